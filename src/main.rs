use portal_dashboard::gateway::FileGateway;
use portal_dashboard::gui::PortalApp;
use portal_dashboard::logging;
use portal_dashboard::settings::Settings;

use eframe::egui;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load("settings.json")?;
    logging::init(settings.debug_logging, settings.log_file());

    let portal_path = settings.portal_settings_path();
    tracing::info!(path = %portal_path.display(), "starting portal dashboard");
    let gateway = Arc::new(FileGateway::new(portal_path));

    let (w, h) = settings.window_size.unwrap_or((1280, 800));
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([w as f32, h as f32])
            .with_min_inner_size([360.0, 240.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Portal Dashboard",
        native_options,
        Box::new(move |_cc| Box::new(PortalApp::new(&settings, gateway))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start the window: {e}"))?;
    Ok(())
}
