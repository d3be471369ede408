mod dashboard_editor_dialog;
pub mod theme;

pub use dashboard_editor_dialog::DashboardEditorDialog;

use crate::auth::StaticAuth;
use crate::dashboard::config::PortalSettings;
use crate::dashboard::dashboard::Dashboard;
use crate::dashboard::layout::Breakpoint;
use crate::gateway::PersistenceGateway;
use crate::settings::Settings;
use crate::theme::resolve_theme;
use eframe::egui;
use std::sync::Arc;

/// Desktop shell: shows the stored dashboard and hosts the settings editor.
pub struct PortalApp {
    gateway: Arc<dyn PersistenceGateway>,
    auth: StaticAuth,
    document: PortalSettings,
    load_error: Option<String>,
    dashboard: Dashboard,
    editor_dialog: DashboardEditorDialog,
}

impl PortalApp {
    pub fn new(settings: &Settings, gateway: Arc<dyn PersistenceGateway>) -> Self {
        let mut app = Self {
            gateway,
            auth: StaticAuth(settings.auth),
            document: PortalSettings::default(),
            load_error: None,
            dashboard: Dashboard::new(settings.start_in_edit_mode),
            editor_dialog: DashboardEditorDialog::default(),
        };
        app.reload();
        app
    }

    fn reload(&mut self) {
        match self.gateway.load() {
            Ok(mut document) => {
                for warning in document.sanitize() {
                    tracing::warn!("{warning}");
                }
                self.document = document;
                self.load_error = None;
            }
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "failed to load dashboard");
                self.load_error = Some(format!("Failed to load dashboard: {err:#}"));
            }
        }
    }
}

impl eframe::App for PortalApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let system = theme::system_preference(frame.info().system_theme);
        let editing = self.editor_dialog.accepts_edits();
        if !editing {
            self.dashboard.drag_end();
        }

        let shown = self.editor_dialog.draft().unwrap_or(&self.document);
        theme::apply(ctx, resolve_theme(shown.theme, system));
        let fill = theme::background_fill(shown.background.as_ref());

        let mut open_editor = false;
        let mut retry = false;
        egui::TopBottomPanel::top("portal-toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Edit dashboard").clicked() {
                    open_editor = true;
                }
                if !self.auth.0.allows_editing() {
                    ui.weak("Read only");
                }
                ui.add_enabled_ui(editing, |ui| {
                    ui.checkbox(&mut self.dashboard.edit_mode, "Drag to reorder");
                });
                if let Some(err) = &self.load_error {
                    ui.colored_label(egui::Color32::RED, err.as_str());
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                }
            });
        });

        let mut frame_style = egui::Frame::central_panel(&ctx.style());
        if let Some(fill) = fill {
            frame_style = frame_style.fill(fill);
        }
        let mut event = None;
        egui::CentralPanel::default()
            .frame(frame_style)
            .show(ctx, |ui| {
                let bp = Breakpoint::from_width(ui.available_width());
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let shown = self.editor_dialog.draft().unwrap_or(&self.document);
                    let layout = &shown.dashboard_layout;
                    let was_editing = self.dashboard.edit_mode;
                    self.dashboard.edit_mode = was_editing && editing;
                    event = self.dashboard.ui(ui, layout, bp);
                    self.dashboard.edit_mode = was_editing;
                });
            });
        if let Some(event) = event {
            self.editor_dialog.apply_event(event);
        }

        if let Some(saved) = self.editor_dialog.ui(ctx, &self.gateway) {
            self.document = saved;
        }
        if open_editor {
            self.editor_dialog.open(&self.auth, self.gateway.as_ref());
        }
        if retry {
            self.reload();
        }
    }
}
