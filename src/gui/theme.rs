use crate::theme::{AppliedTheme, Background, SystemPreference};
use eframe::egui;

pub fn system_preference(system_theme: Option<eframe::Theme>) -> SystemPreference {
    match system_theme {
        Some(eframe::Theme::Dark) => SystemPreference::Dark,
        Some(eframe::Theme::Light) => SystemPreference::Light,
        None => SystemPreference::Unknown,
    }
}

pub fn visuals_for(applied: AppliedTheme) -> egui::Visuals {
    match applied {
        AppliedTheme::Dark => egui::Visuals::dark(),
        AppliedTheme::Light => egui::Visuals::light(),
    }
}

/// Panel fill for the dashboard area; `None` keeps the theme's own fill.
pub fn background_fill(background: Option<&Background>) -> Option<egui::Color32> {
    let [r, g, b] = background?.fill_rgb()?;
    Some(egui::Color32::from_rgb(r, g, b))
}

/// Switch the context's visuals when the resolved theme changed.
pub fn apply(ctx: &egui::Context, applied: AppliedTheme) {
    let want_dark = applied == AppliedTheme::Dark;
    if ctx.style().visuals.dark_mode != want_dark {
        tracing::debug!(?applied, "applying theme");
        ctx.set_visuals(visuals_for(applied));
    }
}
