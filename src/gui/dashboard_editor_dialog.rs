use crate::auth::AuthProvider;
use crate::dashboard::config::{PortalSettings, WidgetConfig};
use crate::dashboard::dashboard::DashboardEvent;
use crate::dashboard::order;
use crate::dashboard::widgets::{
    CalendarSource, Coordinates, DailyContentKind, TemperatureUnits, TriviaDifficulty,
    WidgetSettings, WidgetType, DAYS_TO_SHOW_RANGE, DEFAULT_CALENDAR_COLOR, MAX_ITEMS_RANGE,
    RECIPE_COUNT_RANGE, REFRESH_INTERVAL_RANGE,
};
use crate::editor::{EditorState, SettingsEditor};
use crate::gateway::PersistenceGateway;
use crate::theme::{Background, HolidayTheme, ThemeMode};
use eframe::egui;
use eframe::egui::collapsing_header::CollapsingState;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

/// Edits requested by one frame of the dialog, applied after drawing.
enum EditAction {
    Add(WidgetType),
    Remove(String),
    MoveUp(String),
    MoveDown(String),
    Rename(String, String),
    /// Changed settings fields only, so list edits queued in the same frame
    /// are not overwritten.
    Settings(String, Value),
    AddCalendar(String, CalendarSource),
    RemoveCalendar(String, usize),
    Theme(ThemeMode),
    Background(Option<Background>),
    Save,
    Discard,
    Retry,
}

pub struct DashboardEditorDialog {
    pub open: bool,
    editor: Option<SettingsEditor>,
    add_type: WidgetType,
    save_rx: Option<Receiver<anyhow::Result<()>>>,
    /// Comma separated list inputs, committed when the field loses focus.
    list_buffers: HashMap<String, String>,
    new_sources: HashMap<String, CalendarSource>,
    confirm_remove: Option<String>,
    notice: Option<String>,
}

impl Default for DashboardEditorDialog {
    fn default() -> Self {
        Self {
            open: false,
            editor: None,
            add_type: WidgetType::Weather,
            save_rx: None,
            list_buffers: HashMap::new(),
            new_sources: HashMap::new(),
            confirm_remove: None,
            notice: None,
        }
    }
}

impl DashboardEditorDialog {
    /// Show the dialog. A loaded draft is kept; only a missing, blocked or
    /// failed editor is (re)opened against the gateway.
    pub fn open(&mut self, auth: &dyn AuthProvider, gateway: &dyn PersistenceGateway) {
        let reload = match self.editor.as_ref().map(SettingsEditor::state) {
            None | Some(EditorState::Blocked(_)) | Some(EditorState::LoadFailed(_)) => true,
            Some(EditorState::Loading | EditorState::Ready | EditorState::Saving) => false,
        };
        if reload {
            self.editor = Some(SettingsEditor::open(auth, gateway));
            self.list_buffers.clear();
            self.new_sources.clear();
            self.notice = None;
        }
        self.open = true;
    }

    /// Draft being edited, if the editor is loaded.
    pub fn draft(&self) -> Option<&PortalSettings> {
        self.editor.as_ref().and_then(|e| e.draft())
    }

    /// True while layout drags can be applied to the draft.
    pub fn accepts_edits(&self) -> bool {
        self.editor
            .as_ref()
            .is_some_and(|e| e.state() == &EditorState::Ready)
    }

    pub fn apply_event(&mut self, event: DashboardEvent) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if let Err(err) = editor.apply(event) {
            self.notice = Some(err.to_string());
        }
    }

    fn start_save(&mut self, gateway: &Arc<dyn PersistenceGateway>) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match editor.begin_save() {
            Ok(snapshot) => {
                let (tx, rx) = channel();
                let gateway = Arc::clone(gateway);
                std::thread::spawn(move || {
                    let _ = tx.send(gateway.save(&snapshot));
                });
                self.save_rx = Some(rx);
            }
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    /// Collect a finished background save. Returns the stored document on
    /// success.
    fn poll_save(&mut self) -> Option<PortalSettings> {
        let rx = self.save_rx.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!("save worker stopped")),
        };
        self.save_rx = None;
        let editor = self.editor.as_mut()?;
        match editor.finish_save(result) {
            Ok(()) => editor.draft().cloned(),
            Err(err) => {
                tracing::debug!(error = %err, "save reported failure");
                None
            }
        }
    }

    fn apply(&mut self, action: EditAction, gateway: &Arc<dyn PersistenceGateway>) {
        if let EditAction::Save = action {
            self.start_save(gateway);
            return;
        }
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let result = match action {
            EditAction::Add(ty) => editor.add_widget(ty).map(|_| ()),
            EditAction::Remove(id) => editor.remove_widget(&id).map(|_| ()),
            EditAction::MoveUp(id) => editor.move_up(&id).map(|_| ()),
            EditAction::MoveDown(id) => editor.move_down(&id).map(|_| ()),
            EditAction::Rename(id, title) => editor.rename(&id, &title),
            EditAction::Settings(id, patch) => editor.update_settings(&id, &patch),
            EditAction::AddCalendar(id, source) => editor.add_calendar_source(&id, source),
            EditAction::RemoveCalendar(id, idx) => {
                editor.remove_calendar_source(&id, idx).map(|_| ())
            }
            EditAction::Theme(theme) => editor.set_theme(theme),
            EditAction::Background(bg) => editor.set_background(bg),
            EditAction::Discard => {
                self.list_buffers.clear();
                editor.discard()
            }
            EditAction::Retry => editor.retry_load(gateway.as_ref()),
            EditAction::Save => Ok(()),
        };
        match result {
            Ok(()) => self.notice = None,
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    /// Draw the dialog. Returns the stored document after a successful save.
    pub fn ui(
        &mut self,
        ctx: &egui::Context,
        gateway: &Arc<dyn PersistenceGateway>,
    ) -> Option<PortalSettings> {
        let saved = self.poll_save();
        if self.save_rx.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        if !self.open {
            if self.save_rx.is_none() {
                self.editor = None;
            }
            return saved;
        }

        let mut actions = Vec::new();
        let mut open = self.open;
        let Self {
            editor,
            add_type,
            list_buffers,
            new_sources,
            confirm_remove,
            notice,
            ..
        } = self;
        egui::Window::new("Dashboard Settings")
            .open(&mut open)
            .resizable(true)
            .default_width(520.0)
            .show(ctx, |ui| {
                let Some(editor) = editor.as_ref() else {
                    return;
                };
                match editor.state() {
                    EditorState::Blocked(reason) => {
                        ui.heading("Access denied");
                        ui.label(reason.as_str());
                        return;
                    }
                    EditorState::Loading => {
                        ui.spinner();
                        return;
                    }
                    EditorState::LoadFailed(msg) => {
                        ui.colored_label(egui::Color32::RED, msg.as_str());
                        if ui.button("Retry").clicked() {
                            actions.push(EditAction::Retry);
                        }
                        return;
                    }
                    EditorState::Ready | EditorState::Saving => {}
                }
                let Some(draft) = editor.draft() else {
                    return;
                };
                let saving = editor.is_saving();

                if let Some(err) = editor.last_error() {
                    ui.colored_label(egui::Color32::RED, format!("Save failed: {err}"));
                }
                if let Some(msg) = notice.as_deref() {
                    ui.colored_label(egui::Color32::YELLOW, msg);
                }

                ui.add_enabled_ui(!saving, |ui| {
                    appearance_ui(ui, draft, &mut actions);
                    ui.separator();

                    ui.horizontal(|ui| {
                        egui::ComboBox::from_id_source("add-widget-type")
                            .selected_text(add_type.label())
                            .show_ui(ui, |ui| {
                                for ty in WidgetType::ALL {
                                    ui.selectable_value(add_type, ty, ty.label());
                                }
                            });
                        if ui.button("Add widget").clicked() {
                            actions.push(EditAction::Add(*add_type));
                        }
                    });
                    ui.separator();

                    let mut widgets = draft.dashboard_layout.widgets.clone();
                    order::sort_by_order(&mut widgets);
                    egui::ScrollArea::vertical()
                        .max_height(420.0)
                        .auto_shrink([false, true])
                        .show(ui, |ui| {
                            let count = widgets.len();
                            for (idx, widget) in widgets.iter().enumerate() {
                                ui.push_id(&widget.id, |ui| {
                                    widget_ui(
                                        ui,
                                        widget,
                                        idx == 0,
                                        idx + 1 == count,
                                        list_buffers,
                                        new_sources,
                                        confirm_remove,
                                        &mut actions,
                                    );
                                });
                            }
                        });
                });

                let warnings = editor.validation_warnings();
                if !warnings.is_empty() {
                    ui.separator();
                    for warn in warnings {
                        ui.colored_label(egui::Color32::YELLOW, warn);
                    }
                }

                ui.separator();
                ui.horizontal(|ui| {
                    let dirty = editor.is_dirty();
                    ui.add_enabled_ui(!saving && dirty, |ui| {
                        if ui.button("Save").clicked() {
                            actions.push(EditAction::Save);
                        }
                        if ui.button("Discard changes").clicked() {
                            actions.push(EditAction::Discard);
                        }
                    });
                    if saving {
                        ui.spinner();
                        ui.label("Saving...");
                    } else if let Some(at) = editor.last_saved_at() {
                        ui.label(format!("Saved at {}", at.format("%H:%M:%S")));
                    } else if dirty {
                        ui.label("Unsaved changes");
                    }
                });
            });

        if let Some(id) = self.confirm_remove.clone() {
            let mut keep_open = true;
            let mut close = false;
            egui::Window::new("Confirm remove")
                .collapsible(false)
                .resizable(false)
                .open(&mut keep_open)
                .show(ctx, |ui| {
                    ui.label(format!("Remove widget '{id}'?"));
                    ui.horizontal(|ui| {
                        if ui.button("Remove").clicked() {
                            actions.push(EditAction::Remove(id.clone()));
                            close = true;
                        }
                        if ui.button("Cancel").clicked() {
                            close = true;
                        }
                    });
                });
            if close || !keep_open {
                self.confirm_remove = None;
            }
        }

        for action in actions {
            self.apply(action, gateway);
        }
        self.open = open;
        saved
    }
}

fn appearance_ui(ui: &mut egui::Ui, draft: &PortalSettings, actions: &mut Vec<EditAction>) {
    ui.horizontal(|ui| {
        ui.label("Theme");
        let mut theme = draft.theme;
        for mode in ThemeMode::ALL {
            ui.radio_value(&mut theme, mode, mode.as_str());
        }
        if theme != draft.theme {
            actions.push(EditAction::Theme(theme));
        }
    });

    let mut background = draft.background.clone().unwrap_or(Background::None);
    let before = background.clone();
    ui.horizontal(|ui| {
        ui.label("Background");
        if ui
            .radio(matches!(background, Background::None), "None")
            .clicked()
        {
            background = Background::None;
        }
        if ui
            .radio(matches!(background, Background::Solid { .. }), "Solid")
            .clicked()
            && !matches!(background, Background::Solid { .. })
        {
            background = Background::Solid {
                color: "#1e293b".into(),
            };
        }
        if ui
            .radio(matches!(background, Background::Holiday { .. }), "Holiday")
            .clicked()
            && !matches!(background, Background::Holiday { .. })
        {
            background = Background::Holiday {
                theme: HolidayTheme::Christmas,
            };
        }
    });
    match &mut background {
        Background::Solid { color } => {
            ui.horizontal(|ui| {
                ui.label("Color");
                ui.text_edit_singleline(color);
            });
        }
        Background::Holiday { theme } => {
            egui::ComboBox::from_id_source("holiday-theme")
                .selected_text(theme.label())
                .show_ui(ui, |ui| {
                    for holiday in HolidayTheme::ALL {
                        ui.selectable_value(theme, holiday, holiday.label());
                    }
                });
        }
        Background::Unrecognised(_) => {
            ui.weak("Stored background is not supported here and is kept as is.");
        }
        Background::None => {}
    }
    if background != before {
        let next = match background {
            Background::None => None,
            other => Some(other),
        };
        actions.push(EditAction::Background(next));
    }
}

#[allow(clippy::too_many_arguments)]
fn widget_ui(
    ui: &mut egui::Ui,
    widget: &WidgetConfig,
    first: bool,
    last: bool,
    list_buffers: &mut HashMap<String, String>,
    new_sources: &mut HashMap<String, CalendarSource>,
    confirm_remove: &mut Option<String>,
    actions: &mut Vec<EditAction>,
) {
    let collapsing_id = ui.id().with("widget-collapse");
    let state = CollapsingState::load_with_default_open(ui.ctx(), collapsing_id, false);
    state
        .show_header(ui, |ui| {
            let mut title = widget.title.clone();
            if ui.text_edit_singleline(&mut title).changed() {
                actions.push(EditAction::Rename(widget.id.clone(), title));
            }
            ui.label(egui::RichText::new(widget.type_tag()).weak());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Remove").clicked() {
                    *confirm_remove = Some(widget.id.clone());
                }
                if ui.add_enabled(!last, egui::Button::new("Down")).clicked() {
                    actions.push(EditAction::MoveDown(widget.id.clone()));
                }
                if ui.add_enabled(!first, egui::Button::new("Up")).clicked() {
                    actions.push(EditAction::MoveUp(widget.id.clone()));
                }
            });
        })
        .body(|ui| {
            let mut settings = widget.settings.clone();
            let changed = settings_form(
                ui,
                &widget.id,
                &mut settings,
                list_buffers,
                new_sources,
                actions,
            );
            if changed {
                if let Some(patch) = settings_patch(&widget.settings, &settings) {
                    actions.push(EditAction::Settings(widget.id.clone(), patch));
                }
            }
        });
}

/// Fields that differ between two settings values; fields that disappeared
/// are sent as `null`.
fn settings_patch(before: &WidgetSettings, after: &WidgetSettings) -> Option<Value> {
    let (Value::Object(before), Value::Object(after)) = (before.to_value(), after.to_value())
    else {
        return None;
    };
    let mut patch: Map<String, Value> = after
        .iter()
        .filter(|(key, value)| before.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for key in before.keys() {
        if !after.contains_key(key) {
            patch.insert(key.clone(), Value::Null);
        }
    }
    (!patch.is_empty()).then_some(Value::Object(patch))
}

fn number_row(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut u32,
    range: &std::ops::RangeInclusive<u32>,
) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::DragValue::new(value).clamp_range(range.clone()))
            .changed()
    })
    .inner
}

fn text_row(ui: &mut egui::Ui, label: &str, value: &mut String) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.text_edit_singleline(value).changed()
    })
    .inner
}

/// Comma separated list editor. The list is replaced when the field loses
/// focus so partial input is not normalised away while typing.
fn list_row(
    ui: &mut egui::Ui,
    label: &str,
    key: String,
    values: &mut Vec<String>,
    list_buffers: &mut HashMap<String, String>,
) -> bool {
    let buffer = list_buffers
        .entry(key.clone())
        .or_insert_with(|| values.join(", "));
    let response = ui
        .horizontal(|ui| {
            ui.label(label);
            ui.text_edit_singleline(buffer)
        })
        .inner;
    if response.lost_focus() {
        let parsed: Vec<String> = buffer.split(',').map(|s| s.trim().to_string()).collect();
        list_buffers.remove(&key);
        if parsed != *values {
            *values = parsed;
            return true;
        }
    }
    false
}

fn settings_form(
    ui: &mut egui::Ui,
    id: &str,
    settings: &mut WidgetSettings,
    list_buffers: &mut HashMap<String, String>,
    new_sources: &mut HashMap<String, CalendarSource>,
    actions: &mut Vec<EditAction>,
) -> bool {
    let mut changed = false;
    match settings {
        WidgetSettings::News(_, s) => {
            changed |= text_row(ui, "Feed URL", &mut s.feed_url);
            changed |= number_row(ui, "Max items", &mut s.max_items, &MAX_ITEMS_RANGE);
            changed |= number_row(
                ui,
                "Refresh (min)",
                &mut s.refresh_interval,
                &REFRESH_INTERVAL_RANGE,
            );
            changed |= ui.checkbox(&mut s.show_images, "Show images").changed();
        }
        WidgetSettings::Weather(s) => {
            changed |= text_row(ui, "Location", &mut s.location);
            ui.horizontal(|ui| {
                ui.label("Units");
                for units in [TemperatureUnits::Imperial, TemperatureUnits::Metric] {
                    changed |= ui.radio_value(&mut s.units, units, units.as_str()).changed();
                }
            });
            changed |= ui.checkbox(&mut s.show_forecast, "Show forecast").changed();
            let mut use_coords = s.coordinates.is_some();
            if ui.checkbox(&mut use_coords, "Use coordinates").changed() {
                s.coordinates = use_coords.then_some(Coordinates {
                    latitude: 40.7128,
                    longitude: -74.006,
                });
                changed = true;
            }
            if let Some(coords) = &mut s.coordinates {
                ui.horizontal(|ui| {
                    ui.label("Lat");
                    changed |= ui
                        .add(egui::DragValue::new(&mut coords.latitude).clamp_range(-90.0..=90.0))
                        .changed();
                    ui.label("Lon");
                    changed |= ui
                        .add(
                            egui::DragValue::new(&mut coords.longitude)
                                .clamp_range(-180.0..=180.0),
                        )
                        .changed();
                });
            }
        }
        WidgetSettings::Calendar(s) => {
            for (idx, source) in s.sources().iter().enumerate() {
                ui.horizontal(|ui| {
                    let name = if source.name.is_empty() {
                        "Calendar"
                    } else {
                        source.name.as_str()
                    };
                    ui.label(name);
                    ui.label(egui::RichText::new(source.url.as_str()).weak());
                    ui.label(source.color.as_str());
                    if ui.small_button("x").clicked() {
                        actions.push(EditAction::RemoveCalendar(id.to_string(), idx));
                    }
                });
            }
            let pending = new_sources
                .entry(id.to_string())
                .or_insert_with(|| CalendarSource::new("", "", DEFAULT_CALENDAR_COLOR));
            ui.horizontal(|ui| {
                ui.text_edit_singleline(&mut pending.url);
                ui.text_edit_singleline(&mut pending.name);
                ui.text_edit_singleline(&mut pending.color);
            });
            if ui.button("Add calendar").clicked() && !pending.url.trim().is_empty() {
                let source = CalendarSource::new(&pending.url, &pending.name, &pending.color);
                actions.push(EditAction::AddCalendar(id.to_string(), source));
                new_sources.remove(id);
            }
            changed |= number_row(ui, "Days to show", &mut s.days_to_show, &DAYS_TO_SHOW_RANGE);
            changed |= number_row(
                ui,
                "Refresh (min)",
                &mut s.refresh_interval,
                &REFRESH_INTERVAL_RANGE,
            );
        }
        WidgetSettings::Stocks(s) => {
            changed |= list_row(
                ui,
                "Symbols",
                format!("{id}:symbols"),
                &mut s.symbols,
                list_buffers,
            );
            changed |= number_row(
                ui,
                "Refresh (min)",
                &mut s.refresh_interval,
                &REFRESH_INTERVAL_RANGE,
            );
        }
        WidgetSettings::Lottery(s) => {
            changed |= list_row(ui, "Games", format!("{id}:games"), &mut s.games, list_buffers);
        }
        WidgetSettings::DailyContent(s) => {
            ui.horizontal(|ui| {
                for kind in DailyContentKind::ALL {
                    let mut on = s.is_enabled(kind);
                    if ui.checkbox(&mut on, kind.label()).changed() {
                        s.set_enabled(kind, on);
                        changed = true;
                    }
                }
            });
        }
        WidgetSettings::History(s) => {
            changed |= number_row(ui, "Max items", &mut s.max_items, &MAX_ITEMS_RANGE);
        }
        WidgetSettings::Trivia(s) => {
            changed |= text_row(ui, "Category", &mut s.category);
            ui.horizontal(|ui| {
                ui.label("Difficulty");
                for difficulty in TriviaDifficulty::ALL {
                    changed |= ui
                        .radio_value(&mut s.difficulty, difficulty, difficulty.as_str())
                        .changed();
                }
            });
        }
        WidgetSettings::BitcoinMining(s) => {
            changed |= text_row(ui, "Wallet", &mut s.wallet_address);
            changed |= number_row(
                ui,
                "Refresh (min)",
                &mut s.refresh_interval,
                &REFRESH_INTERVAL_RANGE,
            );
        }
        WidgetSettings::Recipes(s) => {
            changed |= text_row(ui, "Category", &mut s.category);
            changed |= number_row(ui, "Count", &mut s.count, &RECIPE_COUNT_RANGE);
        }
        WidgetSettings::Blog(s) => {
            changed |= text_row(ui, "Feed URL", &mut s.feed_url);
            changed |= number_row(ui, "Max items", &mut s.max_items, &MAX_ITEMS_RANGE);
        }
        WidgetSettings::Unknown { widget_type, .. } => {
            ui.label(format!(
                "Widgets of type '{widget_type}' cannot be edited here."
            ));
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthStatus, StaticAuth};
    use crate::gateway::MemoryGateway;

    fn ready_dialog(gateway: &MemoryGateway) -> DashboardEditorDialog {
        let mut dialog = DashboardEditorDialog::default();
        dialog.open(&StaticAuth(AuthStatus::APPROVED), gateway);
        assert!(dialog.accepts_edits());
        dialog
    }

    #[test]
    fn background_save_round_trip() {
        let gateway = Arc::new(MemoryGateway::default());
        let shared: Arc<dyn PersistenceGateway> = gateway.clone();
        let mut dialog = ready_dialog(&gateway);

        dialog.apply(EditAction::Theme(ThemeMode::Dark), &shared);
        dialog.apply(EditAction::Save, &shared);
        assert!(!dialog.accepts_edits());

        let mut saved = None;
        for _ in 0..100 {
            saved = dialog.poll_save();
            if saved.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let saved = saved.expect("save finished");
        assert_eq!(saved.theme, ThemeMode::Dark);
        assert_eq!(gateway.stored(), Some(saved));
        assert!(dialog.accepts_edits());
    }

    #[test]
    fn rejected_edits_surface_as_notice() {
        let gateway = MemoryGateway::default();
        let mut dialog = ready_dialog(&gateway);
        let shared: Arc<dyn PersistenceGateway> = Arc::new(MemoryGateway::default());
        dialog.apply(EditAction::Remove("nope".into()), &shared);
        assert_eq!(dialog.notice.as_deref(), Some("no widget with id 'nope'"));
        dialog.apply_event(DashboardEvent::Move { from: 0, to: 2 });
        let draft = dialog.draft().unwrap();
        let mut widgets = draft.dashboard_layout.widgets.clone();
        order::sort_by_order(&mut widgets);
        assert_eq!(widgets[2].id, "weather-default");
    }

    #[test]
    fn reopening_keeps_the_unsaved_draft() {
        let gateway = MemoryGateway::default();
        let mut dialog = ready_dialog(&gateway);
        dialog.apply_event(DashboardEvent::Move { from: 0, to: 2 });

        dialog.open(&StaticAuth(AuthStatus::APPROVED), &gateway);
        assert!(dialog.open);
        let mut widgets = dialog.draft().unwrap().dashboard_layout.widgets.clone();
        order::sort_by_order(&mut widgets);
        assert_eq!(widgets[2].id, "weather-default");
        assert!(dialog.editor.as_ref().unwrap().is_dirty());
    }

    #[test]
    fn reopening_after_denial_checks_access_again() {
        let gateway = MemoryGateway::default();
        let mut dialog = DashboardEditorDialog::default();
        dialog.open(&StaticAuth(AuthStatus::default()), &gateway);
        assert!(!dialog.accepts_edits());
        dialog.open(&StaticAuth(AuthStatus::APPROVED), &gateway);
        assert!(dialog.accepts_edits());
    }

    #[test]
    fn settings_edit_in_same_frame_keeps_new_calendar_source() {
        let gateway = MemoryGateway::default();
        let shared: Arc<dyn PersistenceGateway> = Arc::new(MemoryGateway::default());
        let mut dialog = ready_dialog(&gateway);
        dialog.apply(EditAction::Add(WidgetType::Calendar), &shared);
        let widget = dialog
            .draft()
            .unwrap()
            .dashboard_layout
            .widgets
            .iter()
            .find(|w| w.widget_type() == Some(WidgetType::Calendar))
            .cloned()
            .unwrap();

        // Both edits come from one drawn frame of the same widget.
        let mut edited = widget.settings.clone();
        if let WidgetSettings::Calendar(calendar) = &mut edited {
            calendar.days_to_show = 21;
        }
        let patch = settings_patch(&widget.settings, &edited).unwrap();
        assert_eq!(patch, serde_json::json!({ "daysToShow": 21 }));
        let source = CalendarSource::new("https://example.com/team.ics", "Team", "#336699");
        dialog.apply(EditAction::AddCalendar(widget.id.clone(), source), &shared);
        dialog.apply(EditAction::Settings(widget.id.clone(), patch), &shared);

        assert_eq!(dialog.notice, None);
        let stored = dialog.draft().unwrap().dashboard_layout.widget(&widget.id).unwrap();
        match &stored.settings {
            WidgetSettings::Calendar(calendar) => {
                assert_eq!(calendar.days_to_show, 21);
                assert_eq!(calendar.sources().len(), 1);
            }
            other => panic!("expected calendar settings, got {other:?}"),
        }
    }

    #[test]
    fn unchanged_settings_produce_no_patch() {
        let settings = WidgetSettings::defaults(WidgetType::Weather);
        assert_eq!(settings_patch(&settings, &settings.clone()), None);
    }
}
