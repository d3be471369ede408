//! Edit session over one [`PortalSettings`] draft.
//!
//! The editor owns the draft exclusively. Every structural edit goes through
//! the ordering/layout helpers in [`crate::dashboard`], so the draft is never
//! left with gapped orders or half-removed widgets. Saves are single-flight:
//! [`SettingsEditor::begin_save`] hands out a snapshot and
//! [`SettingsEditor::finish_save`] reports the outcome.

use crate::auth::AuthProvider;
use crate::dashboard::config::{PortalSettings, WidgetConfig};
use crate::dashboard::dashboard::DashboardEvent;
use crate::dashboard::layout::{reorder_grid, Breakpoint};
use crate::dashboard::order;
use crate::dashboard::widgets::{CalendarSource, WidgetSettings, WidgetType};
use crate::gateway::PersistenceGateway;
use crate::theme::{Background, ThemeMode};
use chrono::{DateTime, Local};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    /// Access was refused; nothing was loaded.
    Blocked(String),
    Loading,
    LoadFailed(String),
    Ready,
    Saving,
}

impl EditorState {
    pub fn name(&self) -> &'static str {
        match self {
            EditorState::Blocked(_) => "blocked",
            EditorState::Loading => "loading",
            EditorState::LoadFailed(_) => "load failed",
            EditorState::Ready => "ready",
            EditorState::Saving => "saving",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("the editor is {0}")]
    NotReady(&'static str),
    #[error("a save is already in progress")]
    SaveInProgress,
    #[error("no save is in progress")]
    NoSaveInProgress,
    #[error("saving failed: {0}")]
    SaveFailed(String),
    #[error("no widget with id '{0}'")]
    UnknownWidget(String),
    #[error("widget '{0}' is not a calendar")]
    NotACalendar(String),
    #[error("the dashboard does not use a grid layout")]
    NotAGrid,
    #[error("{0}")]
    InvalidSettings(String),
}

pub struct SettingsEditor {
    state: EditorState,
    saved: Option<PortalSettings>,
    draft: Option<PortalSettings>,
    in_flight: Option<PortalSettings>,
    last_error: Option<String>,
    last_saved_at: Option<DateTime<Local>>,
    load_warnings: Vec<String>,
}

impl SettingsEditor {
    fn blank(state: EditorState) -> Self {
        Self {
            state,
            saved: None,
            draft: None,
            in_flight: None,
            last_error: None,
            last_saved_at: None,
            load_warnings: Vec::new(),
        }
    }

    /// Check access, then load the document.
    pub fn open(auth: &dyn AuthProvider, gateway: &dyn PersistenceGateway) -> Self {
        if let Some(reason) = auth.status().denial() {
            tracing::info!(reason, "settings editor blocked");
            return Self::blank(EditorState::Blocked(reason.to_string()));
        }
        let mut editor = Self::blank(EditorState::Loading);
        editor.load(gateway);
        editor
    }

    /// Load again after a failed attempt.
    pub fn retry_load(&mut self, gateway: &dyn PersistenceGateway) -> Result<(), EditorError> {
        match &self.state {
            EditorState::LoadFailed(_) => {
                self.load(gateway);
                Ok(())
            }
            EditorState::Blocked(reason) => Err(EditorError::AccessDenied(reason.clone())),
            other => Err(EditorError::NotReady(other.name())),
        }
    }

    fn load(&mut self, gateway: &dyn PersistenceGateway) {
        self.state = EditorState::Loading;
        match gateway.load() {
            Ok(mut settings) => {
                self.load_warnings = settings.sanitize();
                tracing::info!(
                    widgets = settings.dashboard_layout.widgets.len(),
                    grid = settings.dashboard_layout.is_grid(),
                    "portal settings loaded"
                );
                self.saved = Some(settings.clone());
                self.draft = Some(settings);
                self.last_error = None;
                self.state = EditorState::Ready;
            }
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "failed to load portal settings");
                self.state = EditorState::LoadFailed(format!("Failed to load settings: {err:#}"));
            }
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_saving(&self) -> bool {
        self.state == EditorState::Saving
    }

    pub fn draft(&self) -> Option<&PortalSettings> {
        self.draft.as_ref()
    }

    /// Error from the most recent save, shown inline while editing continues.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Local>> {
        self.last_saved_at
    }

    pub fn load_warnings(&self) -> &[String] {
        &self.load_warnings
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.saved
    }

    fn draft_mut(&mut self) -> Result<&mut PortalSettings, EditorError> {
        match (&self.state, self.draft.as_mut()) {
            (EditorState::Ready, Some(draft)) => Ok(draft),
            (EditorState::Saving, _) => Err(EditorError::SaveInProgress),
            (EditorState::Blocked(reason), _) => Err(EditorError::AccessDenied(reason.clone())),
            (state, _) => Err(EditorError::NotReady(state.name())),
        }
    }

    fn widget_mut(&mut self, id: &str) -> Result<&mut WidgetConfig, EditorError> {
        self.draft_mut()?
            .dashboard_layout
            .widget_mut(id)
            .ok_or_else(|| EditorError::UnknownWidget(id.to_string()))
    }

    fn ensure_widget(&mut self, id: &str) -> Result<(), EditorError> {
        self.widget_mut(id).map(|_| ())
    }

    /// Append a widget with default settings. Returns the new id.
    pub fn add_widget(&mut self, ty: WidgetType) -> Result<String, EditorError> {
        let layout = &mut self.draft_mut()?.dashboard_layout;
        let id = layout.generate_widget_id(ty.as_str());
        order::push(&mut layout.widgets, WidgetConfig::new(id.clone(), ty, 0));
        if let Some(layouts) = &mut layout.layouts {
            layouts.append(&id, ty.default_size());
        }
        tracing::debug!(%id, widget_type = %ty, "widget added");
        Ok(id)
    }

    /// Remove the widget from the list and from every breakpoint in one step.
    pub fn remove_widget(&mut self, id: &str) -> Result<WidgetConfig, EditorError> {
        let layout = &mut self.draft_mut()?.dashboard_layout;
        let removed = order::remove(&mut layout.widgets, id)
            .ok_or_else(|| EditorError::UnknownWidget(id.to_string()))?;
        if let Some(layouts) = &mut layout.layouts {
            layouts.remove(id);
        }
        tracing::debug!(%id, "widget removed");
        Ok(removed)
    }

    pub fn move_up(&mut self, id: &str) -> Result<bool, EditorError> {
        self.ensure_widget(id)?;
        Ok(order::move_up(&mut self.draft_mut()?.dashboard_layout.widgets, id))
    }

    pub fn move_down(&mut self, id: &str) -> Result<bool, EditorError> {
        self.ensure_widget(id)?;
        Ok(order::move_down(&mut self.draft_mut()?.dashboard_layout.widgets, id))
    }

    pub fn drag_reorder(&mut self, from: usize, to: usize) -> Result<bool, EditorError> {
        Ok(order::move_index(
            &mut self.draft_mut()?.dashboard_layout.widgets,
            from,
            to,
        ))
    }

    pub fn drop_in_grid(
        &mut self,
        bp: Breakpoint,
        id: &str,
        target: usize,
    ) -> Result<bool, EditorError> {
        let layouts = self
            .draft_mut()?
            .dashboard_layout
            .layouts
            .as_mut()
            .ok_or(EditorError::NotAGrid)?;
        Ok(reorder_grid(layouts, bp, id, target))
    }

    /// Apply a position intent raised by the dashboard.
    pub fn apply(&mut self, event: DashboardEvent) -> Result<bool, EditorError> {
        match event {
            DashboardEvent::Move { from, to } => self.drag_reorder(from, to),
            DashboardEvent::Drop {
                breakpoint,
                id,
                target_index,
            } => self.drop_in_grid(breakpoint, &id, target_index),
        }
    }

    /// Shallow-merge a JSON object into a widget's settings.
    pub fn update_settings(&mut self, id: &str, patch: &Value) -> Result<(), EditorError> {
        self.widget_mut(id)?
            .merge_settings(patch)
            .map_err(|err| EditorError::InvalidSettings(err.to_string()))
    }

    /// Edit a widget's settings in place. Values are clamped afterwards.
    pub fn update_settings_with(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut WidgetSettings),
    ) -> Result<(), EditorError> {
        self.widget_mut(id)?.edit_settings(f);
        Ok(())
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<(), EditorError> {
        self.widget_mut(id)?.title = title.to_string();
        Ok(())
    }

    pub fn set_theme(&mut self, theme: ThemeMode) -> Result<(), EditorError> {
        self.draft_mut()?.theme = theme;
        Ok(())
    }

    pub fn set_background(&mut self, background: Option<Background>) -> Result<(), EditorError> {
        self.draft_mut()?.background = background;
        Ok(())
    }

    pub fn add_calendar_source(
        &mut self,
        id: &str,
        source: CalendarSource,
    ) -> Result<(), EditorError> {
        self.widget_mut(id)?.edit_settings(|settings| match settings {
            WidgetSettings::Calendar(calendar) => {
                calendar.add_source(source);
                Ok(())
            }
            _ => Err(EditorError::NotACalendar(id.to_string())),
        })
    }

    pub fn remove_calendar_source(
        &mut self,
        id: &str,
        index: usize,
    ) -> Result<Option<CalendarSource>, EditorError> {
        self.widget_mut(id)?.edit_settings(|settings| match settings {
            WidgetSettings::Calendar(calendar) => Ok(calendar.remove_source(index)),
            _ => Err(EditorError::NotACalendar(id.to_string())),
        })
    }

    /// Enter `Saving` and return the document to write.
    pub fn begin_save(&mut self) -> Result<PortalSettings, EditorError> {
        let snapshot = self.draft_mut()?.clone();
        self.in_flight = Some(snapshot.clone());
        self.last_error = None;
        self.state = EditorState::Saving;
        tracing::debug!("save started");
        Ok(snapshot)
    }

    /// Record the outcome of the save started by [`Self::begin_save`].
    ///
    /// Success makes the snapshot the stored document. Failure keeps the
    /// draft as it is and remembers the message.
    pub fn finish_save(&mut self, result: anyhow::Result<()>) -> Result<(), EditorError> {
        if self.state != EditorState::Saving {
            return Err(EditorError::NoSaveInProgress);
        }
        let snapshot = self.in_flight.take();
        self.state = EditorState::Ready;
        match result {
            Ok(()) => {
                self.saved = snapshot;
                let now = Local::now();
                self.last_saved_at = Some(now);
                tracing::info!(at = %now.format("%H:%M:%S"), "portal settings saved");
                Ok(())
            }
            Err(err) => {
                let msg = format!("{err:#}");
                tracing::warn!(error = %msg, "saving portal settings failed");
                self.last_error = Some(msg.clone());
                Err(EditorError::SaveFailed(msg))
            }
        }
    }

    /// Save synchronously through `gateway`.
    pub fn save(&mut self, gateway: &dyn PersistenceGateway) -> Result<(), EditorError> {
        let snapshot = self.begin_save()?;
        let result = gateway.save(&snapshot);
        self.finish_save(result)
    }

    /// Throw away unsaved edits.
    pub fn discard(&mut self) -> Result<(), EditorError> {
        let saved = self.saved.clone();
        let draft = self.draft_mut()?;
        if let Some(saved) = saved {
            *draft = saved;
        }
        self.last_error = None;
        Ok(())
    }

    /// Shape problems in the current draft, one line per issue.
    pub fn validation_warnings(&self) -> Vec<String> {
        let Some(draft) = &self.draft else {
            return Vec::new();
        };
        draft
            .dashboard_layout
            .widgets
            .iter()
            .flat_map(|w| {
                w.settings
                    .validate()
                    .into_iter()
                    .map(move |msg| format!("{}: {msg}", w.title))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthStatus, StaticAuth};
    use crate::dashboard::config::{BreakpointLayouts, DashboardLayout, LayoutItem};
    use crate::gateway::MemoryGateway;
    use serde_json::json;

    fn gateway_with(widgets: &[(&str, u32)]) -> MemoryGateway {
        let mut settings = PortalSettings::default();
        settings.dashboard_layout = DashboardLayout {
            widgets: widgets
                .iter()
                .map(|(id, order)| WidgetConfig::new(*id, WidgetType::Trivia, *order))
                .collect(),
            layouts: None,
        };
        MemoryGateway::new(settings)
    }

    fn ready(gateway: &MemoryGateway) -> SettingsEditor {
        let editor = SettingsEditor::open(&StaticAuth(AuthStatus::APPROVED), gateway);
        assert_eq!(editor.state(), &EditorState::Ready);
        editor
    }

    fn sequence(editor: &SettingsEditor) -> Vec<(String, u32)> {
        let mut widgets = editor.draft().unwrap().dashboard_layout.widgets.clone();
        order::sort_by_order(&mut widgets);
        widgets.into_iter().map(|w| (w.id, w.order)).collect()
    }

    fn pairs(expected: &[(&str, u32)]) -> Vec<(String, u32)> {
        expected.iter().map(|(id, o)| (id.to_string(), *o)).collect()
    }

    #[test]
    fn unapproved_user_is_blocked_before_loading() {
        let gateway = MemoryGateway::default();
        gateway.set_fail_load(true);
        let auth = StaticAuth(AuthStatus {
            authenticated: true,
            approved: false,
        });
        let mut editor = SettingsEditor::open(&auth, &gateway);
        assert!(matches!(editor.state(), EditorState::Blocked(_)));
        assert!(editor.draft().is_none());
        assert!(matches!(
            editor.add_widget(WidgetType::Weather),
            Err(EditorError::AccessDenied(_))
        ));
    }

    #[test]
    fn load_failure_can_be_retried() {
        let gateway = MemoryGateway::default();
        gateway.set_fail_load(true);
        let mut editor = SettingsEditor::open(&StaticAuth(AuthStatus::APPROVED), &gateway);
        assert!(matches!(editor.state(), EditorState::LoadFailed(_)));
        assert!(editor.draft().is_none());

        gateway.set_fail_load(false);
        editor.retry_load(&gateway).unwrap();
        assert_eq!(editor.state(), &EditorState::Ready);
        assert_eq!(editor.retry_load(&gateway), Err(EditorError::NotReady("ready")));
    }

    #[test]
    fn move_c_up_once() {
        let gateway = gateway_with(&[("a", 1), ("b", 2), ("c", 3)]);
        let mut editor = ready(&gateway);
        assert!(editor.move_up("c").unwrap());
        assert_eq!(sequence(&editor), pairs(&[("a", 1), ("c", 2), ("b", 3)]));
    }

    #[test]
    fn first_weather_widget_gets_defaults_and_order_one() {
        let gateway = gateway_with(&[]);
        let mut editor = ready(&gateway);
        let id = editor.add_widget(WidgetType::Weather).unwrap();
        let widget = editor.draft().unwrap().dashboard_layout.widget(&id).unwrap();
        assert_eq!(widget.order, 1);
        assert!(id.starts_with("weather-"));
        assert_eq!(
            widget.settings.to_value(),
            json!({ "location": "New York", "units": "imperial", "showForecast": true })
        );
    }

    #[test]
    fn drag_first_to_third_of_four() {
        let gateway = gateway_with(&[("w0", 1), ("w1", 2), ("w2", 3), ("w3", 4)]);
        let mut editor = ready(&gateway);
        assert!(editor.apply(DashboardEvent::Move { from: 0, to: 2 }).unwrap());
        assert_eq!(
            sequence(&editor),
            pairs(&[("w1", 1), ("w2", 2), ("w0", 3), ("w3", 4)])
        );
    }

    #[test]
    fn grid_add_and_remove_touch_every_breakpoint() {
        let mut settings = PortalSettings::default();
        let ids: Vec<String> = settings
            .dashboard_layout
            .widgets
            .iter()
            .map(|w| w.id.clone())
            .collect();
        let column = |ids: &[String]| -> Vec<LayoutItem> {
            ids.iter()
                .enumerate()
                .map(|(idx, id)| LayoutItem::new(id.as_str(), 0, idx as u32 * 4, 4, 4))
                .collect()
        };
        settings.dashboard_layout.layouts = Some(BreakpointLayouts {
            lg: column(&ids),
            md: column(&ids),
            sm: column(&ids),
        });
        let gateway = MemoryGateway::new(settings);
        let mut editor = ready(&gateway);

        let id = editor.add_widget(WidgetType::Calendar).unwrap();
        let layouts = editor.draft().unwrap().dashboard_layout.layouts.clone().unwrap();
        for bp in Breakpoint::ALL {
            let item = layouts.get(bp).iter().find(|i| i.id == id).unwrap();
            assert_eq!((item.x, item.y, item.w, item.h), (0, 12, 4, 6));
        }

        editor.remove_widget(&ids[0]).unwrap();
        let layout = &editor.draft().unwrap().dashboard_layout;
        assert!(layout.widget(&ids[0]).is_none());
        let layouts = layout.layouts.as_ref().unwrap();
        for bp in Breakpoint::ALL {
            assert!(layouts.get(bp).iter().all(|i| i.id != ids[0]));
        }
        assert_eq!(sequence(&editor).len(), 3);
    }

    #[test]
    fn grid_drop_requires_grid_layout() {
        let gateway = gateway_with(&[("a", 1)]);
        let mut editor = ready(&gateway);
        assert_eq!(
            editor.drop_in_grid(Breakpoint::Lg, "a", 0),
            Err(EditorError::NotAGrid)
        );
    }

    #[test]
    fn settings_patch_keeps_siblings() {
        let gateway = MemoryGateway::default();
        let mut editor = ready(&gateway);
        editor
            .update_settings("news-default", &json!({ "refreshInterval": 99999 }))
            .unwrap();
        let settings = editor
            .draft()
            .unwrap()
            .dashboard_layout
            .widget("news-default")
            .unwrap()
            .settings
            .to_value();
        assert_eq!(settings["refreshInterval"], json!(1440));
        assert_eq!(settings["maxItems"], json!(5));
        assert!(settings["feedUrl"].as_str().unwrap().starts_with("https://"));
    }

    #[test]
    fn typed_update_is_clamped() {
        let gateway = gateway_with(&[]);
        let mut editor = ready(&gateway);
        let id = editor.add_widget(WidgetType::Recipes).unwrap();
        editor
            .update_settings_with(&id, |settings| {
                if let WidgetSettings::Recipes(recipes) = settings {
                    recipes.count = 50;
                }
            })
            .unwrap();
        let widget = editor.draft().unwrap().dashboard_layout.widget(&id).unwrap();
        assert_eq!(widget.settings.to_value()["count"], json!(10));
    }

    #[test]
    fn calendar_sources_only_on_calendars() {
        let gateway = MemoryGateway::default();
        let mut editor = ready(&gateway);
        let source = CalendarSource::new("https://example.com/a.ics", "A", "#112233");
        assert_eq!(
            editor.add_calendar_source("stocks-default", source.clone()),
            Err(EditorError::NotACalendar("stocks-default".into()))
        );
        let id = editor.add_widget(WidgetType::Calendar).unwrap();
        editor.add_calendar_source(&id, source.clone()).unwrap();
        assert_eq!(editor.remove_calendar_source(&id, 0), Ok(Some(source)));
        assert_eq!(editor.remove_calendar_source(&id, 0), Ok(None));
    }

    #[test]
    fn second_save_while_saving_is_rejected() {
        let gateway = MemoryGateway::default();
        let mut editor = ready(&gateway);
        editor.set_theme(ThemeMode::Dark).unwrap();
        let snapshot = editor.begin_save().unwrap();
        assert_eq!(snapshot.theme, ThemeMode::Dark);
        assert!(editor.is_saving());
        assert_eq!(editor.begin_save(), Err(EditorError::SaveInProgress));
        assert_eq!(editor.rename("weather-default", "x"), Err(EditorError::SaveInProgress));

        editor.finish_save(gateway.save(&snapshot)).unwrap();
        assert!(!editor.is_dirty());
        assert!(editor.last_saved_at().is_some());
        assert_eq!(editor.finish_save(Ok(())), Err(EditorError::NoSaveInProgress));
    }

    #[test]
    fn failed_save_keeps_draft_and_error() {
        let gateway = MemoryGateway::default();
        let mut editor = ready(&gateway);
        editor.rename("weather-default", "Home weather").unwrap();
        let before = editor.draft().cloned();

        gateway.set_fail_save(true);
        let err = editor.save(&gateway).unwrap_err();
        assert!(matches!(err, EditorError::SaveFailed(_)));
        assert_eq!(editor.state(), &EditorState::Ready);
        assert_eq!(editor.draft().cloned(), before);
        assert!(editor.is_dirty());
        assert!(editor.last_error().unwrap().contains("rejected"));

        gateway.set_fail_save(false);
        editor.save(&gateway).unwrap();
        assert_eq!(editor.last_error(), None);
        assert_eq!(gateway.stored(), before);
    }

    #[test]
    fn discard_restores_saved_document() {
        let gateway = MemoryGateway::default();
        let mut editor = ready(&gateway);
        editor.remove_widget("stocks-default").unwrap();
        editor
            .set_background(Some(Background::Solid {
                color: "#000000".into(),
            }))
            .unwrap();
        assert!(editor.is_dirty());
        editor.discard().unwrap();
        assert!(!editor.is_dirty());
        assert_eq!(editor.draft(), gateway.stored().as_ref());
    }

    #[test]
    fn warnings_name_the_widget() {
        let gateway = MemoryGateway::default();
        let mut editor = ready(&gateway);
        editor
            .update_settings("stocks-default", &json!({ "symbols": ["$$$"] }))
            .unwrap();
        let warnings = editor.validation_warnings();
        assert_eq!(warnings, vec!["Stocks: '$$$' is not a valid ticker symbol".to_string()]);
    }
}
