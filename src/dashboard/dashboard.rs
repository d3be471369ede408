use crate::dashboard::config::{DashboardLayout, WidgetConfig};
use crate::dashboard::layout::{reading_index, render_sequence, Breakpoint};
use crate::dashboard::order;
use eframe::egui;
#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
use std::sync::Mutex;

const ROW_HEIGHT: f32 = 48.0;
const LINEAR_CARD_HEIGHT: f32 = 120.0;

/// Position intent raised by the dashboard in edit mode. The owner of the
/// document decides what to do with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardEvent {
    /// Linear layout: move the widget at sorted index `from` to `to`.
    Move { from: usize, to: usize },
    /// Grid layout: move `id` to `target_index` in `breakpoint`'s reading order.
    Drop {
        breakpoint: Breakpoint,
        id: String,
        target_index: usize,
    },
}

/// Drag highlight state. Lives only as long as the gesture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct DragState {
    dragged: Option<String>,
    over: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CardHighlight {
    None,
    Dragged,
    DropTarget,
}

/// Read-only view of a [`DashboardLayout`].
///
/// The dashboard never edits the document. In edit mode it turns pointer
/// gestures into [`DashboardEvent`]s and keeps only the highlight state.
#[derive(Default)]
pub struct Dashboard {
    pub edit_mode: bool,
    drag: DragState,
}

impl Dashboard {
    pub fn new(edit_mode: bool) -> Self {
        Self {
            edit_mode,
            drag: DragState::default(),
        }
    }

    pub fn dragged(&self) -> Option<&str> {
        self.drag.dragged.as_deref()
    }

    pub fn drop_target(&self) -> Option<usize> {
        self.drag.over
    }

    pub fn drag_start(&mut self, id: &str) {
        tracing::debug!(%id, "drag start");
        self.drag = DragState {
            dragged: Some(id.to_string()),
            over: None,
        };
    }

    /// Mark the rendered position under the pointer. Ignored when nothing is
    /// being dragged.
    pub fn drag_over(&mut self, index: usize) {
        if self.drag.dragged.is_some() {
            self.drag.over = Some(index);
        }
    }

    /// Cancel the gesture without emitting anything.
    pub fn drag_end(&mut self) {
        self.drag = DragState::default();
    }

    /// Finish the gesture over the current drop target.
    ///
    /// Returns `None` when there is no target or the widget would land on
    /// its own slot.
    pub fn drop(&mut self, layout: &DashboardLayout, bp: Breakpoint) -> Option<DashboardEvent> {
        let DragState { dragged, over } = std::mem::take(&mut self.drag);
        let (id, over) = (dragged?, over?);
        let sequence = render_sequence(layout, bp);
        let target = sequence.get(over).or_else(|| sequence.last())?;

        let event = match &layout.layouts {
            Some(layouts) => {
                let from = reading_index(layouts, bp, &id)?;
                let to = reading_index(layouts, bp, &target.id)?;
                (from != to).then(|| DashboardEvent::Drop {
                    breakpoint: bp,
                    id,
                    target_index: to,
                })
            }
            None => {
                let from = order::sorted_index(&layout.widgets, &id)?;
                let to = order::sorted_index(&layout.widgets, &target.id)?;
                (from != to).then_some(DashboardEvent::Move { from, to })
            }
        };
        tracing::debug!(?event, "drop");
        event
    }

    /// Paint the layout for `bp`. Returns an event when a drag finished on a
    /// new position.
    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        layout: &DashboardLayout,
        bp: Breakpoint,
    ) -> Option<DashboardEvent> {
        let sequence = render_sequence(layout, bp);
        let rects = match &layout.layouts {
            Some(layouts) => {
                let width = ui.available_width();
                let col_width = width / bp.columns() as f32;
                let placements: Vec<_> = sequence
                    .iter()
                    .filter_map(|w| layouts.get(bp).iter().find(|item| item.id == w.id))
                    .collect();
                let rows = placements
                    .iter()
                    .map(|item| item.y.saturating_add(item.h))
                    .max()
                    .unwrap_or(0);
                let (area, _) = ui.allocate_exact_size(
                    egui::vec2(width, rows as f32 * ROW_HEIGHT),
                    egui::Sense::hover(),
                );
                placements
                    .iter()
                    .map(|item| {
                        let x = item.x.min(bp.columns().saturating_sub(1));
                        let w = item.w.max(1).min(bp.columns() - x);
                        egui::Rect::from_min_size(
                            area.min
                                + egui::vec2(col_width * x as f32, ROW_HEIGHT * item.y as f32),
                            egui::vec2(col_width * w as f32, ROW_HEIGHT * item.h.max(1) as f32),
                        )
                    })
                    .collect::<Vec<_>>()
            }
            None => sequence
                .iter()
                .map(|_| {
                    ui.allocate_exact_size(
                        egui::vec2(ui.available_width(), LINEAR_CARD_HEIGHT),
                        egui::Sense::hover(),
                    )
                    .0
                })
                .collect(),
        };

        let mut event = None;
        for (idx, (widget, rect)) in sequence.iter().zip(rects).enumerate() {
            let highlight = if self.dragged() == Some(widget.id.as_str()) {
                CardHighlight::Dragged
            } else if self.drop_target() == Some(idx) {
                CardHighlight::DropTarget
            } else {
                CardHighlight::None
            };
            paint_card(ui, rect, widget, highlight);

            if !self.edit_mode {
                continue;
            }
            let response = ui.interact(
                rect,
                egui::Id::new(("dashboard-card", widget.id.as_str())),
                egui::Sense::drag(),
            );
            if response.drag_started() {
                self.drag_start(&widget.id);
            }
            if self.drag.dragged.is_some() && ui.rect_contains_pointer(rect) {
                self.drag_over(idx);
            }
            if response.drag_stopped() {
                event = self.drop(layout, bp);
            }
        }
        event
    }
}

fn paint_card(
    ui: &mut egui::Ui,
    rect: egui::Rect,
    widget: &WidgetConfig,
    highlight: CardHighlight,
) {
    #[cfg(test)]
    CARD_RECTS.lock().unwrap().push((widget.id.clone(), rect));

    let visuals = ui.visuals().clone();
    let mut frame = egui::Frame::group(ui.style());
    match highlight {
        CardHighlight::Dragged => {
            frame = frame.stroke(egui::Stroke::new(2.0, visuals.selection.stroke.color));
        }
        CardHighlight::DropTarget => {
            frame = frame.fill(visuals.selection.bg_fill.gamma_multiply(0.3));
        }
        CardHighlight::None => {}
    }
    ui.allocate_ui_at_rect(rect.shrink(4.0), |ui| {
        ui.set_clip_rect(rect);
        frame.show(ui, |ui| {
            ui.set_min_size(ui.available_size());
            ui.heading(&widget.title);
            match widget.widget_type() {
                Some(ty) => {
                    ui.label(egui::RichText::new(ty.label()).weak());
                    ui.label(widget.settings.summary());
                }
                None => {
                    ui.label(egui::RichText::new("Unknown widget").weak());
                    ui.label(format!("Unsupported widget type '{}'", widget.type_tag()));
                }
            }
        });
    });
}

#[cfg(test)]
static CARD_RECTS: Lazy<Mutex<Vec<(String, egui::Rect)>>> = Lazy::new(|| Mutex::new(Vec::new()));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::config::{BreakpointLayouts, LayoutItem};
    use crate::dashboard::widgets::WidgetType;
    use serial_test::serial;

    fn take_cards() -> Vec<(String, egui::Rect)> {
        std::mem::take(&mut *CARD_RECTS.lock().unwrap())
    }

    fn linear() -> DashboardLayout {
        DashboardLayout {
            widgets: vec![
                WidgetConfig::new("w0", WidgetType::Weather, 1),
                WidgetConfig::new("w1", WidgetType::Stocks, 2),
                WidgetConfig::new("w2", WidgetType::Trivia, 3),
                WidgetConfig::new("w3", WidgetType::Blog, 4),
            ],
            layouts: None,
        }
    }

    fn grid() -> DashboardLayout {
        let mut layout = linear();
        layout.layouts = Some(BreakpointLayouts {
            lg: vec![
                LayoutItem::new("w0", 0, 0, 4, 4),
                LayoutItem::new("ghost", 4, 0, 4, 4),
                LayoutItem::new("w1", 8, 0, 4, 4),
                LayoutItem::new("w2", 0, 4, 4, 4),
            ],
            ..BreakpointLayouts::default()
        });
        layout
    }

    #[test]
    fn linear_drop_emits_move_by_sorted_index() {
        let layout = linear();
        let mut dash = Dashboard::new(true);
        dash.drag_start("w0");
        dash.drag_over(2);
        assert_eq!(dash.drop_target(), Some(2));
        let event = dash.drop(&layout, Breakpoint::Lg);
        assert_eq!(event, Some(DashboardEvent::Move { from: 0, to: 2 }));
        assert_eq!(dash.dragged(), None);
        assert_eq!(dash.drop_target(), None);
    }

    #[test]
    fn grid_drop_maps_rendered_position_to_layout_index() {
        let layout = grid();
        let mut dash = Dashboard::new(true);
        dash.drag_start("w2");
        // rendered: w0 w1 w2; reading order: w0 ghost w1 w2
        dash.drag_over(1);
        assert_eq!(
            dash.drop(&layout, Breakpoint::Lg),
            Some(DashboardEvent::Drop {
                breakpoint: Breakpoint::Lg,
                id: "w2".into(),
                target_index: 2,
            })
        );
    }

    #[test]
    fn drop_on_self_or_without_target_emits_nothing() {
        let layout = linear();
        let mut dash = Dashboard::new(true);
        dash.drag_start("w1");
        dash.drag_over(1);
        assert_eq!(dash.drop(&layout, Breakpoint::Sm), None);

        dash.drag_start("w1");
        assert_eq!(dash.drop(&layout, Breakpoint::Sm), None);

        dash.drag_over(3);
        assert_eq!(dash.drop_target(), None);
    }

    #[test]
    fn drag_end_clears_highlight_and_leaves_layout_alone() {
        let layout = linear();
        let before = layout.clone();
        let mut dash = Dashboard::new(true);
        dash.drag_start("w3");
        dash.drag_over(0);
        dash.drag_end();
        assert_eq!(dash.dragged(), None);
        assert_eq!(dash.drop(&layout, Breakpoint::Md), None);
        assert_eq!(layout, before);
    }

    #[test]
    #[serial]
    fn grid_cards_follow_placements() {
        take_cards();
        let layout = grid();
        let mut dash = Dashboard::new(false);
        egui::__run_test_ui(|ui| {
            let rect = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1200.0, 800.0));
            ui.allocate_ui_at_rect(rect, |ui| {
                dash.ui(ui, &layout, Breakpoint::Lg);
            });
        });
        let cards = take_cards();
        let ids: Vec<&str> = cards.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["w0", "w1", "w2"]);
        let (w0, w1, w2) = (cards[0].1, cards[1].1, cards[2].1);
        assert_eq!(w0.min.y, w1.min.y);
        assert!(w1.min.x > w0.max.x);
        assert!(w2.min.y >= w0.max.y);
    }

    #[test]
    #[serial]
    fn linear_cards_stack_vertically() {
        take_cards();
        let mut layout = linear();
        layout.widgets[0].order = 9;
        let mut dash = Dashboard::default();
        egui::__run_test_ui(|ui| {
            dash.ui(ui, &layout, Breakpoint::Sm);
        });
        let cards = take_cards();
        let ids: Vec<&str> = cards.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["w1", "w2", "w3", "w0"]);
        assert!(cards.windows(2).all(|pair| pair[1].1.min.y >= pair[0].1.max.y));
    }
}
