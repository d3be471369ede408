use crate::dashboard::config::{BreakpointLayouts, DashboardLayout, LayoutItem, WidgetConfig};
use std::collections::HashSet;

/// Viewport width tier. Derived from the window each frame, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Breakpoint {
    Lg,
    Md,
    Sm,
}

pub const LG_MIN_WIDTH: f32 = 1200.0;
pub const MD_MIN_WIDTH: f32 = 768.0;

/// Column offset used by the two-column reflow after a grid drop.
const REFLOW_COLUMN_WIDTH: u32 = 4;

impl Breakpoint {
    pub const ALL: [Breakpoint; 3] = [Breakpoint::Lg, Breakpoint::Md, Breakpoint::Sm];

    pub fn from_width(width: f32) -> Self {
        if width >= LG_MIN_WIDTH {
            Breakpoint::Lg
        } else if width >= MD_MIN_WIDTH {
            Breakpoint::Md
        } else {
            Breakpoint::Sm
        }
    }

    pub fn columns(&self) -> u32 {
        match self {
            Breakpoint::Lg => 12,
            Breakpoint::Md => 10,
            Breakpoint::Sm => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Lg => "lg",
            Breakpoint::Md => "md",
            Breakpoint::Sm => "sm",
        }
    }
}

/// Stable row-major sort of one breakpoint's placements.
pub fn sort_reading_order(items: &mut [LayoutItem]) {
    items.sort_by_key(|item| (item.y, item.x));
}

/// Position of `id` in the reading order of `bp`.
pub fn reading_index(layouts: &BreakpointLayouts, bp: Breakpoint, id: &str) -> Option<usize> {
    let mut sorted = layouts.get(bp).clone();
    sort_reading_order(&mut sorted);
    sorted.iter().position(|item| item.id == id)
}

/// Move `id` to `target` within the reading order of `bp` and reflow that
/// breakpoint into two columns. Other breakpoints are left alone.
///
/// Returns `false` when the widget has no placement in `bp` or is dropped on
/// its own slot.
pub fn reorder_grid(
    layouts: &mut BreakpointLayouts,
    bp: Breakpoint,
    id: &str,
    target: usize,
) -> bool {
    let items = layouts.get_mut(bp);
    let mut sorted = items.clone();
    sort_reading_order(&mut sorted);
    let Some(source) = sorted.iter().position(|item| item.id == id) else {
        tracing::debug!(%id, bp = bp.as_str(), "drop ignored: widget not placed");
        return false;
    };
    let target = target.min(sorted.len() - 1);
    if source == target {
        return false;
    }

    let dragged = sorted.remove(source);
    sorted.insert(target, dragged);
    for (idx, item) in sorted.iter_mut().enumerate() {
        item.y = (idx / 2) as u32;
        item.x = (idx % 2) as u32 * REFLOW_COLUMN_WIDTH;
    }
    *items = sorted;
    true
}

/// Widgets to draw, in display order.
///
/// Grid layouts follow the breakpoint's reading order; linear layouts follow
/// `order`. Ids that appear on only one side, and repeated ids, are skipped.
pub fn render_sequence(layout: &DashboardLayout, bp: Breakpoint) -> Vec<&WidgetConfig> {
    let mut seen = HashSet::new();
    match &layout.layouts {
        Some(layouts) => {
            let mut items: Vec<&LayoutItem> = layouts.get(bp).iter().collect();
            items.sort_by_key(|item| (item.y, item.x));
            items
                .into_iter()
                .filter_map(|item| layout.widget(&item.id))
                .filter(|w| seen.insert(w.id.as_str()))
                .collect()
        }
        None => {
            let mut widgets: Vec<&WidgetConfig> = layout.widgets.iter().collect();
            widgets.sort_by_key(|w| w.order);
            widgets
                .into_iter()
                .filter(|w| seen.insert(w.id.as_str()))
                .collect()
        }
    }
}
