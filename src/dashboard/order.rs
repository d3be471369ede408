//! Linear ordering of the widget list.
//!
//! Every structural edit leaves `order` as a contiguous `1..=N` ranking.
//! Sorting is stable, so widgets sharing an `order` value keep their
//! relative position in the list.

use crate::dashboard::config::WidgetConfig;

/// Stable sort by `order`.
pub fn sort_by_order(widgets: &mut [WidgetConfig]) {
    widgets.sort_by_key(|w| w.order);
}

/// Sort, then reassign `order = index + 1`.
pub fn renumber(widgets: &mut [WidgetConfig]) {
    sort_by_order(widgets);
    assign_positions(widgets);
}

fn assign_positions(widgets: &mut [WidgetConfig]) {
    for (idx, widget) in widgets.iter_mut().enumerate() {
        widget.order = idx as u32 + 1;
    }
}

/// One past the highest order in use. Freed slots are never reused.
pub fn next_order(widgets: &[WidgetConfig]) -> u32 {
    widgets.iter().map(|w| w.order).max().unwrap_or(0) + 1
}

pub fn push(widgets: &mut Vec<WidgetConfig>, mut widget: WidgetConfig) {
    widget.order = next_order(widgets);
    widgets.push(widget);
}

pub fn remove(widgets: &mut Vec<WidgetConfig>, id: &str) -> Option<WidgetConfig> {
    let idx = widgets.iter().position(|w| w.id == id)?;
    let removed = widgets.remove(idx);
    renumber(widgets);
    Some(removed)
}

/// Position of `id` in order-sorted sequence.
pub fn sorted_index(widgets: &[WidgetConfig], id: &str) -> Option<usize> {
    let mut keyed: Vec<(u32, usize, &str)> = widgets
        .iter()
        .enumerate()
        .map(|(idx, w)| (w.order, idx, w.id.as_str()))
        .collect();
    keyed.sort();
    keyed.iter().position(|(_, _, wid)| *wid == id)
}

/// Exchange `id` with the widget sorted immediately before it.
pub fn move_up(widgets: &mut [WidgetConfig], id: &str) -> bool {
    match sorted_index(widgets, id) {
        Some(idx) if idx > 0 => swap_sorted(widgets, idx, idx - 1),
        _ => false,
    }
}

/// Exchange `id` with the widget sorted immediately after it.
pub fn move_down(widgets: &mut [WidgetConfig], id: &str) -> bool {
    match sorted_index(widgets, id) {
        Some(idx) if idx + 1 < widgets.len() => swap_sorted(widgets, idx, idx + 1),
        _ => false,
    }
}

fn swap_sorted(widgets: &mut [WidgetConfig], a: usize, b: usize) -> bool {
    sort_by_order(widgets);
    widgets.swap(a, b);
    assign_positions(widgets);
    true
}

/// Drag reorder by sorted index. Returns `false` when nothing changed.
pub fn move_index(widgets: &mut Vec<WidgetConfig>, from: usize, to: usize) -> bool {
    if from == to || from >= widgets.len() {
        return false;
    }
    sort_by_order(widgets);
    let dragged = widgets.remove(from);
    let to = to.min(widgets.len());
    widgets.insert(to, dragged);
    assign_positions(widgets);
    true
}
