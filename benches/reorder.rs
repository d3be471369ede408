use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use portal_dashboard::dashboard::config::{BreakpointLayouts, LayoutItem, WidgetConfig};
use portal_dashboard::dashboard::layout::{reorder_grid, Breakpoint};
use portal_dashboard::dashboard::order;
use portal_dashboard::dashboard::widgets::WidgetType;

fn widgets(n: u32) -> Vec<WidgetConfig> {
    (0..n)
        .map(|i| WidgetConfig::new(format!("w{i}"), WidgetType::Stocks, i * 3 + 1))
        .collect()
}

fn layouts(n: u32) -> BreakpointLayouts {
    let items: Vec<LayoutItem> = (0..n)
        .map(|i| LayoutItem::new(format!("w{i}"), (i % 2) * 4, i / 2, 4, 4))
        .collect();
    BreakpointLayouts {
        lg: items.clone(),
        md: items.clone(),
        sm: items,
    }
}

fn bench_reorder(c: &mut Criterion) {
    c.bench_function("linear_drag_200", |b| {
        b.iter_batched(
            || widgets(200),
            |mut list| order::move_index(&mut list, 0, 199),
            BatchSize::SmallInput,
        )
    });
    c.bench_function("linear_remove_200", |b| {
        b.iter_batched(
            || widgets(200),
            |mut list| order::remove(&mut list, "w100"),
            BatchSize::SmallInput,
        )
    });
    c.bench_function("grid_drop_200", |b| {
        b.iter_batched(
            || layouts(200),
            |mut grid| reorder_grid(&mut grid, Breakpoint::Lg, "w0", 150),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_reorder);
criterion_main!(benches);
