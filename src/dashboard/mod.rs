pub mod config;
pub mod dashboard;
pub mod layout;
pub mod order;
pub mod widgets;

pub use config::{
    BreakpointLayouts, DashboardLayout, LayoutItem, PortalSettings, WidgetConfig, BOTTOM_ROW,
};
pub use dashboard::{Dashboard, DashboardEvent};
pub use layout::Breakpoint;
pub use widgets::{WidgetSettings, WidgetType};
