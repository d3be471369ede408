pub mod auth;
pub mod dashboard;
pub mod editor;
pub mod gateway;
pub mod gui;
pub mod logging;
pub mod settings;
pub mod theme;
