//! Terminal front end: menus, prompts and result lists drawn with Ratatui.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
