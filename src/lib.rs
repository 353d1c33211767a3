pub mod board;
pub mod cmds;
mod constructors;
pub mod entities;
pub mod handlers;
pub mod notifications;
pub mod prefs;
pub mod presenters;
pub mod repositories;
pub mod utils;

pub use constructors::*;
