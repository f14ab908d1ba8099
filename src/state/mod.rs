//! Application state module

mod app_state;
mod forms;
pub mod wizard;

pub use app_state::*;
pub use forms::*;
