//! Wizard form rendering
//!
//! - `field_renderer`: one labelled input box with its error line
//! - `wizard`: step indicator, current step fields and the summary

mod field_renderer;
mod wizard;

pub use wizard::draw_wizard;
