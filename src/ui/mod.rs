//! Terminal dashboard
//!
//! Strictly a consumer of the stats snapshot: the UI task polls a copy of
//! engine state at a fixed interval and never mutates it.

pub mod layout;
pub mod terminal;

pub use terminal::run_ui;
