//! REST endpoint handlers organized by resource.

pub mod monitor;
pub mod system;
