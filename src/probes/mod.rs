//! Probe catalog: the named read operations each monitor domain can run.
//!
//! Every `(domain, section)` pair maps to one probe with one concrete row
//! schema; handlers dispatch on the section name, never on ad-hoc field
//! presence. The SQL itself is collaborator territory — the core only
//! cares that a probe yields an ordered sequence of typed rows.

pub mod executions;
pub mod health;
pub mod jobs;
pub mod locks;
pub mod overview;
pub mod performance;
pub mod sessions;
