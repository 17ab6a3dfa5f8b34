//! Request parameter types shared by the monitor endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters accepted by every monitor endpoint.
///
/// Both are forgiving: an unknown `server` targets the whole fleet and an
/// unknown `section` falls back to the domain's default probe.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct MonitorParams {
    /// Server selector (`"db01"` / `"db02"`); omitted or unknown means all.
    pub server: Option<String>,
    /// Section selector within the domain; omitted or unknown means the
    /// domain default.
    pub section: Option<String>,
}
