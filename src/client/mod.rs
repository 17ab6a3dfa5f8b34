//! Consumer-side support: an HTTP client for the monitor endpoints and a
//! refresh coordinator that polls one of them on an interval.

pub mod refresh;
pub mod transport;

pub use refresh::{CoordinatorState, Fetcher, RefreshCoordinator, Snapshot};
pub use transport::{MonitorClient, MonitorEndpoint};
