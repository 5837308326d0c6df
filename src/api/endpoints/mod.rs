//! API endpoint handlers.
//!
//! Each module corresponds to a dashboard panel. Handlers stay thin and
//! delegate to `CoreState` and the monitoring runtime.

pub mod assistant;
pub mod doctors;
pub mod emergency;
pub mod health;
pub mod notifications;
pub mod records;
pub mod subjects;
pub mod vitals;
