//! Live vitals monitoring: evaluation, simulation, the emergency alert
//! machine, the monitored-patients board, appointment reminders and the tasks that drive them.

pub mod emergency;
pub mod evaluator;
pub mod reminder;
pub mod runtime;
pub mod session;
pub mod simulator;
pub mod ward;

pub use emergency::{AlertDelivery, EmergencyAlertMachine, EmergencyEpisode, Resolution};
pub use runtime::{MonitorHandle, ReminderHandle};
pub use session::{MonitoringSession, VitalsSnapshot};
pub use ward::{MonitoredPatient, WardMonitor};
