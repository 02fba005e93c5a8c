// Content synchronization: reconciliation step, scheduler and shared status
pub mod reconciler;
pub mod scheduler;
pub mod status;

pub use reconciler::Reconciler;
pub use scheduler::{SyncScheduleConfig, SyncScheduler};
pub use status::SyncStatus;
