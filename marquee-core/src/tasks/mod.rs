//! Periodic maintenance sweeps and outbound notifications.

pub mod notifications;
pub mod scheduler;
pub mod sweeps;

pub use notifications::{
    LogMailer, Notification, NotificationDispatcher, Notifier, RetryPolicy,
    WebhookMailer,
};
pub use scheduler::{PeriodicTask, TaskScheduler};
pub use sweeps::{RatingSweep, StatusSweep, SweepReport};
