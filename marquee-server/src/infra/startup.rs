use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use marquee_core::tasks::{RatingSweep, StatusSweep, TaskScheduler};

use crate::infra::app_state::AppState;

#[async_trait]
pub trait StartupHooks: Send + Sync {
    /// Runs once before the listener binds. The returned scheduler is shut
    /// down with the server.
    async fn run(&self, state: &AppState) -> Result<TaskScheduler>;
}

#[derive(Debug, Default)]
pub struct ProdStartupHooks;

#[async_trait]
impl StartupHooks for ProdStartupHooks {
    async fn run(&self, state: &AppState) -> Result<TaskScheduler> {
        let mut scheduler = TaskScheduler::new();
        let tasks = state.config().tasks;

        if !tasks.enabled {
            info!("Scheduled sweeps disabled by configuration");
            return Ok(scheduler);
        }

        scheduler.spawn(
            Arc::new(StatusSweep::new(state.movies.clone())),
            tasks.status_sweep_interval,
        );
        scheduler.spawn(
            Arc::new(RatingSweep::new(state.unit_of_work.clone())),
            tasks.rating_sweep_interval,
        );
        info!(
            status_every = ?tasks.status_sweep_interval,
            rating_every = ?tasks.rating_sweep_interval,
            "Scheduled sweeps started"
        );

        Ok(scheduler)
    }
}

#[derive(Debug, Default)]
pub struct NoopStartupHooks;

#[async_trait]
impl StartupHooks for NoopStartupHooks {
    async fn run(&self, _state: &AppState) -> Result<TaskScheduler> {
        Ok(TaskScheduler::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::{Config, TaskConfig};

    #[tokio::test]
    async fn prod_hooks_schedule_both_sweeps() {
        let config = Config {
            tasks: TaskConfig::default(),
            ..Config::dev()
        };
        let state = AppState::in_memory(config);
        let scheduler = ProdStartupHooks.run(&state).await.unwrap();
        assert_eq!(scheduler.len(), 2);
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn disabled_tasks_leave_scheduler_empty() {
        let state = AppState::in_memory(Config::dev());
        let scheduler = ProdStartupHooks.run(&state).await.unwrap();
        assert!(scheduler.is_empty());
    }
}
