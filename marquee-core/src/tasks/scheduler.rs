use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use super::sweeps::SweepReport;
use crate::error::Result;

#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run_once(&self) -> Result<SweepReport>;
}

/// Runs periodic tasks on independent interval loops until shut down.
#[derive(Debug)]
pub struct TaskScheduler {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler {
    pub fn new() -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            stop_tx,
            tasks: Vec::new(),
        }
    }

    /// Starts `task` now and then every `every`; missed ticks are skipped.
    pub fn spawn(&mut self, task: Arc<dyn PeriodicTask>, every: Duration) {
        let stop_rx = self.stop_tx.subscribe();
        info!(task = task.name(), ?every, "scheduling periodic task");
        self.tasks.push(tokio::spawn(task_loop(task, every, stop_rx)));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Signals every loop to stop and waits for them to exit.
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        for handle in self.tasks {
            if let Err(err) = handle.await {
                warn!(error = %err, "periodic task ended abnormally");
            }
        }
    }
}

async fn task_loop(
    task: Arc<dyn PeriodicTask>,
    every: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        match task.run_once().await {
            Ok(report) => debug!(task = task.name(), ?report, "periodic task run complete"),
            Err(err) => warn!(task = task.name(), error = %err, "periodic task run failed"),
        }
    }

    debug!(task = task.name(), "periodic task stopped");
}
