//! Background maintenance.
//!
//! Each job is a [`PeriodicTask`]: a name, an interval, and an async closure that is awaited on every tick. A pass
//! always finishes before the next tick is taken, so a job never overlaps with itself. Errors are logged and the job
//! tries again on the next tick.
use std::{fmt::Display, sync::Arc, time::Duration};

use checkout_engine::{
    checkout_api::errors::CheckoutApiError,
    events::EventProducers,
    helpers,
    MaintenanceApi,
    SqliteDatabase,
};
use futures::future::BoxFuture;
use log::*;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::config::WorkerConfig;

pub type TaskFn = Box<dyn FnMut() -> BoxFuture<'static, Result<String, CheckoutApiError>> + Send>;

pub struct PeriodicTask {
    name: String,
    interval: Duration,
    task: TaskFn,
}

impl PeriodicTask {
    pub fn new<S: Display>(name: S, interval: Duration, task: TaskFn) -> Self {
        Self { name: name.to_string(), interval, task }
    }

    /// Runs one pass. The returned string is a human-readable summary of what the pass did.
    pub async fn run_once(&mut self) -> Result<String, CheckoutApiError> {
        (self.task)().await
    }

    /// Spawns the task. Do not await the returned JoinHandle, as it will run indefinitely.
    pub fn start(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("🕰️ {} worker started. Runs every {}s", self.name, self.interval.as_secs());
            loop {
                timer.tick().await;
                trace!("🕰️ Running {} job", self.name);
                match self.run_once().await {
                    Ok(summary) => debug!("🕰️ {} job complete. {summary}", self.name),
                    Err(e) => error!("🕰️ Error running {} job: {e}", self.name),
                }
            }
        })
    }
}

/// Fails expired, unpaid orders and returns their stock.
pub fn restock_task(db: SqliteDatabase, producers: EventProducers, config: &WorkerConfig) -> PeriodicTask {
    let api = Arc::new(MaintenanceApi::new(db, producers).with_batch_size(config.restock_batch_size));
    let task: TaskFn = Box::new(move || {
        let api = Arc::clone(&api);
        Box::pin(async move {
            let summary = api.restock_expired_orders(helpers::now()).await?;
            Ok(format!(
                "{} orders restocked, {} skipped, {} failed",
                summary.restocked, summary.skipped, summary.failed
            ))
        })
    });
    PeriodicTask::new("Order restock", config.restock_interval, task)
}

/// Expires payment sessions that the provider never reported on.
pub fn payment_expiry_task(db: SqliteDatabase, producers: EventProducers, config: &WorkerConfig) -> PeriodicTask {
    let api = Arc::new(MaintenanceApi::new(db, producers));
    let task: TaskFn = Box::new(move || {
        let api = Arc::clone(&api);
        Box::pin(async move {
            let count = api.expire_stale_payments(helpers::now()).await?;
            Ok(format!("{count} payment sessions expired"))
        })
    });
    PeriodicTask::new("Payment expiry", config.payment_expiry_interval, task)
}
