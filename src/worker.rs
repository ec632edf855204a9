use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::callbacks::expiry_callbacks::ExpiryNotifier;
use crate::db::repositories::users::UserRepository;
use crate::expiry::{notice_for, sweep_window, ExpiryNotice};

/// Finds subscriptions about to lapse and hands each reminder to `notifier`.
pub async fn run_expiry_sweep(
    users: Arc<UserRepository>,
    notifier: &dyn ExpiryNotifier,
    now: DateTime<Utc>,
) -> Result<Vec<ExpiryNotice>> {
    let (after, before) = sweep_window(now);
    let expiring = tokio::task::spawn_blocking(move || users.find_expiring_between(after, before))
        .await
        .map_err(|join_err| anyhow!("Task execution failed: {}", join_err))??;

    let notices: Vec<ExpiryNotice> = expiring.iter().filter_map(|u| notice_for(u, now)).collect();
    debug!(candidates = expiring.len(), notices = notices.len(), "Expiry sweep selected users");

    for notice in &notices {
        notifier.notify(notice).await;
    }
    Ok(notices)
}

/// Runs the expiry sweep on a fixed interval.
pub struct ExpirySweepWorker {
    users: Arc<UserRepository>,
    notifier: Arc<dyn ExpiryNotifier>,
    interval: Duration,
}

impl ExpirySweepWorker {
    pub fn new(users: Arc<UserRepository>, notifier: Arc<dyn ExpiryNotifier>, interval: Duration) -> Self {
        info!("Expiry sweep configured every {:?}", interval);
        Self {
            users,
            notifier,
            interval,
        }
    }

    /// Loops forever; a failed sweep is logged and retried on the next tick.
    pub async fn run(self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match run_expiry_sweep(self.users.clone(), self.notifier.as_ref(), Utc::now()).await {
                Ok(notices) => info!(count = notices.len(), "Expiry sweep finished"),
                Err(e) => error!(error = %e, "Expiry sweep failed"),
            }
        }
    }
}
