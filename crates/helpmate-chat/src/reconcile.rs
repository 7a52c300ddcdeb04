// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification backfill for messages whose send saga stopped after the
//! message row was written.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use helpmate_config::model::ReconcileConfig;
use helpmate_core::{Clock, HelpmateError, MessageStore, NotificationLedger};

use crate::saga::ensure_notified;

/// Outcome of one backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub scanned: usize,
    pub repaired: usize,
    pub failed: usize,
}

pub struct Reconciler {
    messages: Arc<dyn MessageStore>,
    ledger: Arc<dyn NotificationLedger>,
    clock: Arc<dyn Clock>,
    grace: chrono::Duration,
    batch_size: usize,
}

impl Reconciler {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        ledger: Arc<dyn NotificationLedger>,
        clock: Arc<dyn Clock>,
        config: &ReconcileConfig,
    ) -> Self {
        Self {
            messages,
            ledger,
            clock,
            grace: chrono::Duration::seconds(i64::try_from(config.grace_secs).unwrap_or(i64::MAX)),
            batch_size: config.batch_size,
        }
    }

    /// Repairs up to `batch_size` unlinked messages created at least the
    /// grace period before `now`.
    ///
    /// A message that fails to repair is counted and left for the next pass.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<ReconcileReport, HelpmateError> {
        let cutoff = now - self.grace;
        let pending = self.messages.list_unlinked(cutoff, self.batch_size).await?;

        let mut report = ReconcileReport {
            scanned: pending.len(),
            ..ReconcileReport::default()
        };
        for message in &pending {
            match ensure_notified(self.messages.as_ref(), self.ledger.as_ref(), message, now).await {
                Ok(notif_id) => {
                    debug!(message_id = %message.id, notif_id = %notif_id, "notification backfilled");
                    report.repaired += 1;
                }
                Err(e) => {
                    warn!(message_id = %message.id, error = %e, "notification backfill failed");
                    report.failed += 1;
                }
            }
        }

        if report.scanned > 0 {
            info!(
                scanned = report.scanned,
                repaired = report.repaired,
                failed = report.failed,
                "reconciliation pass complete"
            );
        }
        Ok(report)
    }

    /// Runs a pass every `interval` until `cancel` fires.
    pub async fn run(&self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "reconciler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once(self.clock.now()).await {
                        warn!(error = %e, "reconciliation pass failed (non-fatal)");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("reconciler shutting down");
                    break;
                }
            }
        }
    }
}
