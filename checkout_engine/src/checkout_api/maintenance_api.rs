use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    checkout_api::{errors::CheckoutApiError, payment_objects::RestockSummary},
    events::{AnnulmentReason, EventProducers, OrderAnnulledEvent},
    traits::{CheckoutDatabase, CheckoutDbError, RestockCursor, RestockOutcome},
};

pub const DEFAULT_RESTOCK_BATCH_SIZE: i64 = 100;

/// `MaintenanceApi` closes out orders and payments that no provider callback ever resolved.
///
/// Both sweeps are safe to run repeatedly or concurrently with callbacks: every write re-checks its precondition inside
/// its own transaction.
pub struct MaintenanceApi<B> {
    db: B,
    producers: EventProducers,
    batch_size: i64,
}

impl<B> Debug for MaintenanceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MaintenanceApi (batch size {})", self.batch_size)
    }
}

impl<B> MaintenanceApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, batch_size: DEFAULT_RESTOCK_BATCH_SIZE }
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl<B> MaintenanceApi<B>
where B: CheckoutDatabase
{
    /// Fails every pending order whose reservation expired before `now`, and returns its stock.
    ///
    /// Candidates are read page by page, soonest-expired first, until a page comes back short. Each one is restocked
    /// in its own transaction. A failure on one order is logged and the pass moves on; an order that disappears
    /// between the page read and its transaction stops the pass.
    pub async fn restock_expired_orders(&self, now: DateTime<Utc>) -> Result<RestockSummary, CheckoutApiError> {
        let mut summary = RestockSummary::default();
        let mut cursor: Option<RestockCursor> = None;
        loop {
            let batch = self.db.fetch_restock_candidates(now, cursor, self.batch_size).await?;
            let batch_len = batch.len();
            trace!("🕰️ Restock pass fetched {batch_len} candidates");
            for order in &batch {
                match self.db.restock_order(order.id, now).await {
                    Ok(RestockOutcome::Restocked(order)) => {
                        summary.restocked += 1;
                        let event = OrderAnnulledEvent::new(order, AnnulmentReason::Expired);
                        self.producers.publish_order_annulled(event).await;
                    },
                    Ok(RestockOutcome::Skipped(reason)) => {
                        trace!("🕰️ Order #{} skipped: {reason:?}", order.id);
                        summary.skipped += 1;
                    },
                    Err(CheckoutDbError::OrderNotFound(id)) => {
                        error!("🕰️ Order #{id} was selected for restocking but no longer exists. Stopping this pass.");
                        return Err(CheckoutDbError::OrderNotFound(id).into());
                    },
                    Err(e) => {
                        error!("🕰️ Could not restock order #{}: {e}", order.id);
                        summary.failed += 1;
                    },
                }
            }
            cursor = batch.last().map(RestockCursor::from);
            if (batch_len as i64) < self.batch_size {
                break;
            }
        }
        if summary.restocked + summary.skipped + summary.failed > 0 {
            info!(
                "🕰️ Restock pass: {} orders restocked, {} skipped, {} failed",
                summary.restocked, summary.skipped, summary.failed
            );
        }
        Ok(summary)
    }

    /// Expires every `Initiated` payment whose session lapsed before `now`.
    pub async fn expire_stale_payments(&self, now: DateTime<Utc>) -> Result<u64, CheckoutApiError> {
        let count = self.db.expire_stale_payments(now).await?;
        if count > 0 {
            info!("🕰️ {count} stale payment sessions expired");
        }
        Ok(count)
    }
}
