//! Periodic deletion of expired tokens.
//!
//! Expired tokens are already unusable because every lookup filters on
//! `expiry`; this only keeps the table from growing without bound.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use marquee_db::AuthStore;
use tokio_util::sync::CancellationToken;

/// Delete expired tokens once. Returns the number of rows removed, or 0 when
/// the store call failed (the failure is logged).
pub async fn sweep_once(store: &dyn AuthStore) -> u64 {
    match store.delete_expired_tokens(Utc::now()).await {
        Ok(deleted) => {
            if deleted > 0 {
                tracing::info!(deleted, "Token sweep: purged expired tokens");
            } else {
                tracing::debug!("Token sweep: nothing to purge");
            }
            deleted
        }
        Err(e) => {
            tracing::error!(error = %e, "Token sweep: cleanup failed");
            0
        }
    }
}

/// Run the sweep every `every` until `cancel` is triggered.
pub async fn run(store: Arc<dyn AuthStore>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Token sweep job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Token sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                sweep_once(store.as_ref()).await;
            }
        }
    }
}
