//! Background cleanup tasks.
//!
//! Two loops run for the life of the process: a fast one sweeping expired
//! pending challenges (and pruning rate-limiter bookkeeping), and a slow one
//! dropping expired blacklist entries and session rows. Both finish a final
//! pass when the shutdown signal arrives.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::state::AuthState;
use super::storage::delete_expired_sessions;

const CHALLENGE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const EXPIRY_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub(crate) fn spawn(state: Arc<AuthState>, pool: PgPool, shutdown: watch::Receiver<bool>) {
    tokio::spawn(sweep_challenges(state.clone(), shutdown.clone()));
    tokio::spawn(cleanup_expired(state, pool, shutdown));
}

async fn sweep_challenges(state: Arc<AuthState>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(CHALLENGE_SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = state.registry().sweep().await;
                if removed > 0 {
                    debug!("Swept {removed} expired challenges");
                }
                state.rate_limiter().prune();
            }
            _ = shutdown.changed() => {
                let _ = state.registry().sweep().await;
                debug!("Challenge janitor stopped");
                break;
            }
        }
    }
}

async fn cleanup_expired(
    state: Arc<AuthState>,
    pool: PgPool,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(EXPIRY_CLEANUP_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = state.blacklist().cleanup().await;
                if removed > 0 {
                    debug!("Dropped {removed} expired blacklist entries");
                }
                match delete_expired_sessions(&pool).await {
                    Ok(count) if count > 0 => debug!("Deleted {count} expired sessions"),
                    Ok(_) => {}
                    Err(err) => warn!("Failed to delete expired sessions: {err:#}"),
                }
            }
            _ = shutdown.changed() => {
                let _ = state.blacklist().cleanup().await;
                debug!("Expiry janitor stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::tests::{lazy_pool, test_auth_state};
    use anyhow::Result;

    #[tokio::test]
    async fn janitors_stop_on_shutdown() -> Result<()> {
        let state = test_auth_state();
        let (tx, rx) = watch::channel(false);
        spawn(state, lazy_pool()?, rx);

        // Dropping the sender after signalling lets both loops run their final
        // pass and exit; the test passing means neither loop hangs.
        tx.send(true)?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }
}
