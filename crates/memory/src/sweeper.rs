//! Background eviction of idle sessions.

use crate::context_store::ConversationContextStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Spawn a task that sweeps `store` every `interval`.
///
/// The first sweep happens one full interval after spawning. The task runs
/// until aborted or the runtime shuts down.
pub fn spawn_sweeper(store: Arc<ConversationContextStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = store.sweep(chrono::Utc::now()).await;
            let active = store.len().await;
            info!(removed, active, "Swept idle conversation contexts");
        }
    })
}
