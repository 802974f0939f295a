// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cleanup: explicit purge and the periodic auto-cleanup sweeper.

use crate::models::SessionId;
use crate::time_utils::cutoff;
use crate::AppState;
use chrono::Utc;
use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(3600);

/// Remove a session's files and status. Returns whether the session was known.
pub async fn purge_session(state: &AppState, id: &SessionId) -> io::Result<bool> {
    state.storage.remove_session(id).await?;
    let known = state.sessions.remove(id).is_some();
    tracing::info!(session_id = %id, known, "Session purged");
    Ok(known)
}

/// Purge sessions older than `max_age`, including on-disk leftovers from
/// sessions this process never saw. Returns the number purged.
pub async fn sweep_once(state: &AppState, max_age: Duration) -> io::Result<usize> {
    let (created_cutoff, modified_cutoff) = cutoff(Utc::now(), max_age);
    let mut purged = BTreeSet::new();

    for id in state.sessions.expired(created_cutoff) {
        purge_session(state, &id).await?;
        purged.insert(id);
    }

    for id in state.storage.orphaned_sessions(modified_cutoff).await? {
        // Known sessions are governed by their creation time, not file age.
        if purged.contains(&id) || state.sessions.contains(&id) {
            continue;
        }
        purge_session(state, &id).await?;
        purged.insert(id);
    }

    let staging = state.storage.purge_stale_staging(modified_cutoff).await?;
    if staging > 0 {
        tracing::info!(count = staging, "Auto-cleanup removed abandoned uploads");
    }

    if !purged.is_empty() {
        tracing::info!(count = purged.len(), "Auto-cleanup removed sessions");
    }
    Ok(purged.len())
}

/// Start the background sweeper. Returns `None` when auto-cleanup is disabled.
pub fn spawn_sweeper(state: Arc<AppState>) -> Option<JoinHandle<()>> {
    let hours = state.config.auto_cleanup_hours;
    if hours == 0 {
        tracing::info!("Auto-cleanup disabled");
        return None;
    }

    let max_age = Duration::from_secs(hours.saturating_mul(3600));
    let period = max_age.min(MAX_SWEEP_PERIOD);
    tracing::info!(hours, period_secs = period.as_secs(), "Auto-cleanup enabled");

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Err(e) = sweep_once(&state, max_age).await {
                tracing::warn!(error = %e, "Auto-cleanup sweep failed");
            }
        }
    }))
}
