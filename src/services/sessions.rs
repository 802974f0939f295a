// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory session status store.
//!
//! Status lives only as long as the process; files on disk are swept by
//! the cleanup task when the process no longer knows about them.

use crate::models::{ProcessingStatus, SessionId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Shared map of session id to processing status.
#[derive(Default, Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, ProcessingStatus>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a session after its spreadsheet was stored.
    pub fn start(&self, id: &SessionId, filename: &str, path: &str) -> ProcessingStatus {
        let status = ProcessingStatus::with_excel(id, filename, path);
        if self
            .inner
            .insert(id.to_string(), status.clone())
            .is_some()
        {
            tracing::info!(session_id = %id, "Session restarted with new spreadsheet");
        }
        status
    }

    pub fn get(&self, id: &SessionId) -> Option<ProcessingStatus> {
        self.inner.get(id.as_str()).map(|entry| entry.clone())
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.inner.contains_key(id.as_str())
    }

    /// Apply `f` to the session status. Returns false if the session is unknown.
    pub fn update<F>(&self, id: &SessionId, f: F) -> bool
    where
        F: FnOnce(&mut ProcessingStatus),
    {
        match self.inner.get_mut(id.as_str()) {
            Some(mut entry) => {
                f(&mut entry);
                true
            }
            None => false,
        }
    }

    /// Merge newly stored image names into the session.
    pub fn record_images(&self, id: &SessionId, names: &[String]) -> bool {
        self.update(id, |status| {
            for name in names {
                if !status.uploaded_images.contains(name) {
                    status.uploaded_images.push(name.clone());
                }
            }
            status.images_uploaded = true;
            status.image_count = status.uploaded_images.len();
        })
    }

    pub fn complete(&self, id: &SessionId, output_path: &str, mapped_plants: usize) -> bool {
        self.update(id, |status| {
            status.processing_complete = true;
            status.output_path = Some(output_path.to_string());
            status.mapped_plants = mapped_plants;
        })
    }

    pub fn remove(&self, id: &SessionId) -> Option<ProcessingStatus> {
        self.inner.remove(id.as_str()).map(|(_, status)| status)
    }

    /// Sessions created before `cutoff`.
    pub fn expired(&self, cutoff: DateTime<Utc>) -> Vec<SessionId> {
        self.inner
            .iter()
            .filter(|entry| entry.created_at < cutoff)
            .filter_map(|entry| SessionId::parse(entry.key()).ok())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
