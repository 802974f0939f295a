// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local filesystem storage with typed per-session paths.
//!
//! Layout under the data directory:
//! - `uploads/excel/<session>/` (uploaded spreadsheet)
//! - `uploads/images/<session>/` (uploaded images)
//! - `processed_data/<session>_plant_database.json`
//! - `static/images/<session>/` (images published for serving)
//! - `uploads/.staging/<uuid>/` (image uploads still being received)

use crate::error::{AppError, Result};
use crate::models::{PlantDatabase, SessionId};
use crate::services::sniff;
use crate::storage::dirs;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// Filesystem-backed storage rooted at the data directory.
#[derive(Debug, Clone)]
pub struct Storage {
    base: PathBuf,
}

impl Storage {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Create the scaffold directories. Safe to call repeatedly.
    pub async fn ensure_layout(&self) -> io::Result<()> {
        for dir in dirs::SCAFFOLD {
            let path = self.base.join(dir);
            fs::create_dir_all(&path).await?;
            tracing::debug!(path = %path.display(), "Ensured directory");
        }
        Ok(())
    }

    pub fn static_root(&self) -> PathBuf {
        self.base.join(dirs::STATIC_ROOT)
    }

    pub fn excel_dir(&self, id: &SessionId) -> PathBuf {
        self.base.join(dirs::EXCEL_UPLOADS).join(id.as_str())
    }

    pub fn image_dir(&self, id: &SessionId) -> PathBuf {
        self.base.join(dirs::IMAGE_UPLOADS).join(id.as_str())
    }

    pub fn static_dir(&self, id: &SessionId) -> PathBuf {
        self.base.join(dirs::STATIC_IMAGES).join(id.as_str())
    }

    pub fn output_path(&self, id: &SessionId) -> PathBuf {
        self.base
            .join(dirs::PROCESSED_DATA)
            .join(format!("{}{}", id, dirs::DATABASE_SUFFIX))
    }

    /// Write `bytes` as `dir/name`, creating `dir` if needed.
    pub async fn write_file(&self, dir: &Path, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(name);
        fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// A fresh staging directory for one upload request. Not created yet.
    pub fn staging_dir(&self) -> PathBuf {
        self.base
            .join(dirs::STAGING)
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Move staged files into `dest`, then drop the staging directory.
    pub async fn adopt_staged(
        &self,
        staging: &Path,
        dest: &Path,
        names: &[String],
    ) -> io::Result<()> {
        if !names.is_empty() {
            fs::create_dir_all(dest).await?;
        }
        for name in names {
            fs::rename(staging.join(name), dest.join(name)).await?;
        }
        self.discard(staging).await
    }

    /// Remove a directory tree. Missing paths are ignored.
    pub async fn discard(&self, dir: &Path) -> io::Result<()> {
        match fs::remove_dir_all(dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Copy every supported image of a session into its static directory.
    pub async fn publish_images(&self, id: &SessionId) -> io::Result<usize> {
        let source = self.image_dir(id);
        let target = self.static_dir(id);
        fs::create_dir_all(&target).await?;

        let mut copied = 0;
        let mut entries = match fs::read_dir(&source).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if sniff::is_supported_image_name(name) {
                fs::copy(entry.path(), target.join(name)).await?;
                copied += 1;
            }
        }

        tracing::debug!(session_id = %id, copied, "Published images");
        Ok(copied)
    }

    /// Remove every file belonging to a session. Missing paths are ignored.
    pub async fn remove_session(&self, id: &SessionId) -> io::Result<()> {
        for dir in [self.excel_dir(id), self.image_dir(id), self.static_dir(id)] {
            self.discard(&dir).await?;
        }

        match fs::remove_file(self.output_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Persist the processed database as pretty-printed JSON.
    pub async fn write_database(&self, id: &SessionId, db: &PlantDatabase) -> Result<PathBuf> {
        let path = self.output_path(id);
        let json = serde_json::to_vec_pretty(db)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("serialize database: {e}")))?;
        fs::write(&path, json).await?;
        Ok(path)
    }

    /// Load a processed database. `Ok(None)` when it was never written.
    pub async fn read_database(&self, id: &SessionId) -> Result<Option<PlantDatabase>> {
        let bytes = match fs::read(self.output_path(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let db = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt database file: {e}")))?;
        Ok(Some(db))
    }

    /// Session directories on disk not modified since `cutoff`.
    ///
    /// Covers sessions left behind by a previous process, which the
    /// in-memory store no longer knows about.
    pub async fn orphaned_sessions(&self, cutoff: SystemTime) -> io::Result<Vec<SessionId>> {
        let mut stale = BTreeSet::new();

        for root in [dirs::EXCEL_UPLOADS, dirs::IMAGE_UPLOADS, dirs::STATIC_IMAGES] {
            let mut entries = match fs::read_dir(self.base.join(root)).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };

            while let Some(entry) = entries.next_entry().await? {
                let meta = entry.metadata().await?;
                if !meta.is_dir() || meta.modified()? >= cutoff {
                    continue;
                }
                if let Some(id) = entry
                    .file_name()
                    .to_str()
                    .and_then(|name| SessionId::parse(name).ok())
                {
                    stale.insert(id);
                }
            }
        }

        Ok(stale.into_iter().collect())
    }

    /// Remove staging directories not modified since `cutoff`. These are
    /// left behind when a client disconnects mid-upload.
    pub async fn purge_stale_staging(&self, cutoff: SystemTime) -> io::Result<usize> {
        let mut entries = match fs::read_dir(self.base.join(dirs::STAGING)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if meta.is_dir() && meta.modified()? < cutoff {
                self.discard(&entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Reduce a client-supplied file name to a safe single path component.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("plants.xlsx").as_deref(), Some("plants.xlsx"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\photos\\a.jpg").as_deref(), Some("a.jpg"));
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("dir/"), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[tokio::test]
    async fn test_ensure_layout_creates_scaffold() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path());

        storage.ensure_layout().await.unwrap();
        storage.ensure_layout().await.unwrap();

        for dir in dirs::SCAFFOLD {
            assert!(tmp.path().join(dir).is_dir(), "{dir} missing");
        }
    }

    #[tokio::test]
    async fn test_remove_session_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path());
        storage.ensure_layout().await.unwrap();
        let id = SessionId::parse("s1").unwrap();

        storage
            .write_file(&storage.image_dir(&id), "a.png", b"x")
            .await
            .unwrap();
        storage
            .write_file(&storage.excel_dir(&id), "p.xlsx", b"x")
            .await
            .unwrap();

        storage.remove_session(&id).await.unwrap();
        storage.remove_session(&id).await.unwrap();

        assert!(!storage.image_dir(&id).exists());
        assert!(!storage.excel_dir(&id).exists());
    }

    #[tokio::test]
    async fn test_adopt_staged_moves_files() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path());
        let id = SessionId::parse("s1").unwrap();
        let staging = storage.staging_dir();
        assert!(staging.starts_with(tmp.path().join(dirs::STAGING)));

        storage.write_file(&staging, "a.png", b"a").await.unwrap();
        storage.write_file(&staging, "b.png", b"b").await.unwrap();
        let names = ["a.png".to_string(), "b.png".to_string()];
        storage
            .adopt_staged(&staging, &storage.image_dir(&id), &names)
            .await
            .unwrap();

        assert!(!staging.exists());
        assert_eq!(std::fs::read(storage.image_dir(&id).join("b.png")).unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_purge_stale_staging() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path());
        assert_eq!(storage.purge_stale_staging(SystemTime::now()).await.unwrap(), 0);

        let staging = storage.staging_dir();
        storage.write_file(&staging, "a.png", b"a").await.unwrap();

        // Everything on disk predates a cutoff in the future.
        let later = SystemTime::now() + std::time::Duration::from_secs(60);
        assert_eq!(storage.purge_stale_staging(later).await.unwrap(), 1);
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn test_publish_images_skips_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path());
        let id = SessionId::parse("s2").unwrap();
        let dir = storage.image_dir(&id);

        storage.write_file(&dir, "a.PNG", b"x").await.unwrap();
        storage.write_file(&dir, "notes.txt", b"x").await.unwrap();

        assert_eq!(storage.publish_images(&id).await.unwrap(), 1);
        assert!(storage.static_dir(&id).join("a.PNG").exists());
        assert!(!storage.static_dir(&id).join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_orphaned_sessions_respects_cutoff() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path());
        storage.ensure_layout().await.unwrap();
        let id = SessionId::parse("old").unwrap();
        storage
            .write_file(&storage.image_dir(&id), "a.png", b"x")
            .await
            .unwrap();

        let past = SystemTime::now() - std::time::Duration::from_secs(3600);
        assert!(storage.orphaned_sessions(past).await.unwrap().is_empty());

        let future = SystemTime::now() + std::time::Duration::from_secs(3600);
        assert_eq!(storage.orphaned_sessions(future).await.unwrap(), vec![id]);
    }
}
