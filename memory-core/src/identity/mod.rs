//! Identity Store (spec §4.G): three canonical human-readable documents plus
//! the rotating end-of-session conversation-memory archive.

mod frontmatter;

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{instrument, warn};

pub use frontmatter::FrontmatterDocument;

use crate::error::{Error, Result, StorageErrorKind};
use crate::types::IdentityDocKind;

/// Sub-measures aggregated into the advisory coherence score (spec §4.G).
#[derive(Debug, Clone, Copy, Default)]
pub struct CoherenceInputs {
    /// How consistent recalled memories are with the current exchange.
    pub memory_consistency: f32,
    /// A proxy for response quality (e.g. derived from template success rate).
    pub response_quality: f32,
    /// How well context has been tracked across the session.
    pub context_tracking: f32,
    /// How stable the identity's learned traits have been.
    pub trait_stability: f32,
}

/// Compute the advisory coherence score in `[0, 1]`, an unweighted average of
/// the configured sub-measures (spec §9: magic constants are configuration,
/// relative ordering is not load-bearing here since all four weigh equally).
#[must_use]
pub fn compute_coherence(inputs: CoherenceInputs) -> f32 {
    let sum = inputs.memory_consistency + inputs.response_quality + inputs.context_tracking + inputs.trait_stability;
    (sum / 4.0).clamp(0.0, 1.0)
}

fn default_document(kind: IdentityDocKind) -> FrontmatterDocument {
    let mut frontmatter = std::collections::BTreeMap::new();
    frontmatter.insert("awakening_count".to_string(), "0".to_string());
    frontmatter.insert("coherence_score".to_string(), "0.8".to_string());
    let body = match kind {
        IdentityDocKind::Identity => "# Identity\n\nNo learned patterns yet.".to_string(),
        IdentityDocKind::UserProfile => "# User Profile\n\nNo observations yet.".to_string(),
        IdentityDocKind::Preferences => "# Preferences\n\nNo adaptive settings yet.".to_string(),
    };
    FrontmatterDocument { frontmatter, body }
}

/// Filesystem-backed store for the three canonical identity documents and
/// the conversation-memory archive.
pub struct IdentityStore {
    workspace_path: PathBuf,
    archive_max: usize,
}

impl IdentityStore {
    /// Root the store at `workspace_path`, retaining up to `archive_max`
    /// archived conversation memories.
    #[must_use]
    pub fn new(workspace_path: impl Into<PathBuf>, archive_max: usize) -> Self {
        Self {
            workspace_path: workspace_path.into(),
            archive_max,
        }
    }

    fn path_for(&self, kind: IdentityDocKind) -> PathBuf {
        self.workspace_path.join(kind.file_name())
    }

    /// Load a document, recovering gracefully from corruption: the corrupt
    /// file is backed up with a timestamped suffix and a fresh in-memory
    /// document is returned. Never refuses to start (spec §4.G).
    #[instrument(skip(self))]
    pub async fn load(&self, kind: IdentityDocKind) -> Result<FrontmatterDocument> {
        let path = self.path_for(kind);
        match tokio::fs::read(&path).await {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => Ok(FrontmatterDocument::parse(&content)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "identity document is not valid utf-8, recovering");
                    self.backup_corrupt(&path).await?;
                    Ok(default_document(kind))
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(default_document(kind)),
            Err(err) => Err(Error::storage(StorageErrorKind::Unavailable, err.to_string())),
        }
    }

    async fn backup_corrupt(&self, path: &Path) -> Result<()> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(());
        }
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let backup_path = path.with_extension(format!("corrupt.{stamp}"));
        tokio::fs::rename(path, &backup_path)
            .await
            .map_err(|e| Error::storage(StorageErrorKind::Corrupt, e.to_string()))
    }

    /// Write `document` to `kind`'s canonical path atomically (temp file +
    /// rename).
    async fn write_atomic(&self, kind: IdentityDocKind, document: &FrontmatterDocument) -> Result<()> {
        tokio::fs::create_dir_all(&self.workspace_path)
            .await
            .map_err(|e| Error::storage(StorageErrorKind::Unavailable, e.to_string()))?;
        let path = self.path_for(kind);
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, document.render())
            .await
            .map_err(|e| Error::storage(StorageErrorKind::Unavailable, e.to_string()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| Error::storage(StorageErrorKind::Unavailable, e.to_string()))
    }

    /// Touch only structured frontmatter fields (timestamp, and for
    /// `Identity`, the awakening count) without altering the body (spec
    /// §4.G `update_minimal`).
    #[instrument(skip(self))]
    pub async fn update_minimal(&self, kind: IdentityDocKind) -> Result<FrontmatterDocument> {
        let mut document = self.load(kind).await?;
        document
            .frontmatter
            .insert("last_touched".to_string(), Utc::now().to_rfc3339());
        if kind == IdentityDocKind::Identity {
            let count = document.get_u64("awakening_count").unwrap_or(0) + 1;
            document
                .frontmatter
                .insert("awakening_count".to_string(), count.to_string());
        }
        self.write_atomic(kind, &document).await?;
        Ok(document)
    }

    /// Replace the body and merge `frontmatter_updates`, invoked only when
    /// significant changes accumulate (spec §4.G `update_full`).
    #[instrument(skip(self, new_body, frontmatter_updates))]
    pub async fn update_full(
        &self,
        kind: IdentityDocKind,
        new_body: String,
        frontmatter_updates: std::collections::BTreeMap<String, String>,
    ) -> Result<FrontmatterDocument> {
        let mut document = self.load(kind).await?;
        document.body = new_body;
        document.frontmatter.extend(frontmatter_updates);
        document
            .frontmatter
            .insert("last_touched".to_string(), Utc::now().to_rfc3339());
        self.write_atomic(kind, &document).await?;
        Ok(document)
    }

    /// Whether the accumulated session changes warrant `update_full` over
    /// `update_minimal` (spec §4.G: new traits, coherence change > 0.1, or a
    /// non-empty insight set).
    #[must_use]
    pub fn needs_full_update(new_traits: usize, coherence_change: f32, insight_count: usize) -> bool {
        new_traits > 0 || coherence_change.abs() > 0.1 || insight_count > 0
    }

    /// Write the end-of-session `conversation_memory` document, archiving
    /// the previous one under `conversation_memories/session_<ts>` and
    /// trimming the archive to `archive_max` entries (spec §4.G).
    #[instrument(skip(self, content))]
    pub async fn write_conversation_memory(&self, content: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.workspace_path)
            .await
            .map_err(|e| Error::storage(StorageErrorKind::Unavailable, e.to_string()))?;
        let archive_dir = self.workspace_path.join("conversation_memories");
        tokio::fs::create_dir_all(&archive_dir)
            .await
            .map_err(|e| Error::storage(StorageErrorKind::Unavailable, e.to_string()))?;

        let current_path = self.workspace_path.join("conversation_memory");
        if tokio::fs::try_exists(&current_path).await.unwrap_or(false) {
            let stamp = Utc::now().format("%Y%m%d_%H%M%S");
            let archived = archive_dir.join(format!("session_{stamp}"));
            tokio::fs::copy(&current_path, &archived)
                .await
                .map_err(|e| Error::storage(StorageErrorKind::Unavailable, e.to_string()))?;
        }

        tokio::fs::write(&current_path, content)
            .await
            .map_err(|e| Error::storage(StorageErrorKind::Unavailable, e.to_string()))?;

        self.rotate_archive(&archive_dir).await
    }

    async fn rotate_archive(&self, archive_dir: &Path) -> Result<()> {
        let mut entries = tokio::fs::read_dir(archive_dir)
            .await
            .map_err(|e| Error::storage(StorageErrorKind::Unavailable, e.to_string()))?;
        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::storage(StorageErrorKind::Unavailable, e.to_string()))?
        {
            paths.push(entry.path());
        }
        paths.sort();
        while paths.len() > self.archive_max {
            let oldest = paths.remove(0);
            let _ = tokio::fs::remove_file(oldest).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_minimal_increments_awakening_count_without_touching_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::new(dir.path(), 5);
        let first = store.update_minimal(IdentityDocKind::Identity).await.unwrap();
        assert_eq!(first.get_u64("awakening_count"), Some(1));
        let second = store.update_minimal(IdentityDocKind::Identity).await.unwrap();
        assert_eq!(second.get_u64("awakening_count"), Some(2));
        assert_eq!(first.body, second.body);
    }

    #[tokio::test]
    async fn corrupt_file_recovers_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::new(dir.path(), 5);
        let path = dir.path().join(IdentityDocKind::Identity.file_name());
        tokio::fs::write(&path, [0xff, 0xfe, 0x00, 0xff]).await.unwrap();
        let doc = store.load(IdentityDocKind::Identity).await.unwrap();
        assert!(doc.frontmatter.contains_key("awakening_count"));
    }

    #[tokio::test]
    async fn conversation_memory_rotates_archive() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::new(dir.path(), 2);
        for i in 0..4 {
            store
                .write_conversation_memory(&format!("session {i}"))
                .await
                .unwrap();
        }
        let archive_dir = dir.path().join("conversation_memories");
        let mut count = 0;
        let mut entries = tokio::fs::read_dir(&archive_dir).await.unwrap();
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        assert!(count <= 2);
    }

    #[test]
    fn coherence_averages_inputs() {
        let score = compute_coherence(CoherenceInputs {
            memory_consistency: 1.0,
            response_quality: 1.0,
            context_tracking: 1.0,
            trait_stability: 1.0,
        });
        assert!((score - 1.0).abs() < f32::EPSILON);
    }
}
