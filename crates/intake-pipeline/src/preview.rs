//! Attachment previews.
//!
//! A preview is a display handle derived from an attachment's content. It
//! holds a resource until released, so every issued [`PreviewRef`] must be
//! handed back to [`PreviewFactory::release_preview`] exactly once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use intake_core::model::{AttachmentId, PreviewId};
use intake_core::Attachment;

use crate::error::{PipelineError, PipelineResult};

/// A displayable reference to a derived preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRef {
    id: PreviewId,
    attachment: AttachmentId,
    uri: String,
}

impl PreviewRef {
    #[must_use]
    pub fn new(attachment: AttachmentId, uri: impl Into<String>) -> Self {
        Self {
            id: PreviewId::new(),
            attachment,
            uri: uri.into(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> PreviewId {
        self.id
    }

    /// The attachment this preview was derived from.
    #[must_use]
    pub const fn attachment(&self) -> AttachmentId {
        self.attachment
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Creates and releases attachment previews.
#[async_trait]
pub trait PreviewFactory: Send + Sync {
    /// Derive a preview from the attachment's content.
    ///
    /// # Errors
    /// Returns [`PipelineError::PreviewDerivationFailed`] if the content
    /// cannot be read or displayed.
    async fn create_preview(&self, attachment: &Attachment) -> PipelineResult<PreviewRef>;

    /// Release a preview previously returned by `create_preview`.
    fn release_preview(&self, preview: &PreviewRef);
}

/// Materializes image previews as files in a cache directory.
///
/// Each preview is a private copy of the attachment, addressed by a
/// `file://` URI. Releasing a preview deletes its copy.
#[derive(Debug)]
pub struct PreviewCache {
    dir: PathBuf,
    issued: Mutex<HashMap<PreviewId, PathBuf>>,
}

impl PreviewCache {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            issued: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of previews issued and not yet released.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl PreviewFactory for PreviewCache {
    async fn create_preview(&self, attachment: &Attachment) -> PipelineResult<PreviewRef> {
        let name = attachment.name();
        let media_type = attachment.media_type();
        if !media_type.is_image() {
            return Err(PipelineError::preview(name, "not an image"));
        }

        let bytes = tokio::fs::read(attachment.path())
            .await
            .map_err(|e| PipelineError::preview(name, e))?;
        if bytes.is_empty() {
            return Err(PipelineError::preview(name, "file is empty"));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PipelineError::preview(name, e))?;

        let mut preview = PreviewRef::new(attachment.id(), String::new());
        let path = self
            .dir
            .join(format!("{}.{}", preview.id(), media_type.extension()));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| PipelineError::preview(name, e))?;
        preview.uri = format!("file://{}", path.display());

        log::debug!("Created preview {} for {name}", preview.id());
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(preview.id(), path);

        Ok(preview)
    }

    fn release_preview(&self, preview: &PreviewRef) {
        let path = self
            .issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&preview.id());

        let Some(path) = path else {
            log::warn!("Release of unknown preview {}", preview.id());
            return;
        };

        match std::fs::remove_file(&path) {
            Ok(()) => log::debug!("Released preview {}", preview.id()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Preview file {} already gone", path.display());
            }
            Err(e) => log::warn!("Failed to remove preview {}: {e}", path.display()),
        }
    }
}
