use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::ids::AttachmentId;

/// The media type of an attachment, detected from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Svg,
    Other,
}

impl MediaType {
    /// Detect the media type from a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "gif" => Self::Gif,
            "webp" => Self::Webp,
            "bmp" => Self::Bmp,
            "svg" => Self::Svg,
            _ => Self::Other,
        }
    }

    /// Detect the media type of a path; paths without an extension are
    /// [`MediaType::Other`].
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(Self::Other, Self::from_extension)
    }

    #[must_use]
    pub const fn is_image(self) -> bool {
        !matches!(self, Self::Other)
    }

    /// Canonical file extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
            Self::Svg => "svg",
            Self::Other => "bin",
        }
    }

    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Svg => "image/svg+xml",
            Self::Other => "application/octet-stream",
        }
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.mime())
    }
}

/// A handle to a binary object chosen for the attachment field.
///
/// The handle points at the content; it never holds the bytes. Only the
/// descriptor (`name`, `size`, `type`) is serialized into a persisted
/// record, never the local path.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    #[serde(skip)]
    id: AttachmentId,
    name: String,
    size: u64,
    #[serde(rename = "type")]
    media_type: MediaType,
    #[serde(skip)]
    path: PathBuf,
}

impl Attachment {
    #[must_use]
    pub fn new(name: impl Into<String>, path: PathBuf, size: u64) -> Self {
        let media_type = MediaType::from_path(&path);
        Self {
            id: AttachmentId::new(),
            name: name.into(),
            size,
            media_type,
            path,
        }
    }

    /// Build a handle for a file on disk, named after its final path
    /// component.
    ///
    /// # Errors
    /// Returns an error if the file metadata cannot be read, or if the path
    /// is not a regular file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            )));
        }
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(name, path.to_path_buf(), metadata.len()))
    }

    #[must_use]
    pub const fn id(&self) -> AttachmentId {
        self.id
    }

    /// The declared name of the object.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub const fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Where the content can be read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Handles are equal when they refer to the same chosen object.
impl PartialEq for Attachment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Attachment {}
