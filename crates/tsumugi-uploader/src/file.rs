//! Upload sources and payload helpers.
//!
//! An [`UploadSource`] wraps whatever the platform hands over when the
//! user picks a file. Reading is async so browser file readers and
//! native pickers fit the same seam.

use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use mime_sniffer::MimeTypeSniffer;
use smol_str::SmolStr;

use crate::error::UploadError;

/// Largest accepted image payload: 20 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// A file picked for upload.
pub trait UploadSource {
    /// Original filename.
    fn name(&self) -> &str;

    /// Media type as declared by the picker, when it gave one.
    fn media_type(&self) -> Option<&str>;

    /// Payload size in bytes.
    fn size(&self) -> u64;

    /// Reads the full payload.
    fn read(&self) -> impl Future<Output = Result<Bytes, UploadError>> + Send;
}

/// An in-memory file, for tests and pickers that pre-read.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: SmolStr,
    media_type: Option<SmolStr>,
    data: Bytes,
}

impl MemoryFile {
    pub fn new(
        name: impl Into<SmolStr>,
        media_type: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.map(SmolStr::new),
            data: data.into(),
        }
    }
}

impl UploadSource for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read(&self) -> Result<Bytes, UploadError> {
        Ok(self.data.clone())
    }
}

/// An image payload ready for the record store.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    /// The filename (used as the stored reference name)
    pub name: SmolStr,
    /// MIME type of the image (sniffed from bytes)
    pub media_type: SmolStr,
    /// Raw image bytes
    pub data: Bytes,
}

/// Checks the declared media type and size before any work starts.
pub(crate) fn validate(source: &impl UploadSource) -> Result<(), UploadError> {
    let media_type = source.media_type().unwrap_or_default();
    if !media_type.starts_with("image/") {
        return Err(UploadError::UnsupportedType {
            media_type: media_type.into(),
        });
    }
    if source.size() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size: source.size(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Media type for a payload: sniffed from the bytes when possible,
/// then the declared type, then a generic fallback.
pub(crate) fn resolved_media_type(source: &impl UploadSource, data: &[u8]) -> SmolStr {
    match data.sniff_mime_type() {
        Some(sniffed) => sniffed.into(),
        None => source
            .media_type()
            .unwrap_or("application/octet-stream")
            .into(),
    }
}

/// Builds a `data:` URL for an in-memory payload.
pub fn data_url(media_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(data))
}
