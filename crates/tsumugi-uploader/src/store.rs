//! Record store seam.
//!
//! Uploads land as file attachments on the entry record being edited.
//! The store is whatever backend holds those records; the pipeline
//! only needs to append a file and ask for its public URL.

use smol_str::SmolStr;

use crate::error::StoreError;
use crate::file::UploadPayload;

/// A stored record with its attached file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: SmolStr,
    /// Stored filenames, oldest first.
    pub files: Vec<SmolStr>,
}

impl StoredRecord {
    /// Filename of the most recently attached file.
    pub fn newest_file(&self) -> Option<&SmolStr> {
        self.files.last()
    }
}

/// Remote persistence for entry records and their file attachments.
pub trait RecordStore {
    /// Appends `payload` to the record's file list, returning the
    /// updated record. The store may rename the file; the caller reads
    /// the stored name back from the record.
    fn attach_file(
        &self,
        collection: &str,
        record_id: &str,
        payload: UploadPayload,
    ) -> impl Future<Output = Result<StoredRecord, StoreError>> + Send;

    /// Public URL for a stored file, when the store can serve one.
    fn file_url(&self, record: &StoredRecord, filename: &str) -> Option<String>;
}

/// Supplies the id of the entry currently being edited.
pub trait PostIdSource {
    /// The active entry id, read once per upload.
    fn current_post_id(&self) -> Option<SmolStr>;
}

/// Unit type implementation - no entry active.
impl PostIdSource for () {
    fn current_post_id(&self) -> Option<SmolStr> {
        None
    }
}
