//! Error types for the upload pipeline.

use miette::Diagnostic;
use smol_str::SmolStr;

/// Failures surfaced by the record store.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum StoreError {
    /// The store rejected the record update.
    #[error("record update failed: {reason}")]
    #[diagnostic(code(tsumugi::store::update))]
    UpdateFailed { reason: SmolStr },

    /// No record exists for the requested id.
    #[error("record {record_id} not found in {collection}")]
    #[diagnostic(code(tsumugi::store::not_found))]
    NotFound {
        collection: SmolStr,
        record_id: SmolStr,
    },

    /// The updated record came back without the attached file.
    #[error("stored record has no retrievable file")]
    #[diagnostic(code(tsumugi::store::missing_file))]
    MissingFile,
}

/// Main error type for image uploads.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum UploadError {
    /// The picked file is not an image.
    #[error("file type not supported: {media_type}")]
    #[diagnostic(
        code(tsumugi::upload::unsupported_type),
        help("only image files can be uploaded")
    )]
    UnsupportedType { media_type: SmolStr },

    /// The picked file exceeds the upload limit.
    #[error("file too large: {size} bytes (limit {limit})")]
    #[diagnostic(
        code(tsumugi::upload::too_large),
        help("images are capped at 20 MiB")
    )]
    TooLarge { size: u64, limit: u64 },

    /// Reading the file payload failed.
    #[error("could not read file: {reason}")]
    #[diagnostic(code(tsumugi::upload::read))]
    Read { reason: SmolStr },

    /// No entry is active to attach the upload to.
    #[error("no active entry to attach the upload to")]
    #[diagnostic(
        code(tsumugi::upload::missing_record),
        help("save the entry before adding images")
    )]
    MissingRecord,

    /// Record store error
    #[error(transparent)]
    #[diagnostic_source]
    Store(#[from] StoreError),
}
