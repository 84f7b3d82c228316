//! Image upload pipeline for the tsumugi editor.
//!
//! Validates picked files, shows a placeholder widget through the
//! editor's decoration set, pushes the bytes to a record store, and
//! swaps the placeholder for the final image node once both the local
//! preview and the remote upload have settled.
//!
//! The pipeline is headless: hosts plug in an editor via
//! [`EditorHost`](tsumugi_editor_core::state::EditorHost), a backend
//! via [`RecordStore`], and a toast surface via [`Notifier`].

pub mod error;
pub mod file;
pub mod notify;
pub mod pipeline;
pub mod store;

pub use bytes::Bytes;
pub use error::{StoreError, UploadError};
pub use file::{MAX_UPLOAD_BYTES, MemoryFile, UploadPayload, UploadSource, data_url};
pub use notify::{LogNotifier, Notifier, Toast, ToastKind};
pub use pipeline::{
    RemoteImage, UploadContext, UploadOutcome, UploadPhase, UploadTask, start_image_upload,
};
pub use store::{PostIdSource, RecordStore, StoredRecord};
