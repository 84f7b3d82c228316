//! Image upload orchestration.
//!
//! A picked file becomes an image node in four moves: validate the
//! file, clear any selection, show a placeholder widget backed by a
//! local preview, and swap the widget for the final node once the
//! remote store answers. The placeholder is tracked by [`UploadId`]
//! through the editor's decoration set, so edits made while the upload
//! is in flight move it along; if the user deletes the placeholder the
//! upload is dropped without complaint.

use smol_str::SmolStr;
use tsumugi_editor_core::node::{ImageAttrs, Node};
use tsumugi_editor_core::placeholder::{UploadDirective, UploadId, find_placeholder};
use tsumugi_editor_core::state::EditorHost;
use tsumugi_editor_core::transaction::Transaction;
use web_time::Instant;

use crate::error::{StoreError, UploadError};
use crate::file::{self, UploadPayload, UploadSource};
use crate::notify::{Notifier, Toast};
use crate::store::{PostIdSource, RecordStore};

// === Upload context ===

/// Collaborators the pipeline talks to.
#[derive(Debug)]
pub struct UploadContext<S, P, N> {
    pub store: S,
    pub posts: P,
    pub notifier: N,
    /// Collection the active entry lives in.
    pub collection: SmolStr,
}

// === Upload lifecycle ===

/// Phases of a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    /// Checking the file before any transaction is built.
    Validating,
    /// Waiting for the local preview bytes.
    AwaitingLocalPreview,
    /// Placeholder shown; the store has not answered yet.
    Uploading,
    /// The placeholder was swapped for the image node.
    Resolved,
    /// Finished without inserting anything.
    Aborted,
}

/// What the store produced for a finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    /// Public URL, when the store can serve one.
    pub src: Option<SmolStr>,
    /// Stored filename.
    pub title: SmolStr,
}

/// State machine for one upload.
///
/// Two async arms feed it: the local preview read and the remote store
/// round-trip. They settle in either order, and the swap is only legal
/// once both have reported in.
#[derive(Debug)]
pub struct UploadTask {
    id: UploadId,
    phase: UploadPhase,
    preview: Option<SmolStr>,
    remote: Option<Option<RemoteImage>>,
}

impl UploadTask {
    pub fn new(id: UploadId) -> Self {
        Self {
            id,
            phase: UploadPhase::Validating,
            preview: None,
            remote: None,
        }
    }

    pub fn id(&self) -> UploadId {
        self.id
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    /// Marks validation as passed.
    pub fn begin(&mut self) {
        self.phase = UploadPhase::AwaitingLocalPreview;
    }

    /// Records the local preview data URL.
    pub fn preview_ready(&mut self, src: SmolStr) {
        self.preview = Some(src);
        self.phase = UploadPhase::Uploading;
    }

    /// Records the store's answer. `None` means the upload failed and
    /// the local preview will stand in for the remote URL.
    pub fn upload_settled(&mut self, result: Option<RemoteImage>) {
        self.remote = Some(result);
    }

    /// Final image source once both arms have settled, with a flag for
    /// whether it is the remote URL or the local fallback. A stored
    /// image without a servable URL falls back too. `None` while
    /// either arm is still pending.
    pub fn final_src(&self) -> Option<(SmolStr, bool)> {
        let preview = self.preview.as_ref()?;
        let remote = self.remote.as_ref()?;
        Some(match remote.as_ref().and_then(|image| image.src.clone()) {
            Some(url) => (url, true),
            None => (preview.clone(), false),
        })
    }

    /// Stored filename, once the store has answered successfully.
    pub fn remote_title(&self) -> Option<&SmolStr> {
        self.remote.as_ref()?.as_ref().map(|image| &image.title)
    }

    pub fn resolve(&mut self) {
        self.phase = UploadPhase::Resolved;
    }

    pub fn abort(&mut self) {
        self.phase = UploadPhase::Aborted;
    }
}

// === Pipeline ===

/// How an upload run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The image node landed at the placeholder's mapped position.
    Inserted {
        pos: usize,
        /// False when the store failed and the local preview stands in.
        remote: bool,
    },
    /// The placeholder vanished (or never appeared); nothing was
    /// inserted.
    Dropped,
    /// Validation failed; no transaction was dispatched.
    Rejected,
}

/// Runs one image upload against the host editor.
///
/// The placeholder appears at `pos` once the local preview is read.
/// The final image node goes wherever the placeholder has been mapped
/// to by the time both the preview and the store round-trip settle.
pub async fn start_image_upload<H, S, P, N, F>(
    host: &mut H,
    ctx: &UploadContext<S, P, N>,
    source: &F,
    pos: usize,
) -> UploadOutcome
where
    H: EditorHost,
    S: RecordStore,
    P: PostIdSource,
    N: Notifier,
    F: UploadSource,
{
    let started = Instant::now();

    if let Err(error) = file::validate(source) {
        tracing::warn!(
            target: "tsumugi::upload",
            %error,
            file = source.name(),
            "rejected upload"
        );
        ctx.notifier.notify(Toast::error(error.to_string()));
        return UploadOutcome::Rejected;
    }

    let mut task = UploadTask::new(UploadId::fresh());
    task.begin();
    tracing::debug!(
        target: "tsumugi::upload",
        id = %task.id(),
        pos,
        file = source.name(),
        "starting image upload"
    );

    clear_selection(host);

    let preview_arm = async {
        match source.read().await {
            Ok(data) => {
                let media_type = file::resolved_media_type(source, &data);
                let src = SmolStr::from(file::data_url(&media_type, &data));
                task.preview_ready(src.clone());
                let mut tr = Transaction::new();
                tr.set_upload_meta(UploadDirective::Add {
                    id: task.id(),
                    pos,
                    src,
                });
                host.dispatch(tr);
            }
            Err(error) => {
                // No placeholder without a preview; the store arm owns
                // the user-facing report for read failures.
                tracing::warn!(
                    target: "tsumugi::upload",
                    %error,
                    file = source.name(),
                    "preview read failed"
                );
            }
        }
    };

    let upload_arm = async {
        match push_to_store(ctx, source).await {
            Ok(image) => Some(image),
            Err(error) => {
                tracing::error!(
                    target: "tsumugi::upload",
                    %error,
                    file = source.name(),
                    "upload failed"
                );
                ctx.notifier.notify(Toast::error(error.to_string()));
                None
            }
        }
    };

    let ((), remote_result) = n0_future::future::zip(preview_arm, upload_arm).await;
    task.upload_settled(remote_result);

    let Some((src, remote)) = task.final_src() else {
        // The preview never arrived, so no placeholder was shown.
        task.abort();
        return UploadOutcome::Dropped;
    };

    let anchor = host
        .state()
        .and_then(|state| find_placeholder(state, task.id()));
    let Some(anchor) = anchor else {
        tracing::debug!(
            target: "tsumugi::upload",
            id = %task.id(),
            "placeholder gone, dropping upload"
        );
        task.abort();
        return UploadOutcome::Dropped;
    };

    let mut tr = Transaction::new();
    tr.insert(
        anchor,
        Node::image(ImageAttrs {
            src,
            alt: None,
            title: task.remote_title().cloned(),
        }),
    )
    .set_upload_meta(UploadDirective::Remove { id: task.id() });
    host.dispatch(tr);
    task.resolve();

    tracing::info!(
        target: "tsumugi::upload",
        id = %task.id(),
        pos = anchor,
        remote,
        elapsed = ?started.elapsed(),
        "image upload finished"
    );
    UploadOutcome::Inserted {
        pos: anchor,
        remote,
    }
}

/// Deletes the selection up front so the placeholder lands at a
/// collapsed cursor.
fn clear_selection(host: &mut impl EditorHost) {
    let Some(state) = host.state() else {
        return;
    };
    let selection = state.selection();
    if selection.is_collapsed() {
        return;
    }
    let mut tr = Transaction::new();
    tr.delete_range(selection.start(), selection.end());
    host.dispatch(tr);
}

/// Pushes the payload to the record store and resolves its public URL.
///
/// A record that stores the file but cannot serve a URL for it is not
/// an error; the caller falls back to the local preview.
async fn push_to_store<S, P, N>(
    ctx: &UploadContext<S, P, N>,
    source: &impl UploadSource,
) -> Result<RemoteImage, UploadError>
where
    S: RecordStore,
    P: PostIdSource,
{
    let Some(post_id) = ctx.posts.current_post_id() else {
        return Err(UploadError::MissingRecord);
    };
    let data = source.read().await?;
    let media_type = file::resolved_media_type(source, &data);
    let payload = UploadPayload {
        name: source.name().into(),
        media_type,
        data,
    };
    let record = ctx
        .store
        .attach_file(&ctx.collection, &post_id, payload)
        .await?;
    let filename = record.newest_file().ok_or(StoreError::MissingFile)?.clone();
    let src = ctx.store.file_url(&record, &filename).map(SmolStr::from);
    Ok(RemoteImage {
        src,
        title: filename,
    })
}
