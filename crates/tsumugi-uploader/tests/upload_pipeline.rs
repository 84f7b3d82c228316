// Integration tests for the image upload pipeline
//
// Each test drives start_image_upload against a host with fake
// collaborators: an in-memory record store, a fixed entry id, and a
// recording toast sink. Mid-flight edits are injected by a scripted
// host that applies extra transactions right after the pipeline
// dispatches the placeholder.

use std::sync::Mutex;

use bytes::Bytes;
use smol_str::SmolStr;
use tsumugi_editor_core::node::{ImageAttrs, Node};
use tsumugi_editor_core::placeholder::{UploadDirective, UploadId};
use tsumugi_editor_core::state::{EditorHost, EditorState, PlainHost, Selection};
use tsumugi_editor_core::transaction::Transaction;
use tsumugi_uploader::{
    LogNotifier, MemoryFile, Notifier, PostIdSource, RecordStore, StoreError, StoredRecord, Toast,
    ToastKind, UploadContext, UploadError, UploadOutcome, UploadPayload, UploadSource,
    start_image_upload,
};

// === Fakes ===

/// Record store that names stored files by arrival order.
#[derive(Default)]
struct FakeStore {
    stored: Mutex<Vec<SmolStr>>,
    fail_update: bool,
    no_url: bool,
}

impl RecordStore for FakeStore {
    async fn attach_file(
        &self,
        _collection: &str,
        record_id: &str,
        _payload: UploadPayload,
    ) -> Result<StoredRecord, StoreError> {
        if self.fail_update {
            return Err(StoreError::UpdateFailed { reason: "server said no".into() });
        }
        let mut stored = self.stored.lock().unwrap();
        let filename = SmolStr::from(format!("stored-{}.png", stored.len()));
        stored.push(filename);
        Ok(StoredRecord { id: record_id.into(), files: stored.clone() })
    }

    fn file_url(&self, record: &StoredRecord, filename: &str) -> Option<String> {
        if self.no_url {
            return None;
        }
        Some(format!("https://files.example/{}/{}", record.id, filename))
    }
}

/// Fixed entry id.
struct FixedPost(&'static str);

impl PostIdSource for FixedPost {
    fn current_post_id(&self) -> Option<SmolStr> {
        Some(self.0.into())
    }
}

/// Collects toasts for assertion.
#[derive(Default)]
struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    fn errors(&self) -> usize {
        self.toasts
            .lock()
            .unwrap()
            .iter()
            .filter(|toast| toast.kind == ToastKind::Error)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

/// Host that applies scripted transactions right after the pipeline
/// dispatches one, simulating edits landing while the upload is in
/// flight.
struct ScriptedHost {
    inner: PlainHost,
    follow_ups: Vec<Transaction>,
}

impl ScriptedHost {
    fn new(state: EditorState) -> Self {
        Self {
            inner: PlainHost::new(state),
            follow_ups: Vec::new(),
        }
    }

    fn after_next_dispatch(mut self, tr: Transaction) -> Self {
        self.follow_ups.push(tr);
        self
    }
}

impl EditorHost for ScriptedHost {
    fn state(&self) -> Option<&EditorState> {
        self.inner.state()
    }

    fn dispatch(&mut self, tr: Transaction) {
        self.inner.dispatch(tr);
        for follow_up in self.follow_ups.drain(..) {
            self.inner.dispatch(follow_up);
        }
    }
}

/// Claims a 25 MiB payload without carrying it.
struct OversizedFile;

impl UploadSource for OversizedFile {
    fn name(&self) -> &str {
        "huge.png"
    }

    fn media_type(&self) -> Option<&str> {
        Some("image/png")
    }

    fn size(&self) -> u64 {
        25 * 1024 * 1024
    }

    async fn read(&self) -> Result<Bytes, UploadError> {
        Ok(Bytes::new())
    }
}

/// Always fails to read.
struct UnreadableFile;

impl UploadSource for UnreadableFile {
    fn name(&self) -> &str {
        "broken.png"
    }

    fn media_type(&self) -> Option<&str> {
        Some("image/png")
    }

    fn size(&self) -> u64 {
        4
    }

    async fn read(&self) -> Result<Bytes, UploadError> {
        Err(UploadError::Read { reason: "picker revoked the handle".into() })
    }
}

// === Helpers ===

fn doc_with_text(text: &str) -> EditorState {
    EditorState::new(Node::doc(vec![Node::paragraph(vec![Node::text(text)])]))
}

fn png_file() -> MemoryFile {
    let magic = [0x89u8, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    MemoryFile::new("photo.png", Some("image/png"), magic.to_vec())
}

fn test_ctx(store: FakeStore) -> UploadContext<FakeStore, FixedPost, RecordingNotifier> {
    UploadContext {
        store,
        posts: FixedPost("post-1"),
        notifier: RecordingNotifier::default(),
        collection: "posts".into(),
    }
}

/// An image node the way a finished upload inserts it: the stored
/// filename rides along as the title.
fn stored_image(src: &str, title: &str) -> Node {
    Node::image(ImageAttrs { src: src.into(), alt: None, title: Some(title.into()) })
}

fn collect_images(node: &Node) -> Vec<SmolStr> {
    let mut srcs = Vec::new();
    if let Node::Image { attrs } = node {
        srcs.push(attrs.src.clone());
    }
    for child in node.children() {
        srcs.extend(collect_images(child));
    }
    srcs
}

// === Tests ===

#[tokio::test]
async fn test_rejects_non_image_files() {
    let mut host = PlainHost::new(doc_with_text("hello"));
    let ctx = test_ctx(FakeStore::default());
    let pdf = MemoryFile::new("doc.pdf", Some("application/pdf"), vec![1, 2, 3]);

    let outcome = start_image_upload(&mut host, &ctx, &pdf, 3).await;

    assert_eq!(outcome, UploadOutcome::Rejected);
    assert_eq!(ctx.notifier.errors(), 1);
    // Nothing was dispatched.
    let state = host.state().unwrap();
    assert_eq!(state.version(), 0);
    assert!(state.decorations().is_empty());
}

#[tokio::test]
async fn test_rejects_oversized_files() {
    let mut host = PlainHost::new(doc_with_text("hello"));
    let ctx = test_ctx(FakeStore::default());

    let outcome = start_image_upload(&mut host, &ctx, &OversizedFile, 3).await;

    assert_eq!(outcome, UploadOutcome::Rejected);
    assert_eq!(ctx.notifier.errors(), 1);
    assert_eq!(host.state().unwrap().version(), 0);
}

#[tokio::test]
async fn test_successful_upload_swaps_placeholder_for_image() {
    let mut host = PlainHost::new(doc_with_text("hello"));
    let ctx = test_ctx(FakeStore::default());

    let outcome = start_image_upload(&mut host, &ctx, &png_file(), 3).await;

    assert_eq!(outcome, UploadOutcome::Inserted { pos: 3, remote: true });
    let state = host.state().unwrap();
    assert!(state.decorations().is_empty());
    assert_eq!(ctx.notifier.errors(), 0);
    assert_eq!(
        state.doc(),
        &Node::doc(vec![Node::paragraph(vec![
            Node::text("he"),
            stored_image("https://files.example/post-1/stored-0.png", "stored-0.png"),
            Node::text("llo"),
        ])])
    );
}

#[tokio::test]
async fn test_clears_selection_before_placing_placeholder() {
    let state = doc_with_text("hello").with_selection(Selection::new(1, 3));
    let mut host = PlainHost::new(state);
    let ctx = test_ctx(FakeStore::default());

    let outcome = start_image_upload(&mut host, &ctx, &png_file(), 1).await;

    assert_eq!(outcome, UploadOutcome::Inserted { pos: 1, remote: true });
    assert_eq!(
        host.state().unwrap().doc(),
        &Node::doc(vec![Node::paragraph(vec![
            stored_image("https://files.example/post-1/stored-0.png", "stored-0.png"),
            Node::text("llo"),
        ])])
    );
}

#[tokio::test]
async fn test_store_failure_falls_back_to_local_preview() {
    let mut host = PlainHost::new(doc_with_text("hello"));
    let ctx = test_ctx(FakeStore { fail_update: true, ..Default::default() });

    let outcome = start_image_upload(&mut host, &ctx, &png_file(), 3).await;

    assert_eq!(outcome, UploadOutcome::Inserted { pos: 3, remote: false });
    assert_eq!(ctx.notifier.errors(), 1);
    let state = host.state().unwrap();
    assert!(state.decorations().is_empty());
    let srcs = collect_images(state.doc());
    assert_eq!(srcs.len(), 1);
    assert!(srcs[0].starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_log_notifier_stands_in_for_a_toast_surface() {
    let mut host = PlainHost::new(doc_with_text("hello"));
    let ctx = UploadContext {
        store: FakeStore { fail_update: true, ..Default::default() },
        posts: FixedPost("post-1"),
        notifier: LogNotifier,
        collection: "posts".into(),
    };

    let outcome = start_image_upload(&mut host, &ctx, &png_file(), 3).await;

    // The failure report goes to the log; the fallback still lands.
    assert_eq!(outcome, UploadOutcome::Inserted { pos: 3, remote: false });
    let srcs = collect_images(host.state().unwrap().doc());
    assert!(srcs[0].starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_unservable_url_falls_back_without_complaint() {
    let mut host = PlainHost::new(doc_with_text("hello"));
    let ctx = test_ctx(FakeStore { no_url: true, ..Default::default() });

    let outcome = start_image_upload(&mut host, &ctx, &png_file(), 3).await;

    // The file was stored, it just has no public URL yet; that is not
    // an error, the preview simply stays in place.
    assert_eq!(outcome, UploadOutcome::Inserted { pos: 3, remote: false });
    assert_eq!(ctx.notifier.errors(), 0);
    let srcs = collect_images(host.state().unwrap().doc());
    assert!(srcs[0].starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_missing_entry_id_keeps_local_preview() {
    let mut host = PlainHost::new(doc_with_text("hello"));
    let ctx = UploadContext {
        store: FakeStore::default(),
        posts: (),
        notifier: RecordingNotifier::default(),
        collection: SmolStr::new("posts"),
    };

    let outcome = start_image_upload(&mut host, &ctx, &png_file(), 3).await;

    assert_eq!(outcome, UploadOutcome::Inserted { pos: 3, remote: false });
    assert_eq!(ctx.notifier.errors(), 1);
    let srcs = collect_images(host.state().unwrap().doc());
    assert!(srcs[0].starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_deleted_placeholder_drops_upload_silently() {
    // Wipe the whole paragraph right after the placeholder appears.
    let mut wipe = Transaction::new();
    wipe.delete_range(0, 7);
    let mut host = ScriptedHost::new(doc_with_text("hello")).after_next_dispatch(wipe);
    let ctx = test_ctx(FakeStore::default());

    let outcome = start_image_upload(&mut host, &ctx, &png_file(), 3).await;

    assert_eq!(outcome, UploadOutcome::Dropped);
    assert_eq!(ctx.notifier.errors(), 0);
    let state = host.state().unwrap();
    assert!(state.decorations().is_empty());
    assert!(collect_images(state.doc()).is_empty());
}

#[tokio::test]
async fn test_placeholder_shifts_across_earlier_insert() {
    // Prepend text right after the placeholder appears.
    let mut prepend = Transaction::new();
    prepend.insert(1, Node::text("ab"));
    let mut host = ScriptedHost::new(doc_with_text("hello")).after_next_dispatch(prepend);
    let ctx = test_ctx(FakeStore::default());

    let outcome = start_image_upload(&mut host, &ctx, &png_file(), 3).await;

    // Requested before "llo"; the insert pushed that spot right by two.
    assert_eq!(outcome, UploadOutcome::Inserted { pos: 5, remote: true });
    assert_eq!(
        host.state().unwrap().doc(),
        &Node::doc(vec![Node::paragraph(vec![
            Node::text("abhe"),
            stored_image("https://files.example/post-1/stored-0.png", "stored-0.png"),
            Node::text("llo"),
        ])])
    );
}

#[tokio::test]
async fn test_two_uploads_are_tracked_independently() {
    let mut host = PlainHost::new(doc_with_text("hello"));
    let ctx = test_ctx(FakeStore::default());

    let first = start_image_upload(&mut host, &ctx, &png_file(), 1).await;
    let second = start_image_upload(&mut host, &ctx, &png_file(), 6).await;

    assert_eq!(first, UploadOutcome::Inserted { pos: 1, remote: true });
    assert_eq!(second, UploadOutcome::Inserted { pos: 6, remote: true });
    let state = host.state().unwrap();
    assert!(state.decorations().is_empty());
    let srcs = collect_images(state.doc());
    assert_eq!(srcs.len(), 2);
    // Each upload resolved to its own stored file.
    assert_ne!(srcs[0], srcs[1]);
}

#[tokio::test]
async fn test_swap_only_removes_its_own_placeholder() {
    // Another upload's placeholder appears while this one is in
    // flight.
    let mut foreign = Transaction::new();
    foreign.set_upload_meta(UploadDirective::Add {
        id: UploadId::fresh(),
        pos: 5,
        src: "data:image/png;base64,AQID".into(),
    });
    let mut host = ScriptedHost::new(doc_with_text("hello")).after_next_dispatch(foreign);
    let ctx = test_ctx(FakeStore::default());

    let outcome = start_image_upload(&mut host, &ctx, &png_file(), 3).await;

    assert_eq!(outcome, UploadOutcome::Inserted { pos: 3, remote: true });
    // The other upload is still waiting for its swap.
    assert_eq!(host.state().unwrap().decorations().len(), 1);
}

#[tokio::test]
async fn test_unreadable_file_drops_without_inserting() {
    let mut host = PlainHost::new(doc_with_text("hello"));
    let ctx = test_ctx(FakeStore::default());

    let outcome = start_image_upload(&mut host, &ctx, &UnreadableFile, 3).await;

    assert_eq!(outcome, UploadOutcome::Dropped);
    // The store arm reports the read failure once.
    assert_eq!(ctx.notifier.errors(), 1);
    let state = host.state().unwrap();
    assert_eq!(state.version(), 0);
    assert!(collect_images(state.doc()).is_empty());
}

#[tokio::test]
async fn test_inactive_editor_drops_upload() {
    let mut host = PlainHost::inactive();
    // No editor, no toast surface: notifications drop too.
    let ctx = UploadContext {
        store: FakeStore::default(),
        posts: FixedPost("post-1"),
        notifier: (),
        collection: "posts".into(),
    };

    let outcome = start_image_upload(&mut host, &ctx, &png_file(), 0).await;

    assert_eq!(outcome, UploadOutcome::Dropped);
    assert!(host.state().is_none());
}
