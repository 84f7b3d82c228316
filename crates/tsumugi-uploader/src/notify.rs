//! User-facing notifications.

use smol_str::SmolStr;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Error,
    Success,
    Info,
}

/// A short message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: SmolStr,
}

impl Toast {
    pub fn error(text: impl AsRef<str>) -> Self {
        Self {
            kind: ToastKind::Error,
            text: SmolStr::new(text),
        }
    }

    pub fn success(text: impl AsRef<str>) -> Self {
        Self {
            kind: ToastKind::Success,
            text: SmolStr::new(text),
        }
    }

    pub fn info(text: impl AsRef<str>) -> Self {
        Self {
            kind: ToastKind::Info,
            text: SmolStr::new(text),
        }
    }
}

/// Sink for toasts. The app wires this to its toast surface.
pub trait Notifier {
    fn notify(&self, toast: Toast);
}

/// Unit type implementation - notifications are dropped.
impl Notifier for () {
    fn notify(&self, _toast: Toast) {}
}

/// Routes toasts to the log, for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Error => {
                tracing::error!(target: "tsumugi::upload", "{}", toast.text)
            }
            ToastKind::Success => {
                tracing::info!(target: "tsumugi::upload", "{}", toast.text)
            }
            ToastKind::Info => {
                tracing::info!(target: "tsumugi::upload", "{}", toast.text)
            }
        }
    }
}
