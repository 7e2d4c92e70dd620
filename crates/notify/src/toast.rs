/// Default toast display duration in milliseconds.
pub(crate) const DEFAULT_DURATION_MS: u64 = 4000;

/// Error toast display duration in milliseconds.
pub(crate) const ERROR_DURATION_MS: u64 = 6000;

/// The visual category of a toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastType {
    /// Default display duration for this kind of toast.
    pub fn duration_ms(self) -> u64 {
        match self {
            Self::Error => ERROR_DURATION_MS,
            _ => DEFAULT_DURATION_MS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// A single notification shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub toast_type: ToastType,
    pub title: String,
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// In-memory toast queue with monotonic ids.
///
/// Expiry is left to the front-end; the queue only holds toasts until
/// they are drained.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a toast and returns its id.
    pub fn push(
        &mut self,
        toast_type: ToastType,
        title: impl Into<String>,
        message: Option<String>,
        duration_ms: u64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            toast_type,
            title: title.into(),
            message,
            duration_ms,
        });
        id
    }

    pub fn get(&self, id: u64) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }

    /// Toasts in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    /// Takes every queued toast, oldest first. Ids keep counting.
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }
}
