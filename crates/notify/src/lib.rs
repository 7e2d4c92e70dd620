//! User-facing notifications for the upload queue.

mod events;
mod toast;

pub use events::{notify, toast_for_event};
pub use toast::{Toast, ToastQueue, ToastType};
