pub mod event_directory;
pub mod notifier;

pub use event_directory::{
    release_key, reserve_key, DirectoryError, EventDirectory, HttpEventDirectory,
};
pub use notifier::{
    dispatch, HttpNotifier, LogNotifier, Notification, NotificationKind, NotificationSender,
    NotifyError,
};
