use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What gets passed to `registration.showNotification`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub options: NotificationOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    /// Small monochrome icon some platforms show in the status bar
    pub badge: String,
    /// Notifications with the same tag replace each other rather than stacking
    pub tag: String,
    pub renotify: bool,
    pub timestamp: Option<DateTime<Utc>>,
}
