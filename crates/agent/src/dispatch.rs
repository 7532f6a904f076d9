use std::{fmt, rc::Rc, str::FromStr};

use tracing::debug;

use crate::{
    config::AgentConfig,
    error::AgentError,
    handlers::{
        activate, fetch, install, message, notification_click, push, ActivateOutcome, ClickOutcome,
        FetchOutcome, InstallOutcome, MessageOutcome,
    },
    host::Host,
    model::Notification,
};

/// The service worker events the agent subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    NotificationClick,
    Push,
    Message,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Install,
        EventKind::Activate,
        EventKind::Fetch,
        EventKind::NotificationClick,
        EventKind::Push,
        EventKind::Message,
    ];

    /// The name passed to `addEventListener`
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Install => "install",
            EventKind::Activate => "activate",
            EventKind::Fetch => "fetch",
            EventKind::NotificationClick => "notificationclick",
            EventKind::Push => "push",
            EventKind::Message => "message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AgentError::host(format!("Unsupported event: {s}")))
    }
}

pub enum Event<H: Host> {
    Install,
    Activate,
    Fetch(H::Request),
    NotificationClick(H::Notification),
    /// The raw push data, if the message carried any
    Push(Option<String>),
    /// The message data, if it was a string
    Message(Option<String>),
}

impl<H: Host> Event<H> {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Install => EventKind::Install,
            Event::Activate => EventKind::Activate,
            Event::Fetch(_) => EventKind::Fetch,
            Event::NotificationClick(_) => EventKind::NotificationClick,
            Event::Push(_) => EventKind::Push,
            Event::Message(_) => EventKind::Message,
        }
    }
}

pub enum Outcome<H: Host> {
    Installed(InstallOutcome),
    Activated(ActivateOutcome),
    Fetched(FetchOutcome<H::Response>),
    Clicked(ClickOutcome),
    Pushed(Notification),
    Messaged(MessageOutcome),
}

impl<H: Host> Outcome<H> {
    /// The response for `respondWith`. Only fetches produce one
    pub fn into_response(self) -> Option<H::Response> {
        match self {
            Outcome::Fetched(outcome) => outcome.into_response(),
            _ => None,
        }
    }
}

impl<H: Host> fmt::Debug for Outcome<H>
where
    H::Response: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Installed(o) => f.debug_tuple("Installed").field(o).finish(),
            Outcome::Activated(o) => f.debug_tuple("Activated").field(o).finish(),
            Outcome::Fetched(o) => f.debug_tuple("Fetched").field(o).finish(),
            Outcome::Clicked(o) => f.debug_tuple("Clicked").field(o).finish(),
            Outcome::Pushed(o) => f.debug_tuple("Pushed").field(o).finish(),
            Outcome::Messaged(o) => f.debug_tuple("Messaged").field(o).finish(),
        }
    }
}

/// One worker version: its config and the host it runs in
///
/// Created once when the worker script starts and dropped when the browser
/// replaces it with a newer version
pub struct Agent<H: Host> {
    config: Rc<AgentConfig>,
    host: H,
}

impl<H: Host> Agent<H> {
    pub fn new(config: Rc<AgentConfig>, host: H) -> Self {
        Self { config, host }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Runs the handler for an event
    ///
    /// The host should keep the event alive (`waitUntil`/`respondWith`) until
    /// the returned future completes
    pub async fn handle(&self, event: Event<H>) -> Result<Outcome<H>, AgentError> {
        debug!("Handling {}", event.kind());

        let host = &self.host;
        let config = &*self.config;

        Ok(match event {
            Event::Install => Outcome::Installed(install(host, config).await),
            Event::Activate => Outcome::Activated(activate(host, config).await?),
            Event::Fetch(request) => Outcome::Fetched(fetch(host, config, request).await?),
            Event::NotificationClick(notification) => {
                Outcome::Clicked(notification_click(host, config, notification).await?)
            }
            Event::Push(data) => Outcome::Pushed(push(host, config, data.as_deref()).await?),
            Event::Message(data) => Outcome::Messaged(message(host, data.as_deref()).await?),
        })
    }
}
