//! The browser APIs the agent uses
//!
//! Service workers are single threaded, so none of this requires `Send`

use std::future::Future;

use http::{Method, StatusCode};

use crate::{error::AgentError, model::NotificationOptions};

pub trait HostRequest: Clone {
    fn method(&self) -> Method;
    fn url(&self) -> String;
}

pub trait HostResponse: Sized {
    fn status(&self) -> StatusCode;

    /// The fetch "ok" flag: status in the 200-299 range
    fn ok(&self) -> bool {
        self.status().is_success()
    }

    /// A response body can only be read once, so anything that's cached needs
    /// its own copy
    fn try_clone(&self) -> Result<Self, AgentError>;
}

pub trait HostClient {
    fn id(&self) -> String;
    fn url(&self) -> String;
    /// Whether the client can be brought to the foreground (window clients)
    fn focusable(&self) -> bool;
}

pub trait HostNotification {
    fn close(&self);
}

/// Hosts are cheap handles to the worker's globals, so they're cloned into
/// background tasks
#[allow(async_fn_in_trait)]
pub trait Host: Clone + 'static {
    type Request: HostRequest + 'static;
    type Response: HostResponse + 'static;
    type Client: HostClient;
    type Notification: HostNotification;

    /// Origin the worker is registered on
    fn origin(&self) -> String;

    /// A GET request for a url, relative urls resolve against the worker scope
    fn request(&self, url: &str) -> Result<Self::Request, AgentError>;

    /// Fetches and stores every request in the named cache, creating it if
    /// needed. Nothing is stored unless every fetch succeeds
    async fn cache_add_all(
        &self,
        cache: &str,
        requests: Vec<Self::Request>,
    ) -> Result<(), AgentError>;

    /// Looks in every cache, not just the current one
    async fn cache_match(
        &self,
        request: &Self::Request,
    ) -> Result<Option<Self::Response>, AgentError>;

    async fn cache_put(
        &self,
        cache: &str,
        request: &Self::Request,
        response: Self::Response,
    ) -> Result<(), AgentError>;

    async fn cache_names(&self) -> Result<Vec<String>, AgentError>;

    /// Returns whether a cache with that name existed
    async fn cache_delete(&self, cache: &str) -> Result<bool, AgentError>;

    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, AgentError>;

    /// Open window clients, in the order the host lists them
    async fn window_clients(&self) -> Result<Vec<Self::Client>, AgentError>;

    async fn focus(&self, client: &Self::Client) -> Result<(), AgentError>;

    /// Returns false if the host can't open windows
    async fn open_window(&self, url: &str) -> Result<bool, AgentError>;

    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), AgentError>;

    fn skip_waiting(&self) -> Result<(), AgentError>;

    /// Runs `task` in the background. The caller carries on without waiting
    /// for it
    fn wait_until<F: Future<Output = ()> + 'static>(&self, task: F);
}
