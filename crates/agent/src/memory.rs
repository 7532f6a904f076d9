//! A [`Host`] that lives entirely in memory
//!
//! Every side effect is recorded as an [`Effect`] so handlers can be checked
//! without a browser

use std::{cell::RefCell, collections::HashMap, future::Future, rc::Rc};

use futures::future::{self, FutureExt, LocalBoxFuture};
use http::{Method, StatusCode};

use crate::{
    error::AgentError,
    host::{Host, HostClient, HostNotification, HostRequest, HostResponse},
    model::{Notification, NotificationOptions},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryRequest {
    pub method: Method,
    pub url: String,
}

impl MemoryRequest {
    pub fn new<S: Into<String>>(method: Method, url: S) -> Self {
        Self { method, url: url.into() }
    }

    pub fn get<S: Into<String>>(url: S) -> Self {
        Self::new(Method::GET, url)
    }
}

impl HostRequest for MemoryRequest {
    fn method(&self) -> Method {
        self.method.clone()
    }

    fn url(&self) -> String {
        self.url.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl MemoryResponse {
    pub fn text<B: Into<Vec<u8>>>(body: B) -> Self {
        Self { status: StatusCode::OK, body: body.into() }
    }

    /// # Panics
    /// If `status` isn't a valid status code
    pub fn with_status(status: u16) -> Self {
        Self { status: StatusCode::from_u16(status).expect("valid status code"), body: Vec::new() }
    }
}

impl HostResponse for MemoryResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn try_clone(&self) -> Result<Self, AgentError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryClient {
    pub id: String,
    pub url: String,
    pub focusable: bool,
}

impl MemoryClient {
    pub fn window<I: Into<String>, U: Into<String>>(id: I, url: U) -> Self {
        Self { id: id.into(), url: url.into(), focusable: true }
    }

    pub fn unfocusable<I: Into<String>, U: Into<String>>(id: I, url: U) -> Self {
        Self { focusable: false, ..Self::window(id, url) }
    }
}

impl HostClient for MemoryClient {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn focusable(&self) -> bool {
        self.focusable
    }
}

/// A displayed notification the user can click
pub struct MemoryNotification {
    id: String,
    state: Rc<RefCell<State>>,
}

impl MemoryNotification {
    pub fn new<S: Into<String>>(host: &MemoryHost, id: S) -> Self {
        Self { id: id.into(), state: host.state.clone() }
    }
}

impl HostNotification for MemoryNotification {
    fn close(&self) {
        self.state.borrow_mut().effects.push(Effect::NotificationClosed { id: self.id.clone() });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetched { url: String },
    CacheAddAll { cache: String, urls: Vec<String>, stored: bool },
    CachePut { cache: String, url: String },
    CacheDeleted { cache: String },
    Focused { client: String },
    WindowOpened { url: String },
    NotificationShown(Notification),
    NotificationClosed { id: String },
    SkippedWaiting,
}

type Entries = Vec<(MemoryRequest, MemoryResponse)>;

struct State {
    /// In creation order, which is also the order caches are searched
    caches: Vec<(String, Entries)>,
    routes: HashMap<String, Result<MemoryResponse, String>>,
    clients: Vec<MemoryClient>,
    effects: Vec<Effect>,
    network_calls: usize,
    can_open_windows: bool,
    fail_puts: bool,
    stall_puts: bool,
    fail_deletes: bool,
    fail_notifications: bool,
    /// Background tasks that haven't finished yet
    pending: Vec<LocalBoxFuture<'static, ()>>,
}

impl State {
    fn cache_mut(&mut self, name: &str) -> &mut Entries {
        let i = match self.caches.iter().position(|(n, _)| n == name) {
            Some(i) => i,
            None => {
                self.caches.push((name.to_string(), Vec::new()));
                self.caches.len() - 1
            }
        };
        &mut self.caches[i].1
    }

    fn fetch(&mut self, request: &MemoryRequest) -> Result<MemoryResponse, AgentError> {
        self.network_calls += 1;
        self.effects.push(Effect::Fetched { url: request.url.clone() });

        match self.routes.get(&request.url) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(AgentError::network(&request.url, message)),
            None => Ok(MemoryResponse::with_status(404)),
        }
    }
}

fn put(entries: &mut Entries, request: MemoryRequest, response: MemoryResponse) {
    match entries.iter_mut().find(|(r, _)| *r == request) {
        Some(entry) => entry.1 = response,
        None => entries.push((request, response)),
    }
}

#[derive(Clone)]
pub struct MemoryHost {
    origin: String,
    state: Rc<RefCell<State>>,
}

impl MemoryHost {
    pub fn new<S: Into<String>>(origin: S) -> Self {
        Self {
            origin: origin.into(),
            state: Rc::new(RefCell::new(State {
                caches: Vec::new(),
                routes: HashMap::new(),
                clients: Vec::new(),
                effects: Vec::new(),
                network_calls: 0,
                can_open_windows: true,
                fail_puts: false,
                stall_puts: false,
                fail_deletes: false,
                fail_notifications: false,
                pending: Vec::new(),
            })),
        }
    }

    /// What the network answers for a url. Unrouted urls get a 404
    pub fn route<S: Into<String>>(self, url: S, response: MemoryResponse) -> Self {
        self.state.borrow_mut().routes.insert(url.into(), Ok(response));
        self
    }

    /// Fetching the url fails outright, as if offline
    pub fn route_error<S: Into<String>, M: Into<String>>(self, url: S, message: M) -> Self {
        self.state.borrow_mut().routes.insert(url.into(), Err(message.into()));
        self
    }

    pub fn with_cached(self, cache: &str, url: &str, response: MemoryResponse) -> Self {
        put(self.state.borrow_mut().cache_mut(cache), MemoryRequest::get(url), response);
        self
    }

    pub fn with_client(self, client: MemoryClient) -> Self {
        self.state.borrow_mut().clients.push(client);
        self
    }

    pub fn without_open_window(self) -> Self {
        self.state.borrow_mut().can_open_windows = false;
        self
    }

    pub fn fail_puts(self) -> Self {
        self.state.borrow_mut().fail_puts = true;
        self
    }

    /// Cache writes never settle
    pub fn stall_puts(self) -> Self {
        self.state.borrow_mut().stall_puts = true;
        self
    }

    pub fn fail_deletes(self) -> Self {
        self.state.borrow_mut().fail_deletes = true;
        self
    }

    pub fn fail_notifications(self) -> Self {
        self.state.borrow_mut().fail_notifications = true;
        self
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.state.borrow().effects.clone()
    }

    pub fn network_calls(&self) -> usize {
        self.state.borrow().network_calls
    }

    pub fn pending_tasks(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Urls stored in one cache, in insertion order
    pub fn cached_urls(&self, cache: &str) -> Vec<String> {
        self.state
            .borrow()
            .caches
            .iter()
            .find(|(n, _)| n == cache)
            .map(|(_, entries)| entries.iter().map(|(r, _)| r.url.clone()).collect())
            .unwrap_or_default()
    }

    /// Every request stored in any cache
    pub fn cached_requests(&self) -> Vec<MemoryRequest> {
        self.state
            .borrow()
            .caches
            .iter()
            .flat_map(|(_, entries)| entries.iter().map(|(r, _)| r.clone()))
            .collect()
    }
}

impl Host for MemoryHost {
    type Request = MemoryRequest;
    type Response = MemoryResponse;
    type Client = MemoryClient;
    type Notification = MemoryNotification;

    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn request(&self, url: &str) -> Result<MemoryRequest, AgentError> {
        Ok(MemoryRequest::get(url))
    }

    async fn cache_add_all(
        &self,
        cache: &str,
        requests: Vec<MemoryRequest>,
    ) -> Result<(), AgentError> {
        let mut state = self.state.borrow_mut();
        state.cache_mut(cache);

        let urls = requests.iter().map(|r| r.url.clone()).collect();
        let mut fetched = Vec::with_capacity(requests.len());
        let mut failure = None;
        for request in requests {
            match state.fetch(&request) {
                Ok(response) if response.ok() => fetched.push((request, response)),
                Ok(response) => {
                    let message = format!("status {}", response.status);
                    failure = Some(AgentError::network(&request.url, message));
                    break;
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let stored = failure.is_none();
        state.effects.push(Effect::CacheAddAll { cache: cache.to_string(), urls, stored });
        if let Some(e) = failure {
            return Err(e);
        }

        let entries = state.cache_mut(cache);
        for (request, response) in fetched {
            put(entries, request, response);
        }
        Ok(())
    }

    async fn cache_match(
        &self,
        request: &MemoryRequest,
    ) -> Result<Option<MemoryResponse>, AgentError> {
        if request.method != Method::GET {
            return Ok(None);
        }
        Ok(self
            .state
            .borrow()
            .caches
            .iter()
            .flat_map(|(_, entries)| entries.iter())
            .find(|(r, _)| r == request)
            .map(|(_, response)| response.clone()))
    }

    async fn cache_put(
        &self,
        cache: &str,
        request: &MemoryRequest,
        response: MemoryResponse,
    ) -> Result<(), AgentError> {
        let stalled = self.state.borrow().stall_puts;
        if stalled {
            future::pending::<()>().await;
        }

        let mut state = self.state.borrow_mut();
        if state.fail_puts {
            return Err(AgentError::host("QuotaExceededError"));
        }
        if request.method != Method::GET {
            let message = format!("TypeError: can't cache a {} request", request.method);
            return Err(AgentError::host(message));
        }

        put(state.cache_mut(cache), request.clone(), response);
        state.effects.push(Effect::CachePut { cache: cache.to_string(), url: request.url.clone() });
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, AgentError> {
        Ok(self.state.borrow().caches.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn cache_delete(&self, cache: &str) -> Result<bool, AgentError> {
        let mut state = self.state.borrow_mut();
        if state.fail_deletes {
            return Err(AgentError::host(format!("failed to delete {cache}")));
        }

        let before = state.caches.len();
        state.caches.retain(|(n, _)| n != cache);
        let existed = state.caches.len() != before;
        if existed {
            state.effects.push(Effect::CacheDeleted { cache: cache.to_string() });
        }
        Ok(existed)
    }

    async fn fetch(&self, request: &MemoryRequest) -> Result<MemoryResponse, AgentError> {
        self.state.borrow_mut().fetch(request)
    }

    async fn window_clients(&self) -> Result<Vec<MemoryClient>, AgentError> {
        Ok(self.state.borrow().clients.clone())
    }

    async fn focus(&self, client: &MemoryClient) -> Result<(), AgentError> {
        self.state.borrow_mut().effects.push(Effect::Focused { client: client.id.clone() });
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<bool, AgentError> {
        let mut state = self.state.borrow_mut();
        if !state.can_open_windows {
            return Ok(false);
        }
        state.effects.push(Effect::WindowOpened { url: url.to_string() });
        Ok(true)
    }

    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), AgentError> {
        let mut state = self.state.borrow_mut();
        if state.fail_notifications {
            return Err(AgentError::host("TypeError: no notification permission"));
        }
        state.effects.push(Effect::NotificationShown(Notification {
            title: title.to_string(),
            options: options.clone(),
        }));
        Ok(())
    }

    fn skip_waiting(&self) -> Result<(), AgentError> {
        self.state.borrow_mut().effects.push(Effect::SkippedWaiting);
        Ok(())
    }

    /// Runs the task as far as it gets straight away. Whatever is left stays
    /// pending
    fn wait_until<F: Future<Output = ()> + 'static>(&self, task: F) {
        let mut task = task.boxed_local();
        if (&mut task).now_or_never().is_none() {
            self.state.borrow_mut().pending.push(task);
        }
    }
}
