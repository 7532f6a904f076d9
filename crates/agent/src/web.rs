//! [`Host`] backed by the real service worker globals

use std::future::Future;

use http::{Method, StatusCode};
use js_sys::{Array, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Cache, CacheStorage, Client, ClientQueryOptions, ClientType, Notification,
    NotificationOptions as JsNotificationOptions, Request, Response, ServiceWorkerGlobalScope,
    WindowClient,
};

use crate::{
    error::{AgentError, ResultContext},
    host::{Host, HostClient, HostNotification, HostRequest, HostResponse},
    model::NotificationOptions,
};

impl HostRequest for Request {
    fn method(&self) -> Method {
        // Browsers only hand out valid method tokens. Anything else is never
        // intercepted
        Method::from_bytes(Request::method(self).as_bytes()).unwrap_or(Method::CONNECT)
    }

    fn url(&self) -> String {
        Request::url(self)
    }
}

impl HostResponse for Response {
    /// Opaque (cross-origin no-cors) responses report 0, which isn't a valid
    /// status code
    fn status(&self) -> StatusCode {
        StatusCode::from_u16(Response::status(self)).unwrap_or(StatusCode::BAD_GATEWAY)
    }

    fn ok(&self) -> bool {
        Response::ok(self)
    }

    fn try_clone(&self) -> Result<Self, AgentError> {
        // Response::clone (the inherent one) tees the body. The Clone trait would
        // just copy the reference
        Ok(Response::clone(self)?)
    }
}

impl HostClient for Client {
    fn id(&self) -> String {
        Client::id(self)
    }

    fn url(&self) -> String {
        Client::url(self)
    }

    fn focusable(&self) -> bool {
        self.is_instance_of::<WindowClient>()
    }
}

impl HostNotification for Notification {
    fn close(&self) {
        Notification::close(self)
    }
}

#[derive(Clone)]
pub struct WebHost {
    sw: ServiceWorkerGlobalScope,
}

impl WebHost {
    pub fn new(sw: ServiceWorkerGlobalScope) -> Self {
        Self { sw }
    }

    fn caches(&self) -> Result<CacheStorage, AgentError> {
        Ok(self.sw.caches()?)
    }

    async fn open(&self, name: &str) -> Result<Cache, AgentError> {
        let cache = JsFuture::from(self.caches()?.open(name)).await?;
        Ok(cache.dyn_into::<Cache>()?)
    }
}

impl Host for WebHost {
    type Request = Request;
    type Response = Response;
    type Client = Client;
    type Notification = Notification;

    fn origin(&self) -> String {
        self.sw.origin()
    }

    fn request(&self, url: &str) -> Result<Request, AgentError> {
        Ok(Request::new_with_str(url)?)
    }

    async fn cache_add_all(
        &self,
        cache: &str,
        requests: Vec<Request>,
    ) -> Result<(), AgentError> {
        let cache = self.open(cache).await.context("caches::open")?;
        let requests = JsValue::from(requests.into_iter().collect::<Array>());

        JsFuture::from(cache.add_all_with_request_sequence(&requests)).await?;
        Ok(())
    }

    async fn cache_match(&self, request: &Request) -> Result<Option<Response>, AgentError> {
        let cached = JsFuture::from(self.caches()?.match_with_request(request)).await?;

        if cached.is_undefined() {
            Ok(None)
        } else {
            Ok(Some(cached.dyn_into::<Response>()?))
        }
    }

    async fn cache_put(
        &self,
        cache: &str,
        request: &Request,
        response: Response,
    ) -> Result<(), AgentError> {
        let cache = self.open(cache).await.context("caches::open")?;
        JsFuture::from(cache.put_with_request(request, &response)).await?;
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, AgentError> {
        let keys: Array = JsFuture::from(self.caches()?.keys()).await?.into();
        Ok(keys.iter().filter_map(|k| k.as_string()).collect())
    }

    async fn cache_delete(&self, cache: &str) -> Result<bool, AgentError> {
        let existed = JsFuture::from(self.caches()?.delete(cache)).await?;
        Ok(existed.as_bool().unwrap_or(false))
    }

    async fn fetch(&self, request: &Request) -> Result<Response, AgentError> {
        let response = JsFuture::from(self.sw.fetch_with_request(request))
            .await
            .map_err(|e| AgentError::network(request.url(), AgentError::from(e).to_string()))?;
        Ok(response.dyn_into::<Response>()?)
    }

    async fn window_clients(&self) -> Result<Vec<Client>, AgentError> {
        let mut options = ClientQueryOptions::new();
        options.type_(ClientType::Window);

        let clients: Array = JsFuture::from(self.sw.clients().match_all_with_options(&options))
            .await?
            .into();
        Ok(clients.iter().map(|c| c.unchecked_into::<Client>()).collect())
    }

    async fn focus(&self, client: &Client) -> Result<(), AgentError> {
        let window = client
            .dyn_ref::<WindowClient>()
            .ok_or_else(|| AgentError::host(format!("{} is not a window", client.url())))?;
        JsFuture::from(window.focus()?).await?;
        Ok(())
    }

    /// False when the browser doesn't implement `clients.openWindow`
    async fn open_window(&self, url: &str) -> Result<bool, AgentError> {
        let clients = self.sw.clients();
        if !Reflect::has(&clients, &JsValue::from_str("openWindow"))? {
            return Ok(false);
        }

        JsFuture::from(clients.open_window(url)).await?;
        Ok(true)
    }

    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), AgentError> {
        let mut js_options = JsNotificationOptions::new();
        js_options
            .body(&options.body)
            .icon(&options.icon)
            .badge(&options.badge)
            .tag(&options.tag)
            .renotify(options.renotify);
        if let Some(timestamp) = options.timestamp {
            js_options.timestamp(timestamp.timestamp_millis() as f64);
        }

        let registration = self.sw.registration();
        JsFuture::from(registration.show_notification_with_options(title, &js_options)?).await?;
        Ok(())
    }

    fn skip_waiting(&self) -> Result<(), AgentError> {
        // MDN states the promise returned can be safely ignored
        let _ = self.sw.skip_waiting()?;
        Ok(())
    }

    fn wait_until<F: Future<Output = ()> + 'static>(&self, task: F) {
        spawn_local(task);
    }
}
