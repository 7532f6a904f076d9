use std::{cell::RefCell, rc::Rc};

use agent::{
    utils::tracing::configure_tracing_once as configure_tracing, web::WebHost, Agent, AgentConfig,
    AgentError, Event, ValidateModel, ValidationError,
};
use console_error_panic_hook::set_once as set_panic_hook;
use gloo::utils::format::JsValueSerdeExt;
use tracing::{error, info};
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};
use wasm_bindgen_futures::future_to_promise;
use web_sys::{
    js_sys::Promise, MessageEvent, NotificationEvent, PushEvent, Request, ServiceWorkerGlobalScope,
};

thread_local! {
    // One per worker instance. The browser starts a fresh instance (and calls
    // worker_init again) for every new version of the worker
    static AGENT: RefCell<Option<Rc<Agent<WebHost>>>> = const { RefCell::new(None) };
}

fn agent() -> Result<Rc<Agent<WebHost>>, AgentError> {
    AGENT.with(|a| a.borrow().clone()).ok_or(AgentError::NotInitialised)
}

fn parse_config(config: JsValue) -> Result<AgentConfig, AgentError> {
    if config.is_undefined() || config.is_null() {
        return Ok(AgentConfig::default());
    }

    let config: AgentConfig =
        JsValueSerdeExt::into_serde(&config).map_err(|e| ValidationError {
            error_messages: vec![format!("config couldn't be deserialized: {e}")],
        })?;
    config.validate()?;
    Ok(config)
}

/// Must be called from the worker script before any events are forwarded
///
/// `config` is an `AgentConfig` shaped object. `undefined` uses the defaults
#[wasm_bindgen]
pub fn worker_init(sw: ServiceWorkerGlobalScope, config: JsValue) -> Result<(), JsValue> {
    set_panic_hook();
    configure_tracing();

    let config = parse_config(config).inspect_err(|e| error!("worker_init: {e}"))?;
    info!("Starting worker, cache: {}", config.cache_name);

    let agent = Rc::new(Agent::new(Rc::new(config), WebHost::new(sw)));
    AGENT.with(|a| *a.borrow_mut() = Some(agent));

    Ok(())
}

/// Runs the event through the agent and resolves to the response, if any
fn handle(event: Event<WebHost>) -> Promise {
    future_to_promise(async move {
        let agent = agent()?;
        let kind = event.kind();

        let outcome = agent
            .handle(event)
            .await
            .inspect_err(|e| error!("{kind} failed: {e}"))?;

        Ok(outcome.into_response().map_or(JsValue::undefined(), JsValue::from))
    })
}

/// Pass the promise to `event.waitUntil()`
#[wasm_bindgen]
pub fn worker_install() -> Promise {
    handle(Event::Install)
}

/// Pass the promise to `event.waitUntil()`
#[wasm_bindgen]
pub fn worker_activate() -> Promise {
    handle(Event::Activate)
}

/// Resolves to the response for `event.respondWith()`, or `undefined` when
/// there is none
///
/// The worker script decides which requests to intercept (GETs only) and calls
/// `respondWith` synchronously, before this module has necessarily loaded
#[wasm_bindgen]
pub fn worker_fetch(request: Request) -> Promise {
    handle(Event::Fetch(request))
}

#[wasm_bindgen]
pub fn worker_push(event: PushEvent) -> Promise {
    handle(Event::Push(event.data().map(|d| d.text())))
}

#[wasm_bindgen]
pub fn worker_notification_click(event: NotificationEvent) -> Promise {
    handle(Event::NotificationClick(event.notification()))
}

#[wasm_bindgen]
pub fn worker_message(event: MessageEvent) -> Promise {
    handle(Event::Message(event.data().as_string()))
}
