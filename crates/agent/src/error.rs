use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    /// A host (browser) API rejected or threw
    #[error("Host error: {message}")]
    Host { message: String },
    /// The network request itself failed. Non-ok statuses are not errors
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },
    #[error("Invalid push payload: {0}")]
    PushPayload(String),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("The worker was used before worker_init was called")]
    NotInitialised,

    #[error("{context}: {inner}")]
    WithContext { context: String, inner: Box<Self> },
}

impl AgentError {
    pub fn host<S: Into<String>>(message: S) -> Self {
        Self::Host { message: message.into() }
    }

    pub fn network<U: Into<String>, S: Into<String>>(url: U, message: S) -> Self {
        Self::Network { url: url.into(), message: message.into() }
    }

    /// Strips any context wrappers
    pub fn root(&self) -> &Self {
        match self {
            Self::WithContext { inner, .. } => inner.root(),
            e => e,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("Validation failed: {}", .error_messages.join(", "))]
pub struct ValidationError {
    pub error_messages: Vec<String>,
}

pub trait ValidateModel {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub trait ErrorContext<E>: Sized {
    /// Add helpful context to errors
    ///
    /// `context` is provided as a closure to avoid potential formatting cost if
    /// the result isn't an error
    #[allow(dead_code)]
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> E;
    /// Add helpful context to errors
    fn context<S: Into<String>>(self, context: S) -> E;
}

pub trait ResultContext<T, E: ErrorContext<E>> {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, E>;
    fn context<S: Into<String>>(self, context: S) -> Result<T, E>;
}

impl<T, E: ErrorContext<E>> ResultContext<T, E> for Result<T, E> {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, E> {
        self.context(context())
    }
    fn context<S: Into<String>>(self, context: S) -> Result<T, E> {
        self.map_err(|e| e.context(context))
    }
}

impl<E: Into<AgentError>> ErrorContext<AgentError> for E {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> AgentError {
        self.context(context())
    }
    fn context<S: Into<String>>(self, context: S) -> AgentError {
        AgentError::WithContext { context: context.into(), inner: Box::new(self.into()) }
    }
}

#[cfg(feature = "wasm")]
mod wasm {
    use js_sys::Error as JsError;
    use wasm_bindgen::{JsCast, JsValue};

    use super::AgentError;

    impl From<JsValue> for AgentError {
        fn from(err: JsValue) -> AgentError {
            let message = if let Some(e) = err.dyn_ref::<JsError>() {
                format!("{}: {}", String::from(e.name()), String::from(e.message()))
            } else if let Some(s) = err.as_string() {
                s
            } else {
                format!("{:?}", err)
            };
            AgentError::Host { message }
        }
    }

    impl From<AgentError> for JsValue {
        fn from(err: AgentError) -> JsValue {
            JsError::new(&err.to_string()).into()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_context_wraps_and_root_unwraps() {
        let r: Result<(), AgentError> = Err(AgentError::host("boom"));
        let e = r.context("cache::open").context("install").unwrap_err();

        assert_eq!(e.to_string(), "install: cache::open: Host error: boom");
        assert_eq!(e.root(), &AgentError::host("boom"));
    }

    #[test]
    fn test_validation_error_lists_every_message() {
        let e = ValidationError { error_messages: vec!["a".into(), "b".into()] };
        assert_eq!(AgentError::from(e).to_string(), "Validation failed: a, b");
    }
}
