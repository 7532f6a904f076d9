use http::Method;
use tracing::{debug, error, instrument, Instrument};

use crate::{
    config::AgentConfig,
    error::{AgentError, ResultContext},
    host::{Host, HostRequest, HostResponse},
};

#[derive(Debug)]
pub enum FetchOutcome<R> {
    /// Not a GET, left to the browser
    Passthrough,
    /// Served from a cache without touching the network
    Cache(R),
    /// Served from the network. `caching` is true when a copy was handed to
    /// the cache. The write finishes in the background and failures are only
    /// logged
    Network { response: R, caching: bool },
    /// The network request failed. There's no offline fallback so the browser
    /// gets no response
    Failed { reason: AgentError },
}

impl<R> FetchOutcome<R> {
    /// The response to give the page, if any
    pub fn into_response(self) -> Option<R> {
        match self {
            Self::Cache(r) | Self::Network { response: r, .. } => Some(r),
            Self::Passthrough | Self::Failed { .. } => None,
        }
    }
}

/// Only GETs are handled, everything else goes straight to the network
pub fn intercepts(method: &Method) -> bool {
    *method == Method::GET
}

/// Starts writing a copy of `response` to the current cache generation
///
/// The page doesn't wait for the write
fn store<H: Host>(
    host: &H,
    config: &AgentConfig,
    request: &H::Request,
    response: &H::Response,
) -> Result<(), AgentError> {
    let copy = response.try_clone().context("response::clone")?;

    let task_host = host.clone();
    let cache = config.cache_name.clone();
    let request = request.clone();
    let task = async move {
        if let Err(e) = task_host
            .cache_put(&cache, &request, copy)
            .await
            .with_context(|| format!("cache::put:: {cache}"))
        {
            error!("Failed to cache response: {e}");
        }
    };

    host.wait_until(task.in_current_span());
    Ok(())
}

/// Cache first. A miss goes to the network and an ok response is stored in the
/// current cache generation for next time
///
/// Errors only if looking in the cache fails
#[instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
pub async fn fetch<H: Host>(
    host: &H,
    config: &AgentConfig,
    request: H::Request,
) -> Result<FetchOutcome<H::Response>, AgentError> {
    if !intercepts(&request.method()) {
        return Ok(FetchOutcome::Passthrough);
    }

    if let Some(cached) = host.cache_match(&request).await.context("caches::match")? {
        debug!("HIT");
        return Ok(FetchOutcome::Cache(cached));
    }
    debug!("MISS");

    let response = match host.fetch(&request).await {
        Ok(response) => response,
        Err(reason) => {
            error!("Fetch failed: {reason}");
            return Ok(FetchOutcome::Failed { reason });
        }
    };

    if !response.ok() {
        debug!("Not caching {} response", response.status());
        return Ok(FetchOutcome::Network { response, caching: false });
    }

    let caching = match store(host, config, &request, &response) {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to copy response: {e}");
            false
        }
    };

    Ok(FetchOutcome::Network { response, caching })
}

#[cfg(test)]
mod test {
    use futures::{executor::block_on, FutureExt};
    use http::StatusCode;

    use super::*;
    use crate::memory::{MemoryHost, MemoryRequest, MemoryResponse};

    const URL: &str = "https://app.test/data.json";

    fn run(host: &MemoryHost, request: MemoryRequest) -> FetchOutcome<MemoryResponse> {
        block_on(fetch(host, &AgentConfig::default(), request)).unwrap()
    }

    #[test]
    fn test_only_get_is_intercepted() {
        assert!(intercepts(&Method::GET));
        for m in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD, Method::OPTIONS] {
            assert!(!intercepts(&m), "{m}");
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let host = MemoryHost::new("https://app.test").route(URL, MemoryResponse::text("data"));

        let outcome = run(&host, MemoryRequest::get(URL));
        assert!(matches!(&outcome, FetchOutcome::Network { caching: true, .. }));
        assert_eq!(outcome.into_response().unwrap().body, b"data");
        assert_eq!(host.network_calls(), 1);

        let outcome = run(&host, MemoryRequest::get(URL));
        assert!(matches!(&outcome, FetchOutcome::Cache(r) if r.body == b"data"));
        assert_eq!(host.network_calls(), 1);
    }

    #[test]
    fn test_non_ok_is_returned_uncached() {
        let host = MemoryHost::new("https://app.test").route(URL, MemoryResponse::with_status(500));

        let outcome = run(&host, MemoryRequest::get(URL));
        let FetchOutcome::Network { response, caching } = outcome else {
            panic!("expected a network response");
        };
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!caching);
        assert!(host.cached_urls(crate::CACHE_NAME).is_empty());
    }

    #[test]
    fn test_network_failure_gives_no_response() {
        let host = MemoryHost::new("https://app.test").route_error(URL, "offline");

        let outcome = run(&host, MemoryRequest::get(URL));
        assert!(matches!(&outcome, FetchOutcome::Failed { reason: AgentError::Network { .. } }));
        assert!(outcome.into_response().is_none());
    }

    #[test]
    fn test_post_is_passed_through() {
        let host = MemoryHost::new("https://app.test").route(URL, MemoryResponse::text("data"));

        let outcome = run(&host, MemoryRequest::new(Method::POST, URL));
        assert!(matches!(outcome, FetchOutcome::Passthrough));
        assert_eq!(host.network_calls(), 0);
        assert!(host.effects().is_empty());
    }

    #[test]
    fn test_failed_store_still_returns_response() {
        let host = MemoryHost::new("https://app.test")
            .route(URL, MemoryResponse::text("data"))
            .fail_puts();

        let outcome = run(&host, MemoryRequest::get(URL));
        let FetchOutcome::Network { response, .. } = outcome else {
            panic!("expected a network response");
        };
        assert_eq!(response.body, b"data");
        assert!(host.cached_urls(crate::CACHE_NAME).is_empty());
        assert_eq!(host.pending_tasks(), 0);
    }

    #[test]
    fn test_response_is_not_held_back_by_cache_write() {
        let host = MemoryHost::new("https://app.test")
            .route(URL, MemoryResponse::text("data"))
            .stall_puts();

        let outcome = fetch(&host, &AgentConfig::default(), MemoryRequest::get(URL))
            .now_or_never()
            .expect("response ready before the cache write settles")
            .unwrap();
        assert!(matches!(&outcome, FetchOutcome::Network { caching: true, .. }));
        assert_eq!(outcome.into_response().unwrap().body, b"data");
        assert_eq!(host.network_calls(), 1);
        assert_eq!(host.pending_tasks(), 1);
        assert!(host.cached_urls(crate::CACHE_NAME).is_empty());
    }

    #[test]
    fn test_hit_in_another_generation() {
        let host = MemoryHost::new("https://app.test")
            .with_cached("calistenia-app-cache-v0", URL, MemoryResponse::text("old"));

        let outcome = run(&host, MemoryRequest::get(URL));
        assert!(matches!(&outcome, FetchOutcome::Cache(r) if r.body == b"old"));
        assert_eq!(host.network_calls(), 0);
    }
}
