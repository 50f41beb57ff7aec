//! Fetcher — HTTP client for runtime tuning hooks.
//!
//! Sends the model and its history to the configured hook and hands back
//! the response body when the status is one of the hook's success codes.

use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http_body_util::{BodyExt, Full};
use tracing::debug;

use horizon_core::{ParameterMode, TuningFetchHook};

use crate::error::FetchError;
use crate::predictor::BoxFuture;

/// Port for calling a runtime tuning hook with a serialized value.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        hook: &'a TuningFetchHook,
        value: &'a str,
    ) -> BoxFuture<'a, Result<String, FetchError>>;
}

/// Fetches over plain HTTP/1.1 with hyper.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        hook: &'a TuningFetchHook,
        value: &'a str,
    ) -> BoxFuture<'a, Result<String, FetchError>> {
        Box::pin(http_fetch(hook, value))
    }
}

/// Perform one tuning request, bounded by the hook's timeout.
pub async fn http_fetch(hook: &TuningFetchHook, value: &str) -> Result<String, FetchError> {
    let timeout = Duration::from_millis(hook.timeout);
    match tokio::time::timeout(timeout, send(hook, value)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(url = %hook.url, ?timeout, "tuning fetch timed out");
            Err(FetchError::Timeout {
                url: hook.url.clone(),
                timeout,
            })
        }
    }
}

async fn send(hook: &TuningFetchHook, value: &str) -> Result<String, FetchError> {
    let uri: http::Uri = hook
        .url
        .parse()
        .map_err(|e| FetchError::InvalidRequest(format!("bad url '{}': {e}", hook.url)))?;
    if uri.scheme_str() != Some("http") {
        return Err(FetchError::InvalidRequest(format!(
            "unsupported scheme in '{}', only http is supported",
            hook.url
        )));
    }
    let authority = uri
        .authority()
        .ok_or_else(|| FetchError::InvalidRequest(format!("no host in '{}'", hook.url)))?
        .clone();
    let method = http::Method::from_bytes(hook.method.to_ascii_uppercase().as_bytes())
        .map_err(|e| FetchError::InvalidRequest(format!("bad method '{}': {e}", hook.method)))?;

    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let (target, body) = match hook.parameter_mode {
        ParameterMode::Query => {
            let separator = if path.contains('?') { '&' } else { '?' };
            (
                format!("{path}{separator}value={}", urlencoding::encode(value)),
                Bytes::new(),
            )
        }
        ParameterMode::Body => (path.to_string(), Bytes::copy_from_slice(value.as_bytes())),
    };

    let address = format!("{}:{}", authority.host(), authority.port_u16().unwrap_or(80));
    let stream = tokio::net::TcpStream::connect(&address)
        .await
        .map_err(|e| FetchError::Transport(format!("connect to {address}: {e}")))?;

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| FetchError::Transport(format!("handshake with {address}: {e}")))?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let mut builder = http::Request::builder()
        .method(method)
        .uri(target.as_str())
        .header(HOST, authority.as_str())
        .header(USER_AGENT, "horizon-predict/0.1");
    if hook.parameter_mode == ParameterMode::Body {
        builder = builder.header(CONTENT_TYPE, "application/json");
    }
    for (name, header_value) in &hook.headers {
        builder = builder.header(name.as_str(), header_value.as_str());
    }
    let req = builder
        .body(Full::new(body))
        .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| FetchError::Transport(format!("request to {}: {e}", hook.url)))?;

    let status = resp.status().as_u16();
    if !hook.success_codes.contains(&status) {
        debug!(%status, url = %hook.url, "tuning hook returned non-success status");
        return Err(FetchError::Status {
            url: hook.url.clone(),
            status,
        });
    }

    let collected = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| FetchError::Transport(format!("reading body from {}: {e}", hook.url)))?;
    String::from_utf8(collected.to_bytes().to_vec())
        .map_err(|e| FetchError::MalformedBody(format!("body is not utf-8: {e}")))
}
