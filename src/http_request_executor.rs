use crate::errors::{Result, YapiError};
use crate::http_request::ResolvedRequest;
use crate::session_jar::{default_jar_path, SessionJar};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What to do when the session jar cannot be written after a request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SaveFailurePolicy {
    /// Log a warning and report the request as successful.
    #[default]
    BestEffort,
    /// Fail the invocation.
    FailFast,
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn content_type(&self) -> &str {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

/// Client and cookie jar for one invocation.
pub struct ExecutionContext {
    client: Client,
    jar: SessionJar,
    save_policy: SaveFailurePolicy,
}

impl ExecutionContext {
    /// Builds a context whose cookies persist under `session`.
    ///
    /// An empty session name keeps cookies in memory only.
    pub fn new(session: &str, save_policy: SaveFailurePolicy) -> Result<ExecutionContext> {
        let jar = match (session.is_empty(), default_jar_path(session)) {
            (true, _) => SessionJar::in_memory(),
            (false, Some(path)) => SessionJar::open(session, path),
            (false, None) => {
                warn!(
                    "no cache directory available, session `{}` will not be saved",
                    session
                );
                SessionJar::in_memory()
            }
        };
        ExecutionContext::with_jar(jar, save_policy)
    }

    pub fn with_jar(jar: SessionJar, save_policy: SaveFailurePolicy) -> Result<ExecutionContext> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(Policy::none())
            .cookie_provider(jar.store())
            .build()
            .map_err(YapiError::Client)?;
        Ok(ExecutionContext {
            client,
            jar,
            save_policy,
        })
    }

    /// Sends `request` and reads the whole response.
    ///
    /// Redirects are returned as-is. The session jar is saved once the
    /// exchange completes.
    pub fn execute(&self, request: &ResolvedRequest) -> Result<HttpResponse> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            YapiError::Argument(format!(
                "{} is not a valid http method",
                request.method
            ))
        })?;
        let headers = header_map(request)?;
        let network_error = |source: reqwest::Error| YapiError::Network {
            url: request.url.clone(),
            source,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .headers(headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }

        debug!("{} {}", request.method, request.url);
        let res = builder.send().map_err(network_error)?;
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().map_err(network_error)?.to_vec();
        debug!("{} -> {} ({} bytes)", request.url, status, body.len());

        if let Err(e) = self.jar.save() {
            match self.save_policy {
                SaveFailurePolicy::BestEffort => warn!("{}", e),
                SaveFailurePolicy::FailFast => return Err(e),
            }
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn header_map(request: &ResolvedRequest) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (key, value) in &request.headers {
        let name = HeaderName::try_from(key.as_str()).map_err(|e| {
            YapiError::decode(&request.name, format!("invalid header name `{}`: {}", key, e))
        })?;
        let value = HeaderValue::try_from(value.as_str()).map_err(|e| {
            YapiError::decode(
                &request.name,
                format!("invalid value for header `{}`: {}", key, e),
            )
        })?;
        map.insert(name, value);
    }
    Ok(map)
}
