use anyhow::{Context, Result};
use crux_http::{
    HttpError,
    protocol::{HttpRequest, HttpResponse, HttpResult},
};
use log::{debug, warn};
#[cfg(feature = "mock")]
use mockall::automock;
use reqwest::{Client, Method};
use std::time::Duration;
use trait_variant::make;

/// Executes the HTTP requests the core asks for
#[make(Send)]
#[cfg_attr(feature = "mock", automock)]
pub trait Transport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Transport backed by a shared `reqwest` client
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .context(format!("invalid HTTP method {}", request.method))?;
        debug!("{method} {}", request.url);

        let mut builder = self.client.request(method.clone(), &request.url);
        for header in request.headers {
            builder = builder.header(header.name, header.value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let res = builder
            .send()
            .await
            .context(format!("failed to send {method} request to {}", request.url))?;

        let status = res.status().as_u16();
        let body = res.bytes().await.context("failed to read response body")?;
        debug!("{method} {} returned {status} ({} bytes)", request.url, body.len());

        Ok(HttpResponse::status(status).body(body.to_vec()).build())
    }
}

/// Turn the outcome of a transport call into what the core expects
///
/// Non-2xx responses are handed over as responses; the core decides what
/// they mean. Only failures to get any response become errors.
pub fn into_http_result(result: Result<HttpResponse>) -> HttpResult {
    match result {
        Ok(response) => HttpResult::Ok(response),
        Err(e) => {
            warn!("HTTP request failed: {e:#}");

            let timed_out = e
                .chain()
                .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
                .any(reqwest::Error::is_timeout);

            if timed_out {
                HttpResult::Err(HttpError::Timeout)
            } else {
                HttpResult::Err(HttpError::Io(format!("{e:#}")))
            }
        }
    }
}
