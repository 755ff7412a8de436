//! HttpBackend - form-encoded POSTs against the ERP's method endpoints.
//!
//! Every request goes to `{base_url}/api/method/{method_prefix}.{method}`.
//! Requests with an attachment are sent as multipart forms.

use std::time::Duration;

use async_trait::async_trait;
use erpa_core::backend::{Attachment, Backend, BackendRequest};
use erpa_core::config::ClientConfig;
use erpa_core::error::{ErpaError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::csrf::{CSRF_HEADER, resolve_token, scrape_token};
use crate::form::encode_params;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const BODY_PREVIEW_CHARS: usize = 200;

/// Backend implementation that talks to the ERP over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: ClientConfig,
    csrf_token: std::sync::Arc<OnceCell<Option<String>>>,
}

impl HttpBackend {
    /// Creates a backend for the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|err| ErpaError::config(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Uses a caller-provided client, e.g. one carrying session cookies.
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self {
            client,
            config,
            csrf_token: Default::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token for the anti-forgery header, resolved once per backend.
    async fn csrf_token(&self) -> Option<&str> {
        self.csrf_token
            .get_or_init(|| async {
                let configured = self.config.csrf_token.as_deref();
                let scraped = if configured.is_some() {
                    None
                } else {
                    self.scrape_csrf_token().await
                };
                let token = resolve_token(configured, scraped);
                if token.is_none() {
                    tracing::warn!(
                        target: "backend",
                        "[HttpBackend] No CSRF token available; requests proceed without {}",
                        CSRF_HEADER
                    );
                }
                token
            })
            .await
            .as_deref()
    }

    async fn scrape_csrf_token(&self) -> Option<String> {
        let url = self.config.csrf_page_url();
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(target: "backend", "[HttpBackend] CSRF page fetch failed: {err}");
                return None;
            }
        };
        let page = response.text().await.ok()?;
        scrape_token(&page)
    }

    fn build_body(&self, builder: RequestBuilder, request: &BackendRequest) -> Result<RequestBuilder> {
        let fields = encode_params(&request.params);
        match &request.attachment {
            None => Ok(builder.form(&fields)),
            Some(attachment) => {
                let mut form = Form::new();
                for (key, value) in fields {
                    form = form.text(key, value);
                }
                form = form.part(attachment.kind.field_name(), file_part(attachment)?);
                Ok(builder.multipart(form))
            }
        }
    }

    async fn send_request(&self, request: BackendRequest) -> Result<Value> {
        let method = request.endpoint.method_name();
        let url = self.config.method_url(&method);
        tracing::debug!(target: "backend", "[HttpBackend] POST {url}");

        let mut builder = self.client.post(&url).header("Accept", "application/json");
        if let Some(token) = self.csrf_token().await {
            builder = builder.header(CSRF_HEADER, token);
        }
        builder = self.build_body(builder, &request)?;

        let response = builder.send().await.map_err(|err| {
            tracing::error!(target: "backend", "[HttpBackend] {method} request failed: {err}");
            if err.is_connect() || err.is_timeout() {
                ErpaError::connectivity(err.to_string())
            } else {
                ErpaError::transport(None, err.to_string())
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            tracing::error!(target: "backend", "[HttpBackend] {method} body read failed: {err}");
            ErpaError::transport(Some(status.as_u16()), err.to_string())
        })?;

        if !status.is_success() {
            let err = map_http_error(status, &body);
            tracing::error!(target: "backend", "[HttpBackend] {method} failed: {err}");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|err| {
            tracing::error!(
                target: "backend",
                "[HttpBackend] {method} returned non-JSON body ({err}): {}",
                preview(&body)
            );
            ErpaError::malformed(format!(
                "The server returned an unreadable response for {method}."
            ))
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn call(&self, request: BackendRequest) -> Result<Value> {
        self.send_request(request).await
    }
}

fn file_part(attachment: &Attachment) -> Result<Part> {
    let mime = mime_guess::from_path(&attachment.file_name).first_or_octet_stream();
    Part::bytes(attachment.bytes.clone())
        .file_name(attachment.file_name.clone())
        .mime_str(mime.essence_str())
        .map_err(|err| ErpaError::internal(format!("Invalid attachment type: {err}")))
}

#[derive(Deserialize)]
struct FrappeErrorBody {
    #[serde(default)]
    exception: Option<String>,
    #[serde(default)]
    exc_type: Option<String>,
    #[serde(default)]
    message: Option<Value>,
}

/// Maps a non-success status to a transport error. The detail is for logs;
/// users only ever see the generic retry text.
fn map_http_error(status: StatusCode, body: &str) -> ErpaError {
    let detail = serde_json::from_str::<FrappeErrorBody>(body)
        .ok()
        .and_then(|parsed| {
            parsed
                .exception
                .or(parsed.exc_type)
                .or_else(|| parsed.message.map(|message| match message {
                    Value::String(text) => text,
                    other => other.to_string(),
                }))
        })
        .unwrap_or_else(|| preview(body));
    ErpaError::transport(Some(status.as_u16()), format!("HTTP {status}: {detail}"))
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
