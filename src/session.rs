use crate::{
    auth::Credentials,
    config::{SessionConfig, TransportOptions},
    error::{ZephyrError, ZephyrResult},
    observer::{LogObserver, RequestObserver},
    pagination::{PaginationMode, Paginator},
};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{redirect, Body, Client, ClientBuilder, Method, Response};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Query string parameters, kept in a stable order
pub type QueryParams = BTreeMap<String, String>;

/// Outcome of a successful request
#[derive(Debug)]
pub enum Reply {
    /// Decoded JSON body; an empty body becomes `Value::String("")`
    Json(Value),
    /// The unread transport response
    Raw(Response),
}

impl Reply {
    pub fn into_json(self) -> ZephyrResult<Value> {
        match self {
            Reply::Json(value) => Ok(value),
            Reply::Raw(_) => Err(ZephyrError::protocol("expected a decoded body, got a raw response")),
        }
    }

    pub fn into_raw(self) -> ZephyrResult<Response> {
        match self {
            Reply::Raw(response) => Ok(response),
            Reply::Json(_) => Err(ZephyrError::protocol("expected a raw response, got a decoded body")),
        }
    }
}

/// Description of a single request
#[derive(Debug)]
pub struct ZephyrRequest {
    method: Method,
    endpoint: String,
    params: QueryParams,
    json: Option<Value>,
    form: Option<Form>,
    headers: HeaderMap,
    raw: bool,
}

impl ZephyrRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: QueryParams::new(),
            json: None,
            form: None,
            headers: HeaderMap::new(),
            raw: false,
        }
    }

    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn form(mut self, form: Form) -> Self {
        self.form = Some(form);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Return the transport response unread instead of decoding it
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }
}

/// Authenticated session shared by every endpoint group
#[derive(Clone)]
pub struct ZephyrSession {
    client: Client,
    base_url: String,
    credentials: Credentials,
    transport: TransportOptions,
    observer: Arc<dyn RequestObserver>,
}

impl ZephyrSession {
    /// Open a session that reports through the `log` facade
    pub fn new(config: SessionConfig) -> ZephyrResult<Self> {
        Self::with_observer(config, LogObserver)
    }

    /// Open a session with a custom diagnostics hook
    pub fn with_observer(
        config: SessionConfig,
        observer: impl RequestObserver + 'static,
    ) -> ZephyrResult<Self> {
        let credentials = config.credentials()?;
        observer.on_session(&config.base_url, credentials.mode());

        let mut headers = HeaderMap::new();
        credentials.apply_auth(&mut headers)?;
        let builder = Client::builder().default_headers(headers);

        let client = apply_transport(builder, &config.transport)
            .build()
            .map_err(|e| ZephyrError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url,
            credentials,
            transport: config.transport,
            observer: Arc::new(observer),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential attached to every request
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Transport overrides this session was built with
    pub fn transport(&self) -> &TransportOptions {
        &self.transport
    }

    pub(crate) fn observer(&self) -> &dyn RequestObserver {
        self.observer.as_ref()
    }

    /// Base URL followed by `segments` joined with `/`.
    ///
    /// No slash normalisation happens: endpoints are expected without a
    /// leading `/` and the base URL with a trailing one.
    pub fn create_url(&self, segments: &[&str]) -> String {
        format!("{}{}", self.base_url, segments.join("/"))
    }

    /// Send one request and classify the response
    pub async fn execute(&self, request: ZephyrRequest) -> ZephyrResult<Reply> {
        let ZephyrRequest {
            method,
            endpoint,
            params,
            json,
            form,
            headers,
            raw,
        } = request;

        debug!("{} data: endpoint={} params={:?}", method, endpoint, params);
        let url = Url::parse(&self.create_url(&[&endpoint]))?;
        let mut req = self.client.request(method.clone(), url.clone());

        if !params.is_empty() {
            req = req.query(&params);
        }
        if let Some(body) = &json {
            req = req.json(body);
        }
        if let Some(form) = form {
            req = req.multipart(form);
        }
        if !headers.is_empty() {
            req = req.headers(headers);
        }

        self.observer.on_request(&method, url.as_str());
        let response = req.send().await?;
        let status = response.status().as_u16();
        self.observer.on_response(&method, url.as_str(), status);

        if status >= 400 {
            let body = match response.bytes().await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!("Failed to read the body of HTTP {} {}: {}", status, url, e);
                    String::new()
                }
            };
            return Err(ZephyrError::request_failed(status, body));
        }
        if raw {
            return Ok(Reply::Raw(response));
        }

        let text = response.text().await?;
        if text.is_empty() {
            return Ok(Reply::Json(Value::String(String::new())));
        }
        serde_json::from_str(&text)
            .map(Reply::Json)
            .map_err(|e| ZephyrError::protocol(format!("Response body is not JSON: {}", e)))
    }

    /// GET with query parameters
    pub async fn get(&self, endpoint: &str, params: &QueryParams) -> ZephyrResult<Value> {
        let request = ZephyrRequest::new(Method::GET, endpoint).params(params.clone());
        self.execute(request).await?.into_json()
    }

    /// GET returning the unread response (binary downloads)
    pub async fn get_raw(
        &self,
        endpoint: &str,
        params: &QueryParams,
        headers: HeaderMap,
    ) -> ZephyrResult<Response> {
        let request = ZephyrRequest::new(Method::GET, endpoint)
            .params(params.clone())
            .headers(headers)
            .raw();
        self.execute(request).await?.into_raw()
    }

    /// POST with an optional JSON body
    pub async fn post(&self, endpoint: &str, json: Option<Value>) -> ZephyrResult<Value> {
        let mut request = ZephyrRequest::new(Method::POST, endpoint);
        if let Some(body) = json {
            request = request.json(body);
        }
        self.execute(request).await?.into_json()
    }

    /// PUT with an optional JSON body
    pub async fn put(&self, endpoint: &str, json: Option<Value>) -> ZephyrResult<Value> {
        let mut request = ZephyrRequest::new(Method::PUT, endpoint);
        if let Some(body) = json {
            request = request.json(body);
        }
        self.execute(request).await?.into_json()
    }

    pub async fn delete(&self, endpoint: &str) -> ZephyrResult<Value> {
        self.execute(ZephyrRequest::new(Method::DELETE, endpoint))
            .await?
            .into_json()
    }

    /// POST a local file as the multipart part `file`.
    ///
    /// Every `extra_parts` entry is sent as a JSON part without a file name.
    /// The file handle belongs to the request body and is closed once the
    /// request finishes, whatever its outcome.
    pub async fn post_file(
        &self,
        endpoint: &str,
        file_path: impl AsRef<Path>,
        extra_parts: Vec<(String, Value)>,
        params: QueryParams,
    ) -> ZephyrResult<Value> {
        let path = file_path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        debug!("Uploading {} to {}", path.display(), endpoint);

        let file_part = Part::stream(Body::from(file))
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let mut form = Form::new().part("file", file_part);

        for (name, value) in extra_parts {
            let bytes = serde_json::to_vec(&value)
                .map_err(|e| ZephyrError::protocol(format!("Unencodable part {}: {}", name, e)))?;
            form = form.part(name, Part::bytes(bytes).mime_str("application/json")?);
        }

        let request = ZephyrRequest::new(Method::POST, endpoint)
            .params(params)
            .form(form);
        self.execute(request).await?.into_json()
    }

    /// Lazily walk a paginated endpoint; nothing is requested until the
    /// returned paginator is polled.
    pub fn fetch_paginated(
        &self,
        endpoint: impl Into<String>,
        mode: PaginationMode,
        params: QueryParams,
    ) -> Paginator<'_> {
        Paginator::new(self, endpoint.into(), mode, params)
    }
}

impl std::fmt::Debug for ZephyrSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZephyrSession")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("transport", &self.transport)
            .finish()
    }
}

/// `Accept: application/zip`, for archive downloads
pub fn accept_zip() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("application/zip"),
    );
    headers
}

fn apply_transport(builder: ClientBuilder, transport: &TransportOptions) -> ClientBuilder {
    if !transport.is_default() {
        debug!("Modify transport with {:?}", transport);
    }

    let user_agent = transport.user_agent.clone().unwrap_or_else(|| {
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
    });
    let mut builder = builder.user_agent(user_agent);

    if transport.accept_invalid_certs {
        builder = builder.danger_accept_invalid_certs(true);
    }
    if let Some(max) = transport.max_redirects {
        builder = builder.redirect(redirect::Policy::limited(max));
    }
    if let Some(timeout) = transport.timeout {
        builder = builder.timeout(timeout);
    }
    builder
}
