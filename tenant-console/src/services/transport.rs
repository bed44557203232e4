//! HTTP transport for the tenant service.
//!
//! One generic request routine serves every operation: it renders the path
//! template, serializes the body through the model codec, sends the request
//! with trace headers and maps the response to a typed result or
//! [`ClientError`].

use crate::error::ClientError;
use crate::models::{codec, RpcStatus};
use console_core::observability::TracedClientExt;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const APPLICATION_JSON: &str = "application/json";

/// Describes one logical call: which operation, which route, which path
/// parameters and which body.
pub struct Operation<'a, B: ?Sized = ()> {
    pub name: &'static str,
    pub method: Method,
    /// Path relative to the base path, with `{name}` placeholders.
    pub path: &'static str,
    pub params: &'a [(&'static str, Option<&'a str>)],
    pub body: Option<&'a B>,
}

impl<'a> Operation<'a, ()> {
    pub fn new(name: &'static str, method: Method, path: &'static str) -> Self {
        Self {
            name,
            method,
            path,
            params: &[],
            body: None,
        }
    }
}

impl<'a, B: ?Sized> Operation<'a, B> {
    pub fn params(self, params: &'a [(&'static str, Option<&'a str>)]) -> Self {
        Self { params, ..self }
    }

    pub fn body<T: ?Sized>(self, body: &'a T) -> Operation<'a, T> {
        Operation {
            name: self.name,
            method: self.method,
            path: self.path,
            params: self.params,
            body: Some(body),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Transport {
    client: Client,
    base_path: String,
}

impl Transport {
    pub fn new(base_path: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ClientError::network)?;

        Self::with_client(client, base_path)
    }

    pub fn with_client(client: Client, base_path: &str) -> Result<Self, ClientError> {
        let base_path = base_path.trim().trim_end_matches('/').to_string();
        Url::parse(&base_path)
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", base_path, e)))?;

        Ok(Self { client, base_path })
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Execute `operation` and decode a 2xx body as `R`.
    ///
    /// Parameter validation happens before any I/O.
    #[tracing::instrument(
        name = "tenant_api",
        skip_all,
        fields(operation = operation.name, method = %operation.method)
    )]
    pub async fn execute<B, R>(&self, operation: Operation<'_, B>) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned + Default,
    {
        let path = render_path(operation.name, operation.path, operation.params)?;
        let url = Url::parse(&format!("{}{}", self.base_path, path))
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}{}: {}", self.base_path, path, e)))?;

        let mut request = self
            .client
            .traced_request(operation.method.clone(), url)
            .header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

        if let Some(body) = operation.body {
            let bytes = codec::encode(body).map_err(ClientError::encode)?;
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
                .body(bytes);
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(path = %path, request_id = %request_id, "Sending request");

        let response = request
            .request_id(request_id)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "Request to tenant service failed");
                ClientError::network(e)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            tracing::error!(path = %path, error = %e, "Failed to read response body");
            ClientError::network(e)
        })?;

        if !status.is_success() {
            let envelope = RpcStatus::from_error_body(&body);
            tracing::warn!(
                path = %path,
                status = status.as_u16(),
                message = %envelope,
                "Tenant service returned an error"
            );
            return Err(ClientError::Remote {
                status: status.as_u16(),
                envelope,
            });
        }

        codec::decode(&body).map_err(|e| {
            tracing::warn!(path = %path, status = status.as_u16(), error = %e, "Undecodable response");
            ClientError::decode(status.as_u16(), e)
        })
    }
}

/// Substitute every `{name}` in `template` with the percent-encoded value of
/// the matching parameter.
///
/// A placeholder whose parameter is missing or empty is a
/// [`ClientError::Parameter`].
pub fn render_path(
    operation: &'static str,
    template: &'static str,
    params: &[(&'static str, Option<&str>)],
) -> Result<String, ClientError> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name: &'static str = &rest[start + 1..start + len];
        let value = params
            .iter()
            .find(|(param, _)| *param == name)
            .and_then(|(_, value)| *value)
            .filter(|value| !value.is_empty())
            .ok_or(ClientError::Parameter {
                operation,
                parameter: name,
            })?;

        rendered.push_str(&rest[..start]);
        rendered.push_str(&urlencoding::encode(value));
        rest = &rest[start + len + 1..];
    }
    rendered.push_str(rest);

    Ok(rendered)
}
