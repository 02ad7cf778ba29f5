//! HTTP transport shared by the pipeline and the refresh coordinator

use super::ClientError;
use super::coordinator::RefreshTransport;
use super::interceptor;
use super::request::ApiRequest;
use super::user::REFRESH_TOKEN_PATH;
use crate::types::{RefreshTokenRequest, TokenPair};
use async_trait::async_trait;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tracing::debug;
use wallpaper_core::{Credential, Envelope};

/// Content type sent with every request
pub const DEFAULT_CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// A completed HTTP exchange: status plus raw body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub status: StatusCode,
    pub body: String,
}

impl Exchange {
    /// Parse the body as a response envelope
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the body is not an envelope
    pub fn envelope(&self) -> Result<Envelope, ClientError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Best available description of a failed exchange
    pub fn message(&self) -> String {
        if let Ok(envelope) = self.envelope() {
            if !envelope.message.is_empty() {
                return envelope.message;
            }
        }
        if self.body.trim().is_empty() {
            self.status.to_string()
        } else {
            self.body.clone()
        }
    }
}

/// Thin wrapper around a configured `reqwest` client
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: String,
}

impl Transport {
    /// Build a transport for `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        // Ensure base_url ends without a trailing slash
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut builder = ClientBuilder::new().user_agent(user_agent.to_string());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send `request`, authorizing it with `credential` when present
    ///
    /// Only failures to obtain a response are errors here; status codes and
    /// envelopes are judged by the response interceptor.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NetworkUnreachable`] when no response arrives
    pub async fn dispatch(
        &self,
        request: &ApiRequest,
        credential: Option<&Credential>,
    ) -> Result<Exchange, ClientError> {
        let mut builder = self
            .client
            .request(request.method().clone(), self.url(request.path()));

        // Multipart forms carry their own content type with the boundary.
        if let Some(multipart) = request.multipart_body() {
            builder = builder.multipart(multipart.to_form()?);
        } else {
            builder = builder.header(
                header::CONTENT_TYPE,
                HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
            );
            if let Some(body) = request.body() {
                builder = builder.body(serde_json::to_vec(body)?);
            }
        }

        if !request.query_params().is_empty() {
            builder = builder.query(request.query_params());
        }
        builder = builder.headers(request.headers().clone());
        builder = interceptor::authorize(builder, credential);

        debug!(
            method = %request.method(),
            path = request.path(),
            authorized = credential.is_some(),
            "dispatching request"
        );

        let response = builder.send().await.map_err(ClientError::from_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(ClientError::from_transport)?;

        debug!(path = request.path(), %status, "response received");
        Ok(Exchange { status, body })
    }
}

#[async_trait]
impl RefreshTransport for Transport {
    async fn refresh(&self, expired: &Credential) -> Result<Credential, ClientError> {
        let refresh_token = expired
            .refresh_token
            .clone()
            .ok_or_else(|| ClientError::refresh_failed("no refresh token stored"))?;
        let request =
            ApiRequest::post(REFRESH_TOKEN_PATH).json(&RefreshTokenRequest { refresh_token })?;

        // Dispatched directly so a rejected refresh never re-enters recovery.
        let exchange = self.dispatch(&request, Some(expired)).await?;
        if !exchange.status.is_success() {
            return Err(ClientError::refresh_failed(exchange.message()));
        }

        let envelope = exchange.envelope()?;
        if !envelope.is_success() {
            return Err(ClientError::refresh_failed(envelope.message));
        }
        let data = envelope
            .data
            .ok_or_else(|| ClientError::refresh_failed("refresh response carried no token"))?;
        let pair: TokenPair = serde_json::from_value(data)?;
        Ok(pair.into())
    }

    async fn replay(
        &self,
        request: &ApiRequest,
        credential: &Credential,
    ) -> Result<Exchange, ClientError> {
        self.dispatch(request, Some(credential)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(status: StatusCode, body: &str) -> Exchange {
        Exchange {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn message_prefers_envelope_text() {
        let failed = exchange(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"code":500,"message":"database offline"}"#,
        );
        assert_eq!(failed.message(), "database offline");
    }

    #[test]
    fn message_falls_back_to_body_then_status() {
        assert_eq!(
            exchange(StatusCode::BAD_GATEWAY, "upstream timeout").message(),
            "upstream timeout"
        );
        assert_eq!(
            exchange(StatusCode::BAD_GATEWAY, "").message(),
            StatusCode::BAD_GATEWAY.to_string()
        );
    }

    #[test]
    fn url_joins_without_double_slash() {
        let transport = Transport::new("http://localhost:8080/api/", None, "test").unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8080/api");
        assert_eq!(
            transport.url("/wallpaper/1"),
            "http://localhost:8080/api/wallpaper/1"
        );
        assert_eq!(transport.url("tag/all"), "http://localhost:8080/api/tag/all");
    }
}
