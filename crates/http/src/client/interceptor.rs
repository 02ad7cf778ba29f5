//! Request and response interceptors
//!
//! [`authorize`] runs on every outgoing request; [`inspect`] runs on every
//! completed exchange and decides whether the caller gets the envelope, an
//! error, or has to wait for credential recovery.

use super::ClientError;
use super::transport::Exchange;
use reqwest::header::{self, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use tracing::warn;
use wallpaper_core::{Credential, Envelope};

/// Attach `Authorization: Bearer <token>` when a credential is stored
pub fn authorize(builder: RequestBuilder, credential: Option<&Credential>) -> RequestBuilder {
    let Some(credential) = credential else {
        return builder;
    };
    match HeaderValue::from_str(&credential.bearer()) {
        Ok(mut value) => {
            value.set_sensitive(true);
            builder.header(header::AUTHORIZATION, value)
        }
        Err(_) => {
            warn!("stored token is not a valid header value; sending request unauthenticated");
            builder
        }
    }
}

/// Outcome of inspecting a completed exchange
#[derive(Debug)]
pub enum Verdict {
    /// Envelope code 200, handed back unmodified
    Success(Envelope),
    /// Envelope code 401 or HTTP 401/403
    AuthFailure { message: String },
    /// Any other failure, to be notified and returned
    Failure(ClientError),
}

/// Classify a completed exchange
pub fn inspect(exchange: &Exchange) -> Verdict {
    let status = exchange.status;
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Verdict::AuthFailure {
            message: exchange.message(),
        };
    }
    if !status.is_success() {
        return Verdict::Failure(ClientError::from_status(status, exchange.message()));
    }

    match exchange.envelope() {
        Err(error) => Verdict::Failure(error),
        Ok(envelope) if envelope.is_success() => Verdict::Success(envelope),
        Ok(envelope) if envelope.is_unauthorized() => Verdict::AuthFailure {
            message: envelope.message,
        },
        Ok(envelope) => Verdict::Failure(ClientError::application(envelope.code, envelope.message)),
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

    fn authorization_of(credential: Option<&Credential>) -> Option<String> {
        let client = reqwest::Client::new();
        let request = authorize(client.get("http://localhost/wallpaper/1"), credential)
            .build()
            .unwrap();
        request
            .headers()
            .get(header::AUTHORIZATION)
            .map(|value| value.to_str().unwrap().to_string())
    }

    #[test]
    fn no_credential_means_no_header() {
        assert_eq!(authorization_of(None), None);
    }

    #[test]
    fn credential_becomes_bearer_header() {
        let credential = Credential::new("abc.def.ghi", None);
        assert_eq!(
            authorization_of(Some(&credential)).as_deref(),
            Some("Bearer abc.def.ghi")
        );
    }

    #[test]
    fn success_envelope_passes_through() {
        let verdict = inspect(&exchange(
            StatusCode::OK,
            r#"{"code":200,"message":"ok","data":{"id":1}}"#,
        ));
        let Verdict::Success(envelope) = verdict else {
            panic!("expected success, got {verdict:?}");
        };
        assert_eq!(envelope.data.unwrap()["id"], 1);
    }

    #[test]
    fn envelope_401_inside_http_200_is_an_auth_failure() {
        let verdict = inspect(&exchange(
            StatusCode::OK,
            r#"{"code":401,"message":"token expired","data":null}"#,
        ));
        assert!(matches!(verdict, Verdict::AuthFailure { message } if message == "token expired"));
    }

    #[test]
    fn transport_401_and_403_are_auth_failures() {
        assert!(matches!(
            inspect(&exchange(StatusCode::UNAUTHORIZED, "")),
            Verdict::AuthFailure { .. }
        ));
        assert!(matches!(
            inspect(&exchange(StatusCode::FORBIDDEN, "denied")),
            Verdict::AuthFailure { .. }
        ));
    }

    #[test]
    fn other_codes_are_application_errors() {
        let verdict = inspect(&exchange(
            StatusCode::OK,
            r#"{"code":4001,"message":"wrong password"}"#,
        ));
        assert!(matches!(
            verdict,
            Verdict::Failure(ClientError::ApplicationError { code: 4001, ref message })
                if message == "wrong password"
        ));
    }

    #[test]
    fn non_envelope_body_is_a_serialization_failure() {
        assert!(matches!(
            inspect(&exchange(StatusCode::OK, "<html>")),
            Verdict::Failure(ClientError::Serialization(_))
        ));
    }
}
