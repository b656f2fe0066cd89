//! Request-context middleware.
//!
//! Buffers the request body so its input can be attached to error reports,
//! then logs any [`ReportedError`] a handler left on the response.

use std::net::SocketAddr;

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Request},
    http::{header::USER_AGENT, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use shared::ErrorResponse;

use crate::backend::error::ReportedError;
use crate::backend::io::rest::auth::UserSlot;
use crate::backend::reporting::{query_to_input, redact_input, report_error, RequestContext};

pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// First address of `X-Forwarded-For`, else the peer address
pub fn client_ip(parts: &Parts) -> Option<String> {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    forwarded.or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

/// JSON body if there is one, otherwise the query string; always redacted
pub fn request_input(parts: &Parts, body: &[u8]) -> Value {
    let input = if body.is_empty() {
        query_to_input(parts.uri.query().unwrap_or(""))
    } else {
        serde_json::from_slice(body).unwrap_or_else(|_| Value::String(format!("<{} bytes>", body.len())))
    };
    redact_input(input)
}

pub async fn capture_request_context(request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            let error = ErrorResponse {
                error: "Request body too large".to_string(),
            };
            return (StatusCode::PAYLOAD_TOO_LARGE, Json(error)).into_response();
        }
    };

    let mut context = RequestContext {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        ip: client_ip(&parts),
        user_agent: parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        user_id: None,
        input: request_input(&parts, &bytes),
    };

    let user_slot = UserSlot::default();
    parts.extensions.insert(user_slot.clone());

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    if let Some(report) = response.extensions().get::<ReportedError>() {
        context.user_id = user_slot.get();
        report_error(report, &context);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts(uri: &str, forwarded: Option<&str>) -> Parts {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let p = parts("/api/me", Some("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&p).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let mut p = parts("/api/me", None);
        assert_eq!(client_ip(&p), None);

        p.extensions.insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 5000))));
        assert_eq!(client_ip(&p).as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn test_input_from_body_is_redacted() {
        let p = parts("/api/register", None);
        let input = request_input(&p, br#"{"email":"a@b.c","api_token":"t"}"#);
        assert_eq!(input["email"], "a@b.c");
        assert_eq!(input["api_token"], "[REDACTED]");
    }

    #[test]
    fn test_input_from_query_when_body_empty() {
        let p = parts("/api/transactions?limit=5&token=x", None);
        let input = request_input(&p, b"");
        assert_eq!(input["limit"], "5");
        assert_eq!(input["token"], "[REDACTED]");
    }

    #[test]
    fn test_non_json_body_is_summarised() {
        let p = parts("/api/log", None);
        assert_eq!(request_input(&p, b"not json"), Value::String("<8 bytes>".to_string()));
    }
}
