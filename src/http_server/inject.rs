//! HTML rewriting
//!
//! Embeds the bridge `<script>` into outgoing HTML. The pure rewrite lives in
//! [`inject_bridge`]; [`inject_bridge_middleware`] applies it to buffered
//! response bodies and fixes up `Content-Length`.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::bridge::BRIDGE_SCRIPT_ROUTE;

/// Tag inserted into every served page
pub const BRIDGE_SCRIPT_TAG: &str = r#"<script src="/__livespec/client.js"></script>"#;

const BODY_CLOSE: &str = "</body>";

/// Insert the bridge tag into an HTML document.
///
/// A body that already references the script is returned unchanged. The tag
/// goes immediately before the last `</body>` (any case), or at the end when
/// there is no closing body tag.
pub fn inject_bridge(html: &str) -> String {
    if html.contains(BRIDGE_SCRIPT_ROUTE) {
        return html.to_string();
    }

    // ASCII lowercasing keeps byte offsets aligned with the original
    let lowered = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len() + BRIDGE_SCRIPT_TAG.len());
    match lowered.rfind(BODY_CLOSE) {
        Some(idx) => {
            out.push_str(&html[..idx]);
            out.push_str(BRIDGE_SCRIPT_TAG);
            out.push_str(&html[idx..]);
        }
        None => {
            out.push_str(html);
            out.push_str(BRIDGE_SCRIPT_TAG);
        }
    }
    out
}

/// Whether the declared content type is HTML
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"))
        .unwrap_or(false)
}

/// Rewrite HTML responses produced by the inner handlers.
///
/// Non-HTML responses and partial content pass through. HEAD is answered
/// from the GET response so its `Content-Length` matches the rewritten page.
pub async fn inject_bridge_middleware(mut request: Request, next: Next) -> Response {
    let is_head = request.method() == Method::HEAD;
    if is_head {
        *request.method_mut() = Method::GET;
    }
    let response = next.run(request).await;

    if response.status() == StatusCode::PARTIAL_CONTENT || !is_html(response.headers()) {
        return if is_head { without_body(response) } else { response };
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("[HTTP] Failed to buffer HTML response: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Ok(html) = std::str::from_utf8(&bytes) else {
        tracing::debug!("[HTTP] HTML response is not UTF-8, passing through");
        let body = if is_head { Body::empty() } else { Body::from(bytes) };
        return Response::from_parts(parts, body);
    };

    let rewritten = inject_bridge(html);
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(rewritten.len()));
    let body = if is_head { Body::empty() } else { Body::from(rewritten) };
    Response::from_parts(parts, body)
}

/// Headers of a GET response, for answering HEAD
fn without_body(response: Response) -> Response {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Body::empty())
}
