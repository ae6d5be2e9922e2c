//! Client id extraction.
//!
//! The browser SDK produces a client id token that the page forwards either
//! as a hidden form field or as a request header. Which one applies is fixed
//! by the route; both strategies read from the buffered request only.

use axum::body::Body;
use axum::extract::{FromRequest, Multipart};
use axum::http::{header::CONTENT_TYPE, Request};

use crate::http::request::IncomingRequest;
use crate::routing::AuthVariant;

/// Form field carrying the client id.
pub const CLIENT_ID_FIELD: &str = "castle_client_id";

/// Header carrying the client id.
pub const CLIENT_ID_HEADER: &str = "X-Castle-Client-Id";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// Client id for `variant`, or `None` when it is missing or empty.
pub async fn extract_client_id(request: &IncomingRequest, variant: AuthVariant) -> Option<String> {
    match variant {
        AuthVariant::Form => client_id_from_body(request).await,
        AuthVariant::Headers => client_id_from_header(request),
    }
}

/// First `castle_client_id` field of a form body, urlencoded or multipart.
pub async fn client_id_from_body(request: &IncomingRequest) -> Option<String> {
    match mime(request) {
        Some(mime) if mime.eq_ignore_ascii_case(MULTIPART_CONTENT_TYPE) => {
            client_id_from_multipart(request).await
        }
        _ => client_id_from_form(request),
    }
}

/// First `castle_client_id` field of a form-encoded body.
///
/// Bodies declared with any other content type are not parsed.
pub fn client_id_from_form(request: &IncomingRequest) -> Option<String> {
    if let Some(mime) = mime(request) {
        if !mime.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
            return None;
        }
    }

    let body = request.body.as_ref()?;
    url::form_urlencoded::parse(body)
        .find(|(name, _)| name == CLIENT_ID_FIELD)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// First `castle_client_id` part of a `multipart/form-data` body.
///
/// A malformed body or a missing boundary yields `None`.
pub async fn client_id_from_multipart(request: &IncomingRequest) -> Option<String> {
    let content_type = request.header("content-type")?;
    let body = request.body.clone()?;

    let framed = Request::builder()
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .ok()?;
    let mut multipart = Multipart::from_request(framed, &()).await.ok()?;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(CLIENT_ID_FIELD) {
            return field.text().await.ok().filter(|value| !value.is_empty());
        }
    }
    None
}

fn mime(request: &IncomingRequest) -> Option<&str> {
    request
        .header("content-type")
        .map(|value| value.split(';').next().unwrap_or_default().trim())
}

/// Value of the `X-Castle-Client-Id` header.
pub fn client_id_from_header(request: &IncomingRequest) -> Option<String> {
    request
        .header(CLIENT_ID_HEADER)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
