//! Outbound payload construction.
//!
//! Builds the body of the authenticate call from a buffered request. Pure
//! apart from reading the clock.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::http::request::IncomingRequest;
use crate::routing::AuthVariant;
use crate::security::headers::{scrub, ScrubbedHeaders, SensitiveHeaders};

pub const CLIENT_IP_HEADER: &str = "CF-Connecting-IP";
pub const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";
pub const USER_ID_HEADER: &str = "X-Castle-User-Id";
pub const USER_TRAITS_HEADER: &str = "X-Castle-User-Traits";
pub const PROPERTIES_HEADER: &str = "X-Castle-Properties";

/// Client-supplied data that cannot be turned into a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("{header} is not valid JSON: {source}")]
    MalformedJson {
        header: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{header} must be a JSON object")]
    NotAnObject { header: &'static str },
}

/// Identifies this gateway to the scoring service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl Default for LibraryInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Request signals sent along with the event.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub headers: ScrubbedHeaders,
    pub library: LibraryInfo,
}

/// Body of the authenticate call.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringRequestPayload {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_traits: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    pub context: ScoringContext,
    pub sent_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

/// Builds payloads with a fixed set of scrubbed headers.
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    sensitive: SensitiveHeaders,
}

impl PayloadBuilder {
    pub fn new(sensitive: SensitiveHeaders) -> Self {
        Self { sensitive }
    }

    /// Build a payload stamped with the current time.
    pub fn build(
        &self,
        event: &str,
        request: &IncomingRequest,
        client_id: Option<String>,
        variant: AuthVariant,
    ) -> Result<ScoringRequestPayload, PayloadError> {
        self.build_at(event, request, client_id, variant, Utc::now())
    }

    pub fn build_at(
        &self,
        event: &str,
        request: &IncomingRequest,
        client_id: Option<String>,
        variant: AuthVariant,
        now: DateTime<Utc>,
    ) -> Result<ScoringRequestPayload, PayloadError> {
        let mut context = ScoringContext {
            client_id,
            ip: client_ip(request),
            user_agent: None,
            locale: None,
            headers: scrub(request.headers.iter(), &self.sensitive),
            library: LibraryInfo::default(),
        };

        let (user_id, user_traits, properties) = match variant {
            AuthVariant::Form => (None, None, None),
            AuthVariant::Headers => {
                context.user_agent = header_string(request, "User-Agent");
                context.locale = header_string(request, "Accept-Language");
                (
                    header_string(request, USER_ID_HEADER),
                    json_object_header(request, USER_TRAITS_HEADER)?,
                    json_object_header(request, PROPERTIES_HEADER)?,
                )
            }
        };

        Ok(ScoringRequestPayload {
            event: event.to_string(),
            user_id,
            user_traits,
            properties,
            context,
            sent_at: now,
            timestamp: now,
        })
    }
}

/// Client address as reported by the edge, falling back to the first
/// `X-Forwarded-For` hop.
pub fn client_ip(request: &IncomingRequest) -> Option<String> {
    header_string(request, CLIENT_IP_HEADER).or_else(|| {
        request
            .header(FORWARDED_FOR_HEADER)
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
    })
}

fn header_string(request: &IncomingRequest, name: &str) -> Option<String> {
    request
        .header(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn json_object_header(
    request: &IncomingRequest,
    header: &'static str,
) -> Result<Option<Map<String, Value>>, PayloadError> {
    let Some(raw) = request.header(header) else {
        return Ok(None);
    };

    match serde_json::from_str(raw).map_err(|source| PayloadError::MalformedJson { header, source })? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(PayloadError::NotAnObject { header }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn sign_up() -> IncomingRequest {
        IncomingRequest::new("POST", "/users/sign_up")
            .with_header("CF-Connecting-IP", "203.0.113.7")
            .with_header("Cookie", "session=abc")
            .with_header("User-Agent", "Mozilla/5.0")
            .with_body("username=alice&castle_client_id=tok1")
    }

    #[test]
    fn test_form_variant() {
        let payload = PayloadBuilder::default()
            .build_at("$registration", &sign_up(), Some("tok1".into()), AuthVariant::Form, now())
            .unwrap();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["event"], "$registration");
        assert_eq!(json["context"]["client_id"], "tok1");
        assert_eq!(json["context"]["ip"], "203.0.113.7");
        assert_eq!(json["context"]["headers"]["Cookie"], true);
        assert_eq!(json["context"]["headers"]["User-Agent"], "Mozilla/5.0");
        assert_eq!(json["context"]["library"]["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(json["sent_at"], "2024-05-01T12:00:00Z");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");

        // Header-only signals are not part of the form flow
        assert!(json["context"].get("user_agent").is_none());
        assert!(json.get("user_id").is_none());
        assert!(json.get("user_traits").is_none());
    }

    #[test]
    fn test_missing_client_id_is_omitted() {
        let payload = PayloadBuilder::default()
            .build_at("$registration", &sign_up(), None, AuthVariant::Form, now())
            .unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["context"].get("client_id").is_none());
    }

    #[test]
    fn test_header_variant() {
        let request = IncomingRequest::new("POST", "/users/sign_in")
            .with_header("X-Forwarded-For", "198.51.100.4, 10.0.0.1")
            .with_header("User-Agent", "Mozilla/5.0")
            .with_header("Accept-Language", "en-US")
            .with_header("Authorization", "Bearer secret")
            .with_header(USER_ID_HEADER, "user-42")
            .with_header(USER_TRAITS_HEADER, r#"{"email":"alice@example.com"}"#)
            .with_header(PROPERTIES_HEADER, r#"{"plan":"pro"}"#);

        let payload = PayloadBuilder::default()
            .build_at("$login.succeeded", &request, Some("tok".into()), AuthVariant::Headers, now())
            .unwrap();

        assert_eq!(payload.user_id.as_deref(), Some("user-42"));
        assert_eq!(payload.context.ip.as_deref(), Some("198.51.100.4"));
        assert_eq!(payload.context.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(payload.context.locale.as_deref(), Some("en-US"));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["user_traits"], json!({ "email": "alice@example.com" }));
        assert_eq!(json["properties"], json!({ "plan": "pro" }));
        assert_eq!(json["context"]["headers"]["Authorization"], true);
    }

    #[test]
    fn test_malformed_traits() {
        let request =
            IncomingRequest::new("POST", "/users/sign_in").with_header(USER_TRAITS_HEADER, "{email:");
        let err = PayloadBuilder::default()
            .build_at("$login.succeeded", &request, None, AuthVariant::Headers, now())
            .unwrap_err();
        assert!(matches!(
            err,
            PayloadError::MalformedJson {
                header: USER_TRAITS_HEADER,
                ..
            }
        ));
    }

    #[test]
    fn test_non_object_properties() {
        let request =
            IncomingRequest::new("POST", "/users/sign_in").with_header(PROPERTIES_HEADER, "[1,2]");
        let err = PayloadBuilder::default()
            .build_at("$login.succeeded", &request, None, AuthVariant::Headers, now())
            .unwrap_err();
        assert!(matches!(err, PayloadError::NotAnObject { .. }));
    }

    #[test]
    fn test_traits_header_ignored_by_form_variant() {
        let request = sign_up().with_header(USER_TRAITS_HEADER, "{email:");
        assert!(PayloadBuilder::default()
            .build_at("$registration", &request, None, AuthVariant::Form, now())
            .is_ok());
    }

    #[test]
    fn test_client_ip_precedence() {
        let request = IncomingRequest::new("GET", "/")
            .with_header("X-Forwarded-For", "198.51.100.4")
            .with_header("CF-Connecting-IP", "203.0.113.7");
        assert_eq!(client_ip(&request).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_ip(&IncomingRequest::new("GET", "/")), None);
    }
}
