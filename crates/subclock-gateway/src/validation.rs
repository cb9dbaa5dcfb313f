//! Request bodies, their validation, and the API error type.

use axum::Json;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use subclock_core::LimitsConfig;
use subclock_scheduler::{IntervalUnit, SubscriptionConfig};
use thiserror::Error;

/// Body of `POST /v1/register` and `PUT /v1/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionRequest {
    #[serde(rename = "callbackURL", alias = "callbackUrl", default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub interval: Option<i64>,
    #[serde(rename = "intervalUnit", default)]
    pub interval_unit: IntervalUnit,
}

/// Body of `POST /v1/deregister`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeregisterRequest {
    #[serde(rename = "callbackURL", alias = "callbackUrl", default)]
    pub callback_url: Option<String>,
}

/// Machine-readable error code returned alongside every error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    NoBody,
    InvalidRequestBody,
    InvalidFrequency,
    #[serde(rename = "InvalidURLFormat")]
    InvalidUrlFormat,
    Conflict,
    NotFound,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No body was provided")]
    NoBody,

    #[error("Invalid body format")]
    InvalidRequestBody,

    #[error("Frequency should be between {} and {}", describe_secs(.min_secs), describe_secs(.max_secs))]
    InvalidFrequency { min_secs: u64, max_secs: u64 },

    #[error("Provided URL is not in a valid format")]
    InvalidUrlFormat,

    #[error("Callback {0} is already registered")]
    Conflict(String),

    #[error("Callback {0} is not registered")]
    NotFound(String),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::NoBody => ErrorCode::NoBody,
            ApiError::InvalidRequestBody => ErrorCode::InvalidRequestBody,
            ApiError::InvalidFrequency { .. } => ErrorCode::InvalidFrequency,
            ApiError::InvalidUrlFormat => ErrorCode::InvalidUrlFormat,
            ApiError::Conflict(_) => ErrorCode::Conflict,
            ApiError::NotFound(_) => ErrorCode::NotFound,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn invalid_frequency(limits: &LimitsConfig) -> Self {
        ApiError::InvalidFrequency {
            min_secs: limits.min_interval_secs,
            max_secs: limits.max_interval_secs,
        }
    }
}

/// JSON error body: `{"errorCode": ..., "error": ...}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "errorCode")]
    pub error_code: ErrorCode,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error_code: self.code(),
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// "5 seconds", "4 hours", "90 seconds".
fn describe_secs(secs: &u64) -> String {
    let (value, unit) = if *secs % 3600 == 0 {
        (*secs / 3600, "hour")
    } else if *secs % 60 == 0 {
        (*secs / 60, "minute")
    } else {
        (*secs, "second")
    };
    if value == 1 {
        format!("1 {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

/// Decode a JSON body. An empty body or a literal `null` is `NoBody`;
/// anything that does not fit `T` is `InvalidRequestBody`.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::NoBody);
    }
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| ApiError::InvalidRequestBody)?;
    if value.is_null() {
        return Err(ApiError::NoBody);
    }
    serde_json::from_value(value).map_err(|_| ApiError::InvalidRequestBody)
}

/// Absolute `http`/`https` URL with a host.
pub fn is_valid_callback_url(candidate: &str) -> bool {
    reqwest::Url::parse(candidate)
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

/// Check shape, then frequency, then URL format.
pub fn validate_subscription(
    req: &SubscriptionRequest,
    limits: &LimitsConfig,
) -> Result<SubscriptionConfig, ApiError> {
    let callback_url = req
        .callback_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .ok_or(ApiError::InvalidRequestBody)?;
    let interval = req
        .interval
        .filter(|i| *i > 0)
        .ok_or(ApiError::InvalidRequestBody)? as u64;

    let secs = interval
        .checked_mul(req.interval_unit.millis() / 1000)
        .filter(|secs| limits.allows(*secs))
        .ok_or_else(|| ApiError::invalid_frequency(limits))?;
    tracing::debug!("Requested frequency: {} {} ({}s)", interval, req.interval_unit, secs);

    if !is_valid_callback_url(callback_url) {
        return Err(ApiError::InvalidUrlFormat);
    }

    SubscriptionConfig::from_frequency(callback_url, interval, req.interval_unit)
        .map_err(|_| ApiError::invalid_frequency(limits))
}

/// Deregistration only needs a well-formed URL.
pub fn validate_deregister(req: &DeregisterRequest) -> Result<String, ApiError> {
    match req.callback_url.as_deref() {
        Some(url) if is_valid_callback_url(url) => Ok(url.to_string()),
        _ => Err(ApiError::InvalidUrlFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: Option<&str>, interval: Option<i64>, unit: IntervalUnit) -> SubscriptionRequest {
        SubscriptionRequest {
            callback_url: url.map(String::from),
            interval,
            interval_unit: unit,
        }
    }

    fn limits() -> LimitsConfig {
        LimitsConfig::default()
    }

    #[test]
    fn test_parse_body_empty_and_null() {
        assert!(matches!(parse_body::<SubscriptionRequest>(&Bytes::new()), Err(ApiError::NoBody)));
        assert!(matches!(
            parse_body::<SubscriptionRequest>(&Bytes::from_static(b"null")),
            Err(ApiError::NoBody)
        ));
    }

    #[test]
    fn test_parse_body_malformed() {
        assert!(matches!(
            parse_body::<SubscriptionRequest>(&Bytes::from_static(b"{not json")),
            Err(ApiError::InvalidRequestBody)
        ));
        assert!(matches!(
            parse_body::<SubscriptionRequest>(&Bytes::from_static(
                br#"{"callbackURL":"http://url.com","interval":2,"intervalUnit":-3}"#
            )),
            Err(ApiError::InvalidRequestBody)
        ));
    }

    #[test]
    fn test_parse_body_fields() {
        let req: SubscriptionRequest = parse_body(&Bytes::from_static(
            br#"{"callbackURL":"http://localhost:5000","interval":2,"intervalUnit":1}"#,
        ))
        .unwrap();
        assert_eq!(req.callback_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(req.interval, Some(2));
        assert_eq!(req.interval_unit, IntervalUnit::Minutes);
    }

    #[test]
    fn test_missing_fields_are_invalid_body() {
        let missing_url = request(None, Some(2), IntervalUnit::Minutes);
        assert!(matches!(validate_subscription(&missing_url, &limits()), Err(ApiError::InvalidRequestBody)));

        let missing_interval = request(Some("http://url.com"), None, IntervalUnit::Minutes);
        assert!(matches!(
            validate_subscription(&missing_interval, &limits()),
            Err(ApiError::InvalidRequestBody)
        ));

        let zero_interval = request(Some("http://url.com"), Some(0), IntervalUnit::Minutes);
        assert!(matches!(
            validate_subscription(&zero_interval, &limits()),
            Err(ApiError::InvalidRequestBody)
        ));
    }

    #[test]
    fn test_out_of_bounds_frequencies() {
        let cases = [
            (4, IntervalUnit::Seconds),
            (14_401, IntervalUnit::Seconds),
            (241, IntervalUnit::Minutes),
            (5, IntervalUnit::Hours),
        ];
        for (interval, unit) in cases {
            let req = request(Some("http://url.com"), Some(interval), unit);
            let err = validate_subscription(&req, &limits()).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidFrequency, "{interval} {unit}");
            assert_eq!(err.to_string(), "Frequency should be between 5 seconds and 4 hours");
        }
    }

    #[test]
    fn test_frequency_checked_before_url() {
        let req = request(Some("not-a-valid-URL"), Some(1), IntervalUnit::Seconds);
        assert_eq!(
            validate_subscription(&req, &limits()).unwrap_err().code(),
            ErrorCode::InvalidFrequency
        );
    }

    #[test]
    fn test_invalid_urls() {
        for url in ["not-a-valid-URL", "httpstat.us/200", "localhost:5000", "ftp://host/file"] {
            let req = request(Some(url), Some(2), IntervalUnit::Minutes);
            assert_eq!(
                validate_subscription(&req, &limits()).unwrap_err().code(),
                ErrorCode::InvalidUrlFormat,
                "{url}"
            );
        }
    }

    #[test]
    fn test_valid_request_builds_config() {
        let req = request(Some("http://httpstat.us/200?sleep=5000"), Some(2), IntervalUnit::Minutes);
        let cfg = validate_subscription(&req, &limits()).unwrap();
        assert_eq!(cfg.callback_address(), "http://httpstat.us/200?sleep=5000");
        assert_eq!(cfg.interval_millis(), 120_000);
    }

    #[test]
    fn test_bounds_inclusive() {
        for (interval, unit) in [(5, IntervalUnit::Seconds), (240, IntervalUnit::Minutes), (4, IntervalUnit::Hours)] {
            let req = request(Some("http://url.com"), Some(interval), unit);
            assert!(validate_subscription(&req, &limits()).is_ok(), "{interval} {unit}");
        }
    }

    #[test]
    fn test_deregister_validation() {
        let ok = DeregisterRequest { callback_url: Some("http://localhost:5000".into()) };
        assert_eq!(validate_deregister(&ok).unwrap(), "http://localhost:5000");

        let bad = DeregisterRequest { callback_url: Some("invalid-valid-URL".into()) };
        assert!(matches!(validate_deregister(&bad), Err(ApiError::InvalidUrlFormat)));

        let missing = DeregisterRequest { callback_url: None };
        assert!(matches!(validate_deregister(&missing), Err(ApiError::InvalidUrlFormat)));
    }

    #[test]
    fn test_describe_secs() {
        assert_eq!(describe_secs(&5), "5 seconds");
        assert_eq!(describe_secs(&60), "1 minute");
        assert_eq!(describe_secs(&14_400), "4 hours");
        assert_eq!(describe_secs(&90), "90 seconds");
    }

    #[test]
    fn test_error_body_shape() {
        let json = serde_json::to_value(ErrorResponse {
            error_code: ApiError::InvalidUrlFormat.code(),
            error: ApiError::InvalidUrlFormat.to_string(),
        })
        .unwrap();
        assert_eq!(json["errorCode"], "InvalidURLFormat");
        assert_eq!(json["error"], "Provided URL is not in a valid format");
    }
}
