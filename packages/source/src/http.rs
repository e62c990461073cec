//! Blocking HTTP implementation of [`PoliceApi`].

use std::time::Duration;

use police_map_records_models::{Period, RecordKind};

use crate::{PoliceApi, QueryArea, SourceError};

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Talks to the police API over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpPoliceApi {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpPoliceApi {
    /// Creates a client for `base_url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("police_map/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self { client, base_url })
    }

    /// The base URL every endpoint is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a record kind's endpoint.
    #[must_use]
    pub fn endpoint_url(&self, kind: RecordKind) -> String {
        format!("{}{}", self.base_url, kind.endpoint())
    }
}

impl PoliceApi for HttpPoliceApi {
    fn query(
        &self,
        kind: RecordKind,
        area: &QueryArea,
        period: Period,
    ) -> Result<Vec<serde_json::Value>, SourceError> {
        let url = self.endpoint_url(kind);
        let date = period.to_string();

        let request = match area {
            QueryArea::Polygon(polygon) => self
                .client
                .post(&url)
                .form(&[("poly", polygon.to_api_string()), ("date", date)]),
            QueryArea::Point { lat, lng } => self.client.get(&url).query(&[
                ("lat", lat.to_string()),
                ("lng", lng.to_string()),
                ("date", date),
            ]),
        };

        log::debug!("Querying {url} for {period}");
        let response = request.send()?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: final_url,
            });
        }

        let text = response.text()?;
        parse_entries(&text).inspect_err(|e| {
            log::warn!(
                "Unusable response body.\n  \
                 url: {final_url}\n  \
                 status: {status}\n  \
                 received: {} bytes\n  \
                 error: {e}\n  \
                 body preview: {}",
                text.len(),
                preview(&text),
            );
        })
    }
}

/// Parses a response body that must be a JSON array.
///
/// # Errors
///
/// Returns [`SourceError::Json`] if the body is not JSON, or
/// [`SourceError::UnexpectedBody`] if it is JSON but not an array.
pub fn parse_entries(text: &str) -> Result<Vec<serde_json::Value>, SourceError> {
    match serde_json::from_str(text)? {
        serde_json::Value::Array(entries) => Ok(entries),
        other => Err(SourceError::UnexpectedBody {
            message: format!("expected a JSON array, got {}", json_type(&other)),
        }),
    }
}

const fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use police_map_records_models::DEFAULT_API_BASE_URL;

    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let api = HttpPoliceApi::new("http://localhost:9/api", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:9/api/");
        assert_eq!(
            api.endpoint_url(RecordKind::Crime),
            "http://localhost:9/api/crimes-street/all-crime"
        );
        assert_eq!(
            api.endpoint_url(RecordKind::StopAndSearch),
            "http://localhost:9/api/stops-street"
        );
    }

    #[test]
    fn default_base_url_targets_public_api() {
        let api = HttpPoliceApi::new(DEFAULT_API_BASE_URL, Duration::from_secs(1)).unwrap();
        assert_eq!(
            api.endpoint_url(RecordKind::Crime),
            "https://data.police.uk/api/crimes-street/all-crime"
        );
    }

    #[test]
    fn array_body_is_accepted() {
        let entries = parse_entries(r#"[{"category":"burglary"},{"category":"arson"}]"#).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(parse_entries("[]").unwrap().is_empty());
    }

    #[test]
    fn non_array_json_is_rejected() {
        let err = parse_entries(r#"{"error":"too many requests"}"#).unwrap_err();
        assert!(matches!(err, SourceError::UnexpectedBody { .. }));
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn non_json_body_is_rejected() {
        let err = parse_entries("<html>503 Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, SourceError::Json(_)));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let text = "é".repeat(BODY_PREVIEW_LEN + 10);
        let shown = preview(&text);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), BODY_PREVIEW_LEN + 3);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn unreachable_host_is_an_http_error() {
        let api = HttpPoliceApi::new("http://127.0.0.1:9/", Duration::from_secs(2)).unwrap();
        let period: Period = "2025-01".parse().unwrap();
        let area = QueryArea::Point {
            lat: 51.07,
            lng: -1.79,
        };
        let err = api.query(RecordKind::Crime, &area, period).unwrap_err();
        assert!(matches!(err, SourceError::Http(_)));
    }
}
