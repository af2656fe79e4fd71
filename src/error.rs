use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by every fallible operation in this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not complete (connection, DNS, timeout, body read).
    #[error("could not reach the NMDC API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("{}", format_api_error(.status, .url, .body))]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    /// The body was not JSON, or not the JSON shape we expected.
    #[error("failed to parse API JSON (url={url}): {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The server handed back a continuation token we already followed.
    #[error("server repeated page token [{token}] after {pages} page(s); aborting")]
    RepeatedPageToken { token: String, pages: usize },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("invalid comparison [{input}] (expected one of: eq, gt, lt, gte, lte)")]
    InvalidComparison { input: String },

    #[error("value for [{field}] must be a finite number (got {value})")]
    NonFiniteValue { field: String, value: f64 },

    #[error("record is missing field [{field}]")]
    MissingField { field: String },

    #[error("expected {expected} column name(s), got {found}")]
    ColumnCount { expected: usize, found: usize },
}

impl Error {
    /// HTTP status for [`Error::Api`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// FastAPI error payloads: {"detail": "..."} or {"detail": [{"msg": ...}, ...]}.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

fn detail_message(body: &str) -> Option<String> {
    let parsed: ApiErrorResponse = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_string)
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

fn format_api_error(status: &u16, url: &str, body: &str) -> String {
    let status = *status;
    if let Some(detail) = detail_message(body) {
        return format!(
            "API request failed: HTTP {} for url ({})\n{}",
            status, url, detail
        );
    }

    if status == 404 {
        return format!(
            "NMDC API endpoint not found (HTTP 404).\n- Check the collection name and the configured base URL\n- Default base URL: {}\nrequest: {}",
            crate::config::DEFAULT_BASE_URL,
            url
        );
    }

    format!(
        "API request failed: HTTP {} for url ({})\n{}",
        status, url, body
    )
}
