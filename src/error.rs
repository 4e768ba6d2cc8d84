use anyhow::anyhow;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure conditions callers may want to tell apart.
///
/// These travel inside [`anyhow::Error`] and can be recovered with
/// `err.downcast_ref::<ResolweError>()`.
#[derive(Debug, Error)]
pub enum ResolweError {
    /// The server rejected the supplied credentials.
    #[error("authentication failed for {url}: {detail}")]
    AuthenticationFailed { url: String, detail: String },

    /// A lookup matched no remote resource.
    #[error("no sample matches '{slug}'")]
    NotFound { slug: String },

    /// A lookup matched more than one remote resource.
    #[error("{matches} samples match '{slug}', narrow the query")]
    Ambiguous { slug: String, matches: usize },
}

/// Error payload shape used by Resolwe / Django REST endpoints.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ServerErrorResponse {
    #[serde(default)]
    pub(crate) detail: Option<String>,
    #[serde(default)]
    pub(crate) non_field_errors: Vec<String>,
}

/// Best-effort extraction of a human-readable message from an error body.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ServerErrorResponse>(body).ok()?;
    if let Some(detail) = parsed.detail {
        if !detail.is_empty() {
            return Some(detail);
        }
    }
    if parsed.non_field_errors.is_empty() {
        None
    } else {
        Some(parsed.non_field_errors.join("; "))
    }
}

pub(crate) fn format_server_error(status: StatusCode, url: &str, body: &str) -> anyhow::Error {
    let detail = error_detail(body).unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!(
            "Resolwe authentication/authorization failed (HTTP {}).\n- Check the username/password (or .resolwerc) for this server\n- Public data can be read without credentials; private collections cannot\n\nServer message: {}\nrequest: {}",
            status.as_u16(),
            if detail.is_empty() { "(none)" } else { &detail },
            url
        );
    }

    if status == StatusCode::NOT_FOUND {
        return anyhow!(
            "Resolwe API endpoint not found (HTTP 404).\n- The configured base URL may be wrong; expected something like https://app.genialis.com\n\nServer message: {}\nrequest: {}",
            if detail.is_empty() { "(none)" } else { &detail },
            url
        );
    }

    anyhow!(
        "API request failed: HTTP {} for url ({})\n{}",
        status.as_u16(),
        url,
        detail
    )
}
