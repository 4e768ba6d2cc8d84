use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;

use crate::config::load_config;
use crate::download::Transfer;
use crate::error::{ResolweError, error_detail, format_server_error};
use crate::query::SampleQuery;
use crate::util::{append_query, backoff, retriable_status, urljoin};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base server URL, typically `https://app.genialis.com`.
    pub url: String,
    /// Login username; `None` for an anonymous session.
    pub username: Option<String>,
    /// Login password.
    pub password: Option<String>,
}

/// An authenticated session against a Resolwe server.
///
/// The session logs in once at construction; the server's session cookie
/// authenticates every later request. There is no explicit teardown.
#[derive(Debug, Clone)]
pub struct Resolwe {
    url: String,

    timeout: Duration,
    retry_max: usize,
    sleep_max: Duration,
    progress: bool,
    verbose: bool,

    http: HttpClient,
}

impl Resolwe {
    /// Connects to a Resolwe server and validates the credentials.
    ///
    /// Fails with [`ResolweError::AuthenticationFailed`] when the server
    /// rejects them.
    pub fn connect(username: &str, password: &str, url: &str) -> Result<Self> {
        Self::with_config(ClientConfig {
            url: url.to_string(),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        })
    }

    /// Creates an unauthenticated session; only public data is visible.
    pub fn anonymous(url: &str) -> Result<Self> {
        Self::with_config(ClientConfig {
            url: url.to_string(),
            username: None,
            password: None,
        })
    }

    /// Creates a session using (in order of precedence):
    /// - environment variables `RESOLWE_API_URL` / `RESOLWE_API_USERNAME` /
    ///   `RESOLWE_API_PASSWORD`
    /// - a `.resolwerc` file from `RESOLWE_RC`, the current directory or
    ///   the home directory
    pub fn from_env() -> Result<Self> {
        Self::with_config(load_config(None, None, None)?)
    }

    fn with_config(cfg: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("resolwe-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("resolwe-rs")),
        );

        let http = HttpClient::builder()
            .default_headers(default_headers)
            .cookie_store(true)
            .build()
            .context("failed to build HTTP client")?;

        let session = Self {
            url: cfg.url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(60),
            retry_max: 5,
            sleep_max: Duration::from_secs(60),
            progress: true,
            verbose: false,
            http,
        };

        if let (Some(username), Some(password)) = (&cfg.username, &cfg.password) {
            session.login(username, password)?;
        }

        Ok(session)
    }

    /// Per-request timeout for API calls (downloads are not bounded).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_max(mut self, retry_max: usize) -> Self {
        self.retry_max = retry_max;
        self
    }

    pub fn with_sleep_max(mut self, sleep_max: Duration) -> Self {
        self.sleep_max = sleep_max;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Prints a one-line summary of each request and response to stdout.
    ///
    /// This is the session-scoped equivalent of resdk's process-wide
    /// `start_logging()`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Access point for sample queries, as `res.sample` in resdk.
    pub fn sample(&self) -> SampleQuery<'_> {
        SampleQuery::new(self)
    }

    fn login(&self, username: &str, password: &str) -> Result<()> {
        let url = urljoin(&self.url, "rest-auth/login/");
        let body = serde_json::json!({ "username": username, "password": password });

        self.log_request("POST", &url);
        let resp =
            self.robust_request(|| self.http.post(&url).timeout(self.timeout).json(&body).send())?;
        let status = resp.status();
        self.log_response(status, &url);

        if status.is_success() {
            return Ok(());
        }

        let text = resp.text().unwrap_or_default();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(ResolweError::AuthenticationFailed {
                url: self.url.clone(),
                detail: error_detail(&text).unwrap_or_else(|| "invalid credentials".to_string()),
            }
            .into());
        }

        Err(format_server_error(status, &url, &text))
    }

    pub(crate) fn api_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = append_query(&urljoin(&self.url, path), params);

        self.log_request("GET", &url);
        let resp = self.robust_request(|| self.http.get(&url).timeout(self.timeout).send())?;
        let status = resp.status();
        self.log_response(status, &url);

        let text = resp.text().unwrap_or_default();
        if !status.is_success() {
            return Err(format_server_error(status, &url, &text));
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("failed to parse API JSON (url={}, status={})", url, status))
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.url
    }

    pub(crate) fn transfer(&self) -> Transfer<'_> {
        Transfer {
            http: &self.http,
            retry_max: self.retry_max,
            sleep_max: self.sleep_max,
            progress: self.progress,
        }
    }

    fn log_request(&self, method: &str, url: &str) {
        if self.verbose {
            println!("{} {}", method, url);
        }
    }

    fn log_response(&self, status: StatusCode, url: &str) {
        if self.verbose {
            println!("{} ({})", status, url);
        }
    }

    fn robust_request<F>(&self, mut f: F) -> Result<Response>
    where
        F: FnMut() -> std::result::Result<Response, reqwest::Error>,
    {
        let mut tries = 0usize;
        let mut sleep = Duration::from_secs(1);
        loop {
            let result = f();

            match result {
                Ok(resp) => {
                    if retriable_status(resp.status().as_u16()) {
                        tries += 1;
                        if tries >= self.retry_max {
                            return Ok(resp);
                        }
                        thread::sleep(sleep);
                        sleep = backoff(sleep, self.sleep_max);
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    tries += 1;
                    if tries >= self.retry_max {
                        return Err(err).context("could not connect")?;
                    }
                    // timeouts / transient connection errors
                    thread::sleep(sleep);
                    sleep = backoff(sleep, self.sleep_max);
                }
            }
        }
    }
}
