use std::path::PathBuf;
use std::time::Duration;

pub(crate) fn retriable_status(code: u16) -> bool {
    matches!(code, 500 | 502 | 503 | 504 | 429 | 408)
}

pub(crate) fn backoff(current: Duration, max: Duration) -> Duration {
    let next = Duration::from_secs_f64((current.as_secs_f64() * 1.5).max(1.0));
    if next > max { max } else { next }
}

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

pub(crate) fn append_query(url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let mut out = url.to_string();
    let sep = if url.contains('?') { '&' } else { '?' };
    out.push(sep);
    let mut first = true;
    for (k, v) in params {
        if !first {
            out.push('&');
        }
        first = false;
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }
    out
}

/// Turns a server-supplied file name into a relative path that cannot escape
/// the download directory. Empty, `.` and `..` components are dropped.
pub(crate) fn sanitize_file_name(name: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for part in name.split('/') {
        match part {
            "" | "." | ".." => continue,
            p => out.push(p),
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let max = Duration::from_secs(10);
        let mut d = Duration::from_secs(1);
        d = backoff(d, max);
        assert_eq!(d, Duration::from_secs_f64(1.5));
        for _ in 0..20 {
            d = backoff(d, max);
        }
        assert_eq!(d, max);
    }

    #[test]
    fn urljoin_variants() {
        assert_eq!(
            urljoin("https://app.genialis.com/", "api/sample"),
            "https://app.genialis.com/api/sample"
        );
        assert_eq!(
            urljoin("https://app.genialis.com", "/api/sample"),
            "https://app.genialis.com/api/sample"
        );
        assert_eq!(
            urljoin("https://a.example", "https://b.example/x"),
            "https://b.example/x"
        );
    }

    #[test]
    fn append_query_handles_existing_params() {
        assert_eq!(
            append_query("http://x/api/sample", &[("slug", "s1")]),
            "http://x/api/sample?slug=s1"
        );
        assert_eq!(
            append_query("http://x/api/data?entity=7", &[("status", "OK")]),
            "http://x/api/data?entity=7&status=OK"
        );
        assert_eq!(append_query("http://x/api/data", &[]), "http://x/api/data");
    }

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(
            sanitize_file_name("reads.fastq.gz"),
            Some(PathBuf::from("reads.fastq.gz"))
        );
        assert_eq!(
            sanitize_file_name("fastqc/report.html"),
            Some(PathBuf::from("fastqc/report.html"))
        );
        assert_eq!(
            sanitize_file_name("../../etc/passwd"),
            Some(PathBuf::from("etc/passwd"))
        );
        assert_eq!(sanitize_file_name("/"), None);
    }

    #[test]
    fn retriable_statuses() {
        assert!(retriable_status(503));
        assert!(retriable_status(429));
        assert!(!retriable_status(404));
        assert!(!retriable_status(200));
    }
}
