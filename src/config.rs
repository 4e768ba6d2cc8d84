use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::client::ClientConfig;

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

pub(crate) fn load_config(
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("RESOLWE_API_URL").ok());
    let mut username = username.or_else(|| std::env::var("RESOLWE_API_USERNAME").ok());
    let mut password = password.or_else(|| std::env::var("RESOLWE_API_PASSWORD").ok());

    let rc_candidates = rc_candidates();

    if url.is_none() || username.is_none() || password.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;

                if url.is_none() {
                    url = cfg.url;
                }
                if username.is_none() {
                    username = cfg.username;
                }
                if password.is_none() {
                    password = cfg.password;
                }
                break;
            }
        }
    }

    let url = match url {
        Some(v) => v,
        None => {
            if !rc_candidates.is_empty() {
                bail!(
                    "Missing configuration: url (set RESOLWE_API_URL or put `url:` in one of: {})",
                    rc_candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            bail!("Missing configuration: url (set RESOLWE_API_URL or create .resolwerc)");
        }
    };

    // Credentials are optional; a session without them reads public data only.
    Ok(ClientConfig {
        url,
        username,
        password,
    })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                continue;
            }
            match k {
                "url" => cfg.url = Some(v.to_string()),
                "username" => cfg.username = Some(v.to_string()),
                "password" => cfg.password = Some(v.to_string()),
                _ => {}
            }
        }
    }

    cfg
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order:
    // 1) RESOLWE_RC (explicit)
    // 2) ./.resolwerc (current working directory)
    // 3) ~/.resolwerc
    if let Ok(p) = std::env::var("RESOLWE_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".resolwerc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".resolwerc"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_lines() {
        let cfg = parse_rc(
            "# server\nurl: https://app.genialis.com\nusername: 'jane'\npassword: \"s3cret\"\n",
        );
        assert_eq!(cfg.url.as_deref(), Some("https://app.genialis.com"));
        assert_eq!(cfg.username.as_deref(), Some("jane"));
        assert_eq!(cfg.password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn ignores_unknown_keys_and_blank_values() {
        let cfg = parse_rc("url:\nverify: 0\npassword: hunter2\n");
        assert!(cfg.url.is_none());
        assert!(cfg.username.is_none());
        assert_eq!(cfg.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn strip_quotes_only_when_paired() {
        assert_eq!(strip_quotes("\"x\""), "x");
        assert_eq!(strip_quotes("'x'"), "x");
        assert_eq!(strip_quotes("\"x"), "\"x");
        assert_eq!(strip_quotes("x"), "x");
    }
}
