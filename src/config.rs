use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::client::ClientConfig;

/// Public USGS M2M endpoint used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://m2m.cr.usgs.gov/api/api/json/stable/";

#[derive(Debug, Default, PartialEq)]
struct RcConfig {
    url: Option<String>,
    token: Option<String>,
    verify: Option<bool>,
}

pub(crate) fn load_config(
    url: Option<String>,
    token: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    load_config_with(url, token, verify, |name| std::env::var(name).ok())
}

/// Same as [`load_config`], with environment lookups going through `env`.
/// Variables set to an empty string count as unset.
fn load_config_with(
    url: Option<String>,
    token: Option<String>,
    verify: Option<bool>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig> {
    let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    let mut url = url.or_else(|| env("M2M_API_URL"));
    let mut token = token.or_else(|| env("M2M_API_TOKEN"));

    let rc_candidates = rc_candidates(env("M2M_RC"));
    let mut file_verify: Option<bool> = None;

    if url.is_none() || token.is_none() || verify.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;

                if url.is_none() {
                    url = cfg.url;
                }
                if token.is_none() {
                    token = cfg.token;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let url = url.unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let token = match token {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => {
            if !rc_candidates.is_empty() {
                bail!(
                    "Missing configuration: token (set M2M_API_TOKEN or put `token:` in one of: {})",
                    rc_candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            bail!("Missing configuration: token (set M2M_API_TOKEN or create .m2mrc)");
        }
    };

    let verify = verify.or(file_verify).unwrap_or(true);

    Ok(ClientConfig {
        url,
        token,
        verify,
        timeout: None,
    })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // `token:` may be left empty with the value on the next line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if !looks_like_entry(line) {
                let v = strip_quotes(line);
                match pk {
                    "url" => cfg.url = Some(v.to_string()),
                    "token" => cfg.token = Some(v.to_string()),
                    _ => {}
                }
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "url" => {
                    if !v.is_empty() {
                        cfg.url = Some(v.to_string());
                    } else {
                        pending_key = Some("url");
                    }
                }
                "token" | "key" => {
                    if !v.is_empty() {
                        cfg.token = Some(v.to_string());
                    } else {
                        pending_key = Some("token");
                    }
                }
                "verify" => {
                    if !v.is_empty() {
                        cfg.verify = Some(v != "0");
                    }
                }
                _ => {}
            }
        }
    }

    cfg
}

// URLs contain a colon too, so only a known key prefix counts as a new entry.
fn looks_like_entry(line: &str) -> bool {
    line.split_once(':')
        .map(|(k, _)| matches!(k.trim(), "url" | "token" | "key" | "verify"))
        .unwrap_or(false)
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

fn rc_candidates(explicit: Option<String>) -> Vec<PathBuf> {
    // 1) M2M_RC (explicit)
    // 2) ./.m2mrc
    // 3) ~/.m2mrc
    if let Some(p) = explicit {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".m2mrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".m2mrc"));
    }
    v
}
