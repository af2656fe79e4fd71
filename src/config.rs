use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::client::ClientConfig;
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.microbiomedata.org";

const RC_FILE_NAME: &str = ".nmdcrc";

/// Contents of an `.nmdcrc` file (YAML).
#[derive(Debug, Default, PartialEq, Deserialize)]
struct RcConfig {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    verify: Option<Flag>,
}

/// `verify: false` and `verify: 0` both switch TLS verification off.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl From<Flag> for bool {
    fn from(flag: Flag) -> bool {
        match flag {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

pub(crate) fn load_config(url: Option<String>, verify: Option<bool>) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("NMDC_API_URL").ok());
    let mut file_verify: Option<bool> = None;

    if url.is_none() || verify.is_none() {
        if let Some(rc_path) = rc_candidates().into_iter().find(|p| p.exists()) {
            let cfg = read_rc(&rc_path)?;
            tracing::debug!("loaded configuration from {}", rc_path.display());

            url = url.or(cfg.url);
            file_verify = cfg.verify.map(bool::from);
        }
    }

    let url = url
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config {
            message: format!("url must start with http:// or https:// (got {})", url),
        });
    }

    let verify = verify.or(file_verify).unwrap_or(true);

    Ok(ClientConfig { url, verify })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("failed to read configuration file {}: {}", path.display(), e),
    })?;
    parse_rc(&text).map_err(|e| Error::Config {
        message: format!("invalid configuration file {}: {}", path.display(), e),
    })
}

fn parse_rc(text: &str) -> std::result::Result<RcConfig, serde_yaml::Error> {
    // A file holding only comments is an empty YAML document.
    let blank = text
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#'));
    if blank {
        return Ok(RcConfig::default());
    }
    serde_yaml::from_str(text)
}

/// `NMDC_RC` if set, otherwise `./.nmdcrc` then `~/.nmdcrc`.
fn rc_candidates() -> Vec<PathBuf> {
    match std::env::var_os("NMDC_RC") {
        Some(explicit) => vec![PathBuf::from(explicit)],
        None => [std::env::current_dir().ok(), dirs::home_dir()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(RC_FILE_NAME))
            .collect(),
    }
}
