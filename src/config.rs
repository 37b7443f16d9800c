// src/config.rs

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::debug;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://serpapi.com/search";
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_CREDENTIALS_FILE: &str = "google_creds.json";
pub const DEFAULT_RESULT_COUNT: u32 = 10;

static SHEET_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("sheet url regex"));

/// Everything a run needs, built once at start-up and handed to each component.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub serpapi_key: String,
    pub search_endpoint: String,
    pub result_count: u32,
    pub sheet_id: String,
    pub credentials_path: PathBuf,
    pub sheets_endpoint: String,
}

/// Partial settings from one source. Later sources override earlier ones field by field.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub serpapi_key: Option<String>,
    pub search_endpoint: Option<String>,
    pub result_count: Option<u32>,
    pub sheet_id: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub sheets_endpoint: Option<String>,
}

impl ConfigLayer {
    /// Read a YAML settings file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Settings from environment variables, looked up through `get`.
    pub fn from_env_with<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let result_count = match get("SERPAPI_RESULT_COUNT") {
            Some(raw) => Some(raw.trim().parse::<u32>().with_context(|| {
                format!("SERPAPI_RESULT_COUNT must be a number, got `{}`", raw)
            })?),
            None => None,
        };
        Ok(Self {
            serpapi_key: get("SERPAPI_KEY"),
            search_endpoint: get("SERPAPI_ENDPOINT"),
            result_count,
            sheet_id: get("GOOGLE_SHEET_ID"),
            credentials_path: get("GOOGLE_CREDENTIALS_FILE").map(PathBuf::from),
            sheets_endpoint: get("GOOGLE_SHEETS_ENDPOINT"),
        })
    }

    /// Settings from the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self> {
        check_dotenv(dotenvy::dotenv())?;
        Self::from_env_with(|k| env::var(k).ok().filter(|v| !v.is_empty()))
    }

    /// Overlay `other` on top of `self`.
    pub fn merge(self, other: ConfigLayer) -> Self {
        Self {
            serpapi_key: other.serpapi_key.or(self.serpapi_key),
            search_endpoint: other.search_endpoint.or(self.search_endpoint),
            result_count: other.result_count.or(self.result_count),
            sheet_id: other.sheet_id.or(self.sheet_id),
            credentials_path: other.credentials_path.or(self.credentials_path),
            sheets_endpoint: other.sheets_endpoint.or(self.sheets_endpoint),
        }
    }
}

impl Config {
    /// Fill defaults and check required fields.
    pub fn from_layer(layer: ConfigLayer) -> Result<Self> {
        let serpapi_key = match layer.serpapi_key {
            Some(k) if !k.trim().is_empty() => k,
            _ => bail!("missing SerpApi key (set SERPAPI_KEY or --api-key)"),
        };
        let sheet_id = match layer.sheet_id {
            Some(s) if !s.trim().is_empty() => parse_sheet_id(&s)?,
            _ => bail!("missing spreadsheet id (set GOOGLE_SHEET_ID or --sheet)"),
        };
        let result_count = layer.result_count.unwrap_or(DEFAULT_RESULT_COUNT);
        if result_count == 0 {
            bail!("result count must be at least 1");
        }

        Ok(Self {
            serpapi_key,
            search_endpoint: layer
                .search_endpoint
                .unwrap_or_else(|| DEFAULT_SEARCH_ENDPOINT.to_string()),
            result_count,
            sheet_id,
            credentials_path: layer
                .credentials_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE)),
            sheets_endpoint: layer
                .sheets_endpoint
                .unwrap_or_else(|| DEFAULT_SHEETS_ENDPOINT.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// A missing `.env` is normal; an unreadable or malformed one is an error.
fn check_dotenv(loaded: dotenvy::Result<PathBuf>) -> Result<()> {
    match loaded {
        Ok(path) => {
            debug!(path = %path.display(), "loaded .env");
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("loading .env"),
    }
}

/// Accept either a bare spreadsheet id or a full `docs.google.com` URL.
pub fn parse_sheet_id(input: &str) -> Result<String> {
    let input = input.trim();
    if input.starts_with("http://") || input.starts_with("https://") {
        let url = url::Url::parse(input).with_context(|| format!("parsing sheet URL {}", input))?;
        return match SHEET_URL_RE.captures(url.path()) {
            Some(caps) => Ok(caps[1].to_string()),
            None => bail!("no spreadsheet id in URL {}", input),
        };
    }
    if input.contains('/') {
        bail!("`{}` is neither a spreadsheet id nor a URL", input);
    }
    Ok(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn test_defaults_fill_in() {
        let layer = ConfigLayer {
            serpapi_key: Some("key".into()),
            sheet_id: Some("abc123".into()),
            ..Default::default()
        };
        let cfg = Config::from_layer(layer).unwrap();
        assert_eq!(cfg.search_endpoint, DEFAULT_SEARCH_ENDPOINT);
        assert_eq!(cfg.result_count, 10);
        assert_eq!(cfg.credentials_path, PathBuf::from("google_creds.json"));
        assert_eq!(cfg.sheets_endpoint, DEFAULT_SHEETS_ENDPOINT);
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let layer = ConfigLayer {
            sheet_id: Some("abc".into()),
            ..Default::default()
        };
        let err = Config::from_layer(layer).unwrap_err();
        assert!(err.to_string().contains("SerpApi key"));
    }

    #[test]
    fn test_precedence_file_env_flags() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "serpapi_key: from-file\n\
             sheet_id: file-sheet\n\
             result_count: 5\n\
             credentials_path: /etc/creds.json"
        )
        .unwrap();

        let from_file = ConfigLayer::from_yaml_file(file.path()).unwrap();
        let from_env = ConfigLayer::from_env_with(env_of(&[
            ("SERPAPI_KEY", "from-env"),
            ("SERPAPI_RESULT_COUNT", "20"),
        ]))
        .unwrap();
        let from_flags = ConfigLayer {
            result_count: Some(3),
            ..Default::default()
        };

        let cfg = Config::from_layer(
            ConfigLayer::default()
                .merge(from_file)
                .merge(from_env)
                .merge(from_flags),
        )
        .unwrap();

        assert_eq!(cfg.serpapi_key, "from-env");
        assert_eq!(cfg.sheet_id, "file-sheet");
        assert_eq!(cfg.result_count, 3);
        assert_eq!(cfg.credentials_path, PathBuf::from("/etc/creds.json"));
    }

    #[test]
    fn test_unknown_yaml_key_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "serpapi_kye: typo").unwrap();
        assert!(ConfigLayer::from_yaml_file(file.path()).is_err());
    }

    #[test]
    fn test_bad_result_count_env() {
        let err =
            ConfigLayer::from_env_with(env_of(&[("SERPAPI_RESULT_COUNT", "ten")])).unwrap_err();
        assert!(err.to_string().contains("SERPAPI_RESULT_COUNT"));
    }

    #[test]
    fn test_missing_dotenv_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        assert!(check_dotenv(dotenvy::from_path(&path).map(|_| path.clone())).is_ok());
    }

    #[test]
    fn test_malformed_dotenv_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "LOCALSCRAPER_TEST_VAR='never closed").unwrap();
        let path = file.path().to_path_buf();

        let err = check_dotenv(dotenvy::from_path(&path).map(|_| path.clone())).unwrap_err();
        assert!(format!("{:#}", err).contains("loading .env"));
    }

    #[test]
    fn test_parse_sheet_id() {
        assert_eq!(parse_sheet_id("1AbC_d-9").unwrap(), "1AbC_d-9");
        assert_eq!(
            parse_sheet_id("https://docs.google.com/spreadsheets/d/1AbC_d-9/edit#gid=0").unwrap(),
            "1AbC_d-9"
        );
        assert!(parse_sheet_id("https://example.com/nothing/here").is_err());
        assert!(parse_sheet_id("a/b").is_err());
    }
}
