// Configuration loader: reads the credential pair (and a few optional API
// settings) from a JSON file once at startup.

use crate::error::{ConfigError, CredentialField};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Access token plus the account whose repositories we operate on.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    account: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            account: account.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn account(&self) -> &str {
        &self.account
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("account", &self.account)
            .finish()
    }
}

/// Where and how to reach the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub api: ApiSettings,
}

/// On-disk shape. Everything is optional here so that validation can name
/// the missing field instead of surfacing a serde message.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    git_hub_token: Option<String>,
    git_hub_username: Option<String>,
    api_base_url: Option<String>,
    connect_timeout_secs: Option<u64>,
    read_timeout_secs: Option<u64>,
}

/// Read and validate the configuration at `path`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let config = validate(raw)?;
    tracing::debug!(path = %path.display(), account = %config.credentials.account(), "configuration loaded");
    Ok(config)
}

fn validate(raw: RawConfig) -> Result<Config, ConfigError> {
    let token = required(raw.git_hub_token, CredentialField::Token)?;
    let account = required(raw.git_hub_username, CredentialField::Username)?;

    let mut api = ApiSettings::default();
    if let Some(url) = raw.api_base_url {
        let url = url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                field: "apiBaseUrl",
                message: format!("expected an http(s) URL, got {:?}", url),
            });
        }
        api.base_url = url;
    }
    if let Some(secs) = raw.connect_timeout_secs {
        api.connect_timeout = timeout("connectTimeoutSecs", secs)?;
    }
    if let Some(secs) = raw.read_timeout_secs {
        api.read_timeout = timeout("readTimeoutSecs", secs)?;
    }

    Ok(Config {
        credentials: Credentials::new(token, account),
        api,
    })
}

fn required(value: Option<String>, field: CredentialField) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingCredential(field)),
    }
}

fn timeout(field: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            message: "timeout must be at least one second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// `config.json` in the working directory, or the per-user config dir copy
/// when the local one does not exist.
pub fn default_path() -> PathBuf {
    resolve_default_path(PathBuf::from(DEFAULT_CONFIG_FILE), dirs::config_dir())
}

fn resolve_default_path(local: PathBuf, config_dir: Option<PathBuf>) -> PathBuf {
    if local.exists() {
        return local;
    }
    config_dir
        .map(|dir| dir.join("hello-pr").join(DEFAULT_CONFIG_FILE))
        .filter(|candidate| candidate.exists())
        .unwrap_or(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_credentials_and_defaults() {
        let file = write_config(r#"{"gitHubToken":"ghp_abc","gitHubUsername":"octocat"}"#);
        let config = load(file.path()).unwrap();
        assert_eq!(config.credentials.token(), "ghp_abc");
        assert_eq!(config.credentials.account(), "octocat");
        assert_eq!(config.api, ApiSettings::default());
    }

    #[test]
    fn missing_token_is_reported_by_name() {
        let file = write_config(r#"{"gitHubUsername":"octocat"}"#);
        let err = load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential(CredentialField::Token)
        ));
    }

    #[test]
    fn empty_or_null_username_is_missing() {
        for json in [
            r#"{"gitHubToken":"t","gitHubUsername":""}"#,
            r#"{"gitHubToken":"t","gitHubUsername":"   "}"#,
            r#"{"gitHubToken":"t","gitHubUsername":null}"#,
        ] {
            let file = write_config(json);
            let err = load(file.path()).unwrap_err();
            assert!(
                matches!(err, ConfigError::MissingCredential(CredentialField::Username)),
                "{json}: {err}"
            );
        }
    }

    #[test]
    fn optional_api_settings_are_applied() {
        let file = write_config(
            r#"{"gitHubToken":"t","gitHubUsername":"u",
                "apiBaseUrl":"https://ghe.example.com/api/v3/",
                "connectTimeoutSecs":3,"readTimeoutSecs":7}"#,
        );
        let config = load(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.api.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.api.read_timeout, Duration::from_secs(7));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let file = write_config(r#"{"gitHubToken":"t","gitHubUsername":"u","readTimeoutSecs":0}"#);
        assert!(matches!(
            load(file.path()).unwrap_err(),
            ConfigError::InvalidValue { field: "readTimeoutSecs", .. }
        ));
    }

    #[test]
    fn unreadable_and_malformed_files_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let file = write_config("{not json");
        assert!(matches!(load(file.path()).unwrap_err(), ConfigError::Parse { .. }));
    }

    #[test]
    fn local_config_wins_over_user_config_dir() {
        let cwd = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        let local = cwd.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&local, "{}").unwrap();
        std::fs::create_dir_all(user.path().join("hello-pr")).unwrap();
        std::fs::write(user.path().join("hello-pr").join(DEFAULT_CONFIG_FILE), "{}").unwrap();

        assert_eq!(resolve_default_path(local.clone(), Some(user.path().to_path_buf())), local);
    }

    #[test]
    fn falls_back_to_user_config_dir() {
        let cwd = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        let local = cwd.path().join(DEFAULT_CONFIG_FILE);
        let fallback = user.path().join("hello-pr").join(DEFAULT_CONFIG_FILE);
        std::fs::create_dir_all(fallback.parent().unwrap()).unwrap();
        std::fs::write(&fallback, "{}").unwrap();

        assert_eq!(resolve_default_path(local, Some(user.path().to_path_buf())), fallback);
    }

    #[test]
    fn missing_everywhere_reports_the_local_path() {
        let cwd = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        let local = cwd.path().join(DEFAULT_CONFIG_FILE);

        assert_eq!(resolve_default_path(local.clone(), Some(user.path().to_path_buf())), local);
        assert_eq!(resolve_default_path(local.clone(), None), local);
    }

    #[test]
    fn debug_output_hides_the_token() {
        let creds = Credentials::new("ghp_secret", "octocat");
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("ghp_secret"));
        assert!(printed.contains("octocat"));
    }
}
