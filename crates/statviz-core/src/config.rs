//! Service configuration.
//!
//! Values are layered: built-in defaults, then a TOML file, then environment
//! variables, then command-line overrides. Each layer only replaces what it
//! sets.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use statviz_analysis::{DEFAULT_BACKEND_URL, DEFAULT_BLUP_URL, DEFAULT_NONPARAMETRIC_URL};
use statviz_assist::DEFAULT_MODEL;
use statviz_ingest::{DEFAULT_SPREADSHEET_LIMIT_BYTES, UploadPolicy};

use crate::error::{CoreError, Result};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "statviz.toml";

pub const ENV_BACKEND_URL: &str = "STATVIZ_BACKEND_URL";
pub const ENV_SPATIAL_URL: &str = "STATVIZ_SPATIAL_URL";
pub const ENV_RBD_URL: &str = "STATVIZ_RBD_URL";
pub const ENV_FRBD_URL: &str = "STATVIZ_FRBD_URL";
pub const ENV_TRANSFORM_ANALYZE_URL: &str = "STATVIZ_TRANSFORM_ANALYZE_URL";
pub const ENV_TRANSFORM_APPLY_URL: &str = "STATVIZ_TRANSFORM_APPLY_URL";
pub const ENV_NONPARAMETRIC_URL: &str = "STATVIZ_NONPARAMETRIC_URL";
pub const ENV_LMM_URL: &str = "STATVIZ_LMM_URL";
pub const ENV_BLUP_URL: &str = "STATVIZ_BLUP_URL";
pub const ENV_SURVIVAL_URL: &str = "STATVIZ_SURVIVAL_URL";
pub const ENV_PROBIT_URL: &str = "STATVIZ_PROBIT_URL";
pub const ENV_LLM_MODEL: &str = "STATVIZ_LLM_MODEL";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_LLM_TEMPERATURE: f64 = 0.3;

/// Where analysis results come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Hard-coded example results.
    Mock,
    /// POST to the statistics backend.
    #[default]
    Remote,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mock => f.write_str("mock"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub mode: BackendMode,
    pub url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::default(),
            url: DEFAULT_BACKEND_URL.to_string(),
        }
    }
}

/// URLs of the auxiliary services. Unset services are reported as not
/// configured when used; the non-parametric and BLUP services default to a
/// local instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rbd_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frbd_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform_analyze_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform_apply_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonparametric_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lmm_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blup_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survival_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probit_url: Option<String>,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            spatial_url: None,
            rbd_url: None,
            frbd_url: None,
            transform_analyze_url: None,
            transform_apply_url: None,
            nonparametric_url: Some(DEFAULT_NONPARAMETRIC_URL.to_string()),
            lmm_url: None,
            blup_url: Some(DEFAULT_BLUP_URL.to_string()),
            survival_url: None,
            probit_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f64,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Directory with the guide's markdown documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_dir: Option<PathBuf>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_LLM_TEMPERATURE,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            knowledge_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Reject spreadsheets over `max_spreadsheet_bytes`.
    pub enforce_size_limit: bool,
    pub max_spreadsheet_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enforce_size_limit: true,
            max_spreadsheet_bytes: DEFAULT_SPREADSHEET_LIMIT_BYTES,
        }
    }
}

/// Overrides taken from the command line; `None` leaves a value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub backend_mode: Option<BackendMode>,
    pub backend_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub enforce_size_limit: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub backend: BackendConfig,
    pub services: ServiceUrls,
    pub llm: LlmConfig,
    pub http: HttpConfig,
    pub upload: UploadConfig,
}

impl ServiceConfig {
    /// Parse a TOML document on top of the defaults.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| CoreError::ConfigParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Defaults plus the file layer.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in
    /// the working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_file(path)
            }
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    tracing::debug!(
                        path = %local.display(),
                        "loading config from working directory"
                    );
                    Self::from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = read(ENV_BACKEND_URL) {
            self.backend.url = url.trim().to_string();
        }
        let urls = [
            (ENV_SPATIAL_URL, &mut self.services.spatial_url),
            (ENV_RBD_URL, &mut self.services.rbd_url),
            (ENV_FRBD_URL, &mut self.services.frbd_url),
            (ENV_TRANSFORM_ANALYZE_URL, &mut self.services.transform_analyze_url),
            (ENV_TRANSFORM_APPLY_URL, &mut self.services.transform_apply_url),
            (ENV_NONPARAMETRIC_URL, &mut self.services.nonparametric_url),
            (ENV_LMM_URL, &mut self.services.lmm_url),
            (ENV_BLUP_URL, &mut self.services.blup_url),
            (ENV_SURVIVAL_URL, &mut self.services.survival_url),
            (ENV_PROBIT_URL, &mut self.services.probit_url),
        ];
        for (name, slot) in urls {
            if let Some(url) = read(name) {
                *slot = Some(url.trim().to_string());
            }
        }
        if let Some(model) = read(ENV_LLM_MODEL) {
            self.llm.model = model.trim().to_string();
        }
        if let Some(key) = read(&self.llm.api_key_env) {
            self.llm.api_key = Some(key.trim().to_string());
        }
        self.validate()
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(mode) = overrides.backend_mode {
            self.backend.mode = mode;
        }
        if let Some(url) = &overrides.backend_url {
            self.backend.url.clone_from(url);
        }
        if let Some(model) = &overrides.model {
            self.llm.model.clone_from(model);
        }
        if let Some(secs) = overrides.timeout_secs {
            self.http.timeout_secs = secs;
        }
        if let Some(enforce) = overrides.enforce_size_limit {
            self.upload.enforce_size_limit = enforce;
        }
        self.validate()
    }

    /// Full layering: file, process environment, then `overrides`.
    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        config.apply_overrides(overrides)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(CoreError::InvalidSetting {
                name: "http.timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(CoreError::InvalidSetting {
                name: "llm.temperature".to_string(),
                message: format!("{} is outside 0.0..=2.0", self.llm.temperature),
            });
        }
        if self.backend.mode == BackendMode::Remote && self.backend.url.trim().is_empty() {
            return Err(CoreError::InvalidSetting {
                name: "backend.url".to_string(),
                message: "remote mode needs a backend URL".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        if self.upload.enforce_size_limit {
            UploadPolicy::with_spreadsheet_limit(self.upload.max_spreadsheet_bytes)
        } else {
            UploadPolicy::unlimited()
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.llm
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Copy safe to print: the API key is masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.llm.api_key = copy.llm.api_key.as_deref().map(mask_secret);
        copy
    }

    /// Redacted configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.redacted()).map_err(|e| CoreError::InvalidSetting {
            name: "config".to_string(),
            message: e.to_string(),
        })
    }
}

/// Keep the last four characters of long secrets.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
