//! Startup configuration for Triad.
//!
//! Resolution order, later wins:
//!
//! 1. Built-in defaults
//! 2. `~/.triad/config.toml` (or the file named by `TRIAD_CONFIG`)
//! 3. Process environment, after loading `.env` from the working directory
//!
//! Anything that prevents building a client is a [`ConfigError`], and the
//! binary refuses to start on it.

use serde::Deserialize;
use std::{
    env,
    path::{Path, PathBuf},
};
use thiserror::Error;

use triad_types::{
    ApiKey, AzureEndpoint, Endpoint, GenerationParams, GenerationProfile, OpenAiEndpoint,
    Provider, Temperature,
};

pub const CONFIG_PATH_ENV: &str = "TRIAD_CONFIG";
pub const PROVIDER_ENV: &str = "TRIAD_PROVIDER";

pub const AZURE_ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_DEPLOYMENT_ENV: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const AZURE_API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";
pub const AZURE_API_VERSION_ENV: &str = "AZURE_OPENAI_API_VERSION";

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("unknown provider {0:?} (expected \"azure\" or \"openai\")")]
    UnknownProvider(String),
    #[error("required configuration is missing: {}", .vars.join(", "))]
    Missing { vars: Vec<&'static str> },
    #[error("{var} must be an https:// URL, got {url:?}")]
    InsecureUrl { var: &'static str, url: String },
    #[error("[generation.{action}] temperature {value} is outside [0, 1]")]
    InvalidTemperature { action: &'static str, value: f32 },
}

/// On-disk configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct TriadConfig {
    pub app: Option<AppConfig>,
    pub azure: Option<AzureConfig>,
    pub openai: Option<OpenAIConfig>,
    pub http: Option<HttpConfig>,
    pub generation: Option<GenerationConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    pub provider: Option<String>,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
}

#[derive(Default, Deserialize)]
pub struct AzureConfig {
    pub endpoint: Option<String>,
    pub deployment: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Default, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

/// Per-action overrides. Unset fields keep the built-in defaults.
#[derive(Debug, Default, Deserialize)]
pub struct GenerationConfig {
    pub methods: Option<ParamsConfig>,
    pub followup: Option<ParamsConfig>,
    pub chat: Option<ParamsConfig>,
    pub practice_problem: Option<ParamsConfig>,
    pub practice_feedback: Option<ParamsConfig>,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct ParamsConfig {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Transport settings handed to the HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Everything the application needs, fully validated.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: Endpoint,
    pub generation: GenerationProfile,
    pub http: HttpSettings,
    pub high_contrast: bool,
}

/// Expand `${VAR}` references using `lookup`. Unknown variables expand to "".
pub fn expand_env_vars_with(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&lookup(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Expand `${VAR}` references from the process environment.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    expand_env_vars_with(value, &|name| env::var(name).ok())
}

/// Default config file location.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = env::var(CONFIG_PATH_ENV)
        && !explicit.trim().is_empty()
    {
        return Some(PathBuf::from(explicit));
    }
    dirs::home_dir().map(|home| home.join(".triad").join("config.toml"))
}

/// Load `.env` from the working directory. Already-set variables win.
///
/// Runs before logging is set up (so `.env` can carry `RUST_LOG` and
/// `TRIAD_CONFIG`); the caller logs the outcome. A missing file is `Ok(None)`.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Load a specific env file. Already-set variables win.
pub fn load_dotenv_from(path: &Path) -> Result<PathBuf, dotenvy::Error> {
    dotenvy::from_path(path).map(|()| path.to_path_buf())
}

impl TriadConfig {
    /// Load the config file. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(path).map(Some)
    }

    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded config file");
                Ok(config)
            }
            Err(source) => Err(ConfigError::Parse { path, source }),
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

/// Layer the environment over the file and validate.
pub fn resolve(
    file: Option<&TriadConfig>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig, ConfigError> {
    let empty = TriadConfig::default();
    let file = file.unwrap_or(&empty);

    // env first, then the (expanded) file value; blank counts as unset at each layer
    let non_blank = |v: String| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    };
    let pick = |env_name: &str, file_value: Option<&String>| -> Option<String> {
        lookup(env_name).and_then(non_blank).or_else(|| {
            file_value
                .map(|raw| expand_env_vars_with(raw, lookup))
                .and_then(non_blank)
        })
    };

    let app = file.app.as_ref();
    let provider = match pick(PROVIDER_ENV, app.and_then(|a| a.provider.as_ref())) {
        None => Provider::default(),
        Some(raw) => Provider::parse(&raw).ok_or(ConfigError::UnknownProvider(raw))?,
    };

    let endpoint = match provider {
        Provider::Azure => {
            let azure = file.azure.as_ref();
            let endpoint = pick(AZURE_ENDPOINT_ENV, azure.and_then(|a| a.endpoint.as_ref()));
            let deployment = pick(AZURE_DEPLOYMENT_ENV, azure.and_then(|a| a.deployment.as_ref()));
            let api_key = pick(AZURE_API_KEY_ENV, azure.and_then(|a| a.api_key.as_ref()));
            let api_version =
                pick(AZURE_API_VERSION_ENV, azure.and_then(|a| a.api_version.as_ref()));

            match (endpoint, deployment, api_key, api_version) {
                (Some(endpoint), Some(deployment), Some(api_key), Some(api_version)) => {
                    require_https(AZURE_ENDPOINT_ENV, &endpoint)?;
                    Endpoint::Azure(AzureEndpoint {
                        endpoint,
                        deployment,
                        api_version,
                        api_key: ApiKey::new(api_key),
                    })
                }
                (endpoint, deployment, api_key, api_version) => {
                    let vars = [
                        (endpoint.is_none(), AZURE_ENDPOINT_ENV),
                        (deployment.is_none(), AZURE_DEPLOYMENT_ENV),
                        (api_key.is_none(), AZURE_API_KEY_ENV),
                        (api_version.is_none(), AZURE_API_VERSION_ENV),
                    ]
                    .into_iter()
                    .filter_map(|(missing, name)| missing.then_some(name))
                    .collect();
                    return Err(ConfigError::Missing { vars });
                }
            }
        }
        Provider::OpenAI => {
            let openai = file.openai.as_ref();
            let Some(api_key) = pick(OPENAI_API_KEY_ENV, openai.and_then(|o| o.api_key.as_ref()))
            else {
                return Err(ConfigError::Missing {
                    vars: vec![OPENAI_API_KEY_ENV],
                });
            };
            let base_url = pick(OPENAI_BASE_URL_ENV, openai.and_then(|o| o.base_url.as_ref()))
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
            require_https(OPENAI_BASE_URL_ENV, &base_url)?;
            Endpoint::OpenAI(OpenAiEndpoint {
                base_url,
                model: pick(OPENAI_MODEL_ENV, openai.and_then(|o| o.model.as_ref()))
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                api_key: ApiKey::new(api_key),
            })
        }
    };

    let http = file.http.as_ref().map_or_else(HttpSettings::default, |h| {
        let defaults = HttpSettings::default();
        HttpSettings {
            timeout_secs: h.timeout_secs.filter(|s| *s > 0).unwrap_or(defaults.timeout_secs),
            max_retries: h.max_retries.unwrap_or(defaults.max_retries),
        }
    });

    Ok(ResolvedConfig {
        endpoint,
        generation: resolve_generation(file.generation.as_ref())?,
        http,
        high_contrast: app.is_some_and(|a| a.high_contrast),
    })
}

/// The HTTP client refuses plain http, so catch it here with a readable error.
fn require_https(var: &'static str, url: &str) -> Result<(), ConfigError> {
    let scheme_ok = url
        .get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"));
    if scheme_ok {
        Ok(())
    } else {
        Err(ConfigError::InsecureUrl {
            var,
            url: url.to_string(),
        })
    }
}

/// [`resolve`] against the process environment.
pub fn resolve_from_env(file: Option<&TriadConfig>) -> Result<ResolvedConfig, ConfigError> {
    resolve(file, &|name| env::var(name).ok())
}

fn resolve_generation(config: Option<&GenerationConfig>) -> Result<GenerationProfile, ConfigError> {
    let defaults = GenerationProfile::default();
    let Some(config) = config else {
        return Ok(defaults);
    };

    let apply = |action: &'static str,
                 base: GenerationParams,
                 overrides: Option<ParamsConfig>|
     -> Result<GenerationParams, ConfigError> {
        let Some(overrides) = overrides else {
            return Ok(base);
        };
        let temperature = match overrides.temperature {
            None => base.temperature,
            Some(value) => Temperature::new(value)
                .map_err(|_| ConfigError::InvalidTemperature { action, value })?,
        };
        Ok(GenerationParams::new(
            overrides.max_tokens.unwrap_or(base.max_output_tokens),
            temperature,
        ))
    };

    Ok(GenerationProfile {
        methods: apply("methods", defaults.methods, config.methods)?,
        followup: apply("followup", defaults.followup, config.followup)?,
        chat: apply("chat", defaults.chat, config.chat)?,
        practice_problem: apply(
            "practice_problem",
            defaults.practice_problem,
            config.practice_problem,
        )?,
        practice_feedback: apply(
            "practice_feedback",
            defaults.practice_feedback,
            config.practice_feedback,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        AZURE_API_KEY_ENV, AZURE_API_VERSION_ENV, AZURE_DEPLOYMENT_ENV, AZURE_ENDPOINT_ENV,
        ConfigError, OPENAI_BASE_URL_ENV, TriadConfig, expand_env_vars_with, load_dotenv_from,
        resolve,
    };
    use std::collections::HashMap;
    use std::io::Write;
    use triad_types::{Endpoint, Provider};

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn full_azure_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (AZURE_ENDPOINT_ENV, "https://res.openai.azure.com"),
            (AZURE_DEPLOYMENT_ENV, "gpt4o"),
            (AZURE_API_KEY_ENV, "secret"),
            (AZURE_API_VERSION_ENV, "2024-06-01"),
        ]
    }

    #[test]
    fn expands_known_and_unknown_vars() {
        let lookup = env_of(&[("KEY", "abc")]);
        assert_eq!(expand_env_vars_with("x-${KEY}-y", &lookup), "x-abc-y");
        assert_eq!(expand_env_vars_with("${MISSING}", &lookup), "");
        assert_eq!(expand_env_vars_with("open ${KEY", &lookup), "open ${KEY");
        assert_eq!(expand_env_vars_with("手法${KEY}", &lookup), "手法abc");
    }

    #[test]
    fn azure_from_environment() {
        let resolved = resolve(None, &env_of(&full_azure_env())).unwrap();
        assert_eq!(resolved.endpoint.provider(), Provider::Azure);
        match resolved.endpoint {
            Endpoint::Azure(azure) => {
                assert_eq!(azure.deployment, "gpt4o");
                assert_eq!(azure.api_key.expose_secret(), "secret");
            }
            Endpoint::OpenAI(_) => panic!("expected azure"),
        }
        assert_eq!(resolved.http.max_retries, 2);
        assert_eq!(resolved.generation.methods.max_output_tokens, 1000);
    }

    #[test]
    fn missing_azure_vars_are_all_listed() {
        let err = resolve(None, &env_of(&[(AZURE_DEPLOYMENT_ENV, "gpt4o")])).unwrap_err();
        match err {
            ConfigError::Missing { vars } => assert_eq!(
                vars,
                vec![AZURE_ENDPOINT_ENV, AZURE_API_KEY_ENV, AZURE_API_VERSION_ENV]
            ),
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut pairs = full_azure_env();
        pairs[2] = (AZURE_API_KEY_ENV, "   ");
        let err = resolve(None, &env_of(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { vars } if vars == vec![AZURE_API_KEY_ENV]));
    }

    #[test]
    fn blank_env_falls_back_to_file() {
        let file: TriadConfig = toml::from_str(
            r#"
            [azure]
            endpoint = "https://from-file.openai.azure.com"
            deployment = "file-dep"
            api_key = "file-key"
            api_version = "2024-02-01"
            "#,
        )
        .unwrap();

        let lookup = env_of(&[(AZURE_API_KEY_ENV, ""), (AZURE_DEPLOYMENT_ENV, "  ")]);
        let resolved = resolve(Some(&file), &lookup).unwrap();
        match resolved.endpoint {
            Endpoint::Azure(azure) => {
                assert_eq!(azure.api_key.expose_secret(), "file-key");
                assert_eq!(azure.deployment, "file-dep");
            }
            Endpoint::OpenAI(_) => panic!("expected azure"),
        }
    }

    #[test]
    fn plain_http_urls_are_rejected() {
        let lookup = env_of(&[
            ("TRIAD_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-1"),
            (OPENAI_BASE_URL_ENV, "http://localhost:8080/v1"),
        ]);
        let err = resolve(None, &lookup).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InsecureUrl { var: OPENAI_BASE_URL_ENV, ref url } if url == "http://localhost:8080/v1"
        ));
        assert!(err.to_string().contains("https://"));

        let mut pairs = full_azure_env();
        pairs[0] = (AZURE_ENDPOINT_ENV, "http://res.openai.azure.com");
        let err = resolve(None, &env_of(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureUrl { var: AZURE_ENDPOINT_ENV, .. }));

        let lookup = env_of(&[
            ("TRIAD_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-1"),
            (OPENAI_BASE_URL_ENV, "HTTPS://proxy.example.com/v1"),
        ]);
        assert!(resolve(None, &lookup).is_ok());
    }

    #[test]
    fn env_file_is_loaded_from_a_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "TRIAD_DOTENV_LOAD_CHECK=from-dotenv").unwrap();
        let loaded = load_dotenv_from(file.path()).unwrap();
        assert_eq!(loaded, file.path());
        assert_eq!(
            std::env::var("TRIAD_DOTENV_LOAD_CHECK").as_deref(),
            Ok("from-dotenv")
        );
    }

    #[test]
    fn file_values_expand_and_env_overrides() {
        let file: TriadConfig = toml::from_str(
            r#"
            [azure]
            endpoint = "https://from-file.openai.azure.com"
            deployment = "file-dep"
            api_key = "${MY_KEY}"
            api_version = "2024-02-01"

            [http]
            timeout_secs = 30
            max_retries = 0

            [generation.chat]
            max_tokens = 500
            "#,
        )
        .unwrap();

        let lookup = env_of(&[("MY_KEY", "expanded"), (AZURE_DEPLOYMENT_ENV, "env-dep")]);
        let resolved = resolve(Some(&file), &lookup).unwrap();
        match &resolved.endpoint {
            Endpoint::Azure(azure) => {
                assert_eq!(azure.endpoint, "https://from-file.openai.azure.com");
                assert_eq!(azure.deployment, "env-dep");
                assert_eq!(azure.api_key.expose_secret(), "expanded");
            }
            Endpoint::OpenAI(_) => panic!("expected azure"),
        }
        assert_eq!(resolved.http.timeout_secs, 30);
        assert_eq!(resolved.http.max_retries, 0);
        assert_eq!(resolved.generation.chat.max_output_tokens, 500);
        assert_eq!(
            resolved.generation.chat.temperature,
            resolved.generation.methods.temperature
        );
    }

    #[test]
    fn openai_provider_uses_defaults() {
        let lookup = env_of(&[("TRIAD_PROVIDER", "openai"), ("OPENAI_API_KEY", "sk-1")]);
        let resolved = resolve(None, &lookup).unwrap();
        match resolved.endpoint {
            Endpoint::OpenAI(openai) => {
                assert_eq!(openai.base_url, "https://api.openai.com/v1");
                assert_eq!(openai.model, "gpt-4o-mini");
            }
            Endpoint::Azure(_) => panic!("expected openai"),
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = resolve(None, &env_of(&[("TRIAD_PROVIDER", "claude")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider(p) if p == "claude"));
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let file: TriadConfig = toml::from_str(
            r#"
            [generation.followup]
            temperature = 1.5
            "#,
        )
        .unwrap();
        let err = resolve(Some(&file), &env_of(&full_azure_env())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTemperature {
                action: "followup",
                ..
            }
        ));
    }

    #[test]
    fn load_from_reports_parse_errors_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[app\nprovider = ").unwrap();
        let err = TriadConfig::load_from(file.path().to_path_buf()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn load_from_reads_app_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[app]\nprovider = \"openai\"\nhigh_contrast = true").unwrap();
        let config = TriadConfig::load_from(file.path().to_path_buf()).unwrap();
        let app = config.app.unwrap();
        assert_eq!(app.provider.as_deref(), Some("openai"));
        assert!(app.high_contrast);
    }

    #[test]
    fn azure_config_debug_redacts_key() {
        let file: TriadConfig = toml::from_str("[azure]\napi_key = \"hunter2\"").unwrap();
        let debug = format!("{:?}", file.azure.unwrap());
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }
}
