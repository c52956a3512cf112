//! Assessment configuration.
//!
//! Settings come from four layers, highest first: CLI flags, a JSON config
//! file, the `EUCA_LM_COMMAND` environment variable, and built-in defaults.
//! Resolution produces a [`ResolvedConfig`] the binary can hand straight to
//! the executor.
use crate::inference::{
    CommandInference, HttpInference, Inference, ReplayInference, DEFAULT_LM_COMMAND,
};
use crate::workflow::{ExecutorOptions, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_RETRIES};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const LM_COMMAND_ENV: &str = "EUCA_LM_COMMAND";
pub const MAX_ITERATIONS_LIMIT: u32 = 10_000;

const DEFAULT_TEMPERATURE: f64 = 0.2;
const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// On-disk configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssessConfig {
    pub schema_version: u32,
    /// Inference collaborator; when absent the env/default layers decide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderConfig>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

/// Which collaborator answers the inference steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ProviderConfig {
    /// Local LM CLI, prompt on stdin.
    Command { command: String },
    /// OpenAI-compatible chat-completions endpoint.
    Http {
        endpoint: String,
        model: String,
        /// Name of the environment variable holding the API key.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key_env: Option<String>,
        #[serde(default = "default_temperature")]
        temperature: f64,
        #[serde(default = "default_timeout_seconds")]
        timeout_seconds: u64,
    },
    /// Recorded `<phase>.json` answers.
    Replay { dir: PathBuf },
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

pub fn default_config() -> AssessConfig {
    AssessConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        provider: None,
        max_iterations: DEFAULT_MAX_ITERATIONS,
        max_retries: DEFAULT_MAX_RETRIES,
        log_filter: None,
    }
}

/// `<config_dir>/euc-assess/config.json`, whether or not it exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("euc-assess").join("config.json"))
}

pub fn load_config(path: &Path) -> Result<AssessConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: AssessConfig =
        serde_json::from_slice(&bytes).with_context(|| format!("parse config {}", path.display()))?;
    validate_config(&config).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// Validate schema version, limits, and the provider block.
pub fn validate_config(config: &AssessConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {} (expected {CONFIG_SCHEMA_VERSION})",
            config.schema_version
        ));
    }
    validate_max_iterations(config.max_iterations)?;
    if let Some(filter) = config.log_filter.as_deref() {
        if filter.trim().is_empty() {
            return Err(anyhow!("log_filter must be non-empty when set"));
        }
    }
    if let Some(provider) = &config.provider {
        validate_provider(provider)?;
    }
    Ok(())
}

fn validate_max_iterations(value: u32) -> Result<()> {
    if !(1..=MAX_ITERATIONS_LIMIT).contains(&value) {
        return Err(anyhow!(
            "max_iterations must be between 1 and {MAX_ITERATIONS_LIMIT} (got {value})"
        ));
    }
    Ok(())
}

pub fn validate_provider(provider: &ProviderConfig) -> Result<()> {
    match provider {
        ProviderConfig::Command { command } => {
            CommandInference::new(command)?;
        }
        ProviderConfig::Http {
            endpoint,
            model,
            api_key_env,
            temperature,
            timeout_seconds,
        } => {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(anyhow!(
                    "http endpoint must start with http:// or https:// (got {endpoint:?})"
                ));
            }
            if model.trim().is_empty() {
                return Err(anyhow!("http model must be non-empty"));
            }
            if api_key_env
                .as_deref()
                .is_some_and(|name| name.trim().is_empty())
            {
                return Err(anyhow!("api_key_env must be non-empty when set"));
            }
            if !temperature.is_finite() || !(0.0..=2.0).contains(temperature) {
                return Err(anyhow!(
                    "temperature must be between 0 and 2 (got {temperature})"
                ));
            }
            if *timeout_seconds == 0 {
                return Err(anyhow!("timeout_seconds must be positive"));
            }
        }
        ProviderConfig::Replay { dir } => {
            if dir.as_os_str().is_empty() {
                return Err(anyhow!("replay dir must be non-empty"));
            }
        }
    }
    Ok(())
}

/// Everything the config layers can contribute besides the defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// `--config`; must exist when given.
    pub config_path: Option<PathBuf>,
    /// Per-user config file, used only when present and `--config` is absent.
    pub user_config_path: Option<PathBuf>,
    /// Value of `EUCA_LM_COMMAND`.
    pub env_lm_command: Option<String>,
    /// `--lm`
    pub lm: Option<String>,
    /// `--responses`
    pub responses: Option<PathBuf>,
    /// `--max-iterations`
    pub max_iterations: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub provider: ProviderConfig,
    pub options: ExecutorOptions,
    pub log_filter: Option<String>,
    /// Config file that contributed, if any.
    pub source: Option<PathBuf>,
}

pub fn resolve_config(sources: &ConfigSources) -> Result<ResolvedConfig> {
    let (file, source) = match (&sources.config_path, &sources.user_config_path) {
        (Some(path), _) => (load_config(path)?, Some(path.clone())),
        (None, Some(path)) if path.is_file() => (load_config(path)?, Some(path.clone())),
        _ => (default_config(), None),
    };

    let provider = if let Some(dir) = &sources.responses {
        ProviderConfig::Replay { dir: dir.clone() }
    } else if let Some(command) = &sources.lm {
        ProviderConfig::Command {
            command: command.clone(),
        }
    } else if let Some(provider) = file.provider {
        provider
    } else if let Some(command) = sources
        .env_lm_command
        .as_deref()
        .filter(|command| !command.trim().is_empty())
    {
        ProviderConfig::Command {
            command: command.to_string(),
        }
    } else {
        ProviderConfig::Command {
            command: DEFAULT_LM_COMMAND.to_string(),
        }
    };
    validate_provider(&provider)?;

    let max_iterations = sources.max_iterations.unwrap_or(file.max_iterations);
    validate_max_iterations(max_iterations)?;

    Ok(ResolvedConfig {
        provider,
        options: ExecutorOptions {
            max_iterations,
            max_retries: file.max_retries,
        },
        log_filter: file.log_filter,
        source,
    })
}

/// Construct the collaborator a provider block describes.
///
/// Fails early for a missing LM program, a missing API key variable, or a
/// missing replay directory, so a run never starts against nothing.
pub fn build_inference(provider: &ProviderConfig) -> Result<Box<dyn Inference>> {
    match provider {
        ProviderConfig::Command { command } => {
            let inference = CommandInference::new(command)?;
            inference
                .ensure_available()
                .with_context(|| format!("LM command unavailable: {command}"))?;
            Ok(Box::new(inference))
        }
        ProviderConfig::Http {
            endpoint,
            model,
            api_key_env,
            temperature,
            timeout_seconds,
        } => {
            let api_key = match api_key_env {
                Some(name) => Some(
                    std::env::var(name).with_context(|| format!("read API key from ${name}"))?,
                ),
                None => None,
            };
            Ok(Box::new(HttpInference::new(
                endpoint.as_str(),
                model.as_str(),
                api_key,
                *temperature,
                Duration::from_secs(*timeout_seconds),
            )))
        }
        ProviderConfig::Replay { dir } => {
            if !dir.is_dir() {
                return Err(anyhow!("replay dir {} does not exist", dir.display()));
            }
            Ok(Box::new(ReplayInference::new(dir.clone())))
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
