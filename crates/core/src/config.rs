use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::ReaderOptions;
use crate::rfv::ActionTable;

/// Anchor date of the dataset this tool was built around: 2021-12-09.
pub fn default_reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 12, 9).unwrap_or(NaiveDate::MIN)
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub scoring: ScoringConfig,
    pub input: InputConfig,
    pub actions: ActionTable,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ScoringConfig {
    pub reference_date: ReferenceDate,
    pub top_n: usize,
}

#[derive(Clone, Debug)]
pub struct InputConfig {
    pub delimiter: u8,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// "Today" for recency. A fixed date unless the operator explicitly asks for
/// the wall clock with `today`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceDate {
    Fixed(NaiveDate),
    Today,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub reference_date: Option<ReferenceDate>,
    pub top_n: Option<usize>,
    pub delimiter: Option<u8>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig {
                reference_date: ReferenceDate::Fixed(default_reference_date()),
                top_n: 10,
            },
            input: InputConfig { delimiter: b',' },
            actions: ActionTable::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl ReferenceDate {
    /// Concrete date for this run. `Today` reads the local clock.
    pub fn resolve(self) -> NaiveDate {
        match self {
            Self::Fixed(date) => date,
            Self::Today => chrono::Local::now().date_naive(),
        }
    }

    pub fn is_wall_clock(self) -> bool {
        matches!(self, Self::Today)
    }
}

impl fmt::Display for ReferenceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Today => f.write_str("today"),
        }
    }
}

impl std::str::FromStr for ReferenceDate {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("today") {
            return Ok(Self::Today);
        }

        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map(Self::Fixed).map_err(|_| {
            ConfigError::Validation(format!(
                "scoring.reference_date `{trimmed}` must be a YYYY-MM-DD date or `today`"
            ))
        })
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl InputConfig {
    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions { delimiter: self.delimiter }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file || options.config_path.is_some() {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("rfv.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(scoring) = patch.scoring {
            if let Some(reference_date) = scoring.reference_date {
                self.scoring.reference_date = reference_date.parse()?;
            }
            if let Some(top_n) = scoring.top_n {
                self.scoring.top_n = top_n;
            }
        }

        if let Some(input) = patch.input {
            if let Some(delimiter) = input.delimiter {
                self.input.delimiter = parse_delimiter("input.delimiter", &delimiter)?;
            }
        }

        if let Some(actions) = patch.actions {
            self.actions = ActionTable::from_pairs(actions)
                .map_err(|error| ConfigError::Validation(format!("actions: {error}")))?;
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RFV_REFERENCE_DATE") {
            self.scoring.reference_date = value.parse()?;
        }
        if let Some(value) = read_env("RFV_TOP_N") {
            self.scoring.top_n = parse_usize("RFV_TOP_N", &value)?;
        }
        if let Some(value) = read_env("RFV_INPUT_DELIMITER") {
            self.input.delimiter = parse_delimiter("RFV_INPUT_DELIMITER", &value)?;
        }

        let log_level = read_env("RFV_LOGGING_LEVEL").or_else(|| read_env("RFV_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("RFV_LOGGING_FORMAT").or_else(|| read_env("RFV_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(reference_date) = overrides.reference_date {
            self.scoring.reference_date = reference_date;
        }
        if let Some(top_n) = overrides.top_n {
            self.scoring.top_n = top_n;
        }
        if let Some(delimiter) = overrides.delimiter {
            self.input.delimiter = delimiter;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_scoring(&self.scoring)?;
        validate_input(&self.input)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Config file used when no explicit path is given: `rfv.toml`, then `config/rfv.toml`.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("rfv.toml"), PathBuf::from("config/rfv.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_scoring(scoring: &ScoringConfig) -> Result<(), ConfigError> {
    if scoring.top_n == 0 {
        return Err(ConfigError::Validation("scoring.top_n must be greater than zero".to_string()));
    }

    Ok(())
}

fn validate_input(input: &InputConfig) -> Result<(), ConfigError> {
    if matches!(input.delimiter, b'"' | b'\n' | b'\r') || !input.delimiter.is_ascii() {
        return Err(ConfigError::Validation(
            "input.delimiter must be a single ASCII character other than quote or newline"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Single ASCII character; `\t` and `tab` both mean a tab.
pub fn parse_delimiter(key: &str, value: &str) -> Result<u8, ConfigError> {
    let invalid = || ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() };

    if value == "\\t" || value.eq_ignore_ascii_case("tab") {
        return Ok(b'\t');
    }

    let mut bytes = value.bytes();
    match (bytes.next(), bytes.next()) {
        (Some(byte), None) if byte.is_ascii() => Ok(byte),
        _ => Err(invalid()),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    scoring: Option<ScoringPatch>,
    input: Option<InputPatch>,
    actions: Option<BTreeMap<String, String>>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    reference_date: Option<String>,
    top_n: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct InputPatch {
    delimiter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
