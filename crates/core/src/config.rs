use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/1zzf4ax_H2WiTBVrJigGjF2Q3Yz-qy2qMCbAMKvl6VE/export?format=csv&gid=1438203274";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub ga4: Ga4Config,
    pub seo: SeoConfig,
    pub routing: RoutingConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct Ga4Config {
    pub credentials_path: PathBuf,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SeoConfig {
    pub sheet_url: String,
    pub timeout_secs: u64,
    pub max_rows: usize,
    pub sample_rows: usize,
}

#[derive(Clone, Debug)]
pub struct RoutingConfig {
    pub analytics_url: String,
    pub seo_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub role: ServiceRole,
    pub bind_address: String,
    pub port: Option<u16>,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRole {
    Orchestrator,
    Analytics,
    Seo,
}

impl ServiceRole {
    pub fn default_port(self) -> u16 {
        match self {
            Self::Orchestrator => 8080,
            Self::Analytics => 8001,
            Self::Seo => 8002,
        }
    }

    pub fn service_name(self) -> &'static str {
        match self {
            Self::Orchestrator => "orchestrator",
            Self::Analytics => "analytics_agent",
            Self::Seo => "seo_agent",
        }
    }
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
    pub role: Option<ServiceRole>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub ga4_credentials_path: Option<PathBuf>,
    pub seo_sheet_url: Option<String>,
    pub analytics_url: Option<String>,
    pub seo_url: Option<String>,
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
            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                temperature: 0.0,
                timeout_secs: 60,
            },
            ga4: Ga4Config {
                credentials_path: PathBuf::from("credentials.json"),
                api_base_url: "https://analyticsdata.googleapis.com".to_string(),
                timeout_secs: 30,
            },
            seo: SeoConfig {
                sheet_url: DEFAULT_SHEET_URL.to_string(),
                timeout_secs: 30,
                max_rows: 20,
                sample_rows: 5,
            },
            routing: RoutingConfig {
                analytics_url: "http://localhost:8001".to_string(),
                seo_url: "http://localhost:8002".to_string(),
                timeout_secs: 120,
            },
            server: ServerConfig {
                role: ServiceRole::Orchestrator,
                bind_address: "0.0.0.0".to_string(),
                port: None,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for ServiceRole {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "orchestrator" => Ok(Self::Orchestrator),
            "analytics" | "analytics_agent" => Ok(Self::Analytics),
            "seo" | "seo_agent" => Ok(Self::Seo),
            other => Err(ConfigError::Validation(format!(
                "unsupported service role `{other}` (expected orchestrator|analytics|seo)"
            ))),
        }
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

impl ServerConfig {
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.role.default_port())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.effective_port())
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("querylane.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(SecretString::from(llm_api_key_value));
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(ga4) = patch.ga4 {
            if let Some(credentials_path) = ga4.credentials_path {
                self.ga4.credentials_path = credentials_path;
            }
            if let Some(api_base_url) = ga4.api_base_url {
                self.ga4.api_base_url = api_base_url;
            }
            if let Some(timeout_secs) = ga4.timeout_secs {
                self.ga4.timeout_secs = timeout_secs;
            }
        }

        if let Some(seo) = patch.seo {
            if let Some(sheet_url) = seo.sheet_url {
                self.seo.sheet_url = sheet_url;
            }
            if let Some(timeout_secs) = seo.timeout_secs {
                self.seo.timeout_secs = timeout_secs;
            }
            if let Some(max_rows) = seo.max_rows {
                self.seo.max_rows = max_rows;
            }
            if let Some(sample_rows) = seo.sample_rows {
                self.seo.sample_rows = sample_rows;
            }
        }

        if let Some(routing) = patch.routing {
            if let Some(analytics_url) = routing.analytics_url {
                self.routing.analytics_url = analytics_url;
            }
            if let Some(seo_url) = routing.seo_url {
                self.routing.seo_url = seo_url;
            }
            if let Some(timeout_secs) = routing.timeout_secs {
                self.routing.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(role) = server.role {
                self.server.role = role;
            }
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = Some(port);
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUERYLANE_LLM_BASE_URL").or_else(|| read_env("LLM_BASE_URL"))
        {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("QUERYLANE_LLM_API_KEY").or_else(|| read_env("LLM_API_KEY")) {
            self.llm.api_key = Some(SecretString::from(value));
        }
        if let Some(value) = read_env("QUERYLANE_LLM_MODEL").or_else(|| read_env("LLM_MODEL")) {
            self.llm.model = value;
        }
        if let Some(value) = read_env("QUERYLANE_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("QUERYLANE_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("QUERYLANE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("QUERYLANE_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("QUERYLANE_GA4_CREDENTIALS_PATH") {
            self.ga4.credentials_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("QUERYLANE_GA4_API_BASE_URL") {
            self.ga4.api_base_url = value;
        }
        if let Some(value) = read_env("QUERYLANE_GA4_TIMEOUT_SECS") {
            self.ga4.timeout_secs = parse_u64("QUERYLANE_GA4_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("QUERYLANE_SEO_SHEET_URL") {
            self.seo.sheet_url = value;
        }
        if let Some(value) = read_env("QUERYLANE_SEO_TIMEOUT_SECS") {
            self.seo.timeout_secs = parse_u64("QUERYLANE_SEO_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("QUERYLANE_SEO_MAX_ROWS") {
            self.seo.max_rows = parse_usize("QUERYLANE_SEO_MAX_ROWS", &value)?;
        }
        if let Some(value) = read_env("QUERYLANE_SEO_SAMPLE_ROWS") {
            self.seo.sample_rows = parse_usize("QUERYLANE_SEO_SAMPLE_ROWS", &value)?;
        }

        if let Some(value) = read_env("QUERYLANE_ROUTING_ANALYTICS_URL") {
            self.routing.analytics_url = value;
        }
        if let Some(value) = read_env("QUERYLANE_ROUTING_SEO_URL") {
            self.routing.seo_url = value;
        }
        if let Some(value) = read_env("QUERYLANE_ROUTING_TIMEOUT_SECS") {
            self.routing.timeout_secs = parse_u64("QUERYLANE_ROUTING_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("QUERYLANE_SERVER_ROLE") {
            self.server.role = value.parse()?;
        }
        if let Some(value) = read_env("QUERYLANE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("QUERYLANE_SERVER_PORT") {
            self.server.port = Some(parse_u16("QUERYLANE_SERVER_PORT", &value)?);
        }
        if let Some(value) = read_env("QUERYLANE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("QUERYLANE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("QUERYLANE_LOGGING_LEVEL").or_else(|| read_env("QUERYLANE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUERYLANE_LOGGING_FORMAT").or_else(|| read_env("QUERYLANE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(role) = overrides.role {
            self.server.role = role;
        }
        if let Some(port) = overrides.port {
            self.server.port = Some(port);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(credentials_path) = overrides.ga4_credentials_path {
            self.ga4.credentials_path = credentials_path;
        }
        if let Some(sheet_url) = overrides.seo_sheet_url {
            self.seo.sheet_url = sheet_url;
        }
        if let Some(analytics_url) = overrides.analytics_url {
            self.routing.analytics_url = analytics_url;
        }
        if let Some(seo_url) = overrides.seo_url {
            self.routing.seo_url = seo_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_ga4(&self.ga4)?;
        validate_seo(&self.seo)?;
        validate_routing(&self.routing)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("querylane.toml"), PathBuf::from("config/querylane.toml")]
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

fn require_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{key} must start with http:// or https://")))
    }
}

fn require_timeout(key: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{key} must be in range 1..=300")));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    require_http_url("llm.base_url", &llm.base_url)?;
    require_timeout("llm.timeout_secs", llm.timeout_secs)?;

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }
    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_ga4(ga4: &Ga4Config) -> Result<(), ConfigError> {
    if ga4.credentials_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("ga4.credentials_path must not be empty".to_string()));
    }
    require_http_url("ga4.api_base_url", &ga4.api_base_url)?;
    require_timeout("ga4.timeout_secs", ga4.timeout_secs)
}

fn validate_seo(seo: &SeoConfig) -> Result<(), ConfigError> {
    require_http_url("seo.sheet_url", &seo.sheet_url)?;
    require_timeout("seo.timeout_secs", seo.timeout_secs)?;

    if seo.max_rows == 0 {
        return Err(ConfigError::Validation("seo.max_rows must be greater than zero".to_string()));
    }
    if seo.sample_rows == 0 {
        return Err(ConfigError::Validation(
            "seo.sample_rows must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_routing(routing: &RoutingConfig) -> Result<(), ConfigError> {
    require_http_url("routing.analytics_url", &routing.analytics_url)?;
    require_http_url("routing.seo_url", &routing.seo_url)?;
    require_timeout("routing.timeout_secs", routing.timeout_secs)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == Some(0) {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
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

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    ga4: Option<Ga4Patch>,
    seo: Option<SeoPatch>,
    routing: Option<RoutingPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct Ga4Patch {
    credentials_path: Option<PathBuf>,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SeoPatch {
    sheet_url: Option<String>,
    timeout_secs: Option<u64>,
    max_rows: Option<usize>,
    sample_rows: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RoutingPatch {
    analytics_url: Option<String>,
    seo_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    role: Option<ServiceRole>,
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
