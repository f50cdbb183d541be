use std::{env, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Http,
    File,
    Simulate,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Http => "http",
            SourceType::File => "file",
            SourceType::Simulate => "simulate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "http" => Some(SourceType::Http),
            "file" => Some(SourceType::File),
            "simulate" => Some(SourceType::Simulate),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the delta endpoint
    pub base_url: String,

    pub source: SourceType,

    /// JSON file read by the file source
    pub delta_file: PathBuf,

    pub poll_interval: Duration,

    /// Hits older than this are evicted
    pub retention: chrono::Duration,

    pub http_timeout: Duration,

    /// Log cycle summaries instead of drawing the TUI
    pub headless: bool,

    pub sim_app_name: String,

    pub sim_max_gears: usize,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `HITSCOPE_URL` (default: http://localhost:8080)
    /// - `HITSCOPE_SOURCE` (default: http) - http, file or simulate
    /// - `HITSCOPE_DELTA_FILE` (default: delta.json)
    /// - `POLL_INTERVAL_SECS` (default: 1)
    /// - `RETENTION_MINUTES` (default: 5)
    /// - `HTTP_TIMEOUT_SECS` (default: 5)
    /// - `HITSCOPE_HEADLESS` (default: false)
    /// - `SIM_APP_NAME` (default: scaledemo)
    /// - `SIM_MAX_GEARS` (default: 4)
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("HITSCOPE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "HITSCOPE_URL must start with http:// or https://".to_string(),
            ));
        }

        let source_str = env::var("HITSCOPE_SOURCE").unwrap_or_else(|_| "http".to_string());
        let source = match SourceType::from_str(&source_str) {
            Some(source) => source,
            None => {
                log::warn!("Invalid HITSCOPE_SOURCE '{}', defaulting to http", source_str);
                SourceType::Http
            }
        };

        let delta_file = env::var("HITSCOPE_DELTA_FILE")
            .unwrap_or_else(|_| "delta.json".to_string())
            .into();

        let poll_interval_secs = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(1);

        let retention_minutes = env::var("RETENTION_MINUTES")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|minutes| *minutes > 0)
            .unwrap_or(5);
        let retention = chrono::Duration::try_minutes(retention_minutes).ok_or_else(|| {
            ConfigError::InvalidValue(format!("RETENTION_MINUTES {} is out of range", retention_minutes))
        })?;

        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(5);

        let headless = env::var("HITSCOPE_HEADLESS")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            .parse::<bool>()
            .unwrap_or(false);

        let sim_app_name = env::var("SIM_APP_NAME").unwrap_or_else(|_| "scaledemo".to_string());

        let sim_max_gears = env::var("SIM_MAX_GEARS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|gears| *gears > 0)
            .unwrap_or(4);

        Ok(Self {
            base_url,
            source,
            delta_file,
            poll_interval: Duration::from_secs(poll_interval_secs),
            retention,
            http_timeout: Duration::from_secs(http_timeout_secs),
            headless,
            sim_app_name,
            sim_max_gears,
        })
    }

    /// Apply `--source <http|file|simulate>` and `--headless` from the command line
    pub fn apply_args(&mut self, args: &[String]) -> Result<(), ConfigError> {
        if let Some(idx) = args.iter().position(|x| x == "--source") {
            let value = args
                .get(idx + 1)
                .ok_or_else(|| ConfigError::MissingVariable("--source <http|file|simulate>".to_string()))?;
            self.source = SourceType::from_str(value)
                .ok_or_else(|| ConfigError::InvalidValue(format!("unknown source '{}'", value)))?;
        }

        if args.iter().any(|x| x == "--headless") {
            self.headless = true;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 9] = [
        "HITSCOPE_URL",
        "HITSCOPE_SOURCE",
        "HITSCOPE_DELTA_FILE",
        "POLL_INTERVAL_SECS",
        "RETENTION_MINUTES",
        "HTTP_TIMEOUT_SECS",
        "HITSCOPE_HEADLESS",
        "SIM_APP_NAME",
        "SIM_MAX_GEARS",
    ];

    // Env vars are process-wide; keep both cases in one test so they never race
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.source, SourceType::Http);
        assert_eq!(config.delta_file, PathBuf::from("delta.json"));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.retention, chrono::Duration::minutes(5));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert!(!config.headless);
        assert_eq!(config.sim_app_name, "scaledemo");
        assert_eq!(config.sim_max_gears, 4);

        env::set_var("HITSCOPE_URL", "https://scaledemo.example.com");
        env::set_var("HITSCOPE_SOURCE", "FILE");
        env::set_var("POLL_INTERVAL_SECS", "3");
        env::set_var("RETENTION_MINUTES", "not-a-number");
        env::set_var("HITSCOPE_HEADLESS", "true");

        let config = Config::from_env().unwrap();
        assert_eq!(config.base_url, "https://scaledemo.example.com");
        assert_eq!(config.source, SourceType::File);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.retention, chrono::Duration::minutes(5));
        assert!(config.headless);

        env::set_var("RETENTION_MINUTES", "90");
        assert_eq!(Config::from_env().unwrap().retention, chrono::Duration::minutes(90));

        // Parses as i64 but overflows a chrono duration
        env::set_var("RETENTION_MINUTES", i64::MAX.to_string());
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidValue(_))));
        env::remove_var("RETENTION_MINUTES");

        env::set_var("HITSCOPE_URL", "ftp://nope");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidValue(_))));

        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config {
            base_url: "http://localhost:8080".to_string(),
            source: SourceType::Http,
            delta_file: PathBuf::from("delta.json"),
            poll_interval: Duration::from_secs(1),
            retention: chrono::Duration::minutes(5),
            http_timeout: Duration::from_secs(5),
            headless: false,
            sim_app_name: "scaledemo".to_string(),
            sim_max_gears: 4,
        };

        let args: Vec<String> = ["hitscope", "--source", "simulate", "--headless"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        config.apply_args(&args).unwrap();

        assert_eq!(config.source, SourceType::Simulate);
        assert!(config.headless);

        let bad: Vec<String> = ["hitscope", "--source", "carrier-pigeon"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(config.apply_args(&bad).is_err());
    }

    #[test]
    fn test_source_type_round_trip_names() {
        for source in [SourceType::Http, SourceType::File, SourceType::Simulate] {
            assert_eq!(SourceType::from_str(source.as_str()), Some(source));
        }
        assert_eq!(SourceType::from_str("grpc"), None);
    }
}
