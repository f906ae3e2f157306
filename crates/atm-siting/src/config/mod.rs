use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location of the reference data layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub indicators: PathBuf,
    pub competitors: PathBuf,
    pub poi: PathBuf,
    pub communes: PathBuf,
    pub atms: PathBuf,
}

impl DataConfig {
    pub const DEFAULT_INDICATORS: &'static str = "master_indicateurs_normalise.csv";
    pub const DEFAULT_COMPETITORS: &'static str = "nb_atm_normalise_with_coords.csv";
    pub const DEFAULT_POI: &'static str = "poi_maroc.csv";
    pub const DEFAULT_COMMUNES: &'static str = "communes.geojson";
    pub const DEFAULT_ATMS: &'static str = "atms_maroc_clean.csv";

    /// Default file names under `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            indicators: data_dir.join(Self::DEFAULT_INDICATORS),
            competitors: data_dir.join(Self::DEFAULT_COMPETITORS),
            poi: data_dir.join(Self::DEFAULT_POI),
            communes: data_dir.join(Self::DEFAULT_COMMUNES),
            atms: data_dir.join(Self::DEFAULT_ATMS),
            data_dir,
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let data_dir =
            PathBuf::from(env::var("SITING_DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        if data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath {
                variable: "SITING_DATA_DIR",
            });
        }

        let file = |variable: &'static str, default: &str| -> Result<PathBuf, ConfigError> {
            let value = env::var(variable).unwrap_or_else(|_| default.to_string());
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyPath { variable });
            }
            Ok(resolve_under(&data_dir, Path::new(value.trim())))
        };

        Ok(Self {
            indicators: file("SITING_INDICATORS_FILE", Self::DEFAULT_INDICATORS)?,
            competitors: file("SITING_COMPETITORS_FILE", Self::DEFAULT_COMPETITORS)?,
            poi: file("SITING_POI_FILE", Self::DEFAULT_POI)?,
            communes: file("SITING_COMMUNES_FILE", Self::DEFAULT_COMMUNES)?,
            atms: file("SITING_ATMS_FILE", Self::DEFAULT_ATMS)?,
            data_dir,
        })
    }
}

fn resolve_under(dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        dir.join(file)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyPath { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyPath { variable } => write!(f, "{variable} must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort | ConfigError::EmptyPath { .. } => None,
        }
    }
}
