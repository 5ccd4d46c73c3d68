use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use relay_log::{Level, LogConfig};
use relay_rebalancing::RebalancingConfig;
use serde::{Deserialize, Serialize};

/// Defines the source of a config error.
#[derive(Debug)]
enum ConfigErrorSource {
    /// An error occurring independently.
    None,
    /// An error originating from a configuration file.
    File(PathBuf),
    /// An error originating in a field override (a command line argument).
    FieldOverride(String),
}

/// Indicates config related errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum ConfigErrorKind {
    /// Failed to open the file.
    #[error("could not open config file")]
    CouldNotOpenFile,
    /// Parsing YAML failed.
    #[error("could not parse yaml config file")]
    BadYaml,
    /// Parsing JSON failed.
    #[error("could not parse json config file")]
    BadJson,
    /// Invalid config value.
    #[error("invalid config value")]
    InvalidValue,
}

/// Indicates config related errors.
#[derive(Debug)]
pub struct ConfigError {
    origin: ConfigErrorSource,
    kind: ConfigErrorKind,
    cause: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ConfigError {
    #[inline]
    fn new(kind: ConfigErrorKind) -> Self {
        Self {
            origin: ConfigErrorSource::None,
            kind,
            cause: None,
        }
    }

    #[inline]
    fn wrap<E>(inner: E, kind: ConfigErrorKind) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        Self {
            cause: Some(inner.into()),
            ..Self::new(kind)
        }
    }

    #[inline]
    fn for_field<E>(inner: E, field: &'static str) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        Self::wrap(inner, ConfigErrorKind::InvalidValue).field(field)
    }

    #[inline]
    fn file(mut self, p: impl AsRef<Path>) -> Self {
        self.origin = ConfigErrorSource::File(p.as_ref().to_path_buf());
        self
    }

    #[inline]
    fn field(mut self, name: &'static str) -> Self {
        self.origin = ConfigErrorSource::FieldOverride(name.to_owned());
        self
    }

    /// Returns the error kind of the error.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            ConfigErrorSource::None => write!(f, "{}", self.kind),
            ConfigErrorSource::File(file_name) => {
                write!(f, "{} (file {})", self.kind, file_name.display())
            }
            ConfigErrorSource::FieldOverride(name) => write!(f, "{} (field {})", self.kind, name),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Values that can be overridden from the command line.
#[derive(Debug, Default)]
pub struct OverridableConfig {
    /// The sample rate to achieve across the population.
    pub sample_rate: Option<f64>,
    /// How far sample rates are pulled towards an even distribution.
    pub intensity: Option<f64>,
    /// The log level, one of `error`, `warn`, `info`, `debug`, `trace` or `off`.
    pub log_level: Option<String>,
}

/// Configuration of the `rebalance-rates` tool.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Configuration of the logging system.
    pub logging: LogConfig,
    /// Default knobs for rebalancing.
    pub rebalancing: RebalancingConfig,
}

impl Config {
    /// Loads the config from a YAML or JSON file, depending on the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let f = fs::File::open(path)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotOpenFile).file(path))?;
        let reader = io::BufReader::new(f);

        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_reader(reader)
                .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadJson).file(path))?,
            _ => serde_yaml::from_reader(reader)
                .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml).file(path))?,
        };

        config
            .rebalancing
            .validate()
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::InvalidValue).file(path))?;

        Ok(config)
    }

    /// Parses a config from a YAML string.
    ///
    /// This is mostly useful for tests.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml))
    }

    /// Override configuration with values coming from the command line.
    pub fn apply_override(
        &mut self,
        overrides: &OverridableConfig,
    ) -> Result<&mut Self, ConfigError> {
        if let Some(ref level) = overrides.log_level {
            self.logging.level = serde_json::from_value::<Level>(level.as_str().into())
                .map_err(|e| ConfigError::for_field(e, "log_level"))?;
        }

        if let Some(sample_rate) = overrides.sample_rate {
            self.rebalancing.sample_rate = unit_value(sample_rate, "sample_rate")?;
        }

        if let Some(intensity) = overrides.intensity {
            self.rebalancing.intensity = unit_value(intensity, "intensity")?;
        }

        Ok(self)
    }
}

fn unit_value(value: f64, field: &'static str) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::new(ConfigErrorKind::InvalidValue).field(field))
    }
}

#[cfg(test)]
mod tests {
    use relay_log::LogFormat;
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
logging:
  level: debug
  format: json
rebalancing:
  sampleRate: 0.1
  intensity: 0.8
"#;

        let config = Config::from_yaml_str(yaml).unwrap();

        assert_eq!(config.logging.level, Level::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.rebalancing.sample_rate, 0.1);
        assert_eq!(config.rebalancing.intensity, 0.8);
    }

    #[test]
    fn test_partial_yaml() {
        let config = Config::from_yaml_str("rebalancing:\n  sampleRate: 0.5\n").unwrap();

        assert_eq!(config.logging, LogConfig::default());
        assert_eq!(config.rebalancing.sample_rate, 0.5);
        assert_eq!(config.rebalancing.intensity, 1.0);
    }

    #[test]
    fn test_bad_yaml() {
        let error = Config::from_yaml_str("logging: [").unwrap_err();
        assert_eq!(error.kind(), ConfigErrorKind::BadYaml);
        assert!(error.source().is_some());
    }

    #[test]
    fn test_missing_file() {
        let error = Config::from_path("does/not/exist.yml").unwrap_err();

        assert_eq!(error.kind(), ConfigErrorKind::CouldNotOpenFile);
        assert_eq!(
            error.to_string(),
            "could not open config file (file does/not/exist.yml)"
        );
    }

    #[test]
    fn test_apply_override() {
        let mut config = Config::default();
        config
            .apply_override(&OverridableConfig {
                sample_rate: Some(0.2),
                intensity: Some(0.5),
                log_level: Some("trace".to_owned()),
            })
            .unwrap();

        assert_eq!(config.logging.level, Level::Trace);
        assert_eq!(config.rebalancing.sample_rate, 0.2);
        assert_eq!(config.rebalancing.intensity, 0.5);
    }

    #[test]
    fn test_invalid_override() {
        let mut config = Config::default();

        let error = config
            .apply_override(&OverridableConfig {
                sample_rate: Some(1.2),
                ..Default::default()
            })
            .unwrap_err();

        assert_eq!(error.kind(), ConfigErrorKind::InvalidValue);
        assert_eq!(error.to_string(), "invalid config value (field sample_rate)");

        let error = config
            .apply_override(&OverridableConfig {
                log_level: Some("loud".to_owned()),
                ..Default::default()
            })
            .unwrap_err();

        assert_eq!(error.to_string(), "invalid config value (field log_level)");
    }
}
