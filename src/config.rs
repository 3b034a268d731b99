use crate::error::{BridgeError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Keys the bridge reads from the environment.
const ENV_KEYS: &[&str] = &[
    "RUST_LOG",
    "BRIDGE_DIR",
    "SENSOR_SOURCE",
    "SYNC_INTERVAL_MS",
    "CATALOG_NAMING",
    "UA_NAMESPACE",
];

/// Parse `KEY=value` lines of a dotenv file.
///
/// Blank lines and `#` comments are skipped, an optional `export ` prefix is
/// dropped, and one pair of matching outer quotes is removed from the value.
/// Unquoted values keep inner spaces. Later lines override earlier ones.
pub fn parse_dotenv(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|&q| value.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(value)
}

/// Snapshot of the bridge's environment keys.
///
/// Process variables take precedence over values from a `.env` file. The
/// process environment itself is never modified.
#[derive(Debug, Clone, Default)]
pub struct EnvLayer {
    vars: HashMap<String, String>,
}

impl EnvLayer {
    /// Process environment layered over `./.env`, if present.
    pub fn from_system() -> Self {
        Self::with_dotenv(Path::new(".env"))
    }

    pub fn with_dotenv(path: &Path) -> Self {
        let mut vars = fs::read_to_string(path)
            .map(|content| parse_dotenv(&content))
            .unwrap_or_default();
        for key in ENV_KEYS {
            if let Ok(value) = std::env::var(key) {
                vars.insert((*key).to_string(), value);
            }
        }
        Self { vars }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring {}={:?}: not a valid value", key, raw);
                None
            }
        }
    }
}

/// Command-line settings that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bridge_dir: Option<PathBuf>,
    pub source: Option<SensorSource>,
    pub sync_interval_ms: Option<u64>,
    pub catalog_naming: Option<CatalogNaming>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sensors: SensorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Namespace index of every node the bridge creates.
    pub namespace: u16,
    /// Period of the sensor sync job in milliseconds.
    pub sync_interval_ms: u64,
    pub catalog_naming: CatalogNaming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub source: SensorSource,
    /// Directory holding the bridge's per-channel files.
    pub bridge_dir: PathBuf,
}

/// Where channel readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SensorSource {
    File,
    Simulated,
}

/// How scalar catalog variables are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CatalogNaming {
    /// Zero-padded type ordinal: "00", "01", ...
    Ordinal,
    /// Type name: "Boolean", "SByte", ...
    TypeName,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            namespace: 1,
            sync_interval_ms: 10_000,
            catalog_naming: CatalogNaming::Ordinal,
        }
    }
}

impl ServerConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            source: SensorSource::File,
            bridge_dir: std::env::temp_dir(),
        }
    }
}

impl FromStr for SensorSource {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "simulated" | "sim" => Ok(Self::Simulated),
            other => Err(BridgeError::Config(format!("unknown sensor source: {}", other))),
        }
    }
}

impl FromStr for CatalogNaming {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ordinal" => Ok(Self::Ordinal),
            "type_name" | "type-name" | "typename" => Ok(Self::TypeName),
            other => Err(BridgeError::Config(format!(
                "unknown catalog naming: {}",
                other
            ))),
        }
    }
}

impl Config {
    /// Load from an optional JSON file, then apply the environment layer.
    /// The result is not validated; callers apply their overrides first and
    /// then call [`Config::validate`].
    pub fn load(path: Option<&Path>, env: &EnvLayer) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment overrides. Unparseable values are ignored.
    pub fn apply_env(&mut self, env: &EnvLayer) {
        if let Some(dir) = env.get("BRIDGE_DIR") {
            self.sensors.bridge_dir = PathBuf::from(dir);
        }
        if let Some(source) = env.parsed("SENSOR_SOURCE") {
            self.sensors.source = source;
        }
        if let Some(interval) = env.parsed("SYNC_INTERVAL_MS") {
            self.server.sync_interval_ms = interval;
        }
        if let Some(naming) = env.parsed("CATALOG_NAMING") {
            self.server.catalog_naming = naming;
        }
        if let Some(namespace) = env.parsed("UA_NAMESPACE") {
            self.server.namespace = namespace;
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(dir) = &overrides.bridge_dir {
            self.sensors.bridge_dir = dir.clone();
        }
        if let Some(source) = overrides.source {
            self.sensors.source = source;
        }
        if let Some(interval) = overrides.sync_interval_ms {
            self.server.sync_interval_ms = interval;
        }
        if let Some(naming) = overrides.catalog_naming {
            self.server.catalog_naming = naming;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.sync_interval_ms == 0 {
            return Err(BridgeError::Config(
                "sync interval must be greater than zero".to_string(),
            ));
        }
        if self.server.namespace == 0 {
            return Err(BridgeError::Config(
                "namespace 0 is reserved for the standard nodes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.namespace, 1);
        assert_eq!(config.server.sync_interval(), Duration::from_secs(10));
        assert_eq!(config.server.catalog_naming, CatalogNaming::Ordinal);
        assert_eq!(config.sensors.source, SensorSource::File);
        assert_eq!(config.sensors.bridge_dir, std::env::temp_dir());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sensors": {{"source": "simulated"}}, "server": {{"catalog_naming": "type_name"}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.sensors.source, SensorSource::Simulated);
        assert_eq!(config.server.catalog_naming, CatalogNaming::TypeName);
        assert_eq!(config.server.sync_interval_ms, 10_000);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(BridgeError::SerdeJsonError(_))
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.server.sync_interval_ms = 0;
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_invalid_env_value_can_be_overridden_before_validation() {
        let env = EnvLayer::from_pairs([("SYNC_INTERVAL_MS", "0")]);
        let mut config = Config::load(None, &env).unwrap();
        assert_eq!(config.server.sync_interval_ms, 0);
        assert!(config.validate().is_err());

        config.apply_overrides(&Overrides {
            sync_interval_ms: Some(5000),
            ..Default::default()
        });
        assert_eq!(config.server.sync_interval(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_env_overrides_every_key() {
        let env = EnvLayer::from_pairs([
            ("BRIDGE_DIR", "/srv/enocean"),
            ("SENSOR_SOURCE", "simulated"),
            ("SYNC_INTERVAL_MS", "2500"),
            ("CATALOG_NAMING", "type_name"),
            ("UA_NAMESPACE", "3"),
        ]);
        let mut config = Config::default();
        config.apply_env(&env);

        assert_eq!(config.sensors.bridge_dir, PathBuf::from("/srv/enocean"));
        assert_eq!(config.sensors.source, SensorSource::Simulated);
        assert_eq!(config.server.sync_interval_ms, 2500);
        assert_eq!(config.server.catalog_naming, CatalogNaming::TypeName);
        assert_eq!(config.server.namespace, 3);
    }

    #[test]
    fn test_apply_env_ignores_malformed_values() {
        let env = EnvLayer::from_pairs([
            ("SENSOR_SOURCE", "mqtt"),
            ("SYNC_INTERVAL_MS", "soon"),
            ("CATALOG_NAMING", "alphabetical"),
            ("UA_NAMESPACE", "70000"),
        ]);
        let mut config = Config::default();
        config.apply_env(&env);

        assert_eq!(config.sensors.source, SensorSource::File);
        assert_eq!(config.server.sync_interval_ms, 10_000);
        assert_eq!(config.server.catalog_naming, CatalogNaming::Ordinal);
        assert_eq!(config.server.namespace, 1);
    }

    #[test]
    fn test_env_is_applied_over_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"server": {{"sync_interval_ms": 1000, "namespace": 2}}}}"#).unwrap();
        let env = EnvLayer::from_pairs([("SYNC_INTERVAL_MS", "4000")]);

        let config = Config::load(Some(file.path()), &env).unwrap();
        assert_eq!(config.server.sync_interval_ms, 4000);
        assert_eq!(config.server.namespace, 2);
    }

    #[test]
    fn test_parse_dotenv() {
        let vars = parse_dotenv(
            "# bridge settings\n\
             \n\
             BRIDGE_DIR = /var/lib/enocean bridge\n\
             export SENSOR_SOURCE=simulated\n\
             CATALOG_NAMING=\"type_name\"\n\
             RUST_LOG='debug'\n\
             NOT A PAIR\n\
             =orphan\n\
             SYNC_INTERVAL_MS=1000\n\
             SYNC_INTERVAL_MS=2000\n",
        );
        assert_eq!(vars.len(), 5);
        assert_eq!(vars["BRIDGE_DIR"], "/var/lib/enocean bridge");
        assert_eq!(vars["SENSOR_SOURCE"], "simulated");
        assert_eq!(vars["CATALOG_NAMING"], "type_name");
        assert_eq!(vars["RUST_LOG"], "debug");
        assert_eq!(vars["SYNC_INTERVAL_MS"], "2000");
    }

    #[test]
    fn test_dotenv_file_feeds_env_layer() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "BRIDGE_TEST_ONLY_KEY=4").unwrap();
        writeln!(file, "UA_NAMESPACE=4").unwrap();
        let env = EnvLayer::with_dotenv(file.path());
        assert_eq!(env.get("BRIDGE_TEST_ONLY_KEY"), Some("4"));
        if std::env::var("UA_NAMESPACE").is_err() {
            assert_eq!(env.get("UA_NAMESPACE"), Some("4"));
        }

        let missing = EnvLayer::with_dotenv(Path::new("/nonexistent/.env"));
        assert_eq!(missing.get("BRIDGE_TEST_ONLY_KEY"), None);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("SIM".parse::<SensorSource>().unwrap(), SensorSource::Simulated);
        assert_eq!("file".parse::<SensorSource>().unwrap(), SensorSource::File);
        assert!("mqtt".parse::<SensorSource>().is_err());
        assert_eq!(
            "type-name".parse::<CatalogNaming>().unwrap(),
            CatalogNaming::TypeName
        );
    }
}
