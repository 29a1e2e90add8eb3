use std::path::{Path, PathBuf};

use derive_more::derive::{Display, From};
use serde::de::DeserializeOwned;

#[derive(Debug, From, Display)]
pub enum ConfigError {
    #[display("failed to read configuration: {_0}")]
    IOError(std::io::Error),

    #[display("failed to deserialize configuration: {_0}")]
    DeserializationFailed(toml::de::Error),

    #[from(ignore)]
    #[display("configuration file not found: {}", _0.display())]
    InvalidPath(PathBuf),
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IOError(err) => Some(err),
            Self::DeserializationFailed(err) => Some(err),
            Self::InvalidPath(_) => None,
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// `value_from_path` returns the raw `toml::Value` of the file so callers can
/// inspect keys without committing to a typed schema.
pub fn value_from_path<V: Into<PathBuf>>(target: V) -> ConfigResult<toml::Value> {
    from_path(target)
}

/// Reads and deserializes the TOML document at `target` into `T`.
///
/// A missing file is reported as [`ConfigError::InvalidPath`] rather than a
/// bare IO error so the binary can print which path it tried.
pub fn from_path<T, V>(target: V) -> ConfigResult<T>
where
    T: DeserializeOwned,
    V: Into<PathBuf>,
{
    let target_path = target.into();
    if !Path::new(&target_path).exists() {
        return Err(ConfigError::InvalidPath(target_path));
    }

    let config_content = std::fs::read_to_string(&target_path)?;
    from_str(&config_content)
}

pub fn from_str<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config_obj: T = toml::from_str(content)?;
    Ok(config_obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Workers {
        producers: usize,
        #[serde(default)]
        consumers: Option<usize>,
    }

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "mtqueue_config_{}_{}.toml",
            std::process::id(),
            name
        ));
        let mut file = std::fs::File::create(&path).expect("should create scratch file");
        file.write_all(content.as_bytes())
            .expect("should write scratch file");
        path
    }

    #[test]
    fn can_load_typed_config_from_path() {
        let path = scratch_file("typed", "producers = 4\nconsumers = 2\n");

        let workers: Workers = from_path(path.clone()).expect("should load");
        assert_eq!(
            workers,
            Workers {
                producers: 4,
                consumers: Some(2)
            }
        );

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn can_load_raw_value_from_path() {
        let path = scratch_file("raw", "capacity = 10\n");

        let value = value_from_path(path.clone()).expect("should load");
        assert_eq!(value.get("capacity").and_then(toml::Value::as_integer), Some(10));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_an_invalid_path() {
        let result: ConfigResult<Workers> = from_path("/definitely/not/here/mtqueue.toml");
        assert!(matches!(result, Err(ConfigError::InvalidPath(_))));
    }

    #[test]
    fn malformed_toml_fails_deserialization() {
        let result: ConfigResult<Workers> = from_str("producers = \"many\"");
        assert!(matches!(result, Err(ConfigError::DeserializationFailed(_))));
    }
}
