//! INI file configuration adapter.

use crate::domain::error::RegimetraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RegimetraderError> {
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|reason| RegimetraderError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, RegimetraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| RegimetraderError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, RegimetraderError> {
        match self.config.getint(section, key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Ok(default),
            Err(reason) => Err(RegimetraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason,
            }),
        }
    }

    fn get_double(
        &self,
        section: &str,
        key: &str,
        default: f64,
    ) -> Result<f64, RegimetraderError> {
        match self.config.getfloat(section, key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Ok(default),
            Err(reason) => Err(RegimetraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason,
            }),
        }
    }

    fn get_bool(
        &self,
        section: &str,
        key: &str,
        default: bool,
    ) -> Result<bool, RegimetraderError> {
        match self.config.get(section, key) {
            None => Ok(default),
            Some(value) => {
                Self::parse_bool(&value).ok_or_else(|| RegimetraderError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("'{}' is not a boolean", value),
                })
            }
        }
    }
}
