//! Configuration access port trait.

use crate::domain::error::RegimetraderError;

/// Typed configuration access. Absent keys fall back to the caller's
/// default; present but unparseable values are errors, never defaults.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, RegimetraderError>;
    fn get_double(&self, section: &str, key: &str, default: f64)
        -> Result<f64, RegimetraderError>;
    fn get_bool(&self, section: &str, key: &str, default: bool)
        -> Result<bool, RegimetraderError>;
}
