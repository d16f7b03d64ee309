//! Environment variable parsing with type safety.
//!
//! Provides a parser for `BMX_*` overrides that collects every error so
//! all bad values are reported at once instead of one per run.

use super::source::Sourced;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Value out of valid range.
    #[error("Value out of range for {var}: {value} (valid: {min}..={max})")]
    OutOfRange {
        var: String,
        value: String,
        min: String,
        max: String,
    },

    /// Variable is set but empty.
    #[error("{var} is set but empty")]
    Empty { var: String },
}

/// Type-safe environment variable parser.
pub struct EnvParser {
    prefix: &'static str,
    vars: Option<HashMap<String, String>>,
    errors: Vec<EnvError>,
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvParser {
    /// Create a parser reading the process environment with the `BMX_` prefix.
    pub fn new() -> Self {
        Self {
            prefix: "BMX_",
            vars: None,
            errors: Vec::new(),
        }
    }

    /// Create a parser over a fixed variable map instead of the process
    /// environment.
    pub fn with_vars(vars: HashMap<String, String>) -> Self {
        Self {
            prefix: "BMX_",
            vars: Some(vars),
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    fn lookup(&self, var_name: &str) -> Option<String> {
        match &self.vars {
            Some(vars) => vars.get(var_name).cloned(),
            None => env::var(var_name).ok(),
        }
    }

    /// Get a non-empty string value with default.
    pub fn get_string(&mut self, name: &str, default: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some(value) if value.trim().is_empty() => {
                self.errors.push(EnvError::Empty { var: var_name });
                Sourced::default_value(default.to_string())
            }
            Some(value) => Sourced::from_env(value, var_name),
            None => Sourced::default_value(default.to_string()),
        }
    }

    /// Get a path value with default.
    pub fn get_path(&mut self, name: &str, default: PathBuf) -> Sourced<PathBuf> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some(value) if value.trim().is_empty() => {
                self.errors.push(EnvError::Empty { var: var_name });
                Sourced::default_value(default)
            }
            Some(value) => Sourced::from_env(PathBuf::from(value), var_name),
            None => Sourced::default_value(default),
        }
    }

    /// Get a u32 value with default and range validation.
    pub fn get_u32_range(&mut self, name: &str, default: u32, min: u32, max: u32) -> Sourced<u32> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(n) if n >= min && n <= max => Sourced::from_env(n, var_name),
                Ok(n) => {
                    self.errors.push(EnvError::OutOfRange {
                        var: var_name,
                        value: n.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                    Sourced::default_value(default)
                }
                Err(_) => {
                    self.errors.push(EnvError::InvalidValue {
                        var: var_name,
                        expected: "unsigned 32-bit integer".to_string(),
                        value,
                    });
                    Sourced::default_value(default)
                }
            },
            None => Sourced::default_value(default),
        }
    }

    /// Get an optional u32 where `0` or `none` clears the value.
    pub fn get_optional_u32(&mut self, name: &str, default: Option<u32>) -> Sourced<Option<u32>> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some(value) => match value.trim().to_lowercase().as_str() {
                "" | "0" | "none" => Sourced::from_env(None, var_name),
                other => match other.parse::<u32>() {
                    Ok(n) => Sourced::from_env(Some(n), var_name),
                    Err(_) => {
                        self.errors.push(EnvError::InvalidValue {
                            var: var_name,
                            expected: "unsigned 32-bit integer or 'none'".to_string(),
                            value,
                        });
                        Sourced::default_value(default)
                    }
                },
            },
            None => Sourced::default_value(default),
        }
    }
}
