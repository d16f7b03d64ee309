//! Compilation modes: the columns of the benchmark matrix.
//!
//! A [`Mode`] names one combination of compiler run-method and optimization
//! flags. Modes are grouped into a validated, ordered [`ModeSet`] that is
//! built once at startup and handed to every consumer explicitly.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::layout::ARGS_SUFFIX;
use crate::errors::ErrorCode;

/// Errors raised while building a [`ModeSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("mode list is empty")]
    Empty,

    #[error("duplicate mode name '{0}'")]
    DuplicateName(String),

    #[error("invalid mode name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("mode '{0}' has an empty run method")]
    EmptyRunMethod(String),
}

impl ModeError {
    /// Catalog code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Empty => ErrorCode::ConfigNoModes,
            Self::DuplicateName(_) | Self::InvalidName { .. } | Self::EmptyRunMethod(_) => {
                ErrorCode::ConfigInvalidMode
            }
        }
    }
}

/// One point in the benchmark matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    name: String,
    run_method: String,
    #[serde(default, with = "flags_in_order")]
    options: Vec<(String, bool)>,
}

impl Mode {
    pub fn new(name: impl Into<String>, run_method: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run_method: run_method.into(),
            options: Vec::new(),
        }
    }

    /// Set a boolean optimization flag. A new flag goes after the existing
    /// ones; setting a flag again replaces its value in place.
    #[must_use]
    pub fn with_option(mut self, flag: impl Into<String>, value: bool) -> Self {
        let flag = flag.into();
        match self.options.iter_mut().find(|(name, _)| *name == flag) {
            Some((_, slot)) => *slot = value,
            None => self.options.push((flag, value)),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run_method(&self) -> &str {
        &self.run_method
    }

    pub fn options(&self) -> &[(String, bool)] {
        &self.options
    }

    pub fn option(&self, flag: &str) -> Option<bool> {
        self.options
            .iter()
            .find(|(name, _)| name == flag)
            .map(|(_, value)| *value)
    }

    /// Render the option flags as command-line switches, in the order they
    /// were declared.
    ///
    /// `{optimize-egglog: true}` becomes `["--optimize-egglog", "true"]`.
    pub fn render_options(&self) -> Vec<String> {
        self.options
            .iter()
            .flat_map(|(flag, value)| [format!("--{flag}"), value.to_string()])
            .collect()
    }

    fn validate(&self) -> Result<(), ModeError> {
        validate_mode_name(&self.name)?;
        if self.run_method.trim().is_empty() {
            return Err(ModeError::EmptyRunMethod(self.name.clone()));
        }
        Ok(())
    }
}

/// Options keep their declaration order so logged compiler command lines
/// read the same way the modes were written down.
mod flags_in_order {
    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(
        flags: &[(String, bool)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(flags.len()))?;
        for (flag, value) in flags {
            map.serialize_entry(flag, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, bool)>, D::Error> {
        deserializer.deserialize_map(FlagsVisitor)
    }

    struct FlagsVisitor;

    impl<'de> Visitor<'de> for FlagsVisitor {
        type Value = Vec<(String, bool)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of boolean flags")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut flags: Vec<(String, bool)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((flag, value)) = access.next_entry::<String, bool>()? {
                if flags.iter().any(|(name, _)| *name == flag) {
                    return Err(de::Error::custom(format_args!("duplicate flag '{flag}'")));
                }
                flags.push((flag, value));
            }
            Ok(flags)
        }
    }
}

/// A mode name becomes a file name inside the program directory, next to its
/// `-args` side-car and `.json` report, so it must stay a single, unambiguous
/// path component.
pub fn validate_mode_name(name: &str) -> Result<(), ModeError> {
    let invalid = |reason| ModeError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name is a relative path component"));
    }
    if name.contains(['/', '\\']) {
        return Err(invalid("name contains a path separator"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("name contains whitespace"));
    }
    if name.ends_with(ARGS_SUFFIX) {
        return Err(invalid("name collides with the args side-car suffix"));
    }
    if name.ends_with(".json") {
        return Err(invalid("name collides with the report extension"));
    }
    Ok(())
}

/// Ordered, validated list of modes with unique names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModeSet {
    modes: Vec<Mode>,
}

impl ModeSet {
    pub fn new(modes: Vec<Mode>) -> Result<Self, ModeError> {
        if modes.is_empty() {
            return Err(ModeError::Empty);
        }

        let mut seen = HashSet::with_capacity(modes.len());
        for mode in &modes {
            mode.validate()?;
            if !seen.insert(mode.name.as_str()) {
                return Err(ModeError::DuplicateName(mode.name.clone()));
            }
        }

        Ok(Self { modes })
    }

    /// The nightly matrix: one RVSDG round-trip mode plus the 2x2 grid of
    /// egglog/backend optimization toggles for both native backends.
    pub fn default_matrix() -> Self {
        let mut modes = vec![Mode::new("rvsdg_roundtrip", "rvsdg-round-trip-to-executable")];
        modes.extend(toggle_grid(
            "brilift",
            "compile-brilift",
            "optimize-brilift",
        ));
        modes.extend(toggle_grid(
            "bril_llvm",
            "compile-bril-llvm",
            "optimize-bril-llvm",
        ));
        Self { modes }
    }

    /// The four-way sweep used by `bench-one`: egglog and LLVM optimization
    /// toggled independently on the `llvm` run method.
    pub fn four_way() -> Self {
        let mut modes = Vec::with_capacity(4);
        for egglog in [false, true] {
            for llvm in [false, true] {
                modes.push(
                    Mode::new(
                        format!("egglog_{}_llvm_{}", on_off(egglog), on_off(llvm)),
                        "llvm",
                    )
                    .with_option("optimize-egglog", egglog)
                    .with_option("optimize-bril-llvm", llvm),
                );
            }
        }
        Self { modes }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mode> {
        self.modes.iter()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Mode> {
        self.modes.iter().find(|m| m.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modes.iter().map(Mode::name)
    }

    pub fn into_vec(self) -> Vec<Mode> {
        self.modes
    }
}

impl<'a> IntoIterator for &'a ModeSet {
    type Item = &'a Mode;
    type IntoIter = std::slice::Iter<'a, Mode>;

    fn into_iter(self) -> Self::IntoIter {
        self.modes.iter()
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "opt" } else { "noopt" }
}

fn toggle_grid(backend: &str, run_method: &str, backend_flag: &str) -> Vec<Mode> {
    let mut modes = Vec::with_capacity(4);
    for egglog in [false, true] {
        for backend_opt in [false, true] {
            modes.push(
                Mode::new(
                    format!(
                        "egglog_{}_{backend}_{}",
                        on_off(egglog),
                        on_off(backend_opt)
                    ),
                    run_method,
                )
                .with_option("optimize-egglog", egglog)
                .with_option(backend_flag, backend_opt),
            );
        }
    }
    modes
}
