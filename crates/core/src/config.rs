//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The mapper itself never reads environment variables, so concurrent
//! requests and tests see consistent behaviour.

use crate::constants::{DEFAULT_LANGUAGE, TERMINOLOGY_DICTIONARY_PATH};
use crate::{CoreError, CoreResult};
use fhir::validation::check_language_tag;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    terminology_path: Option<PathBuf>,
    default_language: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `terminology_path` may be `None`, in which case the resolver starts empty and passes every
    /// code through unchanged.
    pub fn new(terminology_path: Option<PathBuf>, default_language: String) -> CoreResult<Self> {
        let language = default_language.trim();
        if language.is_empty() {
            return Err(CoreError::InvalidInput(
                "default_language cannot be empty".into(),
            ));
        }
        check_language_tag("default_language", language)
            .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

        Ok(Self {
            terminology_path,
            default_language: language.to_string(),
        })
    }

    pub fn terminology_path(&self) -> Option<&Path> {
        self.terminology_path.as_deref()
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            terminology_path: resolve_terminology_path(None),
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Resolve the terminology dictionary path without reading environment variables.
///
/// If `override_path` is provided it is returned as-is; a missing file there is reported when the
/// dictionary is loaded. Otherwise this looks for `data/snomed_dictionary.json` relative to the
/// current working directory and then walks up from `CARGO_MANIFEST_DIR`.
pub fn resolve_terminology_path(override_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path);
    }

    let cwd_relative = PathBuf::from(TERMINOLOGY_DICTIONARY_PATH);
    if cwd_relative.is_file() {
        return Some(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .map(|ancestor| ancestor.join(TERMINOLOGY_DICTIONARY_PATH))
        .find(|candidate| candidate.is_file())
}
