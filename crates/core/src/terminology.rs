//! Terminology resolution against a static code/display dictionary.
//!
//! The dictionary is a JSON object with two optional tables:
//!
//! ```json
//! {
//!   "codeToDisplay": { "49122002": "Ambulance" },
//!   "termToCodeMapping": { "ambulance service": "49122002" }
//! }
//! ```
//!
//! Terms are lower-cased on load. The process-wide instance is installed once with
//! [`init_global`] and is read-only afterwards.

use crate::{CoreError, CoreResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

static GLOBAL: OnceLock<Terminology> = OnceLock::new();

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DictionaryFile {
    #[serde(default)]
    code_to_display: HashMap<String, String>,
    #[serde(default)]
    term_to_code_mapping: HashMap<String, String>,
}

/// A resolved `(code, display)` pair. Either side may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolved {
    pub code: Option<String>,
    pub display: Option<String>,
}

/// Immutable code/display dictionary.
#[derive(Clone, Debug, Default)]
pub struct Terminology {
    code_to_display: HashMap<String, String>,
    term_to_code: HashMap<String, String>,
}

impl Terminology {
    /// A dictionary with no entries; every lookup passes through unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a dictionary from in-memory tables. Terms are normalised to lower case.
    pub fn from_tables(
        code_to_display: impl IntoIterator<Item = (String, String)>,
        term_to_code: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            code_to_display: code_to_display.into_iter().collect(),
            term_to_code: term_to_code
                .into_iter()
                .map(|(term, code)| (normalise_term(&term), code))
                .collect(),
        }
    }

    /// Reads and parses a dictionary file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TerminologyRead`] if the file cannot be read and
    /// [`CoreError::TerminologyParse`] if it is not a dictionary object.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| CoreError::TerminologyRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file: DictionaryFile =
            serde_json::from_str(&raw).map_err(|source| CoreError::TerminologyParse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_tables(file.code_to_display, file.term_to_code_mapping))
    }

    /// Loads the dictionary at `path`, degrading to an empty dictionary on any failure.
    ///
    /// A missing or malformed dictionary is not fatal: it is logged and the resolver passes
    /// inputs through unchanged.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::warn!("no terminology dictionary configured; codes pass through unresolved");
            return Self::empty();
        };
        match Self::from_path(path) {
            Ok(terminology) => {
                tracing::info!(
                    path = %path.display(),
                    codes = terminology.code_count(),
                    terms = terminology.term_count(),
                    "loaded terminology dictionary"
                );
                terminology
            }
            Err(e) => {
                tracing::warn!("terminology dictionary unavailable, using empty dictionary: {e}");
                Self::empty()
            }
        }
    }

    pub fn code_count(&self) -> usize {
        self.code_to_display.len()
    }

    pub fn term_count(&self) -> usize {
        self.term_to_code.len()
    }

    /// Canonical display for `code`, if the code is known.
    pub fn display_for(&self, code: &str) -> Option<&str> {
        self.code_to_display.get(code).map(String::as_str)
    }

    /// Resolves a `(code, display)` pair to its canonical form.
    ///
    /// 1. A known code returns `(code, canonical display)`.
    /// 2. Otherwise a display whose trimmed, lower-cased form is a known term maps to that term's
    ///    code, which is then looked up as in step 1. An uncanonical mapped code keeps the
    ///    supplied display.
    /// 3. Otherwise the inputs are returned unchanged.
    ///
    /// Blank inputs count as absent. Never fails.
    pub fn resolve(&self, code: Option<&str>, display: Option<&str>) -> Resolved {
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        let display = display.map(str::trim).filter(|d| !d.is_empty());

        if let Some(canonical) = code.and_then(|c| self.canonical(c)) {
            return canonical;
        }

        if let Some(mapped) = display.and_then(|d| self.term_to_code.get(&normalise_term(d))) {
            return self.canonical(mapped).unwrap_or_else(|| Resolved {
                code: Some(mapped.clone()),
                display: display.map(str::to_string),
            });
        }

        Resolved {
            code: code.map(str::to_string),
            display: display.map(str::to_string),
        }
    }

    fn canonical(&self, code: &str) -> Option<Resolved> {
        self.display_for(code).map(|display| Resolved {
            code: Some(code.to_string()),
            display: Some(display.to_string()),
        })
    }
}

fn normalise_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Installs the process-wide dictionary.
///
/// Only the first call has any effect; later calls return the already-installed instance.
pub fn init_global(terminology: Terminology) -> &'static Terminology {
    GLOBAL.get_or_init(|| terminology)
}

/// The process-wide dictionary, or an empty one if [`init_global`] was never called.
pub fn global() -> &'static Terminology {
    GLOBAL.get_or_init(Terminology::empty)
}
