//! Named reaction templates.
//!
//! The catalog maps display names to reaction SMARTS. It is built once at
//! startup, from the built-in table and optionally a TOML or JSON file, and
//! only read afterwards. Templates are stored as text; a malformed one is
//! reported when the engine parses it, not here.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

/// The built-in reactions, in display order.
const BUILTIN: [(&str, &str); 19] = [
    ("Bromination", "[cH:1].[Br][Br]>>[c:1][Br]"),
    ("Chlorination", "[cH:1].[Cl][Cl]>>[c:1][Cl]"),
    ("Iodination", "[cH:1].[I][I]>>[c:1][I]"),
    ("Fluorination", "[cH:1].[F][F]>>[c:1][F]"),
    ("Hydrogenation", "[C:1]=[C:2].[H][H]>>[C:1]-[C:2]"),
    ("Nitration", "[cH:1].[O-][N+](=O)O>>[c:1][N+](=O)[O-]"),
    ("Esterification", "[C:1](=O)O.[O:2][C:3]>>[C:1](=O)[O:2][C:3]"),
    ("Hydrolysis", "[C:1](=O)[O:2][C:3]>>[C:1](=O)O.[C:3][OH]"),
    ("Aldol Condensation", "[C:1]=O.[CH3][C:2]=O>>[C:1]=C-[C:2]=O"),
    ("Decarboxylation", "[C:1](=O)[OH]>>[C:1][H]"),
    (
        "Amide Formation",
        "[C:1](=O)O[C:2][H].[NH2][C:3]>>[C:1](=O)[N][C:3]",
    ),
    ("Epoxidation", "[C:1]=[C:2].[O][O]>>[C:1]1[O][C:2]1"),
    (
        "Cannizzaro Reaction",
        "[C:1]=O.[C:2]=O>>[C:1][OH].[C:2][O-]",
    ),
    (
        "Friedel-Crafts Acylation",
        "[cH:1].[C:2](=O)Cl>>[c:1][C:2](=O)",
    ),
    ("Diels-Alder Reaction", "C=CC=C.C=C>>C1=CCCCC1"),
    (
        "Claisen Condensation",
        "[C:1](=O)O[C:2].[C:3](=O)O[C:4]>>[C:1](=O)C[C:3](=O)[C:4]",
    ),
    (
        "Michael Addition",
        "[C:1]=[C:2]-[C:3]=O.[C:4]-[H]>>[C:1]([C:4])[C:2]-[C:3]=O",
    ),
    ("Wittig Reaction", "[C:1]=O.[C:2]=P[CH3]3>>[C:1]=[C:2]"),
    ("Perkin Reaction", "[C:1](=O)O[C:2].[C:3]=O>>[C:1]=[C:3]"),
];

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML catalog {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid JSON catalog {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unsupported catalog format {} (expected .toml or .json)", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("catalog entry has an empty name")]
    EmptyName,
    #[error("catalog entry '{name}' has an empty template")]
    EmptyTemplate { name: String },
    #[error("catalog has no templates")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct TomlCatalog {
    templates: IndexMap<String, String>,
}

/// Immutable name to template mapping, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCatalog {
    entries: IndexMap<String, String>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateCatalog {
    /// The 19 built-in reactions.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|&(name, template)| (name.to_owned(), template.to_owned()))
                .collect(),
        }
    }

    /// Builds a catalog from name/template pairs. Names and templates are
    /// trimmed; a later duplicate name replaces the earlier template.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = IndexMap::new();
        for (name, template) in entries {
            let name = name.as_ref().trim();
            let template = template.as_ref().trim();
            if name.is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if template.is_empty() {
                return Err(CatalogError::EmptyTemplate {
                    name: name.to_owned(),
                });
            }
            map.insert(name.to_owned(), template.to_owned());
        }
        if map.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { entries: map })
    }

    /// Reads a catalog file: `.toml` with a `[templates]` table, or `.json`
    /// with a single object.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let entries: IndexMap<String, String> = match extension.as_deref() {
            Some("toml") => {
                toml::from_str::<TomlCatalog>(&contents)
                    .map_err(|source| CatalogError::Toml {
                        path: path.to_path_buf(),
                        source,
                    })?
                    .templates
            }
            Some("json") => {
                serde_json::from_str(&contents).map_err(|source| CatalogError::Json {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            _ => {
                return Err(CatalogError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };
        Self::from_entries(entries)
    }

    /// Adds or overrides entries from `other`. Overridden names keep their
    /// original position.
    pub fn merge(&mut self, other: TemplateCatalog) {
        for (name, template) in other.entries {
            self.entries.insert(name, template);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(name, template)| (name.as_str(), template.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
