//! Runtime settings for the predictor and its command-line front end.
//!
//! Settings come from an optional TOML file. A missing file is not an error:
//! every field has a default, so an empty or absent file yields a working
//! configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, TemplateCatalog};
use crate::depict::Canvas;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "rxnpredict.toml";

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_molecule_canvas() -> Canvas {
    Canvas::MOLECULE
}

const fn default_template_panel() -> Canvas {
    Canvas::TEMPLATE_PANEL
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Image sizes used when rendering a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Canvas for each product structure.
    #[serde(default = "default_molecule_canvas")]
    pub molecule: Canvas,

    /// Canvas for each component panel of the template schematic.
    #[serde(default = "default_template_panel")]
    pub template_panel: Canvas,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            molecule: default_molecule_canvas(),
            template_panel: default_template_panel(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Extra catalog file (`.toml` or `.json`).
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    /// Use only the extra catalog instead of extending the built-in one.
    #[serde(default)]
    pub replace_builtin: bool,

    #[serde(default)]
    pub render: RenderOptions,

    /// Directory that receives rendered SVG files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: None,
            replace_builtin: false,
            render: RenderOptions::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl Settings {
    /// Loads `rxnpredict.toml` from the working directory, or defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file(Path::new(CONFIG_FILE_NAME))
    }

    /// Loads and validates `path`. A missing file gives the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                let settings = Self::default();
                settings.validate()?;
                return Ok(settings);
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings that cannot produce images.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, canvas) in [
            ("render.molecule", self.render.molecule),
            ("render.template_panel", self.render.template_panel),
        ] {
            if canvas.width == 0 || canvas.height == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{field} must have a non-zero width and height"
                )));
            }
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "output_dir must not be empty (use '.' for the current directory)".to_owned(),
            ));
        }
        if self.replace_builtin && self.catalog.is_none() {
            return Err(ConfigError::Invalid(
                "replace_builtin needs a catalog file".to_owned(),
            ));
        }
        Ok(())
    }

    /// The catalog these settings describe: built-ins, extended or replaced by
    /// the configured file.
    pub fn build_catalog(&self) -> Result<TemplateCatalog, ConfigError> {
        let Some(path) = &self.catalog else {
            return Ok(TemplateCatalog::builtin());
        };
        let extra = TemplateCatalog::from_file(path)?;
        tracing::debug!(
            path = %path.display(),
            templates = extra.len(),
            replace = self.replace_builtin,
            "loaded catalog file"
        );
        if self.replace_builtin {
            return Ok(extra);
        }
        let mut catalog = TemplateCatalog::builtin();
        catalog.merge(extra);
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.render.molecule, Canvas::new(300, 300));
        assert_eq!(settings.render.template_panel, Canvas::new(400, 200));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rxnpredict.toml");
        std::fs::write(
            &path,
            "output_dir = \"images\"\n[render.molecule]\nwidth = 500\nheight = 450\n",
        )
        .unwrap();
        let settings = Settings::load_from_file(&path).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("images"));
        assert_eq!(settings.render.molecule, Canvas::new(500, 450));
        assert_eq!(settings.render.template_panel, Canvas::TEMPLATE_PANEL);
        assert!(settings.catalog.is_none());
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rxnpredict.toml");
        std::fs::write(&path, "[render.template_panel]\nwidth = 0\nheight = 200\n").unwrap();
        let err = Settings::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("render.template_panel"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rxnpredict.toml");
        std::fs::write(&path, "output_dir = [").unwrap();
        assert!(matches!(
            Settings::load_from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn replace_builtin_requires_catalog() {
        let settings = Settings {
            replace_builtin: true,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn catalog_file_extends_or_replaces_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.toml");
        std::fs::write(&path, "[templates]\n\"Demethylation\" = \"[O:1][CH3]>>[O:1]\"\n").unwrap();

        let mut settings = Settings {
            catalog: Some(path),
            ..Settings::default()
        };
        let extended = settings.build_catalog().unwrap();
        assert_eq!(extended.len(), 20);
        assert!(extended.contains("Bromination"));

        settings.replace_builtin = true;
        let replaced = settings.build_catalog().unwrap();
        assert_eq!(replaced.names().collect::<Vec<_>>(), vec!["Demethylation"]);
    }
}
