//! `ddsgen.toml` settings.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    str::FromStr,
};

use ddsgen_model::{Error, Result};
use serde::Deserialize;

/// File name looked up next to a generation spec or model.
pub const CONFIG_FILE: &str = "ddsgen.toml";

/// Model documents carry this extension unless configured otherwise.
pub const DEFAULT_MODEL_EXTENSION: &str = "opendds";

/// Environment variable pointing an installed binary at its templates.
pub const TEMPLATES_ENV: &str = "DDSGEN_TEMPLATES";

/// Template bundle used when `templates` is not configured.
///
/// Looked up in order: `$DDSGEN_TEMPLATES`, `templates/` next to the
/// executable, `../share/ddsgen/templates` relative to it, and finally the
/// bundle in this crate's source tree.
pub fn default_bundle_dir() -> PathBuf {
    bundle_dir_from(
        std::env::var_os(TEMPLATES_ENV).map(PathBuf::from),
        std::env::current_exe().ok(),
    )
}

fn bundle_dir_from(env: Option<PathBuf>, exe: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env.filter(|dir| !dir.as_os_str().is_empty()) {
        return dir;
    }
    if let Some(bin) = exe.as_deref().and_then(Path::parent) {
        let installed = [bin.join("templates"), bin.join("../share/ddsgen/templates")];
        if let Some(dir) = installed.into_iter().find(|dir| dir.is_dir()) {
            return dir;
        }
    }
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Template bundle directory.
    pub templates: Option<PathBuf>,
    /// Extension that routes template includes to the model's directory.
    pub model_extension: String,
    /// Recompile templates on every use.
    pub force_reload: bool,
    /// Values for `${VAR}` / `$(VAR)` in model references.
    pub search_paths: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates: None,
            model_extension: DEFAULT_MODEL_EXTENSION.to_string(),
            force_reload: false,
            search_paths: BTreeMap::new(),
        }
    }
}

impl FromStr for Config {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_str_with_filename(s, CONFIG_FILE)
    }
}

impl Config {
    pub fn from_str_with_filename(content: &str, filename: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::parse(e.message(), content, filename, e.span().map(|s| s.start)))
    }

    /// Read a config file. A relative `templates` entry is taken relative to
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = Self::from_str_with_filename(&content, &path.display().to_string())?;
        if let (Some(templates), Some(dir)) = (&config.templates, path.parent()) {
            if templates.is_relative() {
                config.templates = Some(dir.join(templates));
            }
        }
        Ok(config)
    }

    /// Load `ddsgen.toml` from `dir` if present, defaults otherwise.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!(config = %path.display(), "loading configuration");
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn bundle_dir(&self) -> PathBuf {
        self.templates.clone().unwrap_or_else(default_bundle_dir)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_bundle_dir_lookup() {
        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("bin/ddsgen");
        let source_tree = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"));

        assert_eq!(
            bundle_dir_from(Some(PathBuf::from("/opt/t")), Some(exe.clone())),
            PathBuf::from("/opt/t")
        );
        assert_eq!(bundle_dir_from(None, Some(exe.clone())), source_tree);
        assert_eq!(bundle_dir_from(Some(PathBuf::new()), None), source_tree);

        fs::create_dir_all(temp.path().join("bin")).unwrap();
        fs::create_dir_all(temp.path().join("share/ddsgen/templates")).unwrap();
        assert_eq!(
            bundle_dir_from(None, Some(exe.clone())),
            temp.path().join("bin/../share/ddsgen/templates")
        );

        fs::create_dir_all(temp.path().join("bin/templates")).unwrap();
        assert_eq!(
            bundle_dir_from(None, Some(exe)),
            temp.path().join("bin/templates")
        );
        assert!(source_tree.join("idl.tera").is_file());
    }

    #[test]
    fn test_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.model_extension, "opendds");
        assert_eq!(config.bundle_dir(), default_bundle_dir());
    }

    #[test]
    fn test_full_file() {
        let config: Config = r#"
            templates = "/opt/ddsgen/templates"
            model_extension = "model"
            force_reload = true

            [search_paths]
            DDS_ROOT = "/opt/dds"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.bundle_dir(), PathBuf::from("/opt/ddsgen/templates"));
        assert_eq!(config.model_extension, "model");
        assert!(config.force_reload);
        assert_eq!(config.search_paths["DDS_ROOT"], "/opt/dds");
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let err = "template = \"x\"".parse::<Config>().unwrap_err();
        assert!(matches!(*err, Error::Parse { .. }));
    }

    #[test]
    fn test_discover_relative_templates() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "templates = \"tpl\"\n").unwrap();

        let config = Config::discover(temp.path()).unwrap();
        assert_eq!(config.bundle_dir(), temp.path().join("tpl"));

        let empty = TempDir::new().unwrap();
        assert_eq!(Config::discover(empty.path()).unwrap(), Config::default());
    }
}
