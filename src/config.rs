//! Optional TOML configuration for the command-line front end.

use directories::ProjectDirs;
use regex::Regex;
use serde::Deserialize;
use sheetcalc_core::{DEFAULT_VERSION, NamePolicy};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    version: Option<String>,
    name_pattern: Option<String>,
    normalize: Option<NormalizeMode>,
}

/// How cell names are rewritten before use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    Upper,
    Lower,
    #[default]
    None,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid name_pattern {pattern:?} in {}: {source}", path.display())]
    InvalidPattern {
        path: PathBuf,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub version: String,
    pub name_pattern: Option<Regex>,
    pub normalize: NormalizeMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: DEFAULT_VERSION.to_string(),
            name_pattern: None,
            normalize: NormalizeMode::None,
        }
    }
}

impl Config {
    /// Naming rules for documents opened with this configuration.
    pub fn name_policy(&self) -> NamePolicy {
        let policy = match self.normalize {
            NormalizeMode::Upper => NamePolicy::uppercase(),
            NormalizeMode::Lower => NamePolicy::new().with_normalizer(|s| s.to_lowercase()),
            NormalizeMode::None => NamePolicy::new(),
        };
        match self.name_pattern.clone() {
            Some(pattern) => policy.with_validator(move |name| pattern.is_match(name)),
            None => policy,
        }
    }
}

/// Load the configuration from `config_file`, or from the user's config
/// directory when none is given.
///
/// Unreadable or unparsable files produce warnings and the defaults. A file
/// that parses but carries an invalid `name_pattern` is an error.
pub fn load_config(config_file: Option<&PathBuf>) -> Result<(Config, Vec<String>), ConfigError> {
    let mut warnings: Vec<String> = Vec::new();
    let config_path = config_file.cloned().or_else(user_config_path);
    let mut file: Option<ConfigFile> = None;

    if let Some(path) = config_path.as_ref() {
        if path.exists() {
            match std::fs::metadata(path) {
                Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
                    warnings.push(format!(
                        "Refusing to read {}: file too large ({} bytes, max {})",
                        path.display(),
                        meta.len(),
                        MAX_CONFIG_FILE_BYTES
                    ));
                }
                Ok(_) => match std::fs::read_to_string(path) {
                    Ok(content) => match toml::from_str::<ConfigFile>(&content) {
                        Ok(parsed) => file = Some(parsed),
                        Err(err) => {
                            warnings.push(format!("Failed to parse {}: {}", path.display(), err))
                        }
                    },
                    Err(err) => {
                        warnings.push(format!("Failed to read {}: {}", path.display(), err))
                    }
                },
                Err(err) => warnings.push(format!(
                    "Failed to read metadata for {}: {}",
                    path.display(),
                    err
                )),
            }
        } else if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
    }

    let Some(file) = file else {
        return Ok((Config::default(), warnings));
    };

    let name_pattern = match file.name_pattern {
        Some(pattern) => match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(source) => {
                return Err(ConfigError::InvalidPattern {
                    path: config_path.unwrap_or_default(),
                    pattern,
                    source,
                });
            }
        },
        None => None,
    };

    let config = Config {
        version: file.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        name_pattern,
        normalize: file.normalize.unwrap_or_default(),
    };
    Ok((config, warnings))
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "sheetcalc")?;
    Some(config_file_in(proj.config_dir()))
}

fn config_file_in(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = config_file_in(dir.path());
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "version = \"ps6\"\nname_pattern = \"^[A-Z][0-9]$\"\nnormalize = \"upper\"\n",
        );
        let (config, warnings) = load_config(Some(&path)).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.version, "ps6");
        assert_eq!(config.normalize, NormalizeMode::Upper);

        let policy = config.name_policy();
        assert_eq!(policy.resolve("b7").unwrap().as_str(), "B7");
        assert!(policy.resolve("b77").is_none());
        assert!(policy.resolve("bb7").is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "normalize = \"lower\"\n");
        let (config, warnings) = load_config(Some(&path)).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.version, DEFAULT_VERSION);
        assert!(config.name_pattern.is_none());
        assert_eq!(config.name_policy().resolve("AB12").unwrap().as_str(), "ab12");
    }

    #[test]
    fn test_missing_explicit_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let (config, warnings) = load_config(Some(&path)).unwrap();
        assert_eq!(config.version, DEFAULT_VERSION);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not found"));
    }

    #[test]
    fn test_unknown_key_warns_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "version = \"x\"\ncolour = \"blue\"\n");
        let (config, warnings) = load_config(Some(&path)).unwrap();
        assert_eq!(config.version, DEFAULT_VERSION);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Failed to parse"));
    }

    #[test]
    fn test_bad_normalize_value_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "normalize = \"title\"\n");
        let (config, warnings) = load_config(Some(&path)).unwrap();
        assert_eq!(config.normalize, NormalizeMode::None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "name_pattern = \"([\"\n");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("name_pattern"));
    }

    #[test]
    fn test_oversized_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = String::from("version = \"big\"\n");
        content.push_str(&"# padding\n".repeat(110_000));
        let path = write_config(&dir, &content);
        let (config, warnings) = load_config(Some(&path)).unwrap();
        assert_eq!(config.version, DEFAULT_VERSION);
        assert!(warnings[0].contains("too large"));
    }
}
