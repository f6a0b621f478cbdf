//! Runtime configuration.
//!
//! Sources, highest priority first:
//! 1. CLI flags (and their `SERIALTRACK_*` environment variables)
//! 2. YAML config file (`--config`, or `<config_dir>/serialtrack/config.yaml`)
//! 3. Built-in defaults
//!
//! Relative paths inside the config file are resolved against the file's
//! parent directory. Relative CLI paths stay relative to the working directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::cli::Cli;
use crate::paths::{DEFAULT_DATA_DIR, default_config_file_path};

const DEFAULT_LOG_LEVEL: &str = "warn";

/// How entry names are ordered when a catalog is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Digit runs compare numerically, text case-insensitively.
    #[default]
    Natural,
    /// Whatever order the directory listing produced.
    Listing,
}

/// Raw config file schema.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub root: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub order: Option<SortOrder>,
    pub player: Option<PathBuf>,
    pub log_level: Option<String>,
    pub keywords: KeywordsFile,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeywordsFile {
    pub stop: Option<Vec<String>>,
    pub edit: Option<Vec<String>>,
    pub help: Option<Vec<String>>,
    pub rescan: Option<Vec<String>>,
    pub all: Option<Vec<String>>,
}

/// Words the command loop recognizes, stored trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    pub stop: Vec<String>,
    pub edit: Vec<String>,
    pub help: Vec<String>,
    pub rescan: Vec<String>,
    pub all: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Stop,
    Edit,
    Help,
    Rescan,
    All,
}

impl Default for Keywords {
    // Cyrillic entries are the same physical keys on a ЙЦУКЕН layout.
    fn default() -> Self {
        Self {
            stop: words(&["n", "т", "stop"]),
            edit: words(&["e", "у", "edit"]),
            help: words(&["h", "р", "help", "?"]),
            rescan: words(&["r", "к", "rescan"]),
            all: words(&["a", "ф", "all"]),
        }
    }
}

impl Keywords {
    /// Classifies a raw input line. Stop words win over every other set.
    pub fn classify(&self, input: &str) -> Option<Keyword> {
        let token = input.trim().to_lowercase();
        if token.is_empty() {
            return None;
        }
        let sets = [
            (Keyword::Stop, &self.stop),
            (Keyword::Edit, &self.edit),
            (Keyword::Help, &self.help),
            (Keyword::Rescan, &self.rescan),
            (Keyword::All, &self.all),
        ];
        sets.into_iter()
            .find(|(_, set)| set.iter().any(|word| *word == token))
            .map(|(keyword, _)| keyword)
    }

    pub fn is_stop(&self, input: &str) -> bool {
        self.classify(input) == Some(Keyword::Stop)
    }

    fn from_file(file: KeywordsFile) -> Result<Self> {
        let defaults = Self::default();
        let keywords = Self {
            stop: file.stop.map(normalize).unwrap_or(defaults.stop),
            edit: file.edit.map(normalize).unwrap_or(defaults.edit),
            help: file.help.map(normalize).unwrap_or(defaults.help),
            rescan: file.rescan.map(normalize).unwrap_or(defaults.rescan),
            all: file.all.map(normalize).unwrap_or(defaults.all),
        };
        keywords.validate()?;
        Ok(keywords)
    }

    fn validate(&self) -> Result<()> {
        if self.stop.is_empty() {
            bail!("keywords.stop must contain at least one word");
        }
        let all_words = self
            .stop
            .iter()
            .chain(&self.edit)
            .chain(&self.help)
            .chain(&self.rescan)
            .chain(&self.all);
        for word in all_words {
            if word.trim_start_matches('-').parse::<i64>().is_ok() {
                bail!("keyword '{word}' would shadow a series position");
            }
        }
        Ok(())
    }
}

fn words(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|word| word.to_string()).collect()
}

fn normalize(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub order: SortOrder,
    pub player: Option<PathBuf>,
    pub log_level: String,
    pub keywords: Keywords,
    pub config_file: Option<PathBuf>,
}

impl Config {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let loaded = match &cli.config {
            Some(path) => Some((load_config_file(path)?, path.clone())),
            None => match default_config_file_path() {
                Some(path) if path.exists() => Some((load_config_file(&path)?, path)),
                _ => None,
            },
        };
        Self::merge(cli, loaded)
    }

    pub(crate) fn merge(cli: &Cli, loaded: Option<(ConfigFile, PathBuf)>) -> Result<Self> {
        let (file, config_file) = match loaded {
            Some((file, path)) => (file, Some(path)),
            None => (ConfigFile::default(), None),
        };
        let base = config_file
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let root = match (&cli.root, &file.root) {
            (Some(root), _) => root.clone(),
            (None, Some(root)) => resolve_path(&base, root),
            (None, None) => bail!(
                "no series root configured; pass --root or set `root` in {}",
                config_file
                    .as_deref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "the config file".to_string())
            ),
        };
        let data_dir = match (&cli.data_dir, &file.data_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => resolve_path(&base, dir),
            (None, None) => PathBuf::from(DEFAULT_DATA_DIR),
        };
        let log_level = cli
            .log_level
            .clone()
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let keywords = Keywords::from_file(file.keywords).with_context(|| {
            format!(
                "invalid keywords in {}",
                config_file
                    .as_deref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default()
            )
        })?;

        Ok(Self {
            root,
            data_dir,
            order: file.order.unwrap_or_default(),
            player: file.player.map(|player| resolve_program(&base, player)),
            log_level,
            keywords,
            config_file,
        })
    }
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&content).with_context(|| format!("failed to parse config file {}", path.display()))
}

pub(crate) fn parse_config(raw: &str) -> Result<ConfigFile> {
    if raw.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

// Bare program names ("mpv") are looked up on PATH, not next to the config file.
fn resolve_program(base: &Path, program: PathBuf) -> PathBuf {
    if program.components().count() > 1 {
        resolve_path(base, &program)
    } else {
        program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with_root(root: &str) -> Cli {
        Cli {
            root: Some(PathBuf::from(root)),
            ..Cli::default()
        }
    }

    #[test]
    fn default_keywords_cover_both_keyboard_layouts() {
        let keywords = Keywords::default();
        assert!(keywords.is_stop("n"));
        assert!(keywords.is_stop("Т"));
        assert!(keywords.is_stop("  STOP "));
        assert_eq!(keywords.classify("у"), Some(Keyword::Edit));
        assert_eq!(keywords.classify("?"), Some(Keyword::Help));
        assert_eq!(keywords.classify("3"), None);
        assert_eq!(keywords.classify(""), None);
    }

    #[test]
    fn parse_config_accepts_partial_file() {
        let file = parse_config("root: /media/tv\norder: listing\nkeywords:\n  stop: [Quit, q]\n")
            .expect("config should parse");
        assert_eq!(file.root, Some(PathBuf::from("/media/tv")));
        assert_eq!(file.order, Some(SortOrder::Listing));
        assert_eq!(
            file.keywords.stop,
            Some(vec!["Quit".to_string(), "q".to_string()])
        );
    }

    #[test]
    fn parse_config_rejects_unknown_fields() {
        assert!(parse_config("rooot: /media/tv\n").is_err());
    }

    #[test]
    fn parse_config_treats_empty_file_as_defaults() {
        let file = parse_config("\n").expect("empty config should parse");
        assert!(file.root.is_none());
    }

    #[test]
    fn merge_prefers_cli_over_file() {
        let file = parse_config("root: shows\ndata_dir: state\nlog_level: info\n")
            .expect("config should parse");
        let config = Config::merge(
            &cli_with_root("/cli/root"),
            Some((file, PathBuf::from("/etc/serialtrack/config.yaml"))),
        )
        .expect("config should merge");
        assert_eq!(config.root, PathBuf::from("/cli/root"));
        assert_eq!(config.data_dir, PathBuf::from("/etc/serialtrack/state"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn merge_resolves_file_paths_against_config_dir() {
        let file = parse_config("root: shows\nplayer: mpv\n").expect("config should parse");
        let config = Config::merge(
            &Cli::default(),
            Some((file, PathBuf::from("/home/me/.config/serialtrack/config.yaml"))),
        )
        .expect("config should merge");
        assert_eq!(
            config.root,
            PathBuf::from("/home/me/.config/serialtrack/shows")
        );
        assert_eq!(config.player, Some(PathBuf::from("mpv")));
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.order, SortOrder::Natural);
    }

    #[test]
    fn merge_requires_a_root() {
        let err = Config::merge(&Cli::default(), None).expect_err("root is required");
        assert!(err.to_string().contains("no series root configured"));
    }

    #[test]
    fn merge_rejects_numeric_keywords() {
        let file = parse_config("keywords:\n  help: ['7']\n").expect("config should parse");
        let result = Config::merge(
            &cli_with_root("/tv"),
            Some((file, PathBuf::from("config.yaml"))),
        );
        assert!(result.is_err());
    }

    #[test]
    fn merge_rejects_empty_stop_list() {
        let file = parse_config("keywords:\n  stop: []\n").expect("config should parse");
        let result = Config::merge(
            &cli_with_root("/tv"),
            Some((file, PathBuf::from("config.yaml"))),
        );
        assert!(result.is_err());
    }

    #[test]
    fn custom_keywords_are_normalized() {
        let file = parse_config("keywords:\n  stop: ['  QUIT ']\n").expect("config should parse");
        let config = Config::merge(&cli_with_root("/tv"), Some((file, PathBuf::from("c.yaml"))))
            .expect("config should merge");
        assert!(config.keywords.is_stop("quit"));
        assert!(!config.keywords.is_stop("n"));
        assert_eq!(config.keywords.classify("e"), Some(Keyword::Edit));
    }
}
