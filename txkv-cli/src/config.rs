use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ast::token_kind::TokenKind;

pub const DEFAULT_STORAGE_PATH: &str = "txkv.db";
pub const DEFAULT_PROMPT: &str = "txkv> ";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Persisted CLI configuration, loaded and saved through `confy`.
///
/// Mirrors the storage-engine CLI's `ConfigLoad`, trimmed to the settings a
/// transactional session actually consults. The session always opens its KVS
/// through `LogCask`, same as the storage-engine CLI it's adapted from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigLoad {
    pub version: u32,
    pub storage_path: Option<PathBuf>,
    pub prompt: String,
    pub show_stats: bool,
    pub multi_line: bool,
    pub replace_newline: bool,
    pub log_dir: String,
    pub log_level: String,
}

impl Default for ConfigLoad {
    fn default() -> Self {
        ConfigLoad {
            version: 1,
            storage_path: Some(PathBuf::from(DEFAULT_STORAGE_PATH)),
            prompt: DEFAULT_PROMPT.to_string(),
            show_stats: true,
            multi_line: false,
            replace_newline: true,
            log_dir: DEFAULT_LOG_DIR.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ConfigLoad {
    /// Loads config from `path` if given, falling back to the platform config
    /// directory under `confy`'s usual `(qualifier, org, app)` convention,
    /// creating a default file on first run.
    pub fn new(path: Option<&Path>) -> anyhow::Result<Self> {
        let cfg: ConfigLoad = match path {
            Some(path) => confy::load_path(path)?,
            None => confy::load("txkv-cli", Some("config"))?,
        };
        Ok(cfg.fix_settings())
    }

    fn fix_settings(mut self) -> Self {
        if self.prompt.is_empty() {
            self.prompt = DEFAULT_PROMPT.to_string();
        }
        if self.log_dir.is_empty() {
            self.log_dir = DEFAULT_LOG_DIR.to_string();
        }
        self
    }

    pub fn is_show_affected(&self) -> bool {
        self.show_stats
    }

    pub fn get_storage_path(&self) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH))
    }

    /// Maps a leading `.command value` line onto a config field update, the
    /// same dot-command convention the storage-engine CLI uses for session
    /// settings (`.prompt`, `.multi_line`, ...).
    pub fn inject_cmd(&mut self, cmd: &str, value: &str) -> bool {
        match cmd {
            "prompt" => {
                self.prompt = value.to_string();
                true
            }
            "show_stats" => {
                self.show_stats = value.eq_ignore_ascii_case("true");
                true
            }
            "multi_line" => {
                self.multi_line = value.eq_ignore_ascii_case("true");
                true
            }
            "replace_newline" => {
                self.replace_newline = value.eq_ignore_ascii_case("true");
                true
            }
            _ => false,
        }
    }
}

/// Keywords `rustyline`'s completer offers in addition to the tokenizer's
/// reserved words.
pub fn session_keywords() -> Vec<String> {
    crate::ast::tokenizer::all_reserved_keywords()
        .into_iter()
        .filter(|kw| kw != &format!("{:?}", TokenKind::Error).to_ascii_lowercase())
        .collect()
}
