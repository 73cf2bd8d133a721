use std::path::PathBuf;

use txkv_cli::config::{session_keywords, ConfigLoad};

#[test]
fn default_config_has_sane_fields() {
    let cfg = ConfigLoad::default();
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.prompt, "txkv> ");
    assert!(cfg.show_stats);
    assert!(!cfg.multi_line);
    assert!(cfg.replace_newline);
    assert_eq!(cfg.get_storage_path(), PathBuf::from("txkv.db"));
}

#[test]
fn inject_cmd_updates_known_settings() {
    let mut cfg = ConfigLoad::default();

    assert!(cfg.inject_cmd("prompt", "tx> "));
    assert_eq!(cfg.prompt, "tx> ");

    assert!(cfg.inject_cmd("show_stats", "false"));
    assert!(!cfg.show_stats);

    assert!(cfg.inject_cmd("multi_line", "true"));
    assert!(cfg.multi_line);

    assert!(cfg.inject_cmd("replace_newline", "false"));
    assert!(!cfg.replace_newline);
}

#[test]
fn inject_cmd_rejects_unknown_settings() {
    let mut cfg = ConfigLoad::default();
    assert!(!cfg.inject_cmd("nonexistent", "value"));
}

#[test]
fn session_keywords_cover_the_command_language() {
    let keywords = session_keywords();
    for kw in ["begin", "commit", "abort", "insert", "update", "delete", "lookup"] {
        assert!(keywords.contains(&kw.to_string()), "missing keyword {kw}");
    }
    assert!(!keywords.contains(&"error".to_string()));
}
