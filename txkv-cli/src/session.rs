use std::sync::Arc;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Editor};
use tokio::time::Instant;

use txkv::controller::{Txn, TxnKvsHandle};
use txkv::data_cfg::{ByteComparator, DataConfig, Merge, MergeResult};
use txkv::info::get_info;
use txkv::kvs::LookupResult;
use txkv::storage::log_cask::LogCask;

use crate::ast::token_kind::TokenKind;
use crate::ast::tokenizer::{tokenize_command, Token};
use crate::config::ConfigLoad;
use crate::rusty::CliHelper;
use crate::show::Show;

fn get_history_path() -> String {
    format!("{}/.txkvcli_history", std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}

/// Replaces the previous value outright -- the CLI's `INSERT`/`UPDATE` both
/// just write the given bytes, there's no structured delta format on this
/// side of the interface.
struct OverwriteMerge;

impl Merge for OverwriteMerge {
    fn merge(&self, _key: &[u8], _old: Option<&[u8]>, delta: &[u8]) -> MergeResult {
        MergeResult::update(delta.to_vec())
    }
}

fn data_cfg() -> DataConfig {
    DataConfig::new(Arc::new(ByteComparator), Arc::new(OverwriteMerge))
}

/// Drives one REPL or batch run of the transactional command language over a
/// `LogCask`-backed `TxnKvsHandle`, mirroring the storage-engine CLI's
/// `Session` but dispatching BEGIN/INSERT/UPDATE/DELETE/LOOKUP/COMMIT/ABORT
/// against the OCC engine instead of raw engine calls.
///
/// `handle` is leaked to `'static` on construction: a session owns exactly
/// one handle for its whole process lifetime, and `Txn` borrows the handle
/// it was opened from, so a stack- or heap-scoped handle can't outlive the
/// transactions a long-lived REPL hands out across calls to `dispatch`.
pub struct Session {
    is_repl: bool,
    running: bool,

    handle: &'static TxnKvsHandle<LogCask>,
    current_txn: Option<Txn<'static, LogCask>>,

    settings: ConfigLoad,
    keywords: Vec<String>,
}

impl Session {
    pub fn try_new(settings: ConfigLoad, is_repl: bool) -> anyhow::Result<Self> {
        if is_repl {
            println!("Welcome to txkv-cli.");
            println!();
        }
        let engine = LogCask::new_compact(settings.get_storage_path(), 0.2)?;
        let handle: &'static TxnKvsHandle<LogCask> =
            Box::leak(Box::new(TxnKvsHandle::open(engine, data_cfg())));
        let keywords = crate::config::session_keywords();
        Ok(Session { is_repl, running: true, handle, current_txn: None, settings, keywords })
    }

    fn prompt(&self) -> String {
        if self.current_txn.is_some() {
            format!("{}* ", self.settings.prompt.trim_end())
        } else {
            self.settings.prompt.clone()
        }
    }

    /// Runs an interactive readline loop until the user exits or sends EOF.
    pub fn handle_repl(&mut self) {
        let config = rustyline::config::Builder::new()
            .completion_prompt_limit(5)
            .completion_type(CompletionType::Circular)
            .build();
        let mut rl: Editor<CliHelper, DefaultHistory> = Editor::with_config(config).unwrap();
        rl.set_helper(Some(CliHelper::with_keywords(Arc::new(self.keywords.clone()))));
        let _ = rl.load_history(&get_history_path());

        while self.running {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    self.handle_query(&line);
                }
                Err(ReadlineError::Interrupted) => println!("^C"),
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("readline error: {err}");
                    break;
                }
            }
        }

        println!("Bye~");
        let _ = rl.save_history(&get_history_path());
        if let Some(txn) = self.current_txn.take() {
            txn.abort();
        }
    }

    /// Runs every line from a non-interactive reader (piped script, `-e`).
    pub fn handle_reader<R: std::io::BufRead>(&mut self, reader: R) -> anyhow::Result<()> {
        for line in reader.lines() {
            let line = line?;
            if !self.running {
                break;
            }
            self.handle_query(&line);
        }
        if let Some(txn) = self.current_txn.take() {
            txn.abort();
        }
        Ok(())
    }

    fn handle_query(&mut self, line: &str) {
        let line = line.trim().trim_end_matches(';').trim();
        if line.is_empty() {
            return;
        }
        if line == "exit" || line == "quit" {
            self.running = false;
            return;
        }
        if let Some(rest) = line.strip_prefix('.') {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let cmd = parts.next().unwrap_or("");
            let value = parts.next().unwrap_or("").trim();
            if !self.settings.inject_cmd(cmd, value) {
                eprintln!("{}", format!("unknown setting: .{cmd}").red());
            }
            return;
        }

        let tokens = match tokenize_command(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                eprintln!("{}", format!("parse error: {err}").red());
                return;
            }
        };
        self.dispatch(&tokens);
    }

    fn dispatch(&mut self, tokens: &[Token]) {
        let start = Instant::now();
        let is_literal_or_kw = |t: &&Token| {
            !matches!(t.kind, TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment)
        };
        let mut significant = tokens.iter().filter(is_literal_or_kw);
        let Some(head) = significant.next() else { return };
        let args: Vec<&Token> = significant.filter(|t| t.kind.is_literal()).collect();

        let affected = match head.kind {
            TokenKind::BEGIN => self.cmd_begin(),
            TokenKind::COMMIT => self.cmd_commit(),
            TokenKind::ABORT => self.cmd_abort(),
            TokenKind::INSERT => self.cmd_write(&args, WriteKind::Insert),
            TokenKind::UPDATE => self.cmd_write(&args, WriteKind::Update),
            TokenKind::DELETE => self.cmd_write(&args, WriteKind::Delete),
            TokenKind::LOOKUP => self.cmd_lookup(&args),
            TokenKind::INFO => self.cmd_info(),
            TokenKind::KEYS => self.cmd_keys(),
            TokenKind::KSize => self.cmd_ksize(),
            TokenKind::SHOW => self.cmd_show(),
            TokenKind::HELP => self.cmd_help(),
            TokenKind::EOI => return,
            _ => {
                eprintln!("{}", "unrecognized command, try HELP".red());
                0
            }
        };

        Show::new_with_start(self.settings.is_show_affected(), self.is_repl, start)
            .output(affected);
    }

    fn require_txn(&self) -> bool {
        if self.current_txn.is_none() {
            eprintln!("{}", "no active transaction, start one with BEGIN".red());
            false
        } else {
            true
        }
    }

    fn cmd_begin(&mut self) -> i64 {
        if self.current_txn.is_some() {
            eprintln!("{}", "a transaction is already active".red());
            return 0;
        }
        let txn = self.handle.begin();
        println!("started txn {}", txn.id());
        self.current_txn = Some(txn);
        0
    }

    fn cmd_commit(&mut self) -> i64 {
        let Some(txn) = self.current_txn.take() else {
            eprintln!("{}", "no active transaction, start one with BEGIN".red());
            return 0;
        };
        match txn.commit() {
            Ok(()) => {
                println!("commit ok");
                1
            }
            Err(err) => {
                eprintln!("{}", format!("commit failed: {err}").red());
                0
            }
        }
    }

    fn cmd_abort(&mut self) -> i64 {
        let Some(txn) = self.current_txn.take() else {
            eprintln!("{}", "no active transaction, start one with BEGIN".red());
            return 0;
        };
        txn.abort();
        println!("aborted");
        1
    }

    fn cmd_write(&mut self, args: &[&Token], kind: WriteKind) -> i64 {
        if !self.require_txn() {
            return 0;
        }
        let Some(key_tok) = args.first() else {
            eprintln!("{}", "missing key".red());
            return 0;
        };
        let key = key_tok.get_slice();
        let value = args.get(1).map(|t| t.get_slice()).unwrap_or_default();

        let txn = self.current_txn.as_ref().unwrap();
        let result = match kind {
            WriteKind::Insert => txn.insert(key.as_bytes(), value.as_bytes()),
            WriteKind::Update => txn.update(key.as_bytes(), value.as_bytes()),
            WriteKind::Delete => txn.delete(key.as_bytes()),
        };
        match result {
            Ok(()) => 1,
            Err(err) => {
                eprintln!("{}", format!("{kind:?} failed: {err}").red());
                0
            }
        }
    }

    fn cmd_lookup(&mut self, args: &[&Token]) -> i64 {
        if !self.require_txn() {
            return 0;
        }
        let Some(key_tok) = args.first() else {
            eprintln!("{}", "missing key".red());
            return 0;
        };
        let key = key_tok.get_slice();
        let txn = self.current_txn.as_ref().unwrap();
        match txn.lookup(key.as_bytes()) {
            Ok(LookupResult::Found(value)) => {
                println!("{}", String::from_utf8_lossy(&value));
                1
            }
            Ok(LookupResult::NotFound) => {
                println!("(not found)");
                0
            }
            Err(err) => {
                eprintln!("{}", format!("lookup failed: {err}").red());
                0
            }
        }
    }

    fn cmd_info(&mut self) -> i64 {
        for line in get_info(self.handle.status()) {
            println!("{line}");
        }
        0
    }

    fn cmd_keys(&mut self) -> i64 {
        println!("active transactions: {}", self.handle.registry_len());
        0
    }

    fn cmd_ksize(&mut self) -> i64 {
        println!("{}", self.handle.registry_len());
        0
    }

    fn cmd_show(&mut self) -> i64 {
        println!("prompt: {}", self.settings.prompt);
        println!("show_stats: {}", self.settings.show_stats);
        println!("storage: {}", self.settings.get_storage_path().display());
        println!("active transactions: {}", self.handle.registry_len());
        0
    }

    fn cmd_help(&mut self) -> i64 {
        println!(
            "BEGIN | INSERT key value | UPDATE key value | DELETE key | LOOKUP key | COMMIT | ABORT"
        );
        println!("INFO | KEYS | KSIZE | SHOW | HELP");
        0
    }
}

#[derive(Debug, Clone, Copy)]
enum WriteKind {
    Insert,
    Update,
    Delete,
}
