#![allow(unused)]

use std::io::{stdin, IsTerminal};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::{env, panic};

use anyhow::Result;
use clap::Parser;
use log::info;

use txkv_cli::config::ConfigLoad;
use txkv_cli::session::Session;
use txkv_cli::trace;

#[derive(Debug, Parser, PartialEq)]
#[command(version, author, about)]
pub struct Args {
    #[clap(short, long, help = "debug mode")]
    debug: bool,

    /// Configuration file path; defaults to the platform config directory.
    #[clap(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Force non-interactive mode, reading commands from stdin line by line.
    #[clap(short = 'n', long = "non-interactive")]
    non_interactive: bool,

    #[clap(short = 'l', long, default_value = "info")]
    log_level: String,

    /// A single query to execute instead of reading from stdin or a terminal.
    #[clap(long, require_equals = true)]
    query: Option<String>,
}

#[tokio::main]
pub async fn main() -> Result<()> {
    setup_panic_hook();

    eprintln!();
    eprintln!("██  ██  █        █");
    eprintln!("██ ██   ██      ██");
    eprintln!("███      ██    ██");
    eprintln!("██ ██     ██  ██");
    eprintln!("██  ██     ████  txkv CLI");
    eprintln!();

    let args = Args::parse();
    if args.debug {
        println!("{:?}", args);
    }

    let log_dir = format!(
        "{}/.txkv-cli",
        env::var("HOME").unwrap_or_else(|_| ".".to_string())
    );
    let _guards = trace::init_logging(&log_dir, &args.log_level).await?;
    info!("txkv-cli starting with args: {:?}", &args);

    let cfg = match ConfigLoad::new(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load config, using defaults: {err}");
            ConfigLoad::default()
        }
    };
    if args.debug {
        println!("{:?}", &cfg);
        eprintln!();
    }
    info!("txkv-cli starting with config: {:?}", &cfg);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("error setting Ctrl-C handler");

    let mut session = Session::try_new(cfg, true)?;

    let is_terminal = stdin().is_terminal();
    let is_repl = is_terminal && !args.non_interactive && args.query.is_none();

    if is_repl {
        session.handle_repl();
        return Ok(());
    }

    match args.query {
        Some(query) => session.handle_reader(std::io::Cursor::new(query))?,
        None => session.handle_reader(stdin().lock())?,
    }

    Ok(())
}

fn setup_panic_hook() {
    let meta = human_panic::Metadata {
        version: env!("CARGO_PKG_VERSION").into(),
        name: env!("CARGO_PKG_NAME").into(),
        authors: env!("CARGO_PKG_AUTHORS").replace(':', ", ").into(),
        homepage: env!("CARGO_PKG_HOMEPAGE").into(),
    };

    let default_hook = panic::take_hook();
    if env::var("RUST_BACKTRACE").is_err() {
        panic::set_hook(Box::new(move |info: &panic::PanicInfo| {
            default_hook(info);
            let file_path = human_panic::handle_dump(&meta, info);
            human_panic::print_msg(file_path, &meta)
                .expect("human-panic: printing error message to console failed");
        }));
    }
}
