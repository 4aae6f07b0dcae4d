//! ocr-watch - main entry point
//!
//! Runs the directory-polling OCR loop as a long-lived foreground daemon.
//!
//! # Usage
//!
//! ```bash
//! # Poll ./clipboard, write recognized text to the system clipboard
//! ocr-watch
//!
//! # Poll a directory and append results to a file
//! ocr-watch --read-from ~/screenshots --write-to ~/ocr.txt
//!
//! # Custom poll interval and config file
//! ocr-watch --delay 0.5 --config /path/to/config.toml
//!
//! # Baseline, run one poll cycle, exit (wiring smoke test)
//! ocr-watch --once
//! ```

use ocr_watch::{CommandOcrEngine, Config, DirectorySource, Watcher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter};

struct Args {
    config_path: Option<PathBuf>,
    read_from: Option<String>,
    write_to: Option<String>,
    delay_secs: Option<f64>,
    once: bool,
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let mut args = Args {
        config_path: None,
        read_from: None,
        write_to: None,
        delay_secs: None,
        once: false,
    };

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-v" => {
                println!("ocr-watch v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                i += 1;
                if i < argv.len() {
                    args.config_path = Some(PathBuf::from(&argv[i]));
                }
            }
            "--read-from" | "-r" => {
                i += 1;
                if i < argv.len() {
                    args.read_from = Some(argv[i].clone());
                }
            }
            "--write-to" | "-w" => {
                i += 1;
                if i < argv.len() {
                    args.write_to = Some(argv[i].clone());
                }
            }
            "--once" => {
                args.once = true;
            }
            "--delay" | "-d" => {
                i += 1;
                if i < argv.len() {
                    match argv[i].parse() {
                        Ok(secs) => args.delay_secs = Some(secs),
                        Err(_) => {
                            eprintln!("Invalid --delay value: {}", argv[i]);
                            std::process::exit(2);
                        }
                    }
                }
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                std::process::exit(2);
            }
        }
        i += 1;
    }

    args
}

fn print_help() {
    println!("ocr-watch - background OCR for a watched directory");
    println!();
    println!("USAGE:");
    println!("    ocr-watch [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -r, --read-from <DIR>    Directory to poll for new images (default: clipboard)");
    println!("    -w, --write-to <TARGET>  \"clipboard\" or a path to a .txt file (default: clipboard)");
    println!("    -d, --delay <SECS>       Poll interval in seconds (default: 1.0)");
    println!("    -c, --config <FILE>      Path to a TOML config file");
    println!("        --once               Baseline, run a single poll cycle, then exit");
    println!("    -h, --help               Print help");
    println!("    -v, --version            Print version");
}

#[tokio::main]
async fn main() {
    let args = parse_args();

    // Logging comes up before the config loads so load-time messages are
    // visible; the configured level is applied afterwards via the reload
    // handle unless RUST_LOG already pinned a filter.
    let rust_log_set = std::env::var_os("RUST_LOG").is_some();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, reload_handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = args
        .config_path
        .clone()
        .unwrap_or_else(Config::default_config_path);
    let mut config = Config::load_from_path(config_path.clone());

    // CLI overrides win over the config file.
    if let Some(read_from) = args.read_from {
        config.watch.read_from = read_from;
    }
    if let Some(write_to) = args.write_to {
        config.watch.write_to = write_to;
    }
    if let Some(delay) = args.delay_secs {
        config.watch.delay_secs = delay;
    }

    if !rust_log_set {
        if let Err(e) = reload_handle.reload(EnvFilter::new(&config.general.log_level)) {
            warn!("could not apply log level {:?}: {}", config.general.log_level, e);
        }
    }

    info!("Starting ocr-watch (config: {})", config_path.display());

    if let Err(e) = run(config, args.once).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config, once: bool) -> Result<(), ocr_watch::WatchError> {
    config.validate()?;

    let engine = CommandOcrEngine::new(config.engine.binary_path.clone().map(PathBuf::from));
    if !engine.is_available() {
        warn!(
            "OCR binary not found at {}; inference will fail until it is installed",
            engine.binary_path().display()
        );
    }

    let sink = ocr_watch::make_sink(&config.watch.write_to, &config.clipboard.command)?;
    info!("Writing to {}", sink.describe());

    let source = DirectorySource::new(&config.watch.read_from, &config.watch.pending_prefix)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| ocr_watch::WatchError::Config(format!("failed to set signal handler: {}", e)))?;

    let mut watcher = Watcher::new(&config, source, Box::new(engine), sink, running);
    if once {
        watcher.run_once().await?;
        Ok(())
    } else {
        watcher.run().await
    }
}
