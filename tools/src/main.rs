//! desk-runner: headless driver for the referral desk.
//!
//! Usage:
//!   desk-runner --data-dir ./data --db desk.db --today 2026-10-19 --seed 7
//!   desk-runner --quota 4096            (cap local storage at 4 KiB)
//!
//! Reads one JSON command per line on stdin and answers with one JSON
//! line on stdout:
//!   {"cmd":"login","email":"yossi.cohen@example.com","password":"x"}
//!   {"cmd":"dashboard"}
//!   {"cmd":"quit"}

use anyhow::Result;
use chrono::NaiveDate;
use referral_core::{
    app::DeskApp,
    clock::AppClock,
    command::AppCommand,
    config::AppConfig,
    error::DeskError,
    storage::{LocalStorage, MemoryStorage, SqliteStorage},
};
use serde_json::{json, Value};
use std::env;
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", session_seed());
    let data_dir = flag_value(&args, "--data-dir");
    let db = flag_value(&args, "--db");
    let today = flag_value(&args, "--today");
    let quota = flag_value(&args, "--quota")
        .map(|raw| {
            raw.parse::<usize>()
                .map_err(|e| anyhow::anyhow!("Bad --quota '{raw}': {e}"))
        })
        .transpose()?;

    let mut config = match data_dir {
        Some(dir) => AppConfig::load(dir)?,
        None => {
            log::info!("no --data-dir given; using built-in demo tables");
            AppConfig::default_demo()
        }
    };

    let clock = match today {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("Bad --today '{raw}': {e}"))?;
            AppClock::fixed_on(date)
        }
        None => AppClock::System,
    };

    if quota.is_some() {
        config.storage.quota_bytes = quota;
    }
    let quota = config.storage.quota_bytes;
    let storage: Box<dyn LocalStorage> = match db {
        Some(path) => Box::new(SqliteStorage::open(path)?.with_quota(quota)),
        None => match quota {
            Some(bytes) => Box::new(MemoryStorage::with_quota(bytes)),
            None => Box::new(MemoryStorage::new()),
        },
    };

    log::info!("desk-runner starting (seed {seed}, db {})", db.unwrap_or(":memory:"));
    let mut app = DeskApp::new(config, storage, clock, seed);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(run_command_loop(&mut app))
}

async fn run_command_loop(app: &mut DeskApp) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let raw: Value = match serde_json::from_str(&buffer) {
            Ok(v) => v,
            Err(e) => {
                writeln!(stdout, "{}", json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };
        if raw.get("cmd").and_then(Value::as_str) == Some("quit") {
            break;
        }
        let command: AppCommand = match serde_json::from_value(raw) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        let response = match app.execute(command).await {
            Ok(value) => json!({ "ok": value }),
            Err(DeskError::Validation { errors }) => {
                json!({ "error": "validation failed", "fields": errors })
            }
            Err(e) => {
                app.report_error(&e);
                json!({ "error": e.to_string() })
            }
        };
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn session_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
