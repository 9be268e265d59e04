//! Debug logging for panemux.
//!
//! `log` records are written to `/tmp/panemux_debug.log` on Unix/macOS, or
//! `%TEMP%\panemux_debug.log` on Windows. Keeping log output out of
//! stdout/stderr matters because stdout carries terminal output.
//!
//! Level precedence: `--log-level` on the command line, then `RUST_LOG`, then
//! `log_level` from the config file (applied after the config is loaded).
//! When `RUST_LOG` is set, records are mirrored to stderr as well.

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Sink state behind the bridge
struct DebugLogger {
    file: Option<File>,
    opened: bool,
    mirror_stderr: bool,
}

impl DebugLogger {
    fn write_line(&mut self, line: &str) {
        if !self.opened {
            self.opened = true;
            self.file = open_log_file();
        }
        if let Some(file) = self.file.as_mut() {
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
        if self.mirror_stderr {
            eprint!("{line}");
        }
    }
}

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();

/// Set when the CLI or `RUST_LOG` chose the level; config must not override it
static LEVEL_PINNED: AtomicBool = AtomicBool::new(false);

struct LogBridge;

static BRIDGE: LogBridge = LogBridge;

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            get_timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        if let Some(logger) = LOGGER.get() {
            logger.lock().write_line(&line);
        }
    }

    fn flush(&self) {
        if let Some(logger) = LOGGER.get() {
            let mut logger = logger.lock();
            if let Some(file) = logger.file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Path of the debug log file
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    {
        PathBuf::from("/tmp/panemux_debug.log")
    }
    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("panemux_debug.log")
    }
}

fn open_log_file() -> Option<File> {
    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(log_path())
        .ok()?;
    let rule = "=".repeat(80);
    let _ = write!(
        file,
        "\n{rule}\npanemux {} debug session started at {}\n{rule}\n",
        crate::VERSION,
        get_timestamp()
    );
    Some(file)
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Level requested by a `RUST_LOG` value
///
/// Accepts a bare level (`debug`) or `target=level` directives; the most
/// verbose level named wins.
pub fn parse_env_level(value: &str) -> Option<LevelFilter> {
    value
        .split(',')
        .filter_map(|directive| {
            let level = directive.rsplit('=').next()?.trim();
            level.parse::<LevelFilter>().ok()
        })
        .max()
}

/// Install the `log` bridge. Call once, before anything logs.
///
/// `cli_level` wins over `RUST_LOG`; with neither, logging stays off until
/// [`apply_config_level`] is called.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let env_value = std::env::var("RUST_LOG").ok();
    let env_level = env_value.as_deref().and_then(parse_env_level);
    let level = cli_level.or(env_level);

    let _ = LOGGER.set(Mutex::new(DebugLogger {
        file: None,
        opened: false,
        mirror_stderr: env_value.is_some(),
    }));

    if log::set_logger(&BRIDGE).is_err() {
        return;
    }
    LEVEL_PINNED.store(level.is_some(), Ordering::SeqCst);
    log::set_max_level(level.unwrap_or(LevelFilter::Off));
}

/// Apply the config file's level unless the CLI or `RUST_LOG` already chose one
pub fn apply_config_level(level: LevelFilter) {
    if !LEVEL_PINNED.load(Ordering::SeqCst) {
        log::set_max_level(level);
    }
}
