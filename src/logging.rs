//! Startup logging.
//!
//! Resolution runs before the banner is printed, so its `tracing` output is
//! captured by a [`DeferredLog`] and replayed afterwards. Once the banner is
//! out, [`init_logging`] installs the process-wide subscriber.

use crate::cli::LogTarget;
use crate::config::BootstrapResult;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber, Layer, fmt};

/// File name used for `--log file`, inside `logger.log_directory`.
pub const LOG_FILE_NAME: &str = "hellpot.log";

/// Environment variable that overrides the post-startup log filter.
pub const LOG_ENV: &str = "HELLPOT_LOG";

/// In-memory line sink for pre-banner log output.
///
/// Clones share the same buffer and the same capture level. Recording never
/// fails and flushing ignores output errors.
#[derive(Debug, Clone, Default)]
pub struct DeferredLog {
    lines: Arc<Mutex<Vec<String>>>,
    debug: Arc<AtomicBool>,
}

impl DeferredLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    pub fn record(&self, line: impl Into<String>) {
        self.lock().push(line.into());
    }

    /// Snapshot of the captured lines.
    pub fn lines(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Switch capture between DEBUG and INFO. Takes effect for the next event.
    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    /// Most verbose level currently captured.
    pub fn max_level(&self) -> LevelFilter {
        level_for(self.debug.load(Ordering::Relaxed))
    }

    /// Print every captured line to stdout, in order.
    pub fn flush(&self) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.flush_to(&mut out);
    }

    /// Write every captured line to `out`, in order.
    pub fn flush_to<W: Write>(&self, out: &mut W) {
        for line in self.lock().iter() {
            if writeln!(out, "{line}").is_err() {
                return;
            }
        }
        let _ = out.flush();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `io::Write` handle that records each formatted event into a [`DeferredLog`].
#[derive(Debug, Clone)]
pub struct DeferredWriter {
    log: DeferredLog,
}

impl Write for DeferredWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        self.log.record(text.trim_end_matches('\n'));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DeferredLog {
    type Writer = DeferredWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DeferredWriter { log: self.clone() }
    }
}

fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Subscriber that formats events into `log` instead of the console.
///
/// Starts at DEBUG when `debug` is set, INFO otherwise. The level follows
/// [`DeferredLog::set_debug`] afterwards. Install it with
/// `tracing::subscriber::with_default` around resolution.
pub fn deferred_subscriber(
    log: &DeferredLog,
    debug: bool,
) -> impl Subscriber + Send + Sync + 'static {
    log.set_debug(debug);
    let switch = log.clone();
    let layer = fmt::layer()
        .with_writer(log.clone())
        .with_ansi(false)
        .with_filter(filter_fn(move |meta| *meta.level() <= switch.max_level()));
    tracing_subscriber::registry().with(layer)
}

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level_for(debug).into()))
}

/// Install the global subscriber according to the resolved configuration.
///
/// Level is DEBUG when `debug` is set, INFO otherwise; `HELLPOT_LOG` overrides.
pub fn init_logging(config: &BootstrapResult, target: LogTarget) -> anyhow::Result<()> {
    match target {
        LogTarget::Off => {
            // No logging
        }
        LogTarget::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(config.debug))
                .with_writer(io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(config.debug))
                .with_writer(io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File => {
            std::fs::create_dir_all(&config.log_directory)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(config.log_directory.join(LOG_FILE_NAME))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(config.debug))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
