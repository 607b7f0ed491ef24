//! Logging setup for the buck-sources binary.
//!
//! Everything goes to a size-rotated file under the buck-sources home
//! directory; stderr gets the same events unless the caller asks for quiet.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, Subscriber};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "buck_sources=info";
const VERBOSE_LOG_FILTER: &str = "buck_sources=debug";
const HOME_ENV: &str = "BUCK_SOURCES_HOME";
const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Logging configuration for buck-sources binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Debug-level events on stderr.
    pub verbose: bool,
    /// Only warnings and errors on stderr. Ignored when `verbose` is set.
    pub quiet: bool,
    /// Overrides the default `<home>/logs` directory.
    pub log_dir: Option<PathBuf>,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the built-in filters for the file layer.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let (subscriber, log_dir) = build_subscriber(config)?;
    subscriber
        .try_init()
        .context("A global tracing subscriber is already installed")?;
    debug!("Writing logs to {}", log_dir.display());
    Ok(())
}

/// The subscriber `init_logging` installs, plus the directory its file layer
/// writes to.
fn build_subscriber(
    config: LogConfig<'_>,
) -> Result<(impl Subscriber + Send + Sync + 'static, PathBuf)> {
    let log_dir = match config.log_dir {
        Some(dir) => dir,
        None => logs_dir().context("Could not determine buck-sources log directory")?,
    };
    let file_writer = SharedRollingWriter::new(&log_dir, config.app_name)
        .context("Failed to initialize rolling log writer")?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = if config.verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else if config.quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        );

    Ok((subscriber, log_dir))
}

/// `$BUCK_SOURCES_HOME`, or `~/.buck_sources`.
pub fn buck_sources_home() -> Option<PathBuf> {
    if let Ok(override_path) = std::env::var(HOME_ENV) {
        return Some(PathBuf::from(override_path));
    }
    dirs::home_dir().map(|home| home.join(".buck_sources"))
}

/// `<home>/logs`
pub fn logs_dir() -> Option<PathBuf> {
    buck_sources_home().map(|home| home.join("logs"))
}

struct RollingFileAppender {
    dir: PathBuf,
    base_name: String,
    max_files: usize,
    max_size: u64,
    file: Option<File>,
    current_size: u64,
}

impl RollingFileAppender {
    fn open(dir: &Path, base_name: &str, max_files: usize, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut appender = Self {
            dir: dir.to_path_buf(),
            base_name: sanitize_name(base_name),
            max_files: max_files.max(1),
            max_size,
            file: None,
            current_size: 0,
        };
        appender.reopen()?;
        if appender.current_size > appender.max_size {
            appender.rotate()?;
        }
        Ok(appender)
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_path())?;
        self.current_size = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.base_name))
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.base_name, index))
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        let max_index = self.max_files.saturating_sub(1);
        if max_index == 0 {
            // Single-file mode: start over.
            fs::remove_file(self.current_path()).or_else(ignore_not_found)?;
            return self.reopen();
        }

        fs::remove_file(self.rotated_path(max_index)).or_else(ignore_not_found)?;
        for idx in (1..max_index).rev() {
            let src = self.rotated_path(idx);
            if src.exists() {
                fs::rename(&src, self.rotated_path(idx + 1))?;
            }
        }
        let current = self.current_path();
        if current.exists() {
            fs::rename(current, self.rotated_path(1))?;
        }

        self.reopen()
    }
}

fn ignore_not_found(err: io::Error) -> io::Result<()> {
    if err.kind() == io::ErrorKind::NotFound {
        Ok(())
    } else {
        Err(err)
    }
}

impl Write for RollingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.current_size > 0 && self.current_size + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let bytes = file.write(buf)?;
        self.current_size += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
struct SharedRollingWriter {
    inner: Arc<Mutex<RollingFileAppender>>,
}

impl SharedRollingWriter {
    fn new(dir: &Path, base_name: &str) -> Result<Self> {
        let appender = RollingFileAppender::open(dir, base_name, MAX_LOG_FILES, MAX_LOG_FILE_SIZE)
            .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(appender)),
        })
    }
}

struct SharedRollingWriterGuard {
    inner: Arc<Mutex<RollingFileAppender>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedRollingWriter {
    type Writer = SharedRollingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedRollingWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedRollingWriterGuard {
    fn with_appender<T>(
        &self,
        f: impl FnOnce(&mut RollingFileAppender) -> io::Result<T>,
    ) -> io::Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        f(&mut guard)
    }
}

impl Write for SharedRollingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_appender(|appender| appender.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_appender(|appender| appender.flush())
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("buck-sources"), "buck-sources");
        assert_eq!(sanitize_name("a/b c"), "a_b_c");
    }

    #[test]
    fn test_events_land_in_log_dir() {
        let dir = TempDir::new().unwrap();
        let (subscriber, log_dir) = build_subscriber(LogConfig {
            app_name: "buck-sources",
            verbose: false,
            quiet: true,
            log_dir: Some(dir.path().join("logs")),
        })
        .unwrap();
        assert_eq!(log_dir, dir.path().join("logs"));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "buck_sources", "link-tree missing for //x:y");
        });

        let log = fs::read_to_string(log_dir.join("buck-sources.log")).unwrap();
        assert!(log.contains("link-tree missing for //x:y"), "{log}");
    }

    #[test]
    fn test_appender_rotates_when_full() {
        let dir = TempDir::new().unwrap();
        let mut appender = RollingFileAppender::open(dir.path(), "app", 3, 16).unwrap();

        appender.write_all(b"0123456789").unwrap();
        appender.write_all(b"0123456789").unwrap();
        appender.write_all(b"0123456789").unwrap();
        appender.flush().unwrap();

        assert!(dir.path().join("app.log").exists());
        assert!(dir.path().join("app.log.1").exists());
        assert!(dir.path().join("app.log.2").exists());
        assert!(!dir.path().join("app.log.3").exists());
        assert_eq!(fs::read(dir.path().join("app.log")).unwrap(), b"0123456789");
    }

    #[test]
    fn test_appender_single_file_truncates() {
        let dir = TempDir::new().unwrap();
        let mut appender = RollingFileAppender::open(dir.path(), "solo", 1, 8).unwrap();

        appender.write_all(b"abcdef").unwrap();
        appender.write_all(b"ghijkl").unwrap();
        appender.flush().unwrap();

        assert!(!dir.path().join("solo.log.1").exists());
        assert_eq!(fs::read(dir.path().join("solo.log")).unwrap(), b"ghijkl");
    }

    #[test]
    fn test_appender_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("keep.log"), b"old\n").unwrap();

        let mut appender = RollingFileAppender::open(dir.path(), "keep", 2, 1024).unwrap();
        appender.write_all(b"new\n").unwrap();
        appender.flush().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("keep.log")).unwrap(), "old\nnew\n");
    }
}
