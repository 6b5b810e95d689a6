//! Centralized logging for the HLE crates.
//!
//! # Architecture
//!
//! - **LogConfig**: process-wide configuration held in atomics
//! - **LogLevel**: hierarchical levels (Off < Error < Warn < Info < Debug < Trace)
//! - **LogCategory**: task dispatch, audio list commands, DSP, memory, dumps, stubs
//! - **log()**: lazily formatted entry point, rate limited per category
//!
//! A category whose own level is `Off` falls back to the global level.
//! Messages go to stderr unless a log file is configured, in which case a
//! background thread owns the file so dispatch never blocks on disk I/O.
//!
//! # Usage
//!
//! ```rust
//! use hle_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Task, LogLevel::Warn, || {
//!     format!("unknown OSTask: sum {:x}", 0x1234)
//! });
//! ```

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

const CATEGORY_COUNT: usize = 6;

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category for the different HLE components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Task classification and ucode identification
    Task,
    /// Audio command list interpretation
    Alist,
    /// DSP primitives (ADPCM, resampler, envelopes, filters)
    Dsp,
    /// DMEM/IMEM/RDRAM access
    Memory,
    /// Diagnostic dump files
    Dump,
    /// Unimplemented commands and collaborator stubs
    Stubs,
}

impl LogCategory {
    pub const ALL: [LogCategory; CATEGORY_COUNT] = [
        LogCategory::Task,
        LogCategory::Alist,
        LogCategory::Dsp,
        LogCategory::Memory,
        LogCategory::Dump,
        LogCategory::Stubs,
    ];

    fn index(self) -> usize {
        match self {
            LogCategory::Task => 0,
            LogCategory::Alist => 1,
            LogCategory::Dsp => 2,
            LogCategory::Memory => 3,
            LogCategory::Dump => 4,
            LogCategory::Stubs => 5,
        }
    }
}

/// Sliding-window limiter, one window per category.
struct RateLimiter {
    max_logs_per_second: AtomicUsize,
    window_duration: Duration,
    windows: Mutex<[VecDeque<Instant>; CATEGORY_COUNT]>,
    dropped: Mutex<[usize; CATEGORY_COUNT]>,
    last_drop_report: Mutex<[Option<Instant>; CATEGORY_COUNT]>,
}

impl RateLimiter {
    fn new(max_logs_per_second: usize) -> Self {
        Self {
            max_logs_per_second: AtomicUsize::new(max_logs_per_second),
            window_duration: Duration::from_secs(1),
            windows: Mutex::new(Default::default()),
            dropped: Mutex::new([0; CATEGORY_COUNT]),
            last_drop_report: Mutex::new([None; CATEGORY_COUNT]),
        }
    }

    /// Returns (allowed, dropped_count); dropped_count is Some(n) when a drop
    /// summary is due.
    fn should_allow(&self, category: LogCategory) -> (bool, Option<usize>) {
        let now = Instant::now();
        let idx = category.index();

        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let mut dropped = self.dropped.lock().unwrap_or_else(|e| e.into_inner());
        let mut last_report = self
            .last_drop_report
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let window = &mut windows[idx];
        while let Some(&front) = window.front() {
            if now.duration_since(front) > self.window_duration {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() < self.max_logs_per_second.load(Ordering::Relaxed) {
            window.push_back(now);
            if dropped[idx] > 0 {
                let count = dropped[idx];
                dropped[idx] = 0;
                last_report[idx] = Some(now);
                return (true, Some(count));
            }
            return (true, None);
        }

        dropped[idx] += 1;
        let report_due = match last_report[idx] {
            None => true,
            Some(last) => now.duration_since(last) >= Duration::from_secs(1),
        };
        if report_due {
            let count = dropped[idx];
            dropped[idx] = 0;
            last_report[idx] = Some(now);
            (false, Some(count))
        } else {
            (false, None)
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    global_level: AtomicU8,
    category_levels: [AtomicU8; CATEGORY_COUNT],
    log_sender: Mutex<Option<Sender<String>>>,
    file_logging_enabled: AtomicBool,
    rate_limiter: RateLimiter,
}

impl LogConfig {
    /// All logging off, 60 messages per second per category.
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            category_levels: Default::default(),
            log_sender: Mutex::new(None),
            file_logging_enabled: AtomicBool::new(false),
            rate_limiter: RateLimiter::new(60),
        }
    }

    /// Get the global singleton instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.category_levels[category.index()].load(Ordering::Relaxed))
    }

    /// A category with its own level uses it; otherwise the global level applies.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Reset all logging to Off
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    /// Set the maximum logs per second per category
    pub fn set_rate_limit(&self, max_logs_per_second: usize) {
        self.rate_limiter
            .max_logs_per_second
            .store(max_logs_per_second, Ordering::Relaxed);
    }

    pub fn get_rate_limit(&self) -> usize {
        self.rate_limiter.max_logs_per_second.load(Ordering::Relaxed)
    }

    /// Route output to `path` through a background writer thread.
    ///
    /// Replaces any previous sink; the old thread exits once its sender drops.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel::<String>();

        thread::Builder::new()
            .name("hle-log-writer".to_string())
            .spawn(move || {
                let mut file = file;
                while let Ok(message) = receiver.recv() {
                    let _ = writeln!(file, "{}", message);
                    let _ = file.flush();
                }
            })?;

        *self.log_sender.lock().unwrap_or_else(|e| e.into_inner()) = Some(sender);
        self.file_logging_enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Stop logging to file and go back to stderr
    pub fn clear_log_file(&self) {
        *self.log_sender.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.file_logging_enabled.store(false, Ordering::Relaxed);
    }

    fn write_message(&self, message: &str) {
        if self.file_logging_enabled.load(Ordering::Relaxed) {
            let sender = self.log_sender.lock().unwrap_or_else(|e| e.into_inner());
            match sender.as_ref() {
                Some(tx) if tx.send(message.to_string()).is_ok() => {}
                _ => eprintln!("{}", message),
            }
        } else {
            eprintln!("{}", message);
        }
    }
}

/// Log a message with the specified category and level.
///
/// `message_fn` only runs when the category/level is enabled and the rate
/// limiter lets the message through, so formatting costs nothing while
/// logging is off.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if !config.should_log(category, level) {
        return;
    }

    let (allowed, dropped) = config.rate_limiter.should_allow(category);
    if let Some(count) = dropped.filter(|&n| n > 0) {
        config.write_message(&format!(
            "[{:?}] WARNING: Rate limit exceeded, {} log message(s) dropped in the last second",
            category, count
        ));
    }

    if allowed {
        config.write_message(&message_fn());
    }
}
