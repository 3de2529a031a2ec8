use crate::logger::severity::LogSeverity;
use crate::logger::time::now;
use once_cell::sync::Lazy;

/// Environment variable holding the minimum severity that gets printed.
pub const LOG_LEVEL_ENV: &str = "STRUCTURE_EDITOR_LOG";

static MIN_SEVERITY: Lazy<LogSeverity> = Lazy::new(|| {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| LogSeverity::parse(&level))
        .unwrap_or(LogSeverity::Info)
});

pub fn enabled(log_severity: LogSeverity) -> bool {
    log_severity >= *MIN_SEVERITY
}

// Logs go to stderr so they never mix with session output on stdout.
pub fn log(msg: String, log_severity: LogSeverity) {
    if enabled(log_severity) {
        eprintln!("[{}] {} {}", log_severity, now(), msg);
    }
}
