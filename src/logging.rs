use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Warn,
    Info,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Self::Warn => "MEMSYNC_WARN",
            Self::Info => "MEMSYNC_INFO",
        }
    }
}

pub const LOG_ENV: &str = "MEMSYNC_LOG";

static THRESHOLD: OnceLock<Option<Level>> = OnceLock::new();

fn parse_threshold(raw: Option<&str>) -> Option<Level> {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("quiet" | "off" | "none") => None,
        Some("info" | "debug" | "trace") => Some(Level::Info),
        _ => Some(Level::Warn),
    }
}

/// Read `LOG_ENV` once; later calls are no-ops.
pub fn init() {
    let raw = env::var(LOG_ENV).ok();
    let _ = THRESHOLD.set(parse_threshold(raw.as_deref()));
}

fn enabled(level: Level) -> bool {
    match THRESHOLD.get_or_init(|| Some(Level::Warn)) {
        Some(max) => level <= *max,
        None => false,
    }
}

fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else if !ch.is_control() {
            out.push(ch);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "na".to_string()
    } else {
        trimmed.to_string()
    }
}

fn render(level: Level, code: &str, fields: &[(&str, &str)]) -> String {
    let mut line = format!("{} code={}", level.tag(), sanitize_value(code));
    for (key, value) in fields {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        line.push_str(&sanitize_value(value));
    }
    line
}

pub fn emit(level: Level, code: &str, fields: &[(&str, &str)]) {
    if enabled(level) {
        eprintln!("{}", render(level, code, fields));
    }
}

pub fn warn(code: &str, fields: &[(&str, &str)]) {
    emit(Level::Warn, code, fields);
}

pub fn info(code: &str, fields: &[(&str, &str)]) {
    emit(Level::Info, code, fields);
}
