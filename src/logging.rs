use std::io::{self, Write};
use std::sync::LazyLock;

use chrono::Local;
use log::{Level, LevelFilter, Log};

/// Environment variable that turns off timestamps when set to anything non-empty.
const NO_TIMESTAMPS_VAR: &str = "DDI_LOG_NO_TIMESTAMPS";

/// A simple logger that writes messages to `stderr`, keeping `stdout` free for command output.
///
/// Colour support is automatically provided by the [`anstream`] crate.
pub struct Logger {
    filter: LevelFilter,
    timestamps: bool,
}

/// Timestamp format for log output. Format is `Jul 08 2001 14:46:23`.
static TIMESTAMP_FMT: LazyLock<&'static [chrono::format::Item<'static>]> = LazyLock::new(|| {
    // Parsed once and leaked; the static lives for the whole program anyway.
    chrono::format::StrftimeItems::new("%b %d %Y %H:%M:%S")
        .parse_to_owned()
        .expect("hardcoded strftime string should be valid")
        .leak()
});

/// Predefined styles for log levels, following the colours `journalctl` uses.
#[rustfmt::skip]
mod styles {
    use anstyle::{Ansi256Color, AnsiColor, Color, Style};

    pub const TRACE: Style = Style::new().fg_color(Some(ansi256(245)));                 // grey
    pub const DEBUG: Style = Style::new().fg_color(None);
    pub const INFO: Style  = Style::new().fg_color(None).bold();
    pub const WARN: Style  = Style::new().fg_color(Some(ansi256(185))).bold();          // khaki
    pub const ERROR: Style = Style::new().fg_color(Some(ansi(AnsiColor::Red))).bold();

    const fn ansi256(color: u8) -> Color {
        Color::Ansi256(Ansi256Color(color))
    }

    const fn ansi(color: AnsiColor) -> Color {
        Color::Ansi(color)
    }
}

impl Logger {
    /// Creates a new logger instance.
    pub fn new(level: LevelFilter) -> Self {
        let timestamps = !std::env::var(NO_TIMESTAMPS_VAR).is_ok_and(|v| !v.is_empty());
        Self {
            filter: level,
            timestamps,
        }
    }

    /// Initializes this logger.
    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.filter;
        log::set_boxed_logger(Box::new(self)).map(|_| log::set_max_level(level))
    }

    /// Whether a record from `target` belongs to this crate. reqwest and hyper log too, but their internals are noise.
    fn is_own_target(target: &str) -> bool {
        let crate_name = env!("CARGO_CRATE_NAME");
        target == crate_name || target.strip_prefix(crate_name).is_some_and(|rest| rest.starts_with("::"))
    }

    /// Renders a record into a single line, without the trailing newline.
    fn format(&self, record: &log::Record, timestamp: Option<&str>) -> String {
        #[rustfmt::skip]
        let (style, tag) = match record.level() {
            Level::Trace => (styles::TRACE, "[trace]"),
            Level::Debug => (styles::DEBUG, "[debug]"),
            Level::Info  => ( styles::INFO, "[info]"),
            Level::Warn  => ( styles::WARN, "[warn]"),
            Level::Error => (styles::ERROR, "[error]"),
        };

        let mut line = String::new();
        if let Some(timestamp) = timestamp {
            line.push_str(timestamp);
            line.push(' ');
        }
        if !record.target().is_empty() {
            line.push_str(record.target());
            line.push(' ');
        }
        line.push_str(&format!("{style}{tag} {}{style:#}", record.args()));
        line
    }

    /// Fallible version of [`Log::log`] to enable the use of `?` within.
    fn try_log(&self, record: &log::Record) -> io::Result<()> {
        if !Self::is_own_target(record.target()) || !self.enabled(record.metadata()) {
            return Ok(());
        }

        let timestamp = self
            .timestamps
            .then(|| Local::now().format_with_items(TIMESTAMP_FMT.iter()).to_string());

        // `anstream`'s versions of `stderr` will automatically handle terminal/VT configuration and NO_COLOR support.
        let mut output = anstream::stderr().lock();
        writeln!(output, "{}", self.format(record, timestamp.as_deref()))?;
        output.flush()
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &log::Record) {
        let _ = self.try_log(record);
    }

    fn flush(&self) {
        let _ = anstream::stderr().flush();
    }
}
