//! Logger set-up for applications and tests.
use simplelog::{ColorChoice, Config, LevelFilter, SimpleLogger, TermLogger, TerminalMode};

/// Installs a terminal logger at `level`; falls back to a plain stdout logger
/// when no terminal is available. Returns false if a logger was already set.
pub fn init_logger(level: LevelFilter) -> bool {
    if TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto).is_ok() {
        return true;
    }
    SimpleLogger::init(level, Config::default()).is_ok()
}
