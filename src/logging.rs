// src/logging.rs
//
// Logger bootstrap for the platforms the engine ships on.
//
// The core only ever talks to the `log` facade. Hosts that already install
// a logger can skip this entirely.

use log::LevelFilter;

// Logger subsystem identifier
#[cfg(feature = "ios")]
const LOG_SUBSYSTEM: &str = "com.automod.engine";

/// Install the platform logger. Safe to call more than once.
#[cfg(feature = "ios")]
pub fn init_logger(level: LevelFilter) {
    oslog::OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(level)
        .init()
        .ok();
}

/// Install the platform logger. Safe to call more than once.
#[cfg(all(feature = "web", not(feature = "ios")))]
pub fn init_logger(level: LevelFilter) {
    console_error_panic_hook::set_once();
    if let Some(level) = level.to_level() {
        console_log::init_with_level(level).ok();
    }
}

/// Install the platform logger. Safe to call more than once.
#[cfg(all(feature = "desktop", not(any(feature = "ios", feature = "web"))))]
pub fn init_logger(level: LevelFilter) {
    simplelog::SimpleLogger::init(level, simplelog::Config::default()).ok();
}

/// No platform backend compiled in; only the max level is applied.
#[cfg(not(any(feature = "ios", feature = "web", feature = "desktop")))]
pub fn init_logger(level: LevelFilter) {
    log::set_max_level(level);
}
