//! Coloured, timestamped console logging used throughout the ground station.

/// Prints one line as `<colour>[TAG][HH:MM:SS]<reset> message`.
#[doc(hidden)]
#[macro_export]
macro_rules! __gs_line {
    ($colour:literal, $tag:literal, $($arg:tt)*) => {
        println!(
            concat!("\x1b[", $colour, "m", $tag, "[{}]\x1b[0m {}"),
            chrono::Utc::now().format("%H:%M:%S"),
            format!($($arg)*)
        )
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::__gs_line!("32", "[INFO] ", $($arg)*) };
}

#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => { $crate::__gs_line!("33", "[LOG]  ", $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::__gs_line!("35", "[WARN] ", $($arg)*) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::__gs_line!("31", "[ERROR]", $($arg)*) };
}

/// Battery and telemetry notices an operator should always see.
#[macro_export]
macro_rules! telem {
    ($($arg:tt)*) => { $crate::__gs_line!("1;34", "[TELEM]", $($arg)*) };
}

/// Per-cycle chatter, only printed when `LOG_DRONE_EVENTS` is set.
#[macro_export]
macro_rules! event {
    ($($arg:tt)*) => {
        if std::env::var("LOG_DRONE_EVENTS").is_ok() {
            $crate::__gs_line!("36", "[EVENT]", $($arg)*)
        }
    };
}

/// Unrecoverable startup defects only; command failures never reach this.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        panic!(
            "\x1b[1;31m[FATAL][{}]\x1b[0m {}",
            chrono::Utc::now().format("%H:%M:%S"),
            format!($($arg)*)
        )
    };
}
