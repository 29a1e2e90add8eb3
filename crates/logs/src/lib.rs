//! Logging macros for the mtqueue crates.
//!
//! Every macro forwards to the matching `tracing` macro, but only when the
//! *calling* crate enables the corresponding feature (`log_info`,
//! `log_warnings`, `log_errors`, `log_debug`). `cfg!` is expanded at the call
//! site, so each crate using these macros declares the same feature set in
//! its own manifest.

#[doc(hidden)]
pub use tracing;

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => {
        if cfg!(feature = "log_info") {
            $crate::tracing::info!($($t)*);
        }
    };
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => {
        if cfg!(feature = "log_warnings") {
            $crate::tracing::warn!($($t)*);
        }
    };
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => {
        if cfg!(feature = "log_debug") {
            $crate::tracing::debug!($($t)*);
        }
    };
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => {
        if cfg!(feature = "log_errors") {
            $crate::tracing::error!($($t)*);
        }
    };
}
