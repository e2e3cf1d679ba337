//! Utilities for logging messages from the library.
//!
//! Warnings about a broken tree go straight to `tracing`.  The chattier messages about
//! what the library decided to do with a document (ids it assigned, values it ignored)
//! go through [`spobject_log!`], which is only active when the `SPOBJECT_LOG`
//! environment variable is set.

use once_cell::sync::Lazy;

#[doc(hidden)]
#[macro_export]
macro_rules! spobject_log {
    (
        $session:expr,
        $($arg:tt)+
    ) => {
        if $session.log_enabled() {
            ::tracing::debug!("{}", format_args!($($arg)+));
        }
    };
}

pub fn log_enabled() -> bool {
    static ENABLED: Lazy<bool> = Lazy::new(|| ::std::env::var_os("SPOBJECT_LOG").is_some());

    *ENABLED
}
