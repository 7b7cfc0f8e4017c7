//! Public surface for call history paging and dial suggestions.
//!
//! This crate re-exports the building blocks, wires them together in
//! [`CallHistoryRuntime`], and provides a logging helper for binaries.

mod runtime;

pub use callhistory_rs_config as config;
/// Paging, filters, the contact cache and the suggestion engine.
pub use callhistory_rs_core as core;
pub use callhistory_rs_protocol as protocol;

pub use runtime::CallHistoryRuntime;

/// Route `log` output through env_logger, honouring `RUST_LOG`.
///
/// Does nothing without the `logging` feature. Safe to call more than once.
#[inline]
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
