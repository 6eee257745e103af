//! Emitting log records to an injected [`log::Log`] rather than the global facade.
//!
//! Components hold a `&dyn Log` handed to them at construction. Unless told otherwise they use
//! [`log::logger()`], so a binary that installs a logger once at startup sees everything.

/// Log to a specific logger: `log_to!(self.logger, Warn, "chunk {} failed", chunk)`.
macro_rules! log_to {
    ($logger:expr, $level:ident, $($arg:tt)+) => {{
        let logger: &dyn ::log::Log = $logger;
        let metadata = ::log::Metadata::builder()
            .level(::log::Level::$level)
            .target(module_path!())
            .build();
        if logger.enabled(&metadata) {
            logger.log(
                &::log::Record::builder()
                    .metadata(metadata)
                    .args(format_args!($($arg)+))
                    .module_path_static(Some(module_path!()))
                    .file_static(Some(file!()))
                    .line(Some(line!()))
                    .build(),
            );
        }
    }};
}
