use log::{Log, Metadata, Record};

/// Forwards records to whatever logger is installed globally.
pub struct GlobalLogger;

impl Log for GlobalLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record) {
        log::logger().log(record)
    }

    fn flush(&self) {
        log::logger().flush()
    }
}

/// Logs through an injected `log::Log` instead of the global facade.
macro_rules! emit {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        use log::Log as _;
        $logger.log(
            &log::Record::builder()
                .level($level)
                .target(module_path!())
                .module_path_static(Some(module_path!()))
                .file_static(Some(file!()))
                .line(Some(line!()))
                .args(format_args!($($arg)+))
                .build(),
        );
    }};
}

pub(crate) use emit;

#[cfg(test)]
mod test {
    use log::Level;

    use crate::utils::test_utilities::CapturingLogger;

    #[test]
    fn emit_formats_record() {
        let logger = CapturingLogger::default();
        emit!(logger, Level::Warn, "Removing running container '{}'", "c0ffee");
        assert_eq!(
            logger.records(),
            vec![(Level::Warn, String::from("Removing running container 'c0ffee'"))]
        );
    }
}
