//! Provides configuration of a logger.
use env_logger::Builder;
use log::trace;
use log::LevelFilter;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use time::OffsetDateTime;

/// Configures the log with the specified verbosity.
///
/// Verbosity 0 logs only errors and each additional level adds the next
/// level of detail, up to trace at 4. When `log_file` is given, records
/// go to that file instead of standard error.
pub fn configure(verbosity: u8, log_file: Option<PathBuf>) -> Result<(), String> {
    let log_level = level(verbosity)?;

    let mut builder = Builder::new();

    if let Some(log_location) = log_file {
        let file = File::create(&log_location).map_err(|e| {
            format!(
                "Unable to create log file {}. {}",
                log_location.display(),
                e
            )
        })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                OffsetDateTime::now_utc(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(log_level)
        .try_init()
        .map_err(|e| format!("Unable to start logger. {e}"))?;

    trace!("Logger verbosity {log_level}");
    Ok(())
}

fn level(verbosity: u8) -> Result<LevelFilter, String> {
    match verbosity {
        0 => Ok(LevelFilter::Error),
        1 => Ok(LevelFilter::Warn),
        2 => Ok(LevelFilter::Info),
        3 => Ok(LevelFilter::Debug),
        4 => Ok(LevelFilter::Trace),
        _ => Err(String::from("Verbosity is at most 4 (-vvvv)")),
    }
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;
    use std::path::PathBuf;

    use super::{configure, level};

    #[test]
    fn configure_when_verbosity_is_5_then_return_err() {
        assert!(configure(5, None).is_err());
    }

    #[test]
    fn configure_when_log_file_in_missing_directory_then_return_err() {
        let path = PathBuf::from("does/not/exist/cminusc.log");
        let result = configure(0, Some(path));

        assert!(result.unwrap_err().contains("Unable to create log file"));
    }

    #[test]
    fn level_when_each_verbosity_then_adds_detail() {
        assert_eq!(level(0), Ok(LevelFilter::Error));
        assert_eq!(level(2), Ok(LevelFilter::Info));
        assert_eq!(level(4), Ok(LevelFilter::Trace));
    }
}
