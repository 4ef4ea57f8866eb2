use anyhow::{anyhow, bail, Result};
use sekaidl_etl::config::LoggingConfig;
use twyg::{LogLevel, OptsBuilder};

/// Install the twyg logger for the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let opts = OptsBuilder::new()
        .coloured(config.coloured)
        .level(parse_level(&config.level)?)
        .report_caller(false)
        .build()
        .map_err(|e| anyhow!("Invalid logging options: {e:?}"))?;

    twyg::setup(opts).map_err(|e| anyhow!("Failed to set up logging: {e:?}"))?;
    Ok(())
}

fn parse_level(level: &str) -> Result<LogLevel> {
    Ok(match level.trim().to_ascii_lowercase().as_str() {
        "trace" => LogLevel::Trace,
        "debug" => LogLevel::Debug,
        "info" => LogLevel::Info,
        "warn" | "warning" => LogLevel::Warn,
        "error" => LogLevel::Error,
        other => bail!("Unknown log level: {other}\n\nValid levels: trace, debug, info, warn, error"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert!(matches!(parse_level("info").unwrap(), LogLevel::Info));
        assert!(matches!(parse_level(" DEBUG ").unwrap(), LogLevel::Debug));
        assert!(matches!(parse_level("warning").unwrap(), LogLevel::Warn));
        assert!(parse_level("loud").is_err());
    }
}
