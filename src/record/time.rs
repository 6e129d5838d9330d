use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
use thiserror::Error;

/// Wire and display form of a timestamp. No zone is ever attached.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Error, Debug)]
pub enum TimeError {
    #[error("timestamp `{input}` is not YYYY-MM-DDTHH:MM:SS: {source}")]
    Parse { input: String, source: jiff::Error },
    #[error("local time `{input}` has no instant: {source}")]
    Resolve { input: String, source: jiff::Error },
    #[error("{secs} seconds is out of range: {source}")]
    OutOfRange { secs: i64, source: jiff::Error },
}

/// Parses a local civil time in the system time zone into epoch seconds
pub fn parse(input: &str) -> Result<i64, TimeError> {
    parse_in(input, TimeZone::system())
}

/// Formats epoch seconds as a civil time in the system time zone
pub fn format(secs: i64) -> Result<String, TimeError> {
    format_in(secs, TimeZone::system())
}

/// Gaps and folds around DST transitions resolve with jiff's compatible
/// strategy, so these don't always round trip with [`format_in`].
pub fn parse_in(input: &str, tz: TimeZone) -> Result<i64, TimeError> {
    let civil = DateTime::strptime(TIMESTAMP_FORMAT, input).map_err(|source| TimeError::Parse {
        input: input.to_string(),
        source,
    })?;

    let zoned = civil.to_zoned(tz).map_err(|source| TimeError::Resolve {
        input: input.to_string(),
        source,
    })?;

    Ok(zoned.timestamp().as_second())
}

pub fn format_in(secs: i64, tz: TimeZone) -> Result<String, TimeError> {
    let ts = Timestamp::from_second(secs).map_err(|source| TimeError::OutOfRange { secs, source })?;
    Ok(ts.to_zoned(tz).strftime(TIMESTAMP_FORMAT).to_string())
}
