use thiserror::Error;

use crate::record::{
    SensorId, TelemetryRecord,
    time::{self, TimeError},
};

pub const FIELD_SEPARATOR: u8 = b'|';

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` is not valid UTF-8")]
    InvalidUtf8(&'static str),
    #[error("invalid value `{0}`")]
    InvalidValue(String),
    #[error("invalid count `{0}`")]
    InvalidCount(String),
    #[error(transparent)]
    Timestamp(#[from] TimeError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `LOG|<sensor_id>|<timestamp>|<value>`
    Log(TelemetryRecord),
    /// `GET|<sensor_id>|<count>`
    Get { sensor_id: SensorId, count: i64 },
    /// anything without a known three byte prefix
    Unknown,
}

impl Command {
    /// Parses a frame with the terminator already stripped.
    /// Fields after the ones a command uses are ignored.
    pub fn parse(frame: &[u8]) -> Result<Self, CommandError> {
        match frame.get(..3) {
            Some(b"LOG") => parse_log(frame),
            Some(b"GET") => parse_get(frame),
            _ => Ok(Self::Unknown),
        }
    }
}

fn parse_log(frame: &[u8]) -> Result<Command, CommandError> {
    let mut fields = frame.split(|b| *b == FIELD_SEPARATOR).skip(1);

    let sensor_id = SensorId::new(fields.next().ok_or(CommandError::MissingField("sensor_id"))?);
    let timestamp = text_field(fields.next(), "timestamp")?;
    let value = text_field(fields.next(), "value")?;

    Ok(Command::Log(TelemetryRecord {
        sensor_id,
        timestamp: time::parse(timestamp)?,
        value: value
            .trim()
            .parse()
            .map_err(|_| CommandError::InvalidValue(value.to_string()))?,
    }))
}

fn parse_get(frame: &[u8]) -> Result<Command, CommandError> {
    let mut fields = frame.split(|b| *b == FIELD_SEPARATOR).skip(1);

    let sensor_id = SensorId::new(fields.next().ok_or(CommandError::MissingField("sensor_id"))?);
    let count = text_field(fields.next(), "count")?;

    Ok(Command::Get {
        sensor_id,
        count: count
            .trim()
            .parse()
            .map_err(|_| CommandError::InvalidCount(count.to_string()))?,
    })
}

fn text_field<'a>(field: Option<&'a [u8]>, name: &'static str) -> Result<&'a str, CommandError> {
    let field = field.ok_or(CommandError::MissingField(name))?;
    std::str::from_utf8(field).map_err(|_| CommandError::InvalidUtf8(name))
}
