pub mod codec;
pub use codec::CrlfCodec;
pub mod command;
pub use command::{Command, CommandError};

/// Reply to a query for a sensor that hasn't been ingested since startup
pub const INVALID_SENSOR_REPLY: &[u8] = b"ERRO|ID_SENSOR_INVALIDO\r\n";
