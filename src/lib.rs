//! Telemetry ingestion over TCP.
//!
//! Clients send `LOG|<sensor>|<YYYY-MM-DDTHH:MM:SS>|<value>\r\n` to store a
//! reading and `GET|<sensor>|<count>\r\n` to read back a sensor's oldest
//! `count` readings. Readings go to one binary file per sensor.

pub mod config;
pub mod protocol;
pub mod record;
pub mod registry;
pub mod server;
pub mod session;
pub mod state;
pub mod store;
