use std::fmt;

use thiserror::Error;

pub mod time;

pub const SENSOR_ID_LEN: usize = 32;
/// id (32) + timestamp (8) + value (8)
pub const RECORD_SIZE: usize = SENSOR_ID_LEN + 8 + 8;

const TIMESTAMP_OFFSET: usize = SENSOR_ID_LEN;
const VALUE_OFFSET: usize = TIMESTAMP_OFFSET + 8;

#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("record needs 48 bytes, got {len}")]
    ShortBuffer { len: usize },
}

/// Sensor identifier in a fixed 32 byte field.
///
/// At most 31 bytes are kept (the last byte is always NUL), input stops at the
/// first NUL and the rest of the field is NUL padded. No charset is enforced.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorId([u8; SENSOR_ID_LEN]);

impl SensorId {
    pub fn new(raw: &[u8]) -> Self {
        let len = raw
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(raw.len())
            .min(SENSOR_ID_LEN - 1);

        let mut field = [0u8; SENSOR_ID_LEN];
        field[..len].copy_from_slice(&raw[..len]);
        Self(field)
    }

    /// id bytes without padding
    pub fn as_bytes(&self) -> &[u8] {
        let len = self
            .0
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(SENSOR_ID_LEN);
        &self.0[..len]
    }

    pub fn field(&self) -> &[u8; SENSOR_ID_LEN] {
        &self.0
    }

    fn from_field(field: [u8; SENSOR_ID_LEN]) -> Self {
        Self(field)
    }
}

impl From<&str> for SensorId {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SensorId").field(&self.to_string()).finish()
    }
}

/// One telemetry sample. On disk it is exactly [`RECORD_SIZE`] bytes:
///
/// ```text
/// +----------------------+-----------------+--------------+
/// | sensor id (32, NUL)  | seconds i64 LE  | value f64 LE |
/// +----------------------+-----------------+--------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    pub sensor_id: SensorId,
    /// seconds since the unix epoch, taken from a local civil time
    pub timestamp: i64,
    pub value: f64,
}

impl TelemetryRecord {
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[..TIMESTAMP_OFFSET].copy_from_slice(self.sensor_id.field());
        buf[TIMESTAMP_OFFSET..VALUE_OFFSET].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[VALUE_OFFSET..].copy_from_slice(&self.value.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; RECORD_SIZE]) -> Self {
        let mut field = [0u8; SENSOR_ID_LEN];
        field.copy_from_slice(&buf[..TIMESTAMP_OFFSET]);

        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&buf[TIMESTAMP_OFFSET..VALUE_OFFSET]);

        let mut value = [0u8; 8];
        value.copy_from_slice(&buf[VALUE_OFFSET..]);

        Self {
            sensor_id: SensorId::from_field(field),
            timestamp: i64::from_le_bytes(timestamp),
            value: f64::from_le_bytes(value),
        }
    }

    /// Decodes the first record of `buf`, extra bytes are ignored
    pub fn from_slice(buf: &[u8]) -> Result<Self, RecordError> {
        let Some(head) = buf.first_chunk::<RECORD_SIZE>() else {
            return Err(RecordError::ShortBuffer { len: buf.len() });
        };
        Ok(Self::decode(head))
    }

    /// `Sensor: <id>, Tempo: <local time>, Valor: <value>\n`
    pub fn to_line(&self) -> String {
        // records written by other tools can hold seconds jiff can't represent
        let tempo = time::format(self.timestamp).unwrap_or_else(|_| self.timestamp.to_string());
        format!(
            "Sensor: {}, Tempo: {}, Valor: {}\n",
            self.sensor_id, tempo, self.value
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> TelemetryRecord {
        TelemetryRecord {
            sensor_id: SensorId::from("S1"),
            timestamp: 1_704_110_400,
            value: 23.5,
        }
    }

    #[test]
    fn test_sensor_id_padding() {
        let id = SensorId::from("temp-01");
        assert_eq!(id.as_bytes(), b"temp-01");
        assert_eq!(&id.field()[..7], b"temp-01");
        assert!(id.field()[7..].iter().all(|b| *b == 0));
        assert_eq!(id.to_string(), "temp-01");
    }

    #[test]
    fn test_sensor_id_truncation() {
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        let id = SensorId::from(long);
        assert_eq!(id.as_bytes().len(), SENSOR_ID_LEN - 1);
        assert_eq!(id.as_bytes(), &long.as_bytes()[..31]);
        assert_eq!(id.field()[31], 0);

        // same 31 byte prefix is the same sensor
        assert_eq!(id, SensorId::from(&long[..31]));
        assert_eq!(id, SensorId::from(&long[..33]));
    }

    #[test]
    fn test_sensor_id_stops_at_nul() {
        let id = SensorId::new(b"abc\0def");
        assert_eq!(id.as_bytes(), b"abc");
        assert_eq!(id, SensorId::from("abc"));
    }

    #[test]
    fn test_encode_layout() {
        let buf = sample().encode();
        assert_eq!(buf.len(), 48);
        assert_eq!(&buf[..2], b"S1");
        assert!(buf[2..32].iter().all(|b| *b == 0));
        assert_eq!(&buf[32..40], &1_704_110_400i64.to_le_bytes());
        assert_eq!(&buf[40..48], &23.5f64.to_le_bytes());
    }

    #[test]
    fn test_decode_inverse() {
        let record = TelemetryRecord {
            sensor_id: SensorId::from("a-sensor-with-a-rather-long-name-here"),
            timestamp: -86_400,
            value: -0.1 + 0.2,
        };
        let decoded = TelemetryRecord::decode(&record.encode());
        assert_eq!(decoded, record);
        assert_eq!(decoded.value.to_bits(), record.value.to_bits());
        assert_eq!(decoded.sensor_id.as_bytes().len(), 31);
    }

    #[test]
    fn test_decode_full_width_id() {
        // files from other writers may fill all 32 bytes
        let mut buf = sample().encode();
        buf[..32].copy_from_slice(&[b'x'; 32]);
        let decoded = TelemetryRecord::decode(&buf);
        assert_eq!(decoded.sensor_id.as_bytes(), &[b'x'; 32]);
    }

    #[test]
    fn test_from_slice() {
        let buf = sample().encode();
        assert_eq!(TelemetryRecord::from_slice(&buf).unwrap(), sample());
        assert_eq!(
            TelemetryRecord::from_slice(&buf[..47]),
            Err(RecordError::ShortBuffer { len: 47 })
        );

        let mut two = buf.to_vec();
        two.extend_from_slice(&buf);
        assert_eq!(TelemetryRecord::from_slice(&two).unwrap(), sample());
    }

    #[test]
    fn test_to_line() {
        let record = sample();
        let tempo = time::format(record.timestamp).unwrap();
        assert_eq!(
            record.to_line(),
            format!("Sensor: S1, Tempo: {tempo}, Valor: 23.5\n")
        );

        let out_of_range = TelemetryRecord {
            timestamp: i64::MAX,
            ..record
        };
        assert_eq!(
            out_of_range.to_line(),
            format!("Sensor: S1, Tempo: {}, Valor: 23.5\n", i64::MAX)
        );
    }
}
