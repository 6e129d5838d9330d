use std::{
    collections::HashMap,
    ffi::OsString,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader},
    sync::Mutex,
};
use tracing::warn;

use crate::record::{RECORD_SIZE, SensorId, TelemetryRecord};

pub const LOG_FILE_EXTENSION: &str = "dat";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// One append-only file of fixed size records per sensor, `<data_dir>/<id>.dat`.
///
/// Appends and reads of the same sensor are serialized, different sensors
/// don't wait on each other.
#[derive(Debug)]
pub struct SensorLogStore {
    data_dir: PathBuf,
    /// sensor -> file lock
    locks: Mutex<HashMap<SensorId, Arc<Mutex<()>>>>,
}

impl SensorLogStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The name is built from the raw id bytes, so distinct ids never share a file
    pub fn path_for(&self, id: &SensorId) -> PathBuf {
        let mut name = file_stem(id);
        name.push(".");
        name.push(LOG_FILE_EXTENSION);
        self.data_dir.join(name)
    }

    async fn lock_for(&self, id: &SensorId) -> Arc<Mutex<()>> {
        self.locks.lock().await.entry(*id).or_default().clone()
    }

    /// Appends one record to its sensor's file, creating the file if needed
    pub async fn append(&self, record: &TelemetryRecord) -> Result<(), StoreError> {
        let path = self.path_for(&record.sensor_id);
        let lock = self.lock_for(&record.sensor_id).await;
        let _guard = lock.lock().await;

        let res: io::Result<()> = async {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            file.write_all(&record.encode()).await?;
            file.flush().await
        }
        .await;

        res.map_err(|source| StoreError::Io { path, source })
    }

    /// Reads up to `limit` records, oldest first. A missing file reads as empty.
    pub async fn read(
        &self,
        id: &SensorId,
        limit: usize,
    ) -> Result<Vec<TelemetryRecord>, StoreError> {
        let path = self.path_for(id);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let mut reader = BufReader::new(file);
        let mut records = Vec::new();
        let mut buf = [0u8; RECORD_SIZE];

        while records.len() < limit {
            let filled = match read_record(&mut reader, &mut buf).await {
                Ok(n) => n,
                Err(source) => return Err(StoreError::Io { path, source }),
            };

            if filled == 0 {
                break;
            }
            if filled < RECORD_SIZE {
                warn!(
                    "{} ends with a partial record ({filled} bytes), ignoring it",
                    path.display()
                );
                break;
            }

            records.push(TelemetryRecord::decode(&buf));
        }

        Ok(records)
    }

    pub async fn read_all(&self, id: &SensorId) -> Result<Vec<TelemetryRecord>, StoreError> {
        self.read(id, usize::MAX).await
    }
}

#[cfg(unix)]
fn file_stem(id: &SensorId) -> OsString {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt};
    OsStr::from_bytes(id.as_bytes()).to_os_string()
}

/// `%XX` for every byte outside printable ASCII, and for `%` itself
#[cfg(not(unix))]
fn file_stem(id: &SensorId) -> OsString {
    let mut stem = String::new();
    for b in id.as_bytes() {
        match b {
            b'%' => stem.push_str("%25"),
            0x20..=0x7e => stem.push(*b as char),
            _ => stem.push_str(&format!("%{b:02X}")),
        }
    }
    stem.into()
}

/// Fills `buf` unless EOF comes first. Returns how many bytes were read.
async fn read_record<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8; RECORD_SIZE],
) -> io::Result<usize> {
    let mut filled = 0;
    while filled < RECORD_SIZE {
        match reader.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
