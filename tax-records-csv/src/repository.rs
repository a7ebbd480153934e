use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tax_core::store::check_update_id;
use tax_core::{RecordStore, StoreError, TaxRecord};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Column order written to new files.
pub const CSV_HEADERS: [&str; 5] = [
    "id",
    "national_identifier",
    "gross_income",
    "total_relief",
    "tax_payable",
];

/// Stores every record in a single CSV file.
///
/// The whole file is read for each operation and rewritten for each write.
/// Writes go to a sibling temporary file that is then renamed over the
/// original, so a failed write leaves the previous contents intact. A file
/// that does not exist yet reads as an empty store.
pub struct CsvRecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Like [`new`](Self::new), but reads the file once so that a corrupt
    /// file is reported before any command runs.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(path);
        let records = read_records(&store.path)?;
        debug!(path = %store.path.display(), records = records.len(), "record file opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_all(
        &self,
        records: &[TaxRecord],
    ) -> Result<(), StoreError> {
        let temp = self.temp_path();

        let result = write_records(&temp, records)
            .and_then(|()| fs::rename(&temp, &self.path).map_err(|e| io_error(&self.path, e)));

        if result.is_err() {
            // Best effort; the original file is untouched either way.
            let _ = fs::remove_file(&temp);
        }
        result
    }
}

fn io_error(
    path: &Path,
    e: impl std::fmt::Display,
) -> StoreError {
    StoreError::Storage(format!("{}: {e}", path.display()))
}

fn read_records(path: &Path) -> Result<Vec<TaxRecord>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(path, e)),
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    reader
        .deserialize()
        .map(|row| row.map_err(|e| io_error(path, e)))
        .collect()
}

fn write_records(
    path: &Path,
    records: &[TaxRecord],
) -> Result<(), StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| io_error(path, e))?;

    writer
        .write_record(CSV_HEADERS)
        .map_err(|e| io_error(path, e))?;
    for record in records {
        writer.serialize(record).map_err(|e| io_error(path, e))?;
    }
    writer.flush().map_err(|e| io_error(path, e))?;

    Ok(())
}

#[async_trait]
impl RecordStore for CsvRecordStore {
    async fn exists(
        &self,
        user_id: &str,
    ) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(read_records(&self.path)?
            .iter()
            .any(|r| r.user_id == user_id))
    }

    async fn get(
        &self,
        user_id: &str,
    ) -> Result<Option<TaxRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(read_records(&self.path)?
            .into_iter()
            .find(|r| r.user_id == user_id))
    }

    async fn insert(
        &self,
        record: &TaxRecord,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = read_records(&self.path)?;

        if records.iter().any(|r| r.user_id == record.user_id) {
            return Err(StoreError::Duplicate(record.user_id.clone()));
        }

        records.push(record.clone());
        self.write_all(&records)?;
        info!(user_id = %record.user_id, path = %self.path.display(), "record inserted");
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        record: &TaxRecord,
    ) -> Result<(), StoreError> {
        check_update_id(user_id, record)?;
        let _guard = self.lock.lock().await;
        let mut records = read_records(&self.path)?;

        let slot = records
            .iter_mut()
            .find(|r| r.user_id == user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        *slot = record.clone();

        self.write_all(&records)?;
        info!(user_id, path = %self.path.display(), "record updated");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TaxRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        read_records(&self.path)
    }
}
