use crate::store::csv_source;
use crate::store::error::StoreError;
use crate::types::observation::WeatherObservation;
use crate::types::record::SourceRecord;
use log::{info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

/// In-memory dataset: a total mapping from position to record.
///
/// The persisted form is a single pretty-printed JSON array. The same file is
/// both the output of a fresh build and the input and output of repair runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<SourceRecord>,
}

impl RecordStore {
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self { records }
    }

    /// Loads a persisted dataset.
    ///
    /// # Errors
    ///
    /// [`StoreError::Read`] if the file cannot be read, [`StoreError::Parse`] if it
    /// is not a JSON array of records.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| StoreError::Read(path.to_path_buf(), e))?;
        let origin = path.to_path_buf();
        let store = task::spawn_blocking(move || Self::from_json_slice(&bytes, &origin)).await??;
        info!("Loaded {} records from {}", store.len(), path.display());
        Ok(store)
    }

    /// Loads the raw CSV source of a fresh build, keeping at most `max_records` rows.
    pub async fn load_csv(path: &Path, max_records: Option<usize>) -> Result<Self, StoreError> {
        let path_buf = path.to_path_buf();
        let mut records =
            task::spawn_blocking(move || csv_source::read_records_from_path(&path_buf)).await??;
        if let Some(limit) = max_records {
            records.truncate(limit);
        }
        info!("Loaded {} CSV rows from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    pub fn from_json_slice(bytes: &[u8], origin: &Path) -> Result<Self, StoreError> {
        serde_json::from_slice::<Vec<SourceRecord>>(bytes)
            .map(Self::new)
            .map_err(|e| StoreError::Parse(origin.to_path_buf(), e))
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&SourceRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn with_weather_count(&self) -> usize {
        self.records.iter().filter(|r| r.has_weather()).count()
    }

    /// Every `(index, record)` pair accepted by `predicate`, in dataset order.
    ///
    /// The iterator is lazy and can be cloned to restart the selection.
    pub fn records_needing_enrichment<'a, P>(
        &'a self,
        predicate: P,
    ) -> impl Iterator<Item = (usize, &'a SourceRecord)> + Clone + 'a
    where
        P: Fn(&SourceRecord) -> bool + Clone + 'a,
    {
        self.records
            .iter()
            .enumerate()
            .filter(move |&(_, record)| predicate(record))
    }

    /// Sets `weather` on every record in `indices`. `None` writes the explicit
    /// no-data marker (`null`). Other records are not touched.
    ///
    /// Returns the number of records updated; indices past the end are skipped.
    pub fn apply_result(
        &mut self,
        indices: &[usize],
        observation: Option<&WeatherObservation>,
    ) -> usize {
        let mut applied = 0;
        for &index in indices {
            match self.records.get_mut(index) {
                Some(record) => {
                    record.weather = observation.cloned();
                    applied += 1;
                }
                None => warn!(
                    "Ignoring weather for index {} beyond dataset length {}",
                    index,
                    self.records.len()
                ),
            }
        }
        applied
    }

    pub fn to_json(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec_pretty(&self.records).map_err(StoreError::Encode)
    }

    /// Writes the dataset to `path`.
    ///
    /// The data goes to a temporary file next to `path` first and is then moved
    /// over it, so a failed write leaves any previous file intact. The in-memory
    /// state is never modified, so the caller may retry.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = self.to_json()?;
        let path_buf = path.to_path_buf();
        let written = bytes.len();
        task::spawn_blocking(move || write_atomically(&path_buf, &bytes)).await??;
        info!(
            "Wrote {} records ({} bytes) to {}",
            self.len(),
            written,
            path.display()
        );
        Ok(())
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut temp_file =
        NamedTempFile::new_in(&directory).map_err(|e| StoreError::Write(path.to_path_buf(), e))?;
    temp_file
        .write_all(bytes)
        .map_err(|e| StoreError::Write(path.to_path_buf(), e))?;
    temp_file
        .flush()
        .map_err(|e| StoreError::Write(path.to_path_buf(), e))?;
    temp_file
        .persist(path)
        .map_err(|e| StoreError::Persist(path.to_path_buf(), e))?;
    Ok(())
}
