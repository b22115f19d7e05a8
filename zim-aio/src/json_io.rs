// zim-aio/src/json_io.rs
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use zim_common::error::{Result, ZimError};

/// Writes serializable data to a JSON file (pretty-printed), atomically.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    debug!("Writing JSON to: {}", path.display());
    let mut json_bytes = serde_json::to_vec_pretty(data).map_err(|e| ZimError::Json(Arc::new(e)))?;
    json_bytes.push(b'\n');
    crate::fs::atomic_write_file(path, &json_bytes)
}

/// Reads and deserializes data from a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Reading JSON from: {}", path.display());
    let file = std::fs::File::open(path).map_err(|e| ZimError::io_at(e, "open", path))?;
    let reader = std::io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| ZimError::Json(Arc::new(e)))
}
