//! Reading the export file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::info;

use crate::error::InputError;
use crate::model::Dataset;

/// Parse an export from any reader.
///
/// An unknown enumeration value or a badly formatted date is a parse error.
///
/// # Errors
/// `Malformed` with the position of the first parse failure.
pub fn read_dataset(reader: impl Read) -> Result<Dataset, InputError> {
    let dataset: Dataset = serde_json::from_reader(reader)?;
    info!(
        members = dataset.members.len(),
        households = dataset.households.len(),
        addresses = dataset.addresses.len(),
        "read export"
    );
    Ok(dataset)
}

/// Parse an export file.
///
/// # Errors
/// `Io` if the file cannot be opened, otherwise as for [`read_dataset`].
pub fn read_dataset_file(path: &Path) -> Result<Dataset, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_dataset(BufReader::new(file))
}
