//! Atomic CSV output shared by the rule and prediction writers.
//!
//! Rows are written to a temporary file next to the destination and only
//! renamed into place once every row has been flushed, so a failed run never
//! leaves a truncated file behind.

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while writing a CSV output file.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The temporary file could not be created next to the destination.
    #[error("Failed to create temporary file for {path}: {source}")]
    TempFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Encoding or flushing a row failed.
    #[error("Failed to write CSV {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    /// The finished file could not be moved into place.
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Write a CSV file atomically, replacing any existing file at `path`.
pub fn write_csv_atomic<F>(path: &Path, fill: F) -> Result<(), OutputError>
where
    F: FnOnce(&mut csv::Writer<&mut File>) -> csv::Result<()>,
{
    let csv_err = |source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut temp = create_tempfile(path)?;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file_mut());
        fill(&mut writer).map_err(csv_err)?;
        writer
            .flush()
            .map_err(|err| csv_err(csv::Error::from(err)))?;
    }
    temp.persist(path).map_err(|err| OutputError::Persist {
        path: path.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}

fn create_tempfile(path: &Path) -> Result<tempfile::NamedTempFile, OutputError> {
    let temp_err = |source| OutputError::TempFile {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".ntprobnp-out");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Same mode a plain create would get once the umask applies.
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let temp = builder.tempfile_in(dir).map_err(temp_err)?;
    if let Ok(existing) = std::fs::metadata(path) {
        temp.as_file()
            .set_permissions(existing.permissions())
            .map_err(temp_err)?;
    }
    Ok(temp)
}
