use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::PathBuf,
};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::{
    config::ExportTarget,
    error::{Error, Result},
    store::DocumentStore,
};

/// Timestamp format embedded in export file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Upper bound on same-second name collisions before giving up.
const MAX_ATTEMPTS: u32 = 1000;

/// Write every document to a new file under `target` and return its path.
///
/// The file is created exclusively; an existing export is never replaced.
/// A file that could not be written completely is removed again.
pub fn export(
    store: &DocumentStore,
    target: &ExportTarget,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    export_with(store, target, now, write_documents)
}

fn export_with<F>(
    store: &DocumentStore,
    target: &ExportTarget,
    now: DateTime<Local>,
    write: F,
) -> Result<PathBuf>
where
    F: FnOnce(&DocumentStore, File) -> Result<()>,
{
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    let (path, file) = create_unique(target, &timestamp)?;

    if let Err(e) = write(store, file) {
        if let Err(remove) = std::fs::remove_file(&path) {
            warn!(
                path = %path.display(),
                error = %remove,
                "could not remove incomplete export"
            );
        }
        return Err(Error::Export {
            path,
            source: Box::new(e),
        });
    }

    info!(path = %path.display(), rows = store.len(), "exported labels");
    Ok(path)
}

fn create_unique(
    target: &ExportTarget,
    timestamp: &str,
) -> Result<(PathBuf, File)> {
    let mut last = target.file_path(timestamp, 0);
    for attempt in 0..MAX_ATTEMPTS {
        let path = target.file_path(timestamp, attempt);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "export name taken");
                last = path;
            }
            Err(e) => {
                return Err(Error::Export {
                    path,
                    source: Box::new(e.into()),
                });
            }
        }
    }

    Err(Error::Export {
        path: last,
        source: Box::new(Error::Config(
            "no free export file name".to_string(),
        )),
    })
}

/// Serialize the store as a delimited table with a header row, using the
/// delimiter the store was loaded with.
pub fn write_documents<W: Write>(store: &DocumentStore, out: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(store.delimiter())
        .from_writer(out);

    wtr.write_record(store.headers())?;
    for doc in store.documents() {
        wtr.write_record(store.record(doc))?;
    }
    wtr.flush()?;
    Ok(())
}
