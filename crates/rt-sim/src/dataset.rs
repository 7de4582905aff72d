//! CSV persistence of the simulated dataset.
//!
//! One header row, then one [`TrainingExample`] per line:
//!
//! ```text
//! orig,dest,dist_m,base_time_sec,time_real_sec,is_disruption_day
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{Reader, Writer};
use tracing::debug;

use crate::{SimResult, TrainingExample};

/// Write `rows` to any sink.
pub fn write_examples_to<W: Write>(sink: W, rows: &[TrainingExample]) -> SimResult<()> {
    let mut writer = Writer::from_writer(sink);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read every row from any source.
pub fn read_examples_from<R: Read>(source: R) -> SimResult<Vec<TrainingExample>> {
    let mut reader = Reader::from_reader(source);
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<TrainingExample>, _>>()?;
    Ok(rows)
}

/// Create (or truncate) `path` and write `rows` to it.
pub fn write_examples(path: &Path, rows: &[TrainingExample]) -> SimResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    write_examples_to(File::create(path)?, rows)?;
    debug!(path = %path.display(), rows = rows.len(), "wrote dataset");
    Ok(())
}

/// Read a dataset written by [`write_examples`].
pub fn read_examples(path: &Path) -> SimResult<Vec<TrainingExample>> {
    read_examples_from(File::open(path)?)
}
