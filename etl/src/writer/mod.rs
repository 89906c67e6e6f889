//! Delimited table writer.
//!
//! The table is written to a temporary file next to the destination and
//! then renamed over it, so a failed write never leaves a partial file and
//! an existing destination is replaced as a whole.

use std::io::Write;
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::table::Table;

/// Encode `table` as delimited text.
pub fn write_to<W: Write>(table: &Table, writer: W, delimiter: u8) -> LoadResult<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    out.write_record(table.headers())?;
    for row in 0..table.row_count() {
        out.write_record(table.render_row(row))?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Encode `table` into a string, mostly for previews and tests.
pub fn to_delimited_string(table: &Table, delimiter: u8) -> LoadResult<String> {
    let mut buf = Vec::new();
    write_to(table, &mut buf, delimiter)?;
    // Cells are `String`s, so the output is valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `table` to `path`, replacing any existing file.
pub fn write_table(table: &Table, path: impl AsRef<Path>, delimiter: u8) -> LoadResult<()> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| LoadError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut buf = Vec::new();
    write_to(table, &mut buf, delimiter)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&buf).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}
