//! Delimiter-separated tabular data.
//!
//! A sibling of the scripted format for simple row/column data: rows are
//! lines, fields are split on a single fixed delimiter byte. There is no
//! quoting, no escaping, and no schema validation.

use std::path::Path;

use crate::error::FileError;

/// Reads `path` as delimiter-separated rows of string fields.
///
/// Rows may have differing field counts; every line becomes a row.
pub fn parse_tabular_file(path: &Path, delimiter: u8) -> Result<Vec<Vec<String>>, FileError> {
    if !path.exists() {
        return Err(FileError::NotFound(path.to_path_buf()));
    }
    let reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(path)
        .map_err(|e| io_error(path, e))?;

    let mut rows = Vec::new();
    for record in reader.into_records() {
        let record = record.map_err(|e| io_error(path, e))?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(rows)
}

fn io_error(path: &Path, e: csv::Error) -> FileError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => FileError::Io(path.to_path_buf(), io),
        other => FileError::Io(
            path.to_path_buf(),
            std::io::Error::new(std::io::ErrorKind::InvalidData, format!("{:?}", other)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn colon_delimited_rows() {
        let mut file = NamedTempFile::new().expect("TempFile");
        write!(file, "a:b:c\n1:2:3").expect("Write");
        let rows = parse_tabular_file(file.path(), b':').expect("parse");
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn no_quoting_support() {
        let mut file = NamedTempFile::new().expect("TempFile");
        write!(file, "\"a:b\":c").expect("Write");
        let rows = parse_tabular_file(file.path(), b':').expect("parse");
        // Quotes are ordinary bytes; the delimiter always splits.
        assert_eq!(rows, vec![vec!["\"a", "b\"", "c"]]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let r = parse_tabular_file(Path::new("path/to/nowhere.csv"), b';');
        assert!(matches!(r, Err(FileError::NotFound(_))));
    }
}
