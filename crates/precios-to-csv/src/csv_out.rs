use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tempfile::NamedTempFile;

use crate::error::ConvertError;
use crate::model::CsvTable;

fn write_table<W: Write>(
    sink: W,
    table: &CsvTable,
    delimiter: u8,
) -> Result<csv::Writer<W>, ConvertError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(sink);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(writer)
}

pub(crate) fn write_csv_to_string(table: &CsvTable, delimiter: u8) -> Result<String, ConvertError> {
    let bytes = write_table(Vec::<u8>::new(), table, delimiter)?
        .into_inner()
        .map_err(|error| ConvertError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ConvertError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

/// A CSV written next to its destination but not yet visible there.
pub(crate) struct StagedCsv {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedCsv {
    pub(crate) fn persist(self) -> Result<PathBuf, ConvertError> {
        self.file.persist(&self.target)?;
        Ok(self.target)
    }
}

pub(crate) fn stage_csv(
    target: &Path,
    table: &CsvTable,
    delimiter: u8,
) -> Result<StagedCsv, ConvertError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file = NamedTempFile::new_in(dir)?;
    let file = write_table(file, table, delimiter)?
        .into_inner()
        .map_err(|error| ConvertError::Io(error.into_error()))?;

    Ok(StagedCsv {
        file,
        target: target.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{stage_csv, write_csv_to_string};
    use crate::model::CsvTable;

    fn table() -> CsvTable {
        CsvTable {
            headers: vec!["vendor".to_string(), "price".to_string()],
            rows: vec![vec!["Bravo, S.A.".to_string(), "25.00".to_string()]],
        }
    }

    #[test]
    fn quotes_fields_containing_the_delimiter() {
        let csv = write_csv_to_string(&table(), b',').expect("csv should serialize");
        assert_eq!(csv, "vendor,price\n\"Bravo, S.A.\",25.00\n");
    }

    #[test]
    fn staged_files_appear_only_after_persist() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let target = dir.path().join("out.csv");

        let staged = stage_csv(&target, &table(), b';').expect("csv should stage");
        assert!(!target.exists());

        let written = staged.persist().expect("csv should persist");
        assert_eq!(written, target);
        let content = fs::read_to_string(&target).expect("csv should be readable");
        assert_eq!(content, "vendor;price\nBravo, S.A.;25.00\n");
    }
}
