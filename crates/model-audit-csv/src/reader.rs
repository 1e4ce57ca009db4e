//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use model_audit_core::{CellContent, CellError, CellTable, Workbook, MAX_COLS};

const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a one-sheet workbook named after the file stem
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Workbook> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let mut options = options.clone();
        if options.sheet_name.is_none() {
            options.sheet_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }
        Self::read(file, &options)
    }

    /// Read CSV from a reader into a one-sheet workbook
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Workbook> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut value_rows = Vec::new();
        let mut formula_rows = Vec::new();

        for result in csv_reader.records() {
            let record = result?;
            if record.len() > MAX_COLS as usize {
                return Err(CsvError::TooManyColumns {
                    row: value_rows.len() + 1,
                    columns: record.len(),
                    max: MAX_COLS,
                });
            }
            let mut values = Vec::with_capacity(record.len());
            let mut formulas = Vec::with_capacity(record.len());

            for field in record.iter() {
                let (value, formula) = Self::split_field(field, options.auto_detect_types);
                values.push(value);
                formulas.push(formula);
            }

            value_rows.push(values);
            formula_rows.push(formulas);
        }

        let name = options
            .sheet_name
            .clone()
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());
        log::debug!("Read {} CSV row(s) into sheet '{}'", value_rows.len(), name);

        let mut workbook = Workbook::new();
        workbook.add_sheet(
            name,
            CellTable::from_rows(value_rows),
            CellTable::from_rows(formula_rows),
        )?;
        Ok(workbook)
    }

    /// `(value table content, formula table content)` for one field
    fn split_field(field: &str, auto_detect: bool) -> (CellContent, CellContent) {
        let trimmed = field.trim();
        if trimmed.len() > 1 && trimmed.starts_with('=') {
            return (CellContent::Blank, CellContent::Formula(trimmed.to_string()));
        }

        let value = if auto_detect {
            Self::detect_type(field)
        } else if field.is_empty() {
            CellContent::Blank
        } else {
            CellContent::text(field)
        };
        (value.clone(), value)
    }

    /// Detect the type of a field value
    fn detect_type(field: &str) -> CellContent {
        let field = field.trim();

        if field.is_empty() {
            return CellContent::Blank;
        }

        if field.eq_ignore_ascii_case("true") {
            return CellContent::Boolean(true);
        }
        if field.eq_ignore_ascii_case("false") {
            return CellContent::Boolean(false);
        }

        if let Some(err) = CellError::parse(field) {
            return CellContent::Error(err);
        }

        if let Ok(n) = field.parse::<f64>() {
            if n.is_finite() {
                return CellContent::Number(n);
            }
        }

        CellContent::text(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_detect_type() {
        assert_eq!(CsvReader::detect_type(" 42 "), CellContent::Number(42.0));
        assert_eq!(CsvReader::detect_type("1"), CellContent::Number(1.0));
        assert_eq!(CsvReader::detect_type("TRUE"), CellContent::Boolean(true));
        assert_eq!(
            CsvReader::detect_type("#REF!"),
            CellContent::Error(CellError::Ref)
        );
        assert_eq!(CsvReader::detect_type("inf"), CellContent::text("inf"));
        assert_eq!(CsvReader::detect_type(""), CellContent::Blank);
    }

    #[test]
    fn test_formula_fields() {
        let data = "Revenue,100,=B1*1.1\nCost,=B1*0.4,\n";
        let workbook = CsvReader::read(data.as_bytes(), &CsvReadOptions::default()).unwrap();
        let ws = workbook.worksheet(0).unwrap();

        assert_eq!(ws.name(), "Sheet1");
        assert_eq!(ws.dimensions(), (2, 3));
        assert_eq!(ws.formulas().get(0, 2), &CellContent::formula("=B1*1.1"));
        assert_eq!(ws.values().get(0, 2), &CellContent::Blank);
        assert_eq!(ws.formulas().get(1, 1), &CellContent::formula("=B1*0.4"));
        assert_eq!(ws.values().get(0, 1), &CellContent::Number(100.0));
        assert_eq!(ws.formulas().get(0, 1), &CellContent::Number(100.0));
        assert_eq!(workbook.formula_count(), 2);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let data = "a\nb,c,d\n";
        let workbook = CsvReader::read(data.as_bytes(), &CsvReadOptions::default()).unwrap();
        assert_eq!(workbook.worksheet(0).unwrap().dimensions(), (2, 3));
    }

    #[test]
    fn test_too_many_columns() {
        let mut data = "a,b\n".to_string();
        data.push_str(&",".repeat(MAX_COLS as usize));
        data.push('\n');

        let err = CsvReader::read(data.as_bytes(), &CsvReadOptions::default()).unwrap_err();
        match err {
            CsvError::TooManyColumns { row, columns, .. } => {
                assert_eq!(row, 2);
                assert_eq!(columns, MAX_COLS as usize + 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_widest_sheet_is_accepted() {
        let data = ",".repeat(MAX_COLS as usize - 1);
        let workbook = CsvReader::read(data.as_bytes(), &CsvReadOptions::default()).unwrap();
        assert_eq!(
            workbook.worksheet(0).unwrap().dimensions(),
            (1, MAX_COLS as usize)
        );
    }

    #[test]
    fn test_read_file_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Total Assets,10").unwrap();

        let workbook = CsvReader::read_file(&path, &CsvReadOptions::default()).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["forecast"]);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let options = CsvReadOptions {
            delimiter: b';',
            ..CsvReadOptions::default()
        };
        let workbook = CsvReader::read("1;2\n".as_bytes(), &options).unwrap();
        assert_eq!(
            workbook.worksheet(0).unwrap().values().get(0, 1),
            &CellContent::Number(2.0)
        );
    }
}
