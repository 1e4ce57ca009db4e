//! CSV options

/// Options for reading CSV files
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Sheet name; defaults to the file stem, or "Sheet1" for readers
    pub sheet_name: Option<String>,
    /// Automatic type detection; when off every non-formula field is text
    pub auto_detect_types: bool,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            sheet_name: None,
            auto_detect_types: true,
        }
    }
}
