use chrono::NaiveDate;

use crate::domain::{LedgerResult, calculate};
use crate::io::{ExcelLedgerParser, LedgerParser, ParseError, file_stem};

/// Processes exactly one ledger file: parse, calculate, wrap. Only one
/// file's parsed entries are ever alive at a time, which is what bounds the
/// memory of a whole batch.
pub struct LedgerFileProcessor {
    parser: Box<dyn LedgerParser + Send + Sync>,
}

impl LedgerFileProcessor {
    /// Processor for workbook ledgers.
    pub fn new() -> Self {
        Self::with_parser(Box::new(ExcelLedgerParser))
    }

    /// Processor with a custom input format.
    pub fn with_parser(parser: Box<dyn LedgerParser + Send + Sync>) -> Self {
        Self { parser }
    }

    /// Parse errors propagate unchanged; the calculator cannot fail on
    /// parsed entries.
    pub fn process(
        &self,
        bytes: &[u8],
        filename: &str,
        as_on_date: NaiveDate,
    ) -> Result<LedgerResult, ParseError> {
        let ledger_name = file_stem(filename);
        let entries = self.parser.parse(bytes, filename)?;
        let summary = calculate(&entries, as_on_date);
        Ok(LedgerResult {
            ledger_name,
            summary,
        })
    }
}

impl Default for LedgerFileProcessor {
    fn default() -> Self {
        Self::new()
    }
}
