mod errors;
mod ledger_row;
mod raw_record;
#[cfg(test)]
mod tests;

use std::fmt;
use std::fmt::{Display, Formatter};

pub use errors::{FormatValidationError, ImportError, InputRejection};
pub use ledger_row::{LedgerRow, StoredLedgerRow};
pub use raw_record::RawRecord;

/// Progress of a single replace-and-load run.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ImportStage {
    Received,
    Validating,
    Validated,
    Parsing,
    Parsed,
    Mapping,
    Mapped,
    Clearing,
    Cleared,
    Loading,
    Done,
    Error
}

impl ImportStage {
    /// Once the table has been cleared a run may no longer be abandoned.
    pub fn is_destructive(self) -> bool {
        matches!(self, ImportStage::Clearing | ImportStage::Cleared | ImportStage::Loading)
    }
}

impl Display for ImportStage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::Received => "received",
            ImportStage::Validating => "validating",
            ImportStage::Validated => "validated",
            ImportStage::Parsing => "parsing",
            ImportStage::Parsed => "parsed",
            ImportStage::Mapping => "mapping",
            ImportStage::Mapped => "mapped",
            ImportStage::Clearing => "clearing",
            ImportStage::Cleared => "cleared",
            ImportStage::Loading => "loading",
            ImportStage::Done => "done",
            ImportStage::Error => "error"
        };

        formatter.write_str(name)
    }
}
