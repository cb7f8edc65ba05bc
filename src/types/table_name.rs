use crate::types::errors::TableNameError;
use regex::Regex;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Destination table name, restricted to plain identifiers because it is
/// spliced into SQL text rather than bound as a parameter.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn new(value: impl Into<String>) -> Result<Self, TableNameError> {
        let value = value.into();

        if value.is_empty() {
            return Err(TableNameError::Empty);
        }

        if !IDENTIFIER.is_match(&value) {
            return Err(TableNameError::InvalidIdentifier(value));
        }

        Ok(Self(value))
    }

    /// Name of the serial sequence backing the `id` column.
    pub fn id_sequence(&self) -> String {
        format!("{}_id_seq", self.0)
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self("cartera".to_string())
    }
}

impl Display for TableName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for TableName {
    type Err = TableNameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TableName::new(value)
    }
}
