use crate::types::coerce::DecimalConvention;
use crate::types::errors::DelimiterError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Field delimiters accepted for ledger imports.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum Delimiter {
    Comma,
    #[default]
    Semicolon,
    Tab,
    Pipe
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Tab => '\t',
            Delimiter::Pipe => '|'
        }
    }

    pub fn as_byte(self) -> u8 {
        self.as_char() as u8
    }

    /// A comma delimiter cannot double as a decimal mark, so comma-separated
    /// exports are read with the US convention and everything else with LATAM.
    pub fn decimal_convention(self) -> DecimalConvention {
        match self {
            Delimiter::Comma => DecimalConvention::Us,
            _ => DecimalConvention::Latam
        }
    }

    /// Lenient form used on the command line, where a literal tab is awkward to type.
    pub fn from_cli(value: &str) -> Result<Self, DelimiterError> {
        match value {
            "\\t" | "tab" | "TAB" => Ok(Delimiter::Tab),
            other => other.parse()
        }
    }
}

impl Display for Delimiter {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.as_char())
    }
}

impl FromStr for Delimiter {
    type Err = DelimiterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "," => Ok(Delimiter::Comma),
            ";" => Ok(Delimiter::Semicolon),
            "\t" => Ok(Delimiter::Tab),
            "|" => Ok(Delimiter::Pipe),
            other => Err(DelimiterError::NotAllowed(other.to_string()))
        }
    }
}

impl Serialize for Delimiter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
