use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 20;

/// Separators that appear inside exchange symbols (`M&M`, `BAJAJ-AUTO`) and are
/// dropped during normalization.
const SEPARATORS: [char; 5] = ['&', '-', '_', '.', ' '];

/// Normalized equity symbol: uppercase ASCII alphanumerics only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase with separators removed.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let mut normalized = String::with_capacity(trimmed.len());
        for (index, ch) in trimmed.chars().enumerate() {
            if SEPARATORS.contains(&ch) {
                continue;
            }
            if !ch.is_ascii_alphanumeric() {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
            normalized.push(ch.to_ascii_uppercase());
        }

        if normalized.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let len = normalized.len();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        if !normalized.chars().any(|ch| ch.is_ascii_alphabetic()) {
            return Err(ValidationError::SymbolWithoutLetter {
                value: trimmed.to_owned(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a free-text spreadsheet cell names this symbol.
    ///
    /// The cell is uppercased and stripped of everything but ASCII alphanumerics
    /// before comparison, so `"m&m "` matches `MM`.
    pub fn matches_cell(&self, cell: &str) -> bool {
        let mut cleaned = cell
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|ch| ch.to_ascii_uppercase());
        let mut expected = self.0.chars();
        loop {
            match (cleaned.next(), expected.next()) {
                (None, None) => return true,
                (Some(left), Some(right)) if left == right => continue,
                _ => return false,
            }
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_symbol() {
        let parsed = Symbol::parse(" infy ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "INFY");
    }

    #[test]
    fn drops_separators() {
        assert_eq!(Symbol::parse("M&M").expect("m&m").as_str(), "MM");
        assert_eq!(Symbol::parse("bajaj-auto").expect("bajaj").as_str(), "BAJAJAUTO");
    }

    #[test]
    fn rejects_invalid_chars() {
        let err = Symbol::parse("ACME$").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidChar { ch: '$', .. }));
    }

    #[test]
    fn rejects_digits_only() {
        let err = Symbol::parse("500325").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolWithoutLetter { .. }));
    }

    #[test]
    fn rejects_separator_only_input() {
        assert_eq!(Symbol::parse(" - & ").expect_err("must fail"), ValidationError::EmptySymbol);
    }

    #[test]
    fn matches_cells_after_cleaning() {
        let symbol = Symbol::parse("MM").expect("symbol");
        assert!(symbol.matches_cell(" m&m "));
        assert!(!symbol.matches_cell("MMTC"));
        assert!(!symbol.matches_cell("M"));
    }
}
