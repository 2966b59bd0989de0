use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Canonical lookup key for a strike price.
///
/// Numeric strikes collapse to their shortest decimal text, so equal values
/// always produce equal keys regardless of formatting. Anything else falls back
/// to uppercased, whitespace-collapsed text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrikeKey(String);

impl StrikeKey {
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        match canonical_decimal(trimmed) {
            Some(decimal) => Self(decimal),
            None => Self(
                trimmed
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_uppercase(),
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for StrikeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_noise(ch: char) -> bool {
    ch == ',' || ch == '₹' || ch == '$' || ch == '_' || ch == '\'' || ch.is_whitespace()
}

fn canonical_decimal(text: &str) -> Option<String> {
    let cleaned: String = text.chars().filter(|ch| !is_noise(*ch)).collect();
    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (unsigned, ""),
    };
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }
    if !integer.chars().all(|ch| ch.is_ascii_digit())
        || !fraction.chars().all(|ch| ch.is_ascii_digit())
    {
        return None;
    }

    let integer = integer.trim_start_matches('0');
    let fraction = fraction.trim_end_matches('0');
    let integer = if integer.is_empty() { "0" } else { integer };

    let mut decimal = String::with_capacity(integer.len() + fraction.len() + 2);
    let is_zero = integer == "0" && fraction.is_empty();
    if negative && !is_zero {
        decimal.push('-');
    }
    decimal.push_str(integer);
    if !fraction.is_empty() {
        decimal.push('.');
        decimal.push_str(fraction);
    }
    Some(decimal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_share_a_key() {
        let expected = StrikeKey::normalize("3000");
        assert_eq!(StrikeKey::normalize("3,000"), expected);
        assert_eq!(StrikeKey::normalize("3000.0"), expected);
        assert_eq!(StrikeKey::normalize(" 3000 "), expected);
        assert_eq!(StrikeKey::normalize("03000.00"), expected);
        assert_eq!(expected.as_str(), "3000");
    }

    #[test]
    fn keeps_significant_fraction() {
        assert_eq!(StrikeKey::normalize("1102.50").as_str(), "1102.5");
        assert_eq!(StrikeKey::normalize(".5").as_str(), "0.5");
        assert_eq!(StrikeKey::normalize("-0.0").as_str(), "0");
    }

    #[test]
    fn falls_back_to_uppercased_text() {
        assert_eq!(StrikeKey::normalize("  atm   strike ").as_str(), "ATM STRIKE");
        assert_eq!(StrikeKey::normalize("3000CE").as_str(), "3000CE");
        assert!(StrikeKey::normalize("   ").is_empty());
    }
}
