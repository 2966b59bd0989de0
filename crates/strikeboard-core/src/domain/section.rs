use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// One of the four labelled subsections of a live block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    CallResistance,
    CallSupport,
    PutResistance,
    PutSupport,
}

impl Section {
    /// All sections in output order.
    pub const ALL: [Section; 4] = [
        Section::CallResistance,
        Section::CallSupport,
        Section::PutResistance,
        Section::PutSupport,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::CallResistance => "Call Resistance",
            Self::CallSupport => "Call Support",
            Self::PutResistance => "Put Resistance",
            Self::PutSupport => "Put Support",
        }
    }

    /// Lowercase marker phrase searched for in live-sheet lines.
    pub fn phrase(self) -> &'static str {
        match self {
            Self::CallResistance => "call resistance",
            Self::CallSupport => "call support",
            Self::PutResistance => "put resistance",
            Self::PutSupport => "put support",
        }
    }

    pub fn is_call(self) -> bool {
        matches!(self, Self::CallResistance | Self::CallSupport)
    }

    pub fn is_put(self) -> bool {
        !self.is_call()
    }

    /// Classify free-text baseline category such as `"Call Resistance 1"`.
    pub fn from_category(category: &str) -> Option<Self> {
        let lowered = category.to_ascii_lowercase();
        let call = lowered.contains("call");
        let put = lowered.contains("put");
        let resistance = lowered.contains("resist");
        let support = lowered.contains("support");

        match (call, put, resistance, support) {
            (true, false, true, false) => Some(Self::CallResistance),
            (true, false, false, true) => Some(Self::CallSupport),
            (false, true, true, false) => Some(Self::PutResistance),
            (false, true, false, true) => Some(Self::PutSupport),
            _ => None,
        }
    }

    /// Every section whose phrase occurs in `line`, in output order.
    pub fn phrases_in(line: &str) -> impl Iterator<Item = Section> {
        let lowered = line.to_lowercase();
        Self::ALL
            .into_iter()
            .filter(move |section| lowered.contains(section.phrase()))
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Section {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "callresistance" => Ok(Self::CallResistance),
            "callsupport" => Ok(Self::CallSupport),
            "putresistance" => Ok(Self::PutResistance),
            "putsupport" => Ok(Self::PutSupport),
            _ => Err(ValidationError::InvalidSection {
                value: value.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_categories() {
        assert_eq!(
            Section::from_category("Call Resistance"),
            Some(Section::CallResistance)
        );
        assert_eq!(Section::from_category("PUT SUPPORT 2"), Some(Section::PutSupport));
        assert_eq!(Section::from_category("Straddle"), None);
    }

    #[test]
    fn finds_side_by_side_phrases() {
        let found: Vec<Section> =
            Section::phrases_in("Call Resistance  OI  Strike  Put Resistance").collect();
        assert_eq!(found, vec![Section::CallResistance, Section::PutResistance]);
    }

    #[test]
    fn parses_labels_and_slugs() {
        assert_eq!("Put Support".parse::<Section>(), Ok(Section::PutSupport));
        assert_eq!("call-resistance".parse::<Section>(), Ok(Section::CallResistance));
        assert!("resistance".parse::<Section>().is_err());
    }
}
