use thiserror::Error;

/// Cell text that should have held a number but did not.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a number")]
pub struct NumberFormatError {
    pub value: String,
}

/// Parse a spreadsheet number.
///
/// Accepts thousands separators, currency symbols, surrounding whitespace and
/// accounting-style parentheses for negatives. Blank cells and bare dash
/// placeholders read as `None`.
pub fn parse_number(raw: &str) -> Result<Option<f64>, NumberFormatError> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|ch| !matches!(ch, ',' | '₹' | '$' | '_') && !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|ch| matches!(ch, '-' | '–' | '—')) {
        return Ok(None);
    }

    let value: f64 = cleaned.parse().map_err(|_| NumberFormatError {
        value: trimmed.to_owned(),
    })?;
    if !value.is_finite() {
        return Err(NumberFormatError {
            value: trimmed.to_owned(),
        });
    }

    Ok(Some(if negative { -value } else { value }))
}

/// Render an open-interest figure rounded to whole contracts with thousands
/// separators, e.g. `-15,000`.
pub fn format_oi(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formatted_numbers() {
        assert_eq!(parse_number("1,20,000"), Ok(Some(120_000.0)));
        assert_eq!(parse_number(" 2950.50 "), Ok(Some(2950.5)));
        assert_eq!(parse_number("(15,000)"), Ok(Some(-15_000.0)));
        assert_eq!(parse_number("-250"), Ok(Some(-250.0)));
    }

    #[test]
    fn blank_and_placeholders_are_absent() {
        assert_eq!(parse_number(""), Ok(None));
        assert_eq!(parse_number("   "), Ok(None));
        assert_eq!(parse_number("-"), Ok(None));
    }

    #[test]
    fn rejects_text() {
        let error = parse_number("n/a").expect_err("must fail");
        assert_eq!(error.value, "n/a");
        assert!(parse_number("inf").is_err());
    }

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(format_oi(15_000.0), "15,000");
        assert_eq!(format_oi(-1_234_567.4), "-1,234,567");
        assert_eq!(format_oi(999.0), "999");
        assert_eq!(format_oi(0.2), "0");
    }
}
