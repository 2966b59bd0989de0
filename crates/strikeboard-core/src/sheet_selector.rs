//! Picks the sheet holding the wanted day's figures.
//!
//! Both workbooks keep one sheet per trading day, named after the date in one
//! of a handful of spellings. Sheets whose names are not dates are ignored.

use thiserror::Error;
use time::macros::format_description;
use time::Date;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("no sheet is named like a date (sheets: {sheets:?})")]
    NoSheetsFound { sheets: Vec<String> },
}

/// Parse a sheet name as a date.
///
/// Tried in order: `DD.MM.YYYY`, `DD-MM-YYYY`, `YYYY-MM-DD`, `DD/MM/YYYY`,
/// `DD-Mon-YYYY`, `DD Mon YYYY`.
pub fn parse_sheet_date(name: &str) -> Option<Date> {
    let text = name.trim();
    Date::parse(
        text,
        format_description!("[day padding:none].[month padding:none].[year]"),
    )
    .or_else(|_| {
        Date::parse(
            text,
            format_description!("[day padding:none]-[month padding:none]-[year]"),
        )
    })
    .or_else(|_| {
        Date::parse(
            text,
            format_description!("[year]-[month padding:none]-[day padding:none]"),
        )
    })
    .or_else(|_| {
        Date::parse(
            text,
            format_description!("[day padding:none]/[month padding:none]/[year]"),
        )
    })
    .or_else(|_| {
        Date::parse(
            text,
            format_description!(
                "[day padding:none]-[month repr:short case_sensitive:false]-[year]"
            ),
        )
    })
    .or_else(|_| {
        Date::parse(
            text,
            format_description!(
                "[day padding:none] [month repr:short case_sensitive:false] [year]"
            ),
        )
    })
    .ok()
}

/// Select the sheet for `target`, or the latest sheet when no target is given.
///
/// With a target, the sheet with the greatest date not after it wins; when every
/// sheet is newer than the target, the earliest sheet is used. Ties keep the
/// first sheet encountered.
pub fn select_sheet<S: AsRef<str>>(
    sheet_names: &[S],
    target_date: Option<Date>,
) -> Result<String, SelectError> {
    let candidates: Vec<(Date, &str)> = sheet_names
        .iter()
        .filter_map(|name| parse_sheet_date(name.as_ref()).map(|date| (date, name.as_ref())))
        .collect();

    let chosen = match target_date {
        None => pick(&candidates, |date, best| date > best),
        Some(target) => {
            let not_after: Vec<(Date, &str)> = candidates
                .iter()
                .copied()
                .filter(|(date, _)| *date <= target)
                .collect();
            if not_after.is_empty() {
                pick(&candidates, |date, best| date < best)
            } else {
                pick(&not_after, |date, best| date > best)
            }
        }
    };

    chosen
        .map(str::to_owned)
        .ok_or_else(|| SelectError::NoSheetsFound {
            sheets: sheet_names
                .iter()
                .map(|name| name.as_ref().to_owned())
                .collect(),
        })
}

fn pick<'a>(
    candidates: &[(Date, &'a str)],
    better: impl Fn(Date, Date) -> bool,
) -> Option<&'a str> {
    let mut best: Option<(Date, &'a str)> = None;
    for &(date, name) in candidates {
        match best {
            Some((best_date, _)) if !better(date, best_date) => {}
            _ => best = Some((date, name)),
        }
    }
    best.map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_every_supported_spelling() {
        let expected = date!(2026 - 02 - 05);
        for name in [
            "05.02.2026",
            "5-2-2026",
            "2026-02-05",
            "05/02/2026",
            "05-Feb-2026",
            " 5 feb 2026 ",
        ] {
            assert_eq!(parse_sheet_date(name), Some(expected), "{name}");
        }
        assert_eq!(parse_sheet_date("Sheet1"), None);
        assert_eq!(parse_sheet_date("31.02.2026"), None);
    }

    #[test]
    fn latest_sheet_ignores_non_dates() {
        let chosen = select_sheet(&["01.01.2025", "02.01.2025", "notadate"], None).expect("select");
        assert_eq!(chosen, "02.01.2025");
    }

    #[test]
    fn latest_sheet_dominates_all_parseable_dates() {
        let names = ["2026-01-10", "11.01.2026", "09-Jan-2026", "summary"];
        let chosen = select_sheet(&names, None).expect("select");
        let chosen_date = parse_sheet_date(&chosen).expect("date");
        assert!(names
            .iter()
            .filter_map(|name| parse_sheet_date(name))
            .all(|date| date <= chosen_date));
    }

    #[test]
    fn ties_keep_first_encountered() {
        let chosen = select_sheet(&["02.01.2025", "2025-01-02"], None).expect("select");
        assert_eq!(chosen, "02.01.2025");
    }

    #[test]
    fn target_picks_closest_not_after() {
        let names = ["01.01.2025", "03.01.2025", "06.01.2025"];
        assert_eq!(
            select_sheet(&names, Some(date!(2025 - 01 - 05))).expect("select"),
            "03.01.2025"
        );
        assert_eq!(
            select_sheet(&names, Some(date!(2025 - 01 - 06))).expect("select"),
            "06.01.2025"
        );
    }

    #[test]
    fn target_before_every_sheet_falls_back_to_earliest() {
        let names = ["06.01.2025", "03.01.2025"];
        assert_eq!(
            select_sheet(&names, Some(date!(2024 - 12 - 31))).expect("select"),
            "03.01.2025"
        );
    }

    #[test]
    fn no_dated_sheets_is_an_error() {
        let error = select_sheet(&["Sheet1", "Pivot"], None).expect_err("must fail");
        assert!(matches!(error, SelectError::NoSheetsFound { ref sheets } if sheets.len() == 2));
    }
}
