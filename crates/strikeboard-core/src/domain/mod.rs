//! # Domain Models
//!
//! Canonical types shared by the extraction and reconciliation stages.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, normalized equity symbol |
//! | [`Section`] | Call/Put resistance/support subsection |
//! | [`StrikeKey`] | Canonical strike lookup key |
//! | [`BaselineRow`] | Historical table row |
//! | [`LiveRow`] | Annotated live-block row |
//! | [`RowSkip`] | Explicit record of a skipped sheet row |
//! | [`UtcDateTime`] | UTC timestamp |

mod number;
mod rows;
mod section;
mod strike;
mod symbol;
mod timestamp;

pub use number::{format_oi, parse_number, NumberFormatError};
pub use rows::{normalize_additional_strike, BaselineRow, LiveRow, RowSkip, SkipReason};
pub use section::Section;
pub use strike::StrikeKey;
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
