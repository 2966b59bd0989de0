//! Baseline lookup maps and per-symbol reconciliation.

use std::collections::HashMap;

use serde::Serialize;

use crate::baseline::{BaselineExtraction, ExtractError};
use crate::domain::{BaselineRow, LiveRow, RowSkip, Section, StrikeKey, Symbol};
use crate::live::{LiveLayout, LiveScanner, LiveSheet};

/// Baseline open interest keyed by strike, split by option side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrikeMaps {
    pub call: HashMap<StrikeKey, f64>,
    pub put: HashMap<StrikeKey, f64>,
    pub additional: HashMap<StrikeKey, String>,
}

impl StrikeMaps {
    /// Build maps from one symbol's baseline rows. Later rows win on duplicate
    /// strikes.
    pub fn from_baseline(rows: &[BaselineRow]) -> Self {
        let mut maps = Self::default();
        for row in rows {
            let category = row.category.to_lowercase();
            if let Some(latest_oi) = row.latest_oi {
                if category.contains("call") {
                    maps.call.insert(row.strike_key.clone(), latest_oi);
                }
                if category.contains("put") {
                    maps.put.insert(row.strike_key.clone(), latest_oi);
                }
            }
            if let Some(marker) = &row.additional_strike {
                maps.additional.insert(row.strike_key.clone(), marker.clone());
            }
        }
        maps
    }

    /// Baseline latest OI for `key` on the side of `section`.
    pub fn baseline_oi(&self, section: Section, key: &StrikeKey) -> Option<f64> {
        let side = if section.is_call() { &self.call } else { &self.put };
        side.get(key).copied()
    }

    pub fn additional_strike(&self, key: &StrikeKey) -> Option<&str> {
        self.additional.get(key).map(String::as_str)
    }
}

/// Reconciled output for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub symbol: Symbol,
    pub baseline: Vec<BaselineRow>,
    pub live: Vec<LiveRow>,
    pub skipped: Vec<RowSkip>,
    pub live_block_found: bool,
}

impl Reconciliation {
    pub fn has_data(&self) -> bool {
        !self.baseline.is_empty() || !self.live.is_empty()
    }

    pub fn new_strike_count(&self) -> usize {
        self.live.iter().filter(|row| row.is_new_strike).count()
    }
}

/// Reconciles baseline rows against a live sheet.
#[derive(Debug, Clone)]
pub struct Reconciler {
    scanner: LiveScanner,
}

impl Reconciler {
    pub fn new(layout: LiveLayout) -> Result<Self, ExtractError> {
        Ok(Self {
            scanner: LiveScanner::new(layout)?,
        })
    }

    pub fn layout(&self) -> &LiveLayout {
        self.scanner.layout()
    }

    pub fn reconcile(
        &self,
        symbol: &Symbol,
        baseline: BaselineExtraction,
        live: &LiveSheet,
    ) -> Result<Reconciliation, ExtractError> {
        let maps = StrikeMaps::from_baseline(&baseline.rows);
        let extraction = self.scanner.extract(live, symbol, &maps)?;

        let mut skipped = baseline.skipped;
        skipped.extend(extraction.skipped);

        Ok(Reconciliation {
            symbol: symbol.clone(),
            baseline: baseline.rows,
            live: extraction.rows,
            skipped,
            live_block_found: extraction.block_found,
        })
    }
}

/// Reconcile `symbol` with a one-off [`Reconciler`].
pub fn reconcile(
    symbol: &Symbol,
    baseline: BaselineExtraction,
    live: &LiveSheet,
    layout: &LiveLayout,
) -> Result<Reconciliation, ExtractError> {
    Reconciler::new(layout.clone())?.reconcile(symbol, baseline, live)
}
