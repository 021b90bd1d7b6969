use crate::error::EngineError;
use chrono::NaiveDate;
use configuration::DuplicatePolicy;
use core_types::TradeEntry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The forward-filled ledger, in date-major, symbol-minor order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    pub entries: Vec<TradeEntry>,
    pub dates: usize,
    pub symbols: usize,
    pub real: usize,
    pub synthesized: usize,
    pub duplicates_replaced: usize,
}

/// Fills every gap a symbol has after its first real trade.
///
/// For each date observed anywhere in the input and each symbol observed
/// anywhere in the input, the output holds the real entry when there is one,
/// otherwise an entry carried forward from the symbol's last real entry.
/// Nothing is emitted for a symbol before its first real entry.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    duplicates: DuplicatePolicy,
}

impl Reconciler {
    pub fn new(duplicates: DuplicatePolicy) -> Self {
        Self { duplicates }
    }

    /// Reconciles `records`. When two records share a `(date, symbol)` key the
    /// later one in iteration order wins, unless the policy rejects duplicates.
    pub fn reconcile(&self, records: impl IntoIterator<Item = TradeEntry>) -> Result<Reconciled, EngineError> {
        let mut by_date: BTreeMap<NaiveDate, HashMap<String, TradeEntry>> = BTreeMap::new();
        let mut symbols: BTreeSet<String> = BTreeSet::new();
        let mut duplicates_replaced = 0;

        for record in records {
            if !symbols.contains(&record.symbol) {
                symbols.insert(record.symbol.clone());
            }
            let day = by_date.entry(record.date).or_default();
            let (date, symbol) = record.key();

            if let Some(replaced) = day.insert(symbol, record) {
                match self.duplicates {
                    DuplicatePolicy::Reject => {
                        return Err(EngineError::DuplicateEntry {
                            date,
                            symbol: replaced.symbol,
                        });
                    }
                    DuplicatePolicy::LastWins => {
                        tracing::warn!(date = %date, symbol = %replaced.symbol, "Duplicate entry replaced by a later one.");
                        duplicates_replaced += 1;
                    }
                }
            }
        }

        let dates = by_date.len();
        let mut reconciled = Reconciled {
            dates,
            symbols: symbols.len(),
            duplicates_replaced,
            ..Reconciled::default()
        };
        let mut last_real: HashMap<&str, TradeEntry> = HashMap::new();

        for (date, mut day) in by_date {
            for symbol in &symbols {
                match day.remove(symbol.as_str()) {
                    Some(entry) => {
                        // A non-trading entry read back from an earlier run is a fill.
                        // It is re-derived from the current base, which a late report
                        // for an earlier date may have moved, and never becomes a base.
                        let refilled = last_real
                            .get(symbol.as_str())
                            .filter(|_| !entry.trading_status)
                            .map(|base| base.forward_fill(date));
                        match refilled {
                            Some(fill) => {
                                reconciled.entries.push(fill);
                                reconciled.synthesized += 1;
                            }
                            None => {
                                reconciled.real += 1;
                                last_real.insert(symbol.as_str(), entry.clone());
                                reconciled.entries.push(entry);
                            }
                        }
                    }
                    None => {
                        if let Some(base) = last_real.get(symbol.as_str()) {
                            reconciled.entries.push(base.forward_fill(date));
                            reconciled.synthesized += 1;
                        }
                    }
                }
            }
        }

        tracing::info!(
            dates = reconciled.dates,
            symbols = reconciled.symbols,
            real = reconciled.real,
            synthesized = reconciled.synthesized,
            "Reconciliation complete."
        );
        Ok(reconciled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn real(d: u32, symbol: &str, close: Decimal) -> TradeEntry {
        TradeEntry {
            date: day(d),
            symbol: symbol.to_string(),
            company_name: format!("{symbol} AB"),
            open: close - dec!(0.1),
            high: close + dec!(0.2),
            low: close - dec!(0.2),
            average: close - dec!(0.05),
            prev_average: close - dec!(0.15),
            close,
            prev_close: close - dec!(0.1),
            change: dec!(0.1),
            change_percent: dec!(1.5),
            num_trades: 9,
            volume: 900,
            value: close * dec!(900),
            trading_status: true,
        }
    }

    fn of<'a>(reconciled: &'a Reconciled, symbol: &str) -> Vec<&'a TradeEntry> {
        reconciled.entries.iter().filter(|e| e.symbol == symbol).collect()
    }

    #[test]
    fn gap_is_filled_from_the_previous_real_entry() {
        let first = real(1, "A", dec!(2.5));
        let result = Reconciler::new(DuplicatePolicy::LastWins)
            .reconcile(vec![first.clone(), real(3, "A", dec!(2.7)), real(2, "B", dec!(1.0))])
            .unwrap();

        let a = of(&result, "A");
        assert_eq!(a.len(), 3);
        assert_eq!(*a[0], first);
        assert_eq!(*a[1], first.forward_fill(day(2)));
        assert!(a[2].trading_status);
        // B first trades on day 2 and is carried into day 3.
        assert_eq!((result.real, result.synthesized), (3, 2));
    }

    #[test]
    fn fills_never_compound() {
        let first = real(1, "A", dec!(2.5));
        let result = Reconciler::new(DuplicatePolicy::LastWins)
            .reconcile(vec![first.clone(), real(2, "B", dec!(1)), real(3, "B", dec!(1))])
            .unwrap();

        let a = of(&result, "A");
        assert_eq!(a.len(), 3);
        assert_eq!(*a[2], first.forward_fill(day(3)));
        assert_eq!(a[2].prev_average, first.average);
    }

    #[test]
    fn reloaded_fills_are_not_treated_as_real() {
        let first = real(1, "A", dec!(2.5));
        let history = vec![first.clone(), first.forward_fill(day(2)), real(2, "B", dec!(1))];
        let mut input = history;
        input.push(real(3, "B", dec!(1)));

        let result = Reconciler::new(DuplicatePolicy::LastWins).reconcile(input).unwrap();

        let a = of(&result, "A");
        assert_eq!(*a[2], first.forward_fill(day(3)));
        assert_eq!(result.synthesized, 2);
    }

    #[test]
    fn stale_fills_follow_a_late_earlier_report() {
        let first = real(1, "A", dec!(1));
        let late = real(2, "A", dec!(5));
        let input = vec![
            first.clone(),
            first.forward_fill(day(3)),
            real(3, "B", dec!(1)),
            late.clone(),
        ];

        let result = Reconciler::new(DuplicatePolicy::LastWins).reconcile(input).unwrap();

        let a = of(&result, "A");
        assert_eq!(a.len(), 3);
        assert_eq!(*a[1], late);
        assert_eq!(*a[2], late.forward_fill(day(3)));
        assert_eq!((result.real, result.synthesized), (3, 1));
    }

    #[test]
    fn no_entries_before_the_first_trade() {
        let result = Reconciler::new(DuplicatePolicy::LastWins)
            .reconcile(vec![real(1, "B", dec!(1)), real(2, "B", dec!(1)), real(3, "A", dec!(4))])
            .unwrap();

        let a = of(&result, "A");
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].date, day(3));
    }

    #[test]
    fn output_is_date_major_symbol_minor() {
        let result = Reconciler::new(DuplicatePolicy::LastWins)
            .reconcile(vec![real(2, "B", dec!(1)), real(1, "C", dec!(1)), real(1, "A", dec!(1))])
            .unwrap();

        let keys: Vec<_> = result.entries.iter().map(|e| (e.date, e.symbol.as_str())).collect();
        assert_eq!(keys, vec![(day(1), "A"), (day(1), "C"), (day(2), "A"), (day(2), "B"), (day(2), "C")]);
    }

    #[test]
    fn duplicates_follow_the_policy() {
        let records = vec![real(1, "A", dec!(1)), real(1, "A", dec!(2))];

        let kept = Reconciler::new(DuplicatePolicy::LastWins).reconcile(records.clone()).unwrap();
        assert_eq!(kept.entries.len(), 1);
        assert_eq!(kept.entries[0].close, dec!(2));
        assert_eq!(kept.duplicates_replaced, 1);

        let rejected = Reconciler::new(DuplicatePolicy::Reject).reconcile(records);
        assert!(matches!(rejected, Err(EngineError::DuplicateEntry { ref symbol, .. }) if symbol == "A"));
    }

    #[test]
    fn empty_input_reconciles_to_nothing() {
        let result = Reconciler::new(DuplicatePolicy::LastWins).reconcile(Vec::new()).unwrap();
        assert_eq!(result, Reconciled::default());
    }
}
