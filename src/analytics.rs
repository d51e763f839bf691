//! Performance aggregation over canonical trade records.
//! All functions are pure -- they take records and return computed values.

use crate::trade::TradeRecord;
use std::collections::{BTreeMap, HashMap};

/// Per-group aggregate. Derived view metrics are methods, not fields.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_profit: f64,
    pub profits: Vec<f64>,
}

impl TradeStats {
    pub fn record(&mut self, profit_loss: f64) {
        self.total_trades += 1;
        self.total_profit += profit_loss;
        self.profits.push(profit_loss);
        if profit_loss > 0.0 {
            self.wins += 1;
        } else if profit_loss < 0.0 {
            self.losses += 1;
        }
    }

    /// Winning share in percent.
    #[inline]
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.wins as f64 / self.total_trades as f64 * 100.0
    }

    #[inline]
    pub fn average_profit(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.total_profit / self.total_trades as f64
    }

    pub fn best_trade(&self) -> Option<f64> {
        self.profits.iter().copied().reduce(f64::max)
    }

    pub fn worst_trade(&self) -> Option<f64> {
        self.profits.iter().copied().reduce(f64::min)
    }

    /// Share of trades that were not break-even, in percent.
    #[inline]
    pub fn decided_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        (self.wins + self.losses) as f64 / self.total_trades as f64 * 100.0
    }

    pub fn view(&self, key: &str) -> GroupPerformance {
        GroupPerformance {
            key: key.to_string(),
            total_trades: self.total_trades,
            wins: self.wins,
            losses: self.losses,
            win_rate: self.win_rate(),
            total_profit: self.total_profit,
            average_profit: self.average_profit(),
            best_trade: self.best_trade(),
            worst_trade: self.worst_trade(),
            decided_rate: self.decided_rate(),
        }
    }
}

/// Flattened row for the performance tables.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GroupPerformance {
    pub key: String,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_profit: f64,
    pub average_profit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_trade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_trade: Option<f64>,
    pub decided_rate: f64,
}

pub fn aggregate_by<F>(records: &[TradeRecord], key_fn: F) -> HashMap<String, TradeStats>
where
    F: Fn(&TradeRecord) -> String,
{
    let mut groups: HashMap<String, TradeStats> = HashMap::new();
    for r in records {
        groups.entry(key_fn(r)).or_default().record(r.profit_loss);
    }
    groups
}

pub fn by_symbol(records: &[TradeRecord]) -> HashMap<String, TradeStats> {
    aggregate_by(records, |r| r.symbol.clone())
}

pub fn by_strategy(records: &[TradeRecord]) -> HashMap<String, TradeStats> {
    aggregate_by(records, |r| r.strategy.clone())
}

/// Groups ordered by descending total profit. Tie order is unspecified.
pub fn ranked(groups: HashMap<String, TradeStats>) -> Vec<(String, TradeStats)> {
    let mut out: Vec<_> = groups.into_iter().collect();
    out.sort_by(|a, b| b.1.total_profit.total_cmp(&a.1.total_profit));
    out
}

pub fn performance_table(groups: HashMap<String, TradeStats>) -> Vec<GroupPerformance> {
    ranked(groups)
        .iter()
        .map(|(key, stats)| stats.view(key))
        .collect()
}

// ── Whole-journal summary ──

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct JournalSummary {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_profit: f64,
    pub win_rate: f64,
    pub max_profit: Option<f64>,
}

pub fn summarize(records: &[TradeRecord]) -> JournalSummary {
    let mut stats = TradeStats::default();
    for r in records {
        stats.record(r.profit_loss);
    }
    JournalSummary {
        total_trades: stats.total_trades,
        wins: stats.wins,
        losses: stats.losses,
        total_profit: stats.total_profit,
        win_rate: stats.win_rate(),
        max_profit: stats.best_trade(),
    }
}

/// Profit/loss per entry month (`YYYY-MM`), oldest first.
pub fn monthly_profit(records: &[TradeRecord]) -> Vec<(String, f64)> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for r in records {
        *months.entry(r.entry_month()).or_insert(0.0) += r.profit_loss;
    }
    months.into_iter().collect()
}

// ── Distribution bands ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitBand {
    LargeLoss,
    MediumLoss,
    SmallLoss,
    SmallProfit,
    MediumProfit,
    LargeProfit,
}

impl ProfitBand {
    pub const ALL: [ProfitBand; 6] = [
        ProfitBand::LargeLoss,
        ProfitBand::MediumLoss,
        ProfitBand::SmallLoss,
        ProfitBand::SmallProfit,
        ProfitBand::MediumProfit,
        ProfitBand::LargeProfit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::LargeLoss => "below -1,000,000",
            Self::MediumLoss => "-1,000,000 to -100,000",
            Self::SmallLoss => "-100,000 to 0",
            Self::SmallProfit => "0 to 100,000",
            Self::MediumProfit => "100,000 to 1,000,000",
            Self::LargeProfit => "above 1,000,000",
        }
    }

    #[inline]
    fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for ProfitBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[inline]
pub fn band_for(profit_loss: f64) -> ProfitBand {
    if profit_loss < -1_000_000.0 {
        ProfitBand::LargeLoss
    } else if profit_loss < -100_000.0 {
        ProfitBand::MediumLoss
    } else if profit_loss < 0.0 {
        ProfitBand::SmallLoss
    } else if profit_loss < 100_000.0 {
        ProfitBand::SmallProfit
    } else if profit_loss < 1_000_000.0 {
        ProfitBand::MediumProfit
    } else {
        ProfitBand::LargeProfit
    }
}

/// Trade count per band, in band order.
pub fn distribution(records: &[TradeRecord]) -> [(ProfitBand, usize); 6] {
    let mut counts = ProfitBand::ALL.map(|b| (b, 0usize));
    for r in records {
        counts[band_for(r.profit_loss).index()].1 += 1;
    }
    counts
}

// ── Filtering ──

/// Report filter. Empty fields match everything.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TradeFilter {
    pub strategy: Option<String>,
    /// Entry month prefix, `YYYY-MM`.
    pub month: Option<String>,
    /// Case-insensitive symbol substring.
    pub symbol: Option<String>,
}

impl TradeFilter {
    pub fn matches(&self, r: &TradeRecord) -> bool {
        let strategy_ok = match self.strategy.as_deref() {
            Some(s) if !s.is_empty() => r.strategy == s,
            _ => true,
        };
        let month_ok = match self.month.as_deref() {
            Some(m) if !m.is_empty() => r.entry_date.format("%Y-%m-%d").to_string().starts_with(m),
            _ => true,
        };
        let symbol_ok = match self.symbol.as_deref() {
            Some(s) if !s.is_empty() => r.symbol.contains(&s.to_uppercase()),
            _ => true,
        };
        strategy_ok && month_ok && symbol_ok
    }
}

pub fn apply_filter(records: &[TradeRecord], filter: &TradeFilter) -> Vec<TradeRecord> {
    records.iter().filter(|r| filter.matches(r)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trade(symbol: &str, strategy: &str, month: u32, pl: f64) -> TradeRecord {
        let d = NaiveDate::from_ymd_opt(2024, month, 10).unwrap();
        TradeRecord {
            id: format!("{symbol}-{month}-{pl}"),
            entry_date: d,
            exit_date: d,
            symbol: symbol.into(),
            entry_price: 1000.0,
            exit_price: 1000.0,
            lot_size: 1,
            broker_fee: 0.0,
            strategy: strategy.into(),
            note: None,
            profit_loss: pl,
        }
    }

    fn sample() -> Vec<TradeRecord> {
        vec![
            trade("BBCA", "Scalping", 1, 100.0),
            trade("BBCA", "Swing", 1, -50.0),
            trade("TLKM", "Scalping", 2, 0.0),
            trade("TLKM", "Swing", 3, 200.0),
        ]
    }

    #[test]
    fn test_aggregate_counts() {
        let all = aggregate_by(&sample(), |_| "all".into());
        let stats = &all["all"];
        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.total_profit, 250.0);
        assert_eq!(stats.win_rate(), 50.0);
        assert_eq!(stats.average_profit(), 62.5);
        assert_eq!(stats.best_trade(), Some(200.0));
        assert_eq!(stats.worst_trade(), Some(-50.0));
        assert_eq!(stats.decided_rate(), 75.0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = TradeStats::default();
        assert_eq!(stats.win_rate(), 0.0);
        assert_eq!(stats.average_profit(), 0.0);
        assert_eq!(stats.best_trade(), None);
        assert_eq!(stats.worst_trade(), None);
        assert!(aggregate_by(&[], |r| r.symbol.clone()).is_empty());
    }

    #[test]
    fn test_ranked_by_total_profit() {
        let table = performance_table(by_symbol(&sample()));
        let keys: Vec<_> = table.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["TLKM", "BBCA"]);
        assert_eq!(table[0].total_profit, 200.0);
        assert_eq!(table[1].total_profit, 50.0);

        let strategies = ranked(by_strategy(&sample()));
        assert_eq!(strategies[0].0, "Swing");
        assert_eq!(strategies[0].1.total_profit, 150.0);
    }

    #[test]
    fn test_bands() {
        assert_eq!(band_for(-1_500_000.0), ProfitBand::LargeLoss);
        assert_eq!(band_for(-1_000_000.0), ProfitBand::MediumLoss);
        assert_eq!(band_for(-100_000.0), ProfitBand::SmallLoss);
        assert_eq!(band_for(-0.01), ProfitBand::SmallLoss);
        assert_eq!(band_for(0.0), ProfitBand::SmallProfit);
        assert_eq!(band_for(100_000.0), ProfitBand::MediumProfit);
        assert_eq!(band_for(1_000_000.0), ProfitBand::LargeProfit);
    }

    #[test]
    fn test_distribution_counts() {
        let dist = distribution(&sample());
        assert_eq!(dist[ProfitBand::SmallLoss.index()], (ProfitBand::SmallLoss, 1));
        assert_eq!(dist[ProfitBand::SmallProfit.index()], (ProfitBand::SmallProfit, 3));
        assert_eq!(dist.iter().map(|(_, n)| n).sum::<usize>(), 4);
    }

    #[test]
    fn test_summary_and_monthly() {
        let s = summarize(&sample());
        assert_eq!(s.total_trades, 4);
        assert_eq!(s.total_profit, 250.0);
        assert_eq!(s.win_rate, 50.0);
        assert_eq!(s.max_profit, Some(200.0));
        assert_eq!(summarize(&[]).max_profit, None);

        let monthly = monthly_profit(&sample());
        assert_eq!(
            monthly,
            vec![
                ("2024-01".to_string(), 50.0),
                ("2024-02".to_string(), 0.0),
                ("2024-03".to_string(), 200.0),
            ]
        );
    }

    #[test]
    fn test_filter() {
        let filter = TradeFilter {
            strategy: Some("Swing".into()),
            month: None,
            symbol: Some("tl".into()),
        };
        let hits = apply_filter(&sample(), &filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].profit_loss, 200.0);

        let by_month = TradeFilter { month: Some("2024-01".into()), ..Default::default() };
        assert_eq!(apply_filter(&sample(), &by_month).len(), 2);
        assert_eq!(apply_filter(&sample(), &TradeFilter::default()).len(), 4);
    }
}
