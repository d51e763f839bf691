use crate::trade::TradeRecord;

/// Owns the canonical in-memory trade collection, in insertion order.
/// Calculators never touch it; the journal service is its only writer.
#[derive(Debug, Clone, Default)]
pub struct TradeRepository {
    trades: Vec<TradeRecord>,
}

impl TradeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn get(&self, id: &str) -> Option<&TradeRecord> {
        self.trades.iter().find(|t| t.id == id)
    }

    /// Insert or fully replace by id. Returns the previous version, if any.
    /// A replaced record keeps its position.
    pub fn upsert(&mut self, record: TradeRecord) -> Option<TradeRecord> {
        match self.trades.iter().position(|t| t.id == record.id) {
            Some(i) => Some(std::mem::replace(&mut self.trades[i], record)),
            None => {
                self.trades.push(record);
                None
            }
        }
    }

    /// Remove by id, returning the record and the index it occupied.
    pub fn remove_by_id(&mut self, id: &str) -> Option<(usize, TradeRecord)> {
        let i = self.trades.iter().position(|t| t.id == id)?;
        Some((i, self.trades.remove(i)))
    }

    /// Put a removed record back where it was.
    pub fn restore_at(&mut self, index: usize, record: TradeRecord) {
        let index = index.min(self.trades.len());
        self.trades.insert(index, record);
    }

    pub fn replace_all(&mut self, trades: Vec<TradeRecord>) {
        self.trades = trades;
    }
}
