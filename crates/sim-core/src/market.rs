//! Market state carried between days.

use crate::config::GameConfig;
use crate::resource::ResourceMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One resolved day as shown on the price chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub day: u32,
    /// Prices the day's sales cleared at.
    pub prices: ResourceMap<Decimal>,
    pub colony_needs: ResourceMap<Decimal>,
    pub sold: ResourceMap<Decimal>,
}

/// Prices and colony demand in effect for the current day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    /// Prices visible to players while they decide.
    pub prices: ResourceMap<Decimal>,
    /// Prices of the previous day.
    pub last_prices: ResourceMap<Decimal>,
    /// Demand the current day's sales are measured against.
    pub colony_needs: ResourceMap<Decimal>,
    /// Trailing window of resolved days; display only.
    #[serde(default)]
    pub history: VecDeque<MarketRecord>,
}

impl MarketState {
    /// Opening market: every price at the configured start.
    pub fn opening(cfg: &GameConfig, colony_needs: ResourceMap<Decimal>) -> Self {
        let prices = ResourceMap::splat(cfg.pricing.starting_price);
        Self {
            prices,
            last_prices: prices,
            colony_needs,
            history: VecDeque::new(),
        }
    }

    /// Append a record and drop the oldest beyond `limit`.
    pub fn record(&mut self, record: MarketRecord, limit: usize) {
        self.history.push_back(record);
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }
}
