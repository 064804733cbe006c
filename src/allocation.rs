//! Allocation of supply to destinations and buyers.
//!
//! There are two allocators: an exact LP over destinations ([`optimal`]) and a greedy,
//! margin-ranked fill over buyers with caps ([`greedy`]). Both produce an [`AllocationResult`].
use crate::period::PeriodID;
use crate::units::{Dimensionless, Money, MoneyPerQuantity, Quantity};
use indexmap::IndexMap;
use std::hash::Hash;

pub mod greedy;
pub mod optimal;

/// The allocation made to a single destination or buyer in a period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationEntry {
    /// Quantity allocated
    pub quantity: Quantity,
    /// Profit per unit allocated
    pub unit_margin: MoneyPerQuantity,
    /// `unit_margin * quantity`
    pub gross_profit: Money,
    /// Gross profit adjusted for the risk of counterparty default
    pub adjusted_profit: Money,
    /// Fraction of the allocated quantity which is delivered
    pub delivered_fraction: Dimensionless,
}

impl AllocationEntry {
    /// Create an entry where the counterparty defaults with the given probability.
    ///
    /// Use a probability of zero for destinations, which have no notion of default.
    pub fn new(
        quantity: Quantity,
        unit_margin: MoneyPerQuantity,
        probability_of_default: Dimensionless,
        delivered_fraction: Dimensionless,
    ) -> Self {
        let gross_profit = unit_margin * quantity;
        Self {
            quantity,
            unit_margin,
            gross_profit,
            adjusted_profit: gross_profit * (Dimensionless(1.0) - probability_of_default),
            delivered_fraction,
        }
    }
}

/// Allocations keyed by period and destination or buyer ID
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult<K: Hash + Eq> {
    entries: IndexMap<(PeriodID, K), AllocationEntry>,
    objectives: IndexMap<PeriodID, Money>,
}

impl<K: Hash + Eq> Default for AllocationResult<K> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            objectives: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone> AllocationResult<K> {
    /// Record an allocation, replacing any existing one for the same period and key
    pub fn insert(&mut self, period_id: PeriodID, key: K, entry: AllocationEntry) {
        self.entries.insert((period_id, key), entry);
    }

    /// Record the solver's objective value for a period
    pub fn set_objective(&mut self, period_id: PeriodID, objective: Money) {
        self.objectives.insert(period_id, objective);
    }

    /// The allocation for a key in a period, if any was made
    pub fn get(&self, period_id: &PeriodID, key: &K) -> Option<&AllocationEntry> {
        self.entries.get(&(period_id.clone(), key.clone()))
    }

    /// The quantity allocated to a key in a period (zero if none)
    pub fn quantity(&self, period_id: &PeriodID, key: &K) -> Quantity {
        self.get(period_id, key)
            .map_or(Quantity(0.0), |entry| entry.quantity)
    }

    /// The objective value reported for a period, if this result came from an optimisation
    pub fn objective(&self, period_id: &PeriodID) -> Option<Money> {
        self.objectives.get(period_id).copied()
    }

    /// Iterate over period, key and allocation
    pub fn iter(&self) -> impl Iterator<Item = (&PeriodID, &K, &AllocationEntry)> {
        self.entries
            .iter()
            .map(|((period_id, key), entry)| (period_id, key, entry))
    }

    /// Iterate over the allocations for a single period
    pub fn iter_period<'a>(
        &'a self,
        period_id: &'a PeriodID,
    ) -> impl Iterator<Item = (&'a K, &'a AllocationEntry)> {
        self.iter()
            .filter(move |(p, _, _)| *p == period_id)
            .map(|(_, key, entry)| (key, entry))
    }

    /// Whether no allocations were recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
