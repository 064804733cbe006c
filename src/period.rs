//! Periods are the ordered time buckets (usually calendar months) over which supply, demand and
//! caps are defined.
use crate::id::define_id_type;
use anyhow::{Result, ensure};
use indexmap::IndexSet;

define_id_type! {PeriodID}

/// The periods covered by a model run, in chronological order.
///
/// The order in which periods were supplied is the order used for every period-indexed structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PeriodSet(IndexSet<PeriodID>);

impl PeriodSet {
    /// Create a [`PeriodSet`] from period names given in chronological order.
    ///
    /// Fails if no periods are given or if a period is repeated.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut periods = IndexSet::new();
        for name in names {
            let name = name.as_ref().trim();
            ensure!(!name.is_empty(), "Period names cannot be empty");
            ensure!(
                periods.insert(PeriodID::new(name)),
                "Period {name} is listed more than once"
            );
        }
        ensure!(!periods.is_empty(), "At least one period must be given");

        Ok(Self(periods))
    }

    /// Iterate over the periods in chronological order
    pub fn iter(&self) -> impl Iterator<Item = &PeriodID> {
        self.0.iter()
    }

    /// The number of periods
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no periods
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The underlying set of IDs, for validating references in input files
    pub fn ids(&self) -> &IndexSet<PeriodID> {
        &self.0
    }
}
