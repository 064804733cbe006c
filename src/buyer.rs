//! Buyers are the counterparties which receive supply in the greedy allocation.
//!
//! Each buyer belongs to a group (a country or import terminal) and carries a credit rating, which
//! determines the probability that the buyer defaults on a cargo.
use crate::id::define_id_type;
use crate::period::{PeriodID, PeriodSet};
use crate::units::{Dimensionless, MoneyPerQuantity};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use strum::EnumString;

define_id_type! {BuyerID}
define_id_type! {GroupID}
define_id_type! {IndexID}

/// A map of [`Buyer`]s, keyed by buyer ID. Input order is preserved.
pub type BuyerMap = IndexMap<BuyerID, Buyer>;

/// The final delivered cost per unit for selling into each group, keyed by period and group
pub type FinalCostMap = IndexMap<(PeriodID, GroupID), MoneyPerQuantity>;

/// The probability of default assumed for a rating which is not in the rating table
pub const UNRATED_PROBABILITY_OF_DEFAULT: Dimensionless = Dimensionless(0.05);

/// A credit rating on the usual AAA to CCC scale
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum CreditRating {
    /// AAA
    #[strum(serialize = "AAA")]
    Aaa,
    /// AA
    #[strum(serialize = "AA")]
    Aa,
    /// A
    #[strum(serialize = "A")]
    A,
    /// BBB
    #[strum(serialize = "BBB")]
    Bbb,
    /// BB
    #[strum(serialize = "BB")]
    Bb,
    /// B
    #[strum(serialize = "B")]
    B,
    /// CCC
    #[strum(serialize = "CCC")]
    Ccc,
    /// Any rating not covered by the table
    #[strum(default)]
    Unrated(String),
}

impl CreditRating {
    /// The probability of default for this rating.
    ///
    /// Unrated counterparties fall back to [`UNRATED_PROBABILITY_OF_DEFAULT`].
    pub fn probability_of_default(&self) -> Dimensionless {
        match self {
            Self::Aaa => Dimensionless(0.0001),
            Self::Aa => Dimensionless(0.0002),
            Self::A => Dimensionless(0.0005),
            Self::Bbb => Dimensionless(0.002),
            Self::Bb => Dimensionless(0.008),
            Self::B => Dimensionless(0.02),
            Self::Ccc => Dimensionless(0.10),
            Self::Unrated(_) => UNRATED_PROBABILITY_OF_DEFAULT,
        }
    }

    /// The rating as it is written in input and output files
    pub fn as_str(&self) -> &str {
        match self {
            Self::Aaa => "AAA",
            Self::Aa => "AA",
            Self::A => "A",
            Self::Bbb => "BBB",
            Self::Bb => "BB",
            Self::B => "B",
            Self::Ccc => "CCC",
            Self::Unrated(s) => s,
        }
    }
}

impl fmt::Display for CreditRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for CreditRating {
    fn deserialize<D>(deserialiser: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserialiser)?;
        s.trim().parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for CreditRating {
    fn serialize<S>(&self, serialiser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialiser.serialize_str(self.as_str())
    }
}

fn default_active() -> bool {
    true
}

/// The static description of a buyer, as read from `buyers.csv`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuyerBase {
    /// Unique identifier for the buyer
    pub id: BuyerID,
    /// Display name
    pub name: String,
    /// The country or terminal the buyer belongs to
    pub group_id: GroupID,
    /// Free-form buyer profile (e.g. "utility", "trader")
    pub profile: String,
    /// The buyer's credit rating
    pub credit_rating: CreditRating,
    /// Where in the target price range the buyer settles, between 0 (low) and 1 (high)
    pub negotiation_factor: Dimensionless,
    /// Overrides the probability of default given by the credit rating
    #[serde(default)]
    pub probability_of_default: Option<Dimensionless>,
    /// Inactive buyers never receive a cap
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A buyer with its prices resolved for every period
#[derive(Debug, Clone, PartialEq)]
pub struct Buyer {
    /// Unique identifier for the buyer
    pub id: BuyerID,
    /// Display name
    pub name: String,
    /// The country or terminal the buyer belongs to
    pub group_id: GroupID,
    /// Free-form buyer profile
    pub profile: String,
    /// The buyer's credit rating
    pub credit_rating: CreditRating,
    /// The probability that the buyer defaults
    pub probability_of_default: Dimensionless,
    /// Whether the buyer can receive caps
    pub active: bool,
    /// Sale price per unit for each period in which it is defined
    pub prices: IndexMap<PeriodID, MoneyPerQuantity>,
}

impl Buyer {
    /// The buyer's price in the given period, if defined
    pub fn price(&self, period_id: &PeriodID) -> Option<MoneyPerQuantity> {
        self.prices.get(period_id).copied()
    }
}

/// A rule for deriving a buyer's sale price in a period
pub trait PricingRule {
    /// The price for `buyer` in `period_id`, or `None` if it cannot be determined
    fn price(&self, buyer: &BuyerBase, period_id: &PeriodID) -> Option<MoneyPerQuantity>;
}

/// Prices given directly for each buyer and period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplicitPrices(pub IndexMap<(PeriodID, BuyerID), MoneyPerQuantity>);

impl PricingRule for ExplicitPrices {
    fn price(&self, buyer: &BuyerBase, period_id: &PeriodID) -> Option<MoneyPerQuantity> {
        self.0.get(&(period_id.clone(), buyer.id.clone())).copied()
    }
}

/// The target sale price range for a group, as a linear function of a market index
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPricing {
    /// The market index the group's prices are linked to
    pub index_id: IndexID,
    /// Multiplier applied to the index value
    pub slope: Dimensionless,
    /// Premium added to give the bottom of the range
    pub premium_low: MoneyPerQuantity,
    /// Premium added to give the top of the range
    pub premium_high: MoneyPerQuantity,
}

/// Prices derived from market indices (e.g. Brent, JKM) and each buyer's negotiation factor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexLinkedPrices {
    /// Index values for each period
    pub indices: IndexMap<(PeriodID, IndexID), MoneyPerQuantity>,
    /// Pricing formula for each group
    pub groups: IndexMap<GroupID, GroupPricing>,
}

impl IndexLinkedPrices {
    /// The low and high ends of the target price range for a group in a period
    pub fn target_range(
        &self,
        group_id: &GroupID,
        period_id: &PeriodID,
    ) -> Option<(MoneyPerQuantity, MoneyPerQuantity)> {
        let pricing = self.groups.get(group_id)?;
        let index = *self
            .indices
            .get(&(period_id.clone(), pricing.index_id.clone()))?;
        let linked = pricing.slope * index;

        Some((linked + pricing.premium_low, linked + pricing.premium_high))
    }
}

impl PricingRule for IndexLinkedPrices {
    fn price(&self, buyer: &BuyerBase, period_id: &PeriodID) -> Option<MoneyPerQuantity> {
        let (low, high) = self.target_range(&buyer.group_id, period_id)?;
        Some(low + buyer.negotiation_factor * (high - low))
    }
}

/// Build the full set of buyers from their base data and a pricing rule.
///
/// The probability of default comes from the buyer's override if present, otherwise from its
/// credit rating. Periods for which the rule yields no price are left out of the buyer's price
/// table.
pub fn build_buyers(bases: &[BuyerBase], periods: &PeriodSet, rule: &dyn PricingRule) -> BuyerMap {
    bases
        .iter()
        .map(|base| {
            let prices = periods
                .iter()
                .filter_map(|period_id| {
                    rule.price(base, period_id)
                        .map(|price| (period_id.clone(), price))
                })
                .collect();
            let probability_of_default = base
                .probability_of_default
                .unwrap_or_else(|| base.credit_rating.probability_of_default());

            let buyer = Buyer {
                id: base.id.clone(),
                name: base.name.clone(),
                group_id: base.group_id.clone(),
                profile: base.profile.clone(),
                credit_rating: base.credit_rating.clone(),
                probability_of_default,
                active: base.active,
                prices,
            };
            (buyer.id.clone(), buyer)
        })
        .collect()
}
