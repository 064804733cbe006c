//! Destinations are the terminals to which cargoes can be shipped in the LP allocation.
use crate::id::define_id_type;
use crate::period::PeriodID;
use crate::units::{Distance, MoneyPerQuantity, Quantity};
use indexmap::IndexMap;
use serde::Deserialize;

define_id_type! {DestinationID}

/// A map of [`Destination`]s, keyed by destination ID
pub type DestinationMap = IndexMap<DestinationID, Destination>;

/// Delivered prices for destinations, keyed by period and destination.
///
/// A missing entry means the price is undefined and the destination is not eligible in that
/// period.
pub type DestinationPriceMap = IndexMap<(PeriodID, DestinationID), MoneyPerQuantity>;

/// A receiving terminal
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Destination {
    /// Short code for the destination (e.g. "SLNG")
    pub id: DestinationID,
    /// Display name
    pub name: String,
    /// Voyage distance from the loading port
    pub distance: Distance,
    /// Maximum quantity the destination can receive in a single period
    pub capacity: Quantity,
    /// Terminal handling fee per unit
    pub handling_fee: MoneyPerQuantity,
}
