use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trip parameters extracted from one free-text utterance. Every field is
/// independently optional: absence means the utterance carried no cue for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTripQuery {
    pub destination: Option<String>,
    pub budget: Option<u64>,
    pub duration_days: Option<u32>,
    pub people: Option<u32>,
    pub preferences: Option<Vec<Preference>>,
}

impl ParsedTripQuery {
    pub fn is_empty(&self) -> bool {
        self.destination.is_none()
            && self.budget.is_none()
            && self.duration_days.is_none()
            && self.people.is_none()
            && self.preferences.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    Vegetarian,
    Beach,
    Mountain,
    City,
    Adventure,
    Luxury,
}

impl Preference {
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Vegetarian => "vegetarian",
            Self::Beach => "beach",
            Self::Mountain => "mountain",
            Self::City => "city",
            Self::Adventure => "adventure",
            Self::Luxury => "luxury",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    Solo,
    Couple,
    Family,
    Friends,
}

impl GroupType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "solo" | "alone" => Some(Self::Solo),
            "couple" | "pair" => Some(Self::Couple),
            "family" => Some(Self::Family),
            "friends" | "group" => Some(Self::Friends),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommuteMethod {
    PrivateCab,
    Scooter,
    Walk,
    Shuttle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommuteInfo {
    pub method: CommuteMethod,
    pub cost: f64,
    pub duration_minutes: u32,
    pub distance_km: f64,
}

/// One priced unit in a quote request. Quantity is non-negative by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingLineItem {
    pub name: String,
    pub base_unit_price: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub name: String,
    pub base_unit_price: f64,
    pub quantity: u32,
    pub sell_price: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComposition {
    pub base_cost: f64,
    pub margin_value: f64,
    pub tax: f64,
}

/// Full-precision quote. Rounding to 0 or 2 decimal places is a display
/// concern and never happens here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub subtotal: f64,
    pub tax: f64,
    pub grand_total: f64,
    pub total_base_cost: f64,
    pub margin_value: f64,
    pub top_lines: Vec<QuoteLine>,
    pub composition: CostComposition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceLevel {
    Cheap,
    Moderate,
    Expensive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub cuisine: String,
    pub rating: f32,
    pub price_level: PriceLevel,
    pub tags: Vec<String>,
    pub location_id: String,
}

impl Restaurant {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Travelers {
    pub adults: u32,
    pub children: u32,
}

impl Travelers {
    pub fn total(self) -> u32 {
        self.adults + self.children
    }
}

impl Default for Travelers {
    fn default() -> Self {
        Self {
            adults: 2,
            children: 0,
        }
    }
}

/// A booking-wizard selection carrying the price it was offered at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedSelection {
    pub id: String,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDraft {
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub duration_days: u32,
    pub travelers: Travelers,
    pub budget: Option<u64>,
    pub transport: Option<PricedSelection>,
    pub transfer: Option<PricedSelection>,
    pub activities: Vec<PricedSelection>,
    pub total_price: f64,
}

impl Default for TripDraft {
    fn default() -> Self {
        Self {
            destination: None,
            start_date: None,
            duration_days: 3,
            travelers: Travelers::default(),
            budget: None,
            transport: None,
            transfer: None,
            activities: Vec::new(),
            total_price: 0.0,
        }
    }
}

impl TripDraft {
    /// Transport and activities are priced per head; the transfer is booked
    /// per vehicle.
    pub fn recalculate_total(&mut self) {
        let heads = f64::from(self.travelers.total());
        let mut total = 0.0;

        if let Some(transport) = &self.transport {
            total += transport.price * heads;
        }
        if let Some(transfer) = &self.transfer {
            total += transfer.price;
        }
        total += self.activities.iter().map(|a| a.price).sum::<f64>() * heads;

        self.total_price = total;
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("numeric value out of range: {0}")]
    NumberOutOfRange(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    #[error("negative base unit price {price} for line item {name:?}")]
    NegativeUnitPrice { name: String, price: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_group_type_aliases() {
        assert_eq!(GroupType::parse("Friends"), Some(GroupType::Friends));
        assert_eq!(GroupType::parse(" pair "), Some(GroupType::Couple));
        assert_eq!(GroupType::parse("tour bus"), None);
    }

    #[test]
    fn trip_total_scales_per_head_except_transfer() {
        let mut draft = TripDraft {
            travelers: Travelers {
                adults: 2,
                children: 1,
            },
            transport: Some(PricedSelection {
                id: "t1".to_string(),
                name: "Flight".to_string(),
                price: 100.0,
            }),
            transfer: Some(PricedSelection {
                id: "x1".to_string(),
                name: "Airport cab".to_string(),
                price: 40.0,
            }),
            activities: vec![PricedSelection {
                id: "a1".to_string(),
                name: "Temple tour".to_string(),
                price: 20.0,
            }],
            ..TripDraft::default()
        };

        draft.recalculate_total();
        assert_eq!(draft.total_price, 100.0 * 3.0 + 40.0 + 20.0 * 3.0);
    }
}
