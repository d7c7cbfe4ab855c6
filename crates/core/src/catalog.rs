//! Static reference data: the destination vocabulary the voice parser scans,
//! plus the canned coordinate and restaurant catalogs the mock data layer
//! serves.

use once_cell::sync::Lazy;

use crate::models::{PriceLevel, Restaurant};
use crate::proximity::CoordinateLookup;

/// Known place names, scanned in order; first substring hit wins.
pub const DESTINATIONS: &[&str] = &[
    "bali",
    "paris",
    "tokyo",
    "london",
    "new york",
    "goa",
    "dubai",
    "singapore",
    "thailand",
    "vietnam",
    "italy",
    "swiss",
    "maldives",
];

static BALI_COORDINATES: Lazy<CoordinateLookup> = Lazy::new(|| {
    CoordinateLookup::from_entries([
        // Uluwatu cluster
        ("Uluwatu Temple", -8.8291, 115.0837),
        ("Single Fin", -8.8250, 115.0870),
        ("Padang Padang Beach", -8.8111, 115.1030),
        ("Kecak Fire Dance", -8.8291, 115.0837),
        // Ubud area
        ("Ubud Art Market", -8.5069, 115.2625),
        ("Monkey Forest", -8.5194, 115.2606),
        ("Tegalalang Rice Terrace", -8.4293, 115.2810),
        // Nusa Penida
        ("Kelingking Beach", -8.7505, 115.4750),
        ("Angel's Billabong", -8.7300, 115.4500),
    ])
});

pub fn default_coordinates() -> &'static CoordinateLookup {
    &BALI_COORDINATES
}

static RESTAURANTS: Lazy<Vec<Restaurant>> = Lazy::new(|| {
    vec![
        restaurant(
            "r1",
            "Warung Babi Guling Ibu Oka",
            "Balinese",
            4.8,
            PriceLevel::Cheap,
            &["iconic", "non-veg", "authentic"],
        ),
        restaurant(
            "r2",
            "Bebek Bengil (Dirty Duck Diner)",
            "Indonesian",
            4.6,
            PriceLevel::Moderate,
            &["kid-friendly", "family", "iconic", "scenic"],
        ),
        restaurant(
            "r3",
            "Plant Bistro",
            "Vegan",
            4.9,
            PriceLevel::Moderate,
            &["vegetarian", "vegan", "healthy", "couple"],
        ),
        restaurant(
            "r4",
            "Potato Head Beach Club",
            "International",
            4.7,
            PriceLevel::Expensive,
            &["friends", "party", "beach", "alcohol"],
        ),
        restaurant(
            "r5",
            "Locavore",
            "Modern European",
            4.9,
            PriceLevel::Expensive,
            &["fine-dining", "romantic", "couple", "iconic"],
        ),
        restaurant(
            "r6",
            "Naughty Nuri's Warung",
            "BBQ",
            4.7,
            PriceLevel::Moderate,
            &["friends", "meat-lover", "lively"],
        ),
    ]
});

pub fn restaurants() -> &'static [Restaurant] {
    &RESTAURANTS
}

fn restaurant(
    id: &str,
    name: &str,
    cuisine: &str,
    rating: f32,
    price_level: PriceLevel,
    tags: &[&str],
) -> Restaurant {
    Restaurant {
        id: id.to_string(),
        name: name.to_string(),
        cuisine: cuisine.to_string(),
        rating,
        price_level,
        tags: tags.iter().map(ToString::to_string).collect(),
        location_id: "bali".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_has_no_substring_pairs() {
        // First-match-in-order stays unambiguous only while this holds.
        for a in DESTINATIONS {
            for b in DESTINATIONS {
                if a != b {
                    assert!(!a.contains(b), "{a} contains {b}");
                }
            }
        }
    }

    #[test]
    fn coordinate_table_resolves_known_places() {
        assert!(default_coordinates().resolve("Uluwatu Temple").is_some());
        assert!(default_coordinates().resolve("Atlantis").is_none());
    }
}
