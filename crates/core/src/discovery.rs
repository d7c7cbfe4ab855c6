//! Group-type inference and restaurant shortlisting for the local-discovery
//! panel.

use crate::models::{GroupType, Preference, PriceLevel, Restaurant};

/// How many restaurants the shortlist returns.
pub const SHORTLIST_LEN: usize = 3;

/// Infers the travel-party type when the query did not state one. Explicit
/// cue words win; otherwise the head count decides.
pub fn infer_group_type(people: u32, text: &str) -> GroupType {
    let lower = text.to_lowercase();

    if lower.contains("family") || (3..=6).contains(&people) {
        GroupType::Family
    } else if lower.contains("friends") || people > 6 {
        GroupType::Friends
    } else if lower.contains("couple") || people == 2 {
        GroupType::Couple
    } else {
        GroupType::Solo
    }
}

/// Filters the catalog down to a shortlist for the party type, then applies
/// dietary preferences. When filtering leaves fewer than [`SHORTLIST_LEN`]
/// options the constraints relax: filtered picks stay on top and the list is
/// back-filled from the rest of the catalog.
pub fn filter_restaurants(
    group_type: GroupType,
    preferences: &[Preference],
    catalog: &[Restaurant],
) -> Vec<Restaurant> {
    let mut filtered: Vec<Restaurant> = catalog
        .iter()
        .filter(|r| matches_group(r, group_type))
        .cloned()
        .collect();

    if preferences.contains(&Preference::Vegetarian) {
        filtered.retain(|r| r.has_tag("vegetarian") || r.has_tag("vegan"));
    }

    if filtered.len() < SHORTLIST_LEN {
        let missing = SHORTLIST_LEN - filtered.len();
        let backfill = catalog
            .iter()
            .filter(|r| !filtered.iter().any(|kept| kept.id == r.id))
            .take(missing)
            .cloned()
            .collect::<Vec<_>>();
        filtered.extend(backfill);
        return filtered;
    }

    filtered.truncate(SHORTLIST_LEN);
    filtered
}

fn matches_group(restaurant: &Restaurant, group_type: GroupType) -> bool {
    match group_type {
        GroupType::Family => {
            (restaurant.has_tag("kid-friendly") || restaurant.has_tag("family"))
                && !restaurant.has_tag("party")
        }
        GroupType::Friends => {
            restaurant.has_tag("friends")
                || restaurant.has_tag("lively")
                || restaurant.price_level == PriceLevel::Cheap
        }
        GroupType::Couple => {
            restaurant.has_tag("romantic")
                || restaurant.has_tag("scenic")
                || restaurant.price_level == PriceLevel::Expensive
        }
        GroupType::Solo => true,
    }
}

pub fn personalized_tip(group_type: GroupType) -> &'static str {
    match group_type {
        GroupType::Family => {
            "Family tip: we've prioritized places with kids menus and spacious seating."
        }
        GroupType::Friends => {
            "Squad tip: these spots are great for sharing platters and have a lively vibe."
        }
        GroupType::Couple => {
            "Romantic pick: selected quiet, scenic spots perfect for a date night."
        }
        GroupType::Solo => {
            "Solo traveler: these places have great communal tables or bar seating to meet people."
        }
    }
}
