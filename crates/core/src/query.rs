use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::DESTINATIONS;
use crate::models::{ParsedTripQuery, Preference, QueryError};

/// Budget assigned when the utterance only carries a cheapness cue.
pub const DEFAULT_CHEAP_BUDGET: u64 = 500;

const WEEKEND_DAYS: u32 = 3;
const WEEK_DAYS: u32 = 7;

static BUDGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(dollars?|usd|\$|k|thousand)").expect("budget pattern"));
static DAYS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*days?").expect("days pattern"));
static WEEKS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*weeks?").expect("weeks pattern"));
static PEOPLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*(?:people|persons?|adults?|guests?)").expect("people pattern")
});

const PREFERENCE_CUES: &[(Preference, &[&str])] = &[
    // "veg" also covers vegetarian/vegan phrasing
    (Preference::Vegetarian, &["veg"]),
    (Preference::Beach, &["beach"]),
    (Preference::Mountain, &["mountain", "hiking"]),
    (Preference::City, &["city", "shopping"]),
    (Preference::Adventure, &["adventure"]),
    (Preference::Luxury, &["luxury", "5 star"]),
];

/// Extracts trip parameters from a transcript. Matching is case-insensitive
/// and each field populates independently; explicit numeric cues always win
/// over qualitative defaults. The only error is a digit run too large for the
/// target type, which surfaces instead of being swallowed.
pub fn parse_voice_query(transcript: &str) -> Result<ParsedTripQuery, QueryError> {
    let lower = transcript.to_lowercase();

    Ok(ParsedTripQuery {
        destination: extract_destination(&lower),
        budget: extract_budget(&lower)?,
        duration_days: extract_duration(&lower)?,
        people: extract_people(&lower)?,
        preferences: extract_preferences(&lower),
    })
}

fn extract_destination(lower: &str) -> Option<String> {
    DESTINATIONS
        .iter()
        .find(|place| lower.contains(*place))
        .map(ToString::to_string)
}

fn extract_budget(lower: &str) -> Result<Option<u64>, QueryError> {
    if let Some(caps) = BUDGET_RE.captures(lower) {
        let amount = parse_u64(&caps[1])?;
        // The captured scale token decides the multiplier, not a stray "k"
        // elsewhere in the transcript.
        let amount = match &caps[2] {
            "k" | "thousand" => amount
                .checked_mul(1000)
                .ok_or_else(|| QueryError::NumberOutOfRange(caps[1].to_string()))?,
            _ => amount,
        };
        return Ok(Some(amount));
    }

    if contains_any(lower, &["cheap", "budget"]) {
        return Ok(Some(DEFAULT_CHEAP_BUDGET));
    }

    Ok(None)
}

fn extract_duration(lower: &str) -> Result<Option<u32>, QueryError> {
    if let Some(caps) = DAYS_RE.captures(lower) {
        return Ok(Some(parse_u32(&caps[1])?));
    }

    if let Some(caps) = WEEKS_RE.captures(lower) {
        let weeks = parse_u32(&caps[1])?;
        let days = weeks
            .checked_mul(WEEK_DAYS)
            .ok_or_else(|| QueryError::NumberOutOfRange(caps[1].to_string()))?;
        return Ok(Some(days));
    }

    if lower.contains("weekend") {
        return Ok(Some(WEEKEND_DAYS));
    }
    if lower.contains("week") {
        return Ok(Some(WEEK_DAYS));
    }

    Ok(None)
}

fn extract_people(lower: &str) -> Result<Option<u32>, QueryError> {
    if let Some(caps) = PEOPLE_RE.captures(lower) {
        return Ok(Some(parse_u32(&caps[1])?));
    }

    let count = if contains_any(lower, &["couple", "honeymoon", "honey moon"]) {
        Some(2)
    } else if contains_any(lower, &["solo", "alone"]) {
        Some(1)
    } else if lower.contains("family") {
        Some(4)
    } else {
        None
    };

    Ok(count)
}

fn extract_preferences(lower: &str) -> Option<Vec<Preference>> {
    let matched = PREFERENCE_CUES
        .iter()
        .filter(|(_, cues)| contains_any(lower, cues))
        .map(|(preference, _)| *preference)
        .collect::<Vec<_>>();

    if matched.is_empty() {
        None
    } else {
        Some(matched)
    }
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}

fn parse_u64(digits: &str) -> Result<u64, QueryError> {
    digits
        .parse()
        .map_err(|_| QueryError::NumberOutOfRange(digits.to_string()))
}

fn parse_u32(digits: &str) -> Result<u32, QueryError> {
    digits
        .parse()
        .map_err(|_| QueryError::NumberOutOfRange(digits.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParsedTripQuery {
        parse_voice_query(text).expect("parse should succeed")
    }

    #[test]
    fn unrecognized_text_leaves_every_field_absent() {
        let parsed = parse("please recite the alphabet backwards");
        assert!(parsed.is_empty());
    }

    #[test]
    fn extracts_full_structured_query() {
        let parsed =
            parse("Plan a 5 day trip to Bali for 2 people with a budget of 2000 dollars");
        assert_eq!(parsed.destination.as_deref(), Some("bali"));
        assert_eq!(parsed.duration_days, Some(5));
        assert_eq!(parsed.people, Some(2));
        assert_eq!(parsed.budget, Some(2000));
        assert_eq!(parsed.preferences, None);
    }

    #[test]
    fn qualitative_cues_supply_defaults() {
        let parsed = parse("a cheap weekend getaway");
        assert_eq!(parsed.budget, Some(DEFAULT_CHEAP_BUDGET));
        assert_eq!(parsed.duration_days, Some(3));
        assert_eq!(parsed.destination, None);
        assert_eq!(parsed.people, None);
    }

    #[test]
    fn family_cue_defaults_people() {
        let parsed = parse("family trip to goa");
        assert_eq!(parsed.destination.as_deref(), Some("goa"));
        assert_eq!(parsed.people, Some(4));
    }

    #[test]
    fn scale_token_multiplies_budget() {
        assert_eq!(parse("somewhere sunny under 2k").budget, Some(2000));
        assert_eq!(parse("around 5 thousand total").budget, Some(5000));
        // A "k" elsewhere in the transcript must not scale a dollar amount.
        assert_eq!(
            parse("trip to tokyo for 800 dollars").budget,
            Some(800)
        );
    }

    #[test]
    fn explicit_day_count_beats_weekend_cue() {
        let parsed = parse("a 10 days weekend-ish escape");
        assert_eq!(parsed.duration_days, Some(10));
    }

    #[test]
    fn weeks_convert_to_days() {
        assert_eq!(parse("gone for 2 weeks").duration_days, Some(14));
        assert_eq!(parse("out for a week").duration_days, Some(7));
    }

    #[test]
    fn collects_all_matched_preferences() {
        let parsed = parse("luxury beach resort with vegetarian food");
        assert_eq!(
            parsed.preferences,
            Some(vec![
                Preference::Vegetarian,
                Preference::Beach,
                Preference::Luxury
            ])
        );
    }

    #[test]
    fn parsing_is_idempotent() {
        let text = "Plan a 5 day trip to Bali for 2 people with a budget of 2000 dollars";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn oversized_numbers_surface_as_errors() {
        let result = parse_voice_query("trip for 99999999999 people");
        assert!(matches!(result, Err(QueryError::NumberOutOfRange(_))));
    }
}
