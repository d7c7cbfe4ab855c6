pub mod capture;
pub mod catalog;
pub mod discovery;
pub mod models;
pub mod pricing;
pub mod proximity;
pub mod query;

pub use discovery::{filter_restaurants, infer_group_type, personalized_tip};
pub use models::*;
pub use pricing::{compute_quote, DEFAULT_TAX_RATE};
pub use proximity::{
    commute_for_group, group_by_proximity, haversine_km, CommutePolicy, CoordinateLookup,
    DEFAULT_PROXIMITY_RADIUS_KM,
};
pub use query::parse_voice_query;
