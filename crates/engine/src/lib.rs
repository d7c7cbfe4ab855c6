use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use voyage_core::catalog;
use voyage_core::{
    commute_for_group, compute_quote, filter_restaurants, group_by_proximity, infer_group_type,
    parse_voice_query, personalized_tip, Activity, CommuteInfo, CommutePolicy, GroupType,
    ParsedTripQuery, PricingLineItem, Quote, Restaurant, TripDraft,
};
use voyage_observability::AppMetrics;
use voyage_store::{KvStore, PlannerState, SearchHistoryEntry};

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub search_id: String,
    pub query: String,
    pub parsed: ParsedTripQuery,
    pub group_type: GroupType,
    pub restaurants: Vec<Restaurant>,
    pub tip: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityGroup {
    pub activities: Vec<Activity>,
    pub commute: CommuteInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItineraryGroups {
    pub radius_km: f64,
    pub groups: Vec<ActivityGroup>,
}

/// Facade wiring the pure planners to the state container and metrics. One
/// instance serves the API and the CLI alike.
pub struct PlannerEngine<S: KvStore> {
    state: Arc<PlannerState<S>>,
    metrics: Arc<AppMetrics>,
    commute_policy: CommutePolicy,
}

impl<S: KvStore> PlannerEngine<S> {
    pub fn new(state: Arc<PlannerState<S>>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            state,
            metrics,
            commute_policy: CommutePolicy::default(),
        }
    }

    pub fn with_commute_policy(mut self, policy: CommutePolicy) -> Self {
        self.commute_policy = policy;
        self
    }

    #[instrument(skip(self, query))]
    pub async fn handle_search(&self, query: &str) -> Result<SearchOutcome> {
        self.metrics.inc_search();
        let outcome = self.run_search(query, true).await?;

        info!(
            search_id = %outcome.search_id,
            destination = outcome.parsed.destination.as_deref().unwrap_or("-"),
            group_type = ?outcome.group_type,
            "search handled"
        );

        Ok(outcome)
    }

    /// Voice path. Interim transcripts are parsed for live feedback but only
    /// a final transcript lands in the search history.
    #[instrument(skip(self, transcript))]
    pub async fn handle_transcript(
        &self,
        transcript: &str,
        is_final: bool,
    ) -> Result<SearchOutcome> {
        self.metrics.inc_voice_transcript();
        self.run_search(transcript, is_final).await
    }

    async fn run_search(&self, query: &str, record: bool) -> Result<SearchOutcome> {
        let started = Instant::now();
        self.metrics.inc_request();

        let parsed = parse_voice_query(query)?;
        let group_type = infer_group_type(parsed.people.unwrap_or(1), query);
        let preferences = parsed.preferences.clone().unwrap_or_default();
        let restaurants = filter_restaurants(group_type, &preferences, catalog::restaurants());

        if record {
            self.state.record_search(query).await?;
        }

        self.metrics.observe_latency(started.elapsed());

        Ok(SearchOutcome {
            search_id: Uuid::new_v4().to_string(),
            query: query.to_string(),
            parsed,
            group_type,
            restaurants,
            tip: personalized_tip(group_type).to_string(),
        })
    }

    pub fn build_quote(
        &self,
        items: &[PricingLineItem],
        margin_percent: f64,
        tax_rate: f64,
    ) -> Result<Quote> {
        self.metrics.inc_request();
        self.metrics.inc_quote();
        let quote = compute_quote(items, margin_percent, tax_rate)?;
        Ok(quote)
    }

    pub fn group_itinerary(&self, activities: &[Activity], radius_km: f64) -> ItineraryGroups {
        self.metrics.inc_request();
        self.metrics.inc_grouping();

        let groups = group_by_proximity(activities, radius_km, catalog::default_coordinates())
            .into_iter()
            .map(|members| ActivityGroup {
                commute: commute_for_group(members.len(), &self.commute_policy),
                activities: members,
            })
            .collect();

        ItineraryGroups { radius_km, groups }
    }

    pub fn favorites(&self) -> Vec<String> {
        self.state.favorites()
    }

    pub async fn toggle_favorite(&self, id: &str) -> Result<bool> {
        self.state.toggle_favorite(id).await
    }

    pub fn search_history(&self) -> Vec<SearchHistoryEntry> {
        self.state.search_history()
    }

    pub fn trip_draft(&self) -> TripDraft {
        self.state.trip_draft()
    }

    pub async fn update_trip(&self, apply: impl FnOnce(&mut TripDraft)) -> Result<TripDraft> {
        self.state.update_trip(apply).await
    }

    pub fn budget_optimization(&self) -> bool {
        self.state.budget_optimization()
    }

    pub async fn set_budget_optimization(&self, enabled: bool) -> Result<()> {
        self.state.set_budget_optimization(enabled).await
    }
}
