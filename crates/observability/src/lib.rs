use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    searches_total: AtomicU64,
    voice_transcripts_total: AtomicU64,
    quotes_total: AtomicU64,
    groupings_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub searches_total: u64,
    pub voice_transcripts_total: u64,
    pub quotes_total: u64,
    pub groupings_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_search(&self) {
        self.searches_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_voice_transcript(&self) {
        self.voice_transcripts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_quote(&self) {
        self.quotes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_grouping(&self) {
        self.groupings_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            searches_total: self.searches_total.load(Ordering::Relaxed),
            voice_transcripts_total: self.voice_transcripts_total.load(Ordering::Relaxed),
            quotes_total: self.quotes_total.load(Ordering::Relaxed),
            groupings_total: self.groupings_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,voyage_api=info,voyage_engine=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
