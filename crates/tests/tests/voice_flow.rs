use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use voyage_core::capture::{ScriptedCapture, SpeechCapture, SpeechErrorCode, SpeechEvents};
use voyage_engine::PlannerEngine;
use voyage_observability::AppMetrics;
use voyage_store::{MemoryKv, PlannerState};

#[derive(Default)]
struct CollectingSink {
    transcripts: Mutex<Vec<(String, bool)>>,
    errors: Mutex<Vec<SpeechErrorCode>>,
}

impl SpeechEvents for CollectingSink {
    fn on_transcript(&self, transcript: &str, is_final: bool) {
        self.transcripts
            .lock()
            .push((transcript.to_string(), is_final));
    }

    fn on_error(&self, code: SpeechErrorCode) {
        self.errors.lock().push(code);
    }
}

#[tokio::test]
async fn scripted_capture_drives_the_search_pipeline() -> Result<()> {
    let state = PlannerState::load(Arc::new(MemoryKv::new())).await?;
    let engine = PlannerEngine::new(Arc::new(state), AppMetrics::shared());

    let capture = ScriptedCapture::new(vec![
        "plan a cheap".to_string(),
        "plan a cheap weekend getaway".to_string(),
    ]);
    let sink = Arc::new(CollectingSink::default());
    capture.start(sink.clone());

    assert!(sink.errors.lock().is_empty());

    let mut final_outcome = None;
    for (transcript, is_final) in sink.transcripts.lock().clone() {
        let outcome = engine.handle_transcript(&transcript, is_final).await?;
        if is_final {
            final_outcome = Some(outcome);
        }
    }

    let outcome = final_outcome.expect("script ends with a final transcript");
    assert_eq!(outcome.parsed.budget, Some(500));
    assert_eq!(outcome.parsed.duration_days, Some(3));

    // Only the final transcript lands in history.
    assert_eq!(engine.search_history().len(), 1);
    assert_eq!(
        engine.search_history()[0].query,
        "plan a cheap weekend getaway"
    );

    Ok(())
}
