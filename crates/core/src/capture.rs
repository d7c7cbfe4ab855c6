//! Capability interface over a speech-recognition backend. The parser never
//! talks to a platform API directly; capture backends push transcript events
//! into a sink and the caller decides what to do with them.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechErrorCode {
    NotSupported,
    PermissionDenied,
    NoSpeech,
    Network,
    Aborted,
}

/// Receives capture events. Interim transcripts arrive with
/// `is_final = false` and may be revised; a final transcript closes the
/// utterance.
pub trait SpeechEvents: Send + Sync {
    fn on_transcript(&self, transcript: &str, is_final: bool);
    fn on_error(&self, code: SpeechErrorCode);
}

pub trait SpeechCapture: Send + Sync {
    fn is_supported(&self) -> bool;
    fn start(&self, events: Arc<dyn SpeechEvents>);
    fn stop(&self);
}

/// Replays a canned utterance script: every line but the last is delivered
/// as an interim transcript. Stands in for a real recognizer in tests, the
/// CLI and demos.
pub struct ScriptedCapture {
    lines: Vec<String>,
    running: Mutex<bool>,
}

impl ScriptedCapture {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            running: Mutex::new(false),
        }
    }
}

impl SpeechCapture for ScriptedCapture {
    fn is_supported(&self) -> bool {
        true
    }

    fn start(&self, events: Arc<dyn SpeechEvents>) {
        *self.running.lock() = true;

        if self.lines.is_empty() {
            events.on_error(SpeechErrorCode::NoSpeech);
            *self.running.lock() = false;
            return;
        }

        let last = self.lines.len() - 1;
        for (idx, line) in self.lines.iter().enumerate() {
            if !*self.running.lock() {
                events.on_error(SpeechErrorCode::Aborted);
                return;
            }
            events.on_transcript(line, idx == last);
        }

        *self.running.lock() = false;
    }

    fn stop(&self) {
        *self.running.lock() = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        transcripts: Mutex<Vec<(String, bool)>>,
        errors: Mutex<Vec<SpeechErrorCode>>,
    }

    impl SpeechEvents for Recorder {
        fn on_transcript(&self, transcript: &str, is_final: bool) {
            self.transcripts
                .lock()
                .push((transcript.to_string(), is_final));
        }

        fn on_error(&self, code: SpeechErrorCode) {
            self.errors.lock().push(code);
        }
    }

    #[test]
    fn replays_script_with_final_marker_on_last_line() {
        let capture = ScriptedCapture::new(vec![
            "plan a trip".to_string(),
            "plan a trip to bali".to_string(),
        ]);
        let recorder = Arc::new(Recorder::default());

        capture.start(recorder.clone());

        let transcripts = recorder.transcripts.lock();
        assert_eq!(transcripts.len(), 2);
        assert_eq!(transcripts[0], ("plan a trip".to_string(), false));
        assert_eq!(transcripts[1], ("plan a trip to bali".to_string(), true));
        assert!(recorder.errors.lock().is_empty());
    }

    #[test]
    fn empty_script_reports_no_speech() {
        let capture = ScriptedCapture::new(Vec::new());
        let recorder = Arc::new(Recorder::default());

        capture.start(recorder.clone());

        assert_eq!(*recorder.errors.lock(), vec![SpeechErrorCode::NoSpeech]);
    }
}
