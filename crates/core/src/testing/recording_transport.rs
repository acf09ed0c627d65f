//! Transport that records delivered events.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::hub::{ProgressEvent, Transport, TransportError};

#[derive(Debug, Default)]
struct State {
    events: Vec<ProgressEvent>,
    failing: bool,
    /// Successful sends left before the transport starts failing.
    remaining: Option<usize>,
}

/// In-memory [`Transport`] for assertions.
///
/// Can be switched into a failing mode to simulate a dropped connection,
/// either immediately or after a number of successful sends.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    state: Mutex<State>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered so far, in order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Make every following send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        let mut state = self.state.lock().unwrap();
        state.failing = failing;
        state.remaining = None;
    }

    /// Accept `n` more sends, then fail.
    pub fn fail_after(&self, n: usize) {
        self.state.lock().unwrap().remaining = Some(n);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, text: String) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(TransportError::Closed);
        }
        if let Some(remaining) = state.remaining {
            if remaining == 0 {
                state.failing = true;
                return Err(TransportError::Closed);
            }
            state.remaining = Some(remaining - 1);
        }
        let event = serde_json::from_str(&text)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        state.events.push(event);
        Ok(())
    }
}
