#![forbid(unsafe_code)]
// The in-process counterpart of the browser fetch logic; the server binary
// itself never dispatches.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use log::error;
use serde_json::Value;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Shown when a failure response carries no error field, and for transport
// errors that never produced a response.
const GENERIC_FAILURE_MSG : &str = "Request failed";

// ***************************************************************************
//                              Dispatcher Types
// ***************************************************************************
// ---------------------------------------------------------------------------
// BackendId:
// ---------------------------------------------------------------------------
/** The user-selected backend.  Both backends implement the same contract;
 * the selection changes only which origin receives the request.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendId {
    Primary,
    Peer,
}

// ---------------------------------------------------------------------------
// BackendTargets:
// ---------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct BackendTargets {
    pub primary_url: String,
    pub peer_url: String,
}

impl BackendTargets {
    pub fn new(primary_url: &str, peer_url: &str) -> Self {
        Self {
            primary_url: primary_url.trim_end_matches('/').to_string(),
            peer_url: peer_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, backend: BackendId) -> &str {
        match backend {
            BackendId::Primary => &self.primary_url,
            BackendId::Peer => &self.peer_url,
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchOutcome:
// ---------------------------------------------------------------------------
/** The normalized result a UI renders: either a display string composed
 * from the greeting and its backend tag, or an error message.
 */
#[derive(Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success { display: String },
    Failed { error: String },
}

// ***************************************************************************
//                                Dispatcher
// ***************************************************************************
// ---------------------------------------------------------------------------
// Dispatcher:
// ---------------------------------------------------------------------------
/** Sends greeting requests to the selected backend and tracks a single
 * loading flag.  The flag exists so a caller can disable its submit
 * control while a request is in flight; it does not cancel, queue, or
 * otherwise prevent concurrent attempts.
 */
pub struct Dispatcher {
    http: reqwest::Client,
    targets: BackendTargets,
    in_flight: AtomicBool,
}

impl Dispatcher {
    pub fn new(targets: BackendTargets) -> Self {
        Self {
            http: reqwest::Client::new(),
            targets,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /** POST the name to the selected backend and normalize the response. */
    pub async fn submit_greeting(&self, backend: BackendId, name: &str) -> DispatchOutcome {
        self.in_flight.store(true, Ordering::SeqCst);
        let outcome = self.request_greeting(backend, name).await;
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn request_greeting(&self, backend: BackendId, name: &str) -> DispatchOutcome {
        let url = format!("{}/greeting", self.targets.url_for(backend));

        // Transport errors surface as an undifferentiated failure; there
        // is no retry.
        let resp = match self.http.post(&url)
            .json(&serde_json::json!({ "name": name }))
            .send().await {
                Ok(r) => r,
                Err(e) => {
                    error!("Greeting request to {} failed: {}", url, e);
                    return DispatchOutcome::Failed { error: GENERIC_FAILURE_MSG.to_string() };
                }
            };

        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);

        // Non-2xx: report the body's error field, else the generic message.
        if !status.is_success() {
            let msg = body.get("error")
                .and_then(Value::as_str)
                .unwrap_or(GENERIC_FAILURE_MSG);
            return DispatchOutcome::Failed { error: msg.to_string() };
        }

        // Compose the display string from the message and the backend tag.
        let message = body.get("message").and_then(Value::as_str).unwrap_or_default();
        let processed_on = body.get("processedOn").and_then(Value::as_str).unwrap_or("unknown");
        DispatchOutcome::Success { display: format!("{} (Processed on: {})", message, processed_on) }
    }
}
