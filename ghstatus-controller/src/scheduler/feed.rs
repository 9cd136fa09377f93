//! Watch feed
//!
//! Turns a stream of JSON documents into watch events. Three shapes are
//! accepted, matching what `kubectl get pipelineruns -w -o json` prints:
//! - watch events `{"type": "MODIFIED", "object": {...}}` (`--output-watch-events`)
//! - lists `{"kind": "PipelineRunList", "items": [...]}`
//! - bare pipeline-run objects, treated as applied

use anyhow::Result;
use ghstatus_core::domain::pipeline_run::PipelineRun;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A change observed on the watch feed
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// The run was created or updated
    Applied(PipelineRun),
    /// The run was deleted; carries its last known state
    Deleted(PipelineRun),
}

impl WatchEvent {
    pub fn run(&self) -> &PipelineRun {
        match self {
            WatchEvent::Applied(run) | WatchEvent::Deleted(run) => run,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedDocument {
    Event {
        #[serde(rename = "type")]
        event_type: String,
        object: Value,
    },
    List {
        items: Vec<PipelineRun>,
    },
    Object(PipelineRun),
}

/// Decode one JSON document into zero or more events
pub fn decode(document: Value) -> Result<Vec<WatchEvent>> {
    let events = match serde_json::from_value::<FeedDocument>(document)? {
        FeedDocument::Event { event_type, object } => match event_type.as_str() {
            "ADDED" | "MODIFIED" => vec![WatchEvent::Applied(serde_json::from_value(object)?)],
            "DELETED" => vec![WatchEvent::Deleted(serde_json::from_value(object)?)],
            other => {
                debug!("Ignoring watch event of type {}", other);
                Vec::new()
            }
        },
        FeedDocument::List { items } => items.into_iter().map(WatchEvent::Applied).collect(),
        FeedDocument::Object(run) => vec![WatchEvent::Applied(run)],
    };
    Ok(events)
}

/// Reads `reader` to the end, forwarding decoded events to `events`
///
/// Blocking; run it on a blocking thread. Documents that do not decode are
/// logged and skipped. Returns when the input ends or the receiver is gone.
pub fn pump<R: Read>(reader: R, events: mpsc::Sender<WatchEvent>) -> Result<()> {
    let documents = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();

    for document in documents {
        let document = document?;
        let decoded = match decode(document) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Skipping undecodable feed document: {}", e);
                continue;
            }
        };

        for event in decoded {
            if events.blocking_send(event).is_err() {
                debug!("Event receiver closed, stopping feed");
                return Ok(());
            }
        }
    }

    Ok(())
}
