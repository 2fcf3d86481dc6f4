//! Server-Sent Events support
//!
//! A stream opens with an `init` snapshot and then relays session events.

use crate::runtime::{SessionEvent, SessionSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert a session subscription to an SSE stream
pub fn sse_stream(
    snapshot: SessionSnapshot,
    broadcast_rx: broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(to_sse(
            "init",
            json!({ "type": "init", "snapshot": snapshot }),
        ))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(session_event_to_sse(event))),
        Err(_) => None, // Lagged; the client can refetch the snapshot
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn session_event_to_sse(event: SessionEvent) -> Event {
    match event {
        SessionEvent::Entry { entry } => to_sse("entry", json!({ "type": "entry", "entry": entry })),
        SessionEvent::StepChange {
            step,
            affordances,
            pending,
        } => to_sse(
            "step",
            json!({
                "type": "step",
                "step": step,
                "affordances": affordances,
                "pending": pending
            }),
        ),
        SessionEvent::LanguageChange { snapshot } => to_sse(
            "language",
            json!({ "type": "language", "snapshot": snapshot }),
        ),
    }
}

fn to_sse(event_type: &str, data: serde_json::Value) -> Event {
    Event::default().event(event_type).data(data.to_string())
}

