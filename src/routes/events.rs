use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use serde::Deserialize;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use utoipa::ToSchema;

use crate::{
    events::Collection,
    middleware::auth::AuthUser,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct EventsQuery {
    /// Restrict the stream to one collection; both when absent.
    pub collection: Option<Collection>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(change_stream))
}

/// Server-sent change notifications. Clients hold one stream open and patch
/// or refetch the affected record instead of polling whole collections.
#[utoipa::path(
    get,
    path = "/api/events",
    params(("collection" = Option<String>, Query, description = "orders or products")),
    responses(
        (status = 200, description = "SSE stream of change events", content_type = "text/event-stream"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Events"
)]
pub async fn change_stream(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.events.subscribe();

    let stream = BroadcastStream::new(receiver).filter_map(move |result| {
        // Lagged receivers drop the missed events and continue.
        let event = result.ok()?;
        if let Some(wanted) = query.collection {
            if event.collection != wanted {
                return None;
            }
        }
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event("change").data(data)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
