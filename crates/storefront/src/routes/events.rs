//! Session-change stream.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use futures::{Stream, StreamExt};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::SessionContext;
use crate::session::{self, events::SessionChange};
use crate::state::AppState;

/// SSE event name the page script listens for.
pub const EVENT_NAME: &str = "session";

fn to_event(change: &SessionChange) -> Event {
    let json = serde_json::to_string(change)
        .unwrap_or_else(|_| r#"{"kind":"updated","username":null}"#.to_string());
    Event::default().event(EVENT_NAME).data(json)
}

/// Stream changes to this visitor's session.
///
/// GET /session/events
///
/// Every tab of the visitor holds one of these open. Changes made in any
/// tab arrive in all of them, including the tab that made the change.
#[instrument(skip(state, ctx))]
pub async fn stream(
    State(state): State<AppState>,
    ctx: SessionContext,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let channel = session::channel_id(&ctx.session).await?;
    tracing::debug!(%channel, "Session event stream opened");

    let events = state
        .events()
        .subscribe(channel)
        .map(|change| Ok(to_event(&change)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::events::ChangeKind;
    use uuid::Uuid;

    #[test]
    fn test_change_serializes_without_channel() {
        let change = SessionChange {
            channel: Uuid::new_v4(),
            kind: ChangeKind::LoggedIn,
            username: Some("ana".to_string()),
        };
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"{"kind":"logged_in","username":"ana"}"#);
    }
}
