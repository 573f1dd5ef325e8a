//! Session-change notifications.
//!
//! Every open tab of a visitor shares one session. When one tab logs in,
//! logs out, edits the account or changes the cart, a [`SessionChange`] is
//! published here; the other tabs hold a `GET /session/events` stream and
//! re-sync their header when one arrives for their channel.

use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

/// Buffered changes per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    LoggedIn,
    LoggedOut,
    /// Account fields (username) changed.
    Updated,
    /// Cart contents changed.
    Cart,
}

/// One change to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionChange {
    /// Channel of the session that changed; never sent to the browser.
    #[serde(skip)]
    pub channel: Uuid,
    pub kind: ChangeKind,
    /// Username after the change, if logged in.
    pub username: Option<String>,
}

/// Broadcast hub for session changes.
#[derive(Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionChange>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish a change. Having no listeners is not an error.
    pub fn publish(&self, change: SessionChange) {
        let receivers = self.sender.send(change).unwrap_or(0);
        tracing::debug!(receivers, "Published session change");
    }

    /// Changes for one channel, in publish order.
    ///
    /// A subscriber that falls behind skips the missed changes and keeps
    /// going; a header re-sync only needs the latest one.
    pub fn subscribe(
        &self,
        channel: Uuid,
    ) -> impl Stream<Item = SessionChange> + Send + 'static + use<> {
        let mut receiver = self.sender.subscribe();
        async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(change) if change.channel == channel => yield change,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Session change subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::StreamExt;

    use super::*;

    fn change(channel: Uuid, kind: ChangeKind) -> SessionChange {
        SessionChange {
            channel,
            kind,
            username: None,
        }
    }

    #[tokio::test]
    async fn test_subscriber_only_sees_own_channel() {
        let events = SessionEvents::new();
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();

        let stream = events.subscribe(mine);
        futures::pin_mut!(stream);

        events.publish(change(other, ChangeKind::LoggedIn));
        events.publish(change(mine, ChangeKind::LoggedOut));

        let received = stream.next().await.unwrap();
        assert_eq!(received.kind, ChangeKind::LoggedOut);
        assert_eq!(received.channel, mine);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        SessionEvents::new().publish(change(Uuid::new_v4(), ChangeKind::Cart));
    }

    #[test]
    fn test_channel_is_not_serialized() {
        let json = serde_json::to_value(SessionChange {
            channel: Uuid::new_v4(),
            kind: ChangeKind::LoggedIn,
            username: Some("ana".to_string()),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "logged_in", "username": "ana"})
        );
    }
}
