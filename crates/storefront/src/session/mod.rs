//! Per-visitor session state.
//!
//! Everything a visitor accumulates lives in their server-side session:
//!
//! - the four authentication keys written at login (`username`, `token`,
//!   `role`, `userId`), always written and cleared together
//! - the cart and flyout flag
//! - payment details captured at checkout, and the last issued invoice
//! - a channel id used to route [`events::SessionChange`] notifications to
//!   the visitor's other open tabs
//!
//! Handlers load what they need, mutate it synchronously and write it
//! back; the session layer persists the record once with the response.

pub mod events;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;
use uuid::Uuid;

use carrito_core::{CartState, Invoice, OrderId, Role, UserId};

/// Session keys.
pub mod keys {
    /// Logged-in username.
    pub const USERNAME: &str = "username";
    /// Backend bearer token.
    pub const TOKEN: &str = "token";
    /// Role string (`admin` or anything else).
    pub const ROLE: &str = "role";
    /// Backend user id.
    pub const USER_ID: &str = "userId";
    /// Serialized [`carrito_core::CartState`].
    pub const CART: &str = "cart";
    /// Payment details from the invoice form.
    pub const PAYMENT_INFO: &str = "payment_info";
    /// Last invoice issued in this session.
    pub const LAST_INVOICE: &str = "last_invoice";
    /// Session-change channel id.
    pub const CHANNEL: &str = "channel";

    /// The keys written at login and removed at logout.
    pub const AUTH: [&str; 4] = [USERNAME, TOKEN, ROLE, USER_ID];
}

/// Errors reading or writing the session record.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),
}

/// Opaque payment details captured during checkout.
pub type PaymentInfo = BTreeMap<String, String>;

/// The last invoice issued in this session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedInvoice {
    pub invoice: Invoice,
    /// Backend order placed with it; `None` for anonymous checkouts.
    pub order_id: Option<OrderId>,
}

/// The authenticated user held in the session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub username: String,
    pub role: Role,
    pub token: String,
    pub user_id: UserId,
}

impl std::fmt::Debug for SessionUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionUser")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish()
    }
}

// =============================================================================
// Authentication Keys
// =============================================================================

/// Read the logged-in user.
///
/// Returns `None` unless username, token and user id are all present. A
/// missing or unrecognized role reads as [`Role::Customer`].
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn current_user(session: &Session) -> Result<Option<SessionUser>, SessionError> {
    let username: Option<String> = session.get(keys::USERNAME).await?;
    let token: Option<String> = session.get(keys::TOKEN).await?;
    let user_id: Option<String> = session.get(keys::USER_ID).await?;
    let role: Option<String> = session.get(keys::ROLE).await?;

    let (Some(username), Some(token), Some(user_id)) = (username, token, user_id) else {
        return Ok(None);
    };

    Ok(Some(SessionUser {
        username,
        role: role.as_deref().map_or(Role::Customer, Role::from),
        token,
        user_id: UserId::new(user_id),
    }))
}

/// Write all four authentication keys.
///
/// The session id is cycled first, so an id handed out before login is
/// worthless afterwards. Cart and channel carry over to the new id.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_user(session: &Session, user: &SessionUser) -> Result<(), SessionError> {
    session.cycle_id().await?;
    session.insert(keys::USERNAME, &user.username).await?;
    session.insert(keys::TOKEN, &user.token).await?;
    session.insert(keys::ROLE, user.role.as_str()).await?;
    session.insert(keys::USER_ID, user.user_id.as_str()).await?;
    Ok(())
}

/// Change the stored username, keeping the other keys.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_username(session: &Session, username: &str) -> Result<(), SessionError> {
    session.insert(keys::USERNAME, username).await?;
    Ok(())
}

/// Remove all four authentication keys.
///
/// The cart and the channel id survive so the visitor keeps their cart and
/// their other tabs keep listening.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_user(session: &Session) -> Result<(), SessionError> {
    for key in keys::AUTH {
        session.remove_value(key).await?;
    }
    Ok(())
}

// =============================================================================
// Cart
// =============================================================================

/// Load the visitor's cart, empty when none is stored.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<CartState, SessionError> {
    Ok(session
        .get::<CartState>(keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &CartState) -> Result<(), SessionError> {
    session.insert(keys::CART, cart).await?;
    Ok(())
}

// =============================================================================
// Checkout
// =============================================================================

/// Store the payment details from the invoice form.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_payment_info(session: &Session, info: &PaymentInfo) -> Result<(), SessionError> {
    session.insert(keys::PAYMENT_INFO, info).await?;
    Ok(())
}

/// Store the invoice issued at checkout, replacing the previous one.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_invoice(session: &Session, issued: &IssuedInvoice) -> Result<(), SessionError> {
    session.insert(keys::LAST_INVOICE, issued).await?;
    Ok(())
}

/// The last invoice issued in this session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn last_invoice(session: &Session) -> Result<Option<IssuedInvoice>, SessionError> {
    Ok(session.get(keys::LAST_INVOICE).await?)
}

// =============================================================================
// Change Channel
// =============================================================================

/// The session's change-channel id, created on first use.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn channel_id(session: &Session) -> Result<Uuid, SessionError> {
    if let Some(id) = session.get::<Uuid>(keys::CHANNEL).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4();
    session.insert(keys::CHANNEL, id).await?;
    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use carrito_core::{Price, Product, Quantity};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn admin() -> SessionUser {
        SessionUser {
            username: "ana".to_string(),
            role: Role::Admin,
            token: "tok-123".to_string(),
            user_id: UserId::new("u1"),
        }
    }

    #[tokio::test]
    async fn test_user_round_trip_uses_four_keys() {
        let session = session();
        set_user(&session, &admin()).await.unwrap();

        for key in keys::AUTH {
            assert!(session.get_value(key).await.unwrap().is_some(), "{key}");
        }
        assert_eq!(
            session.get::<String>(keys::ROLE).await.unwrap().as_deref(),
            Some("admin")
        );
        assert_eq!(current_user(&session).await.unwrap(), Some(admin()));
    }

    #[tokio::test]
    async fn test_clear_user_removes_all_auth_keys_and_keeps_cart() {
        let session = session();
        set_user(&session, &admin()).await.unwrap();

        let mut cart = CartState::default();
        cart.add_to_cart(
            Product::new("p1", "Widget", Price::from_cents(999), "w.png"),
            Quantity::ONE,
        );
        save_cart(&session, &cart).await.unwrap();

        clear_user(&session).await.unwrap();

        for key in keys::AUTH {
            assert!(session.get_value(key).await.unwrap().is_none(), "{key}");
        }
        assert_eq!(current_user(&session).await.unwrap(), None);
        assert_eq!(load_cart(&session).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_partial_keys_are_anonymous() {
        let session = session();
        session.insert(keys::USERNAME, "ana").await.unwrap();
        session.insert(keys::ROLE, "admin").await.unwrap();

        assert_eq!(current_user(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_role_reads_as_customer() {
        let session = session();
        set_user(&session, &admin()).await.unwrap();
        session.insert(keys::ROLE, "superuser").await.unwrap();

        let user = current_user(&session).await.unwrap().unwrap();
        assert_eq!(user.role, Role::Customer);
    }

    #[tokio::test]
    async fn test_empty_session_has_empty_cart() {
        let cart = load_cart(&session()).await.unwrap();
        assert!(cart.cart().is_empty());
        assert!(!cart.flyout_visible());
    }

    #[tokio::test]
    async fn test_channel_id_is_stable() {
        let session = session();
        let first = channel_id(&session).await.unwrap();
        assert_eq!(channel_id(&session).await.unwrap(), first);
    }

    #[test]
    fn test_session_user_debug_redacts_token() {
        assert!(!format!("{:?}", admin()).contains("tok-123"));
    }
}
