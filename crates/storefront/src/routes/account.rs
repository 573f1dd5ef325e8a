//! Account route handlers (login required).

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State};
use serde::Deserialize;
use tracing::instrument;

use carrito_core::{AccountError, Email, Order, Password, Username};

use crate::api::types::UpdateUserRequest;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireUser;
use crate::session::{
    self,
    events::{ChangeKind, SessionChange},
};
use crate::state::AppState;
use crate::views::Chrome;

// =============================================================================
// Order Views
// =============================================================================

/// Order line display data.
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
}

/// Order display data, shared with the admin screen.
pub struct OrderView {
    pub id: String,
    pub customer: String,
    pub date: String,
    pub status: String,
    pub status_label: String,
    pub total: String,
    pub items: Vec<OrderItemView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            customer: order
                .user_id
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            date: order
                .created_at
                .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string()),
            status: order.status.as_str().to_string(),
            status_label: order.status.label().to_string(),
            total: order.total.to_string(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.to_string(),
                })
                .collect(),
        }
    }
}

/// My orders template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub chrome: Chrome,
    pub orders: Vec<OrderView>,
    pub error: Option<String>,
}

/// List the logged-in user's orders.
#[instrument(skip(state, auth), fields(user_id = %auth.user.user_id))]
pub async fn orders(State(state): State<AppState>, auth: RequireUser) -> Result<OrdersTemplate> {
    let (orders, error) = match state
        .backend()
        .orders_for_user(&auth.user.token, &auth.user.user_id)
        .await
    {
        Ok(orders) => (orders.iter().map(OrderView::from).collect(), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders");
            (Vec::new(), Some(e.user_message()))
        }
    };

    Ok(OrdersTemplate {
        chrome: auth.ctx.chrome().await?,
        orders,
        error,
    })
}

// =============================================================================
// Update User
// =============================================================================

/// Update user form data. Blank fields are left unchanged.
#[derive(Deserialize, Default)]
pub struct UpdateUserForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl std::fmt::Debug for UpdateUserForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUserForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Validated changes.
struct UserChanges {
    username: Option<Username>,
    email: Option<Email>,
    password: Option<Password>,
}

impl UpdateUserForm {
    fn changes(&self) -> std::result::Result<UserChanges, AccountError> {
        let username = non_blank(&self.username).map(Username::parse).transpose()?;
        let email = non_blank(&self.email).map(Email::parse).transpose()?;
        let password = if self.password.is_empty() && self.password_confirm.is_empty() {
            None
        } else {
            Some(Password::new_checked(&self.password, &self.password_confirm)?)
        };
        Ok(UserChanges {
            username,
            email,
            password,
        })
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Update user template.
#[derive(Template, WebTemplate)]
#[template(path = "account/update_user.html")]
pub struct UpdateUserTemplate {
    pub chrome: Chrome,
    pub username: String,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the account form.
#[instrument(skip(auth))]
pub async fn update_user_page(auth: RequireUser) -> Result<UpdateUserTemplate> {
    Ok(UpdateUserTemplate {
        chrome: auth.ctx.chrome().await?,
        username: auth.user.username.clone(),
        email: String::new(),
        error: None,
        success: None,
    })
}

/// Apply account changes.
///
/// A changed username is written back to the session and the visitor's
/// other tabs are told to refresh their header.
#[instrument(skip(state, auth), fields(user_id = %auth.user.user_id))]
pub async fn update_user(
    State(state): State<AppState>,
    auth: RequireUser,
    Form(form): Form<UpdateUserForm>,
) -> Result<UpdateUserTemplate> {
    let outcome = match form.changes() {
        Ok(changes) => {
            let request = UpdateUserRequest {
                username: changes.username.as_ref().map(Username::as_str),
                email: changes.email.as_ref().map(Email::as_str),
                password: changes.password.as_ref().map(Password::expose),
            };
            if request.is_empty() {
                Err("Nothing to update".to_string())
            } else {
                match state
                    .backend()
                    .update_user(&auth.user.token, &auth.user.user_id, &request)
                    .await
                {
                    Ok(()) => Ok(changes.username.map(|u| u.as_str().to_string())),
                    Err(e) => {
                        tracing::warn!(error = %e, "Account update rejected");
                        Err(e.user_message())
                    }
                }
            }
        }
        Err(e) => Err(e.to_string()),
    };

    let mut username = auth.user.username.clone();
    let (error, success) = match outcome {
        Ok(new_username) => {
            if let Some(new_username) = new_username {
                session::set_username(&auth.ctx.session, &new_username).await?;
                username = new_username;
            }
            state.events().publish(SessionChange {
                channel: session::channel_id(&auth.ctx.session).await?,
                kind: ChangeKind::Updated,
                username: Some(username.clone()),
            });
            tracing::info!("Account updated");
            (None, Some("Account updated".to_string()))
        }
        Err(message) => (Some(message), None),
    };

    // Re-read so the header shows the new username.
    let mut ctx = auth.ctx;
    ctx.reload_user().await?;

    Ok(UpdateUserTemplate {
        chrome: ctx.chrome().await?,
        username,
        email: form.email.trim().to_string(),
        error,
        success,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_unchanged() {
        let changes = UpdateUserForm::default().changes().unwrap();
        assert!(changes.username.is_none());
        assert!(changes.email.is_none());
        assert!(changes.password.is_none());
    }

    #[test]
    fn test_password_needs_matching_confirmation() {
        let form = UpdateUserForm {
            password: "longenough1".to_string(),
            password_confirm: "different1".to_string(),
            ..UpdateUserForm::default()
        };
        assert!(matches!(form.changes(), Err(AccountError::PasswordMismatch)));
    }

    #[test]
    fn test_email_is_validated() {
        let form = UpdateUserForm {
            email: "not-an-email".to_string(),
            ..UpdateUserForm::default()
        };
        assert!(matches!(form.changes(), Err(AccountError::InvalidEmail)));
    }
}
