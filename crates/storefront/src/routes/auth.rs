//! Authentication route handlers.
//!
//! Login exchanges credentials with the backend for a token and role, then
//! writes the four session keys. Logout removes them. Both notify the
//! visitor's other tabs through the session-change channel.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use carrito_core::{Email, Password, UserId, Username};

use crate::api::types::{LoginRequest, RegisterRequest};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::SessionContext;
use crate::session::{
    self, SessionUser,
    events::{ChangeKind, SessionChange},
};
use crate::state::AppState;
use crate::views::Chrome;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub registered: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub chrome: Chrome,
    pub username: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub chrome: Chrome,
    pub username: String,
    pub email: String,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(ctx))]
pub async fn login_page(
    ctx: SessionContext,
    Query(query): Query<MessageQuery>,
) -> Result<LoginTemplate> {
    Ok(LoginTemplate {
        chrome: ctx.chrome().await?,
        username: String::new(),
        error: None,
        success: query
            .registered
            .map(|_| "Account created, you can log in now".to_string()),
    })
}

/// Handle login form submission.
#[instrument(skip(state, ctx))]
pub async fn login(
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return Ok(LoginTemplate {
            chrome: ctx.chrome().await?,
            username: username.to_string(),
            error: Some("Username and password are required".to_string()),
            success: None,
        }
        .into_response());
    }

    let response = match state
        .backend()
        .login(&LoginRequest {
            username,
            password: &form.password,
        })
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return Ok(LoginTemplate {
                chrome: ctx.chrome().await?,
                username: username.to_string(),
                error: Some(e.user_message()),
                success: None,
            }
            .into_response());
        }
    };

    let user = SessionUser {
        role: response.role(),
        username: response.username,
        token: response.token,
        user_id: UserId::new(response.user_id),
    };
    session::set_user(&ctx.session, &user).await?;

    set_sentry_user(&user.user_id, &user.username);
    state.events().publish(SessionChange {
        channel: session::channel_id(&ctx.session).await?,
        kind: ChangeKind::LoggedIn,
        username: Some(user.username.clone()),
    });
    tracing::info!(username = %user.username, role = %user.role, "User logged in");

    Ok(Redirect::to("/").into_response())
}

/// Handle logout.
///
/// All four session keys are removed together; the cart is kept.
#[instrument(skip(state, ctx))]
pub async fn logout(State(state): State<AppState>, ctx: SessionContext) -> Result<Redirect> {
    session::clear_user(&ctx.session).await?;
    clear_sentry_user();

    state.events().publish(SessionChange {
        channel: session::channel_id(&ctx.session).await?,
        kind: ChangeKind::LoggedOut,
        username: None,
    });
    if let Some(user) = &ctx.user {
        tracing::info!(username = %user.username, "User logged out");
    }

    Ok(Redirect::to("/"))
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(ctx))]
pub async fn register_page(ctx: SessionContext) -> Result<RegisterTemplate> {
    Ok(RegisterTemplate {
        chrome: ctx.chrome().await?,
        username: String::new(),
        email: String::new(),
        error: None,
    })
}

/// Handle registration form submission.
///
/// Fields are checked locally first so obvious mistakes never reach the
/// backend; backend rejections (e.g. a taken username) are shown inline.
#[instrument(skip(state, ctx))]
pub async fn register(
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let validated = Username::parse(&form.username).and_then(|username| {
        let email = Email::parse(&form.email)?;
        let password = Password::new_checked(&form.password, &form.password_confirm)?;
        Ok((username, email, password))
    });

    let error = match validated {
        Ok((username, email, password)) => {
            let request = RegisterRequest {
                username: username.as_str(),
                email: email.as_str(),
                password: password.expose(),
            };
            match state.backend().register(&request).await {
                Ok(()) => {
                    tracing::info!(username = %username, "Account registered");
                    return Ok(Redirect::to("/login?registered=1").into_response());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Registration rejected");
                    e.user_message()
                }
            }
        }
        Err(e) => e.to_string(),
    };

    Ok(RegisterTemplate {
        chrome: ctx.chrome().await?,
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        error: Some(error),
    }
    .into_response())
}
