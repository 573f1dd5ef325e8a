//! Session extractors and route guards.
//!
//! - [`SessionContext`]: the visitor's session plus the logged-in user, if any
//! - [`RequireUser`]: redirects anonymous visitors to `/login`
//! - [`RequireAdmin`]: renders an inline access-denied page (403) for anyone
//!   whose session role is not admin, including anonymous visitors
//!
//! Guards only decide what this server renders. The backend still checks
//! the bearer token on every call.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use carrito_core::Role;

use crate::filters;
use crate::session::{self, SessionError, SessionUser};
use crate::views::Chrome;

/// Per-request view of the visitor's session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(ctx: SessionContext) -> impl IntoResponse {
///     match ctx.user {
///         Some(user) => format!("Welcome, {}", user.username),
///         None => "Welcome, guest".to_string(),
///     }
/// }
/// ```
#[derive(Clone)]
pub struct SessionContext {
    pub session: Session,
    pub user: Option<SessionUser>,
    path: String,
}

impl SessionContext {
    /// Header and flyout data for the current page.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be read from the session.
    pub async fn chrome(&self) -> Result<Chrome, SessionError> {
        let cart = session::load_cart(&self.session).await?;
        Ok(Chrome::new(self.user.as_ref(), &cart, &self.path))
    }

    /// Read the user back from the session after it was changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn reload_user(&mut self) -> Result<(), SessionError> {
        self.user = session::current_user(&self.session).await?;
        Ok(())
    }

    /// Whether the session holds an admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.role.is_admin())
    }
}

/// Error returned when the session itself is unusable.
pub enum SessionRejection {
    /// The session layer is not installed on this route.
    MissingLayer,
    /// The session store failed.
    Store(SessionError),
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingLayer => {
                tracing::error!("Session extractor used without session layer");
            }
            Self::Store(e) => {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Session store error");
            }
        }
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(SessionRejection::MissingLayer)?;

        let user = session::current_user(&session)
            .await
            .map_err(SessionRejection::Store)?;

        Ok(Self {
            session,
            user,
            path: parts.uri.path().to_string(),
        })
    }
}

// =============================================================================
// RequireUser
// =============================================================================

/// Extractor that requires a logged-in user.
pub struct RequireUser {
    pub ctx: SessionContext,
    pub user: SessionUser,
}

/// Error returned when a logged-in user is required.
pub enum UserRejection {
    RedirectToLogin,
    Session(SessionRejection),
}

impl IntoResponse for UserRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Session(rejection) => rejection.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = UserRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = SessionContext::from_request_parts(parts, state)
            .await
            .map_err(UserRejection::Session)?;
        let user = ctx.user.clone().ok_or(UserRejection::RedirectToLogin)?;
        Ok(Self { ctx, user })
    }
}

// =============================================================================
// RequireAdmin
// =============================================================================

/// Extractor that requires the admin role.
pub struct RequireAdmin {
    pub ctx: SessionContext,
    pub user: SessionUser,
}

/// Inline access-denied page.
#[derive(Template, WebTemplate)]
#[template(path = "access_denied.html")]
pub struct AccessDeniedTemplate {
    pub chrome: Chrome,
}

/// Error returned when the admin role is required.
pub enum AdminRejection {
    /// Rendered in place, with a 403 status and no redirect.
    AccessDenied(Box<Chrome>),
    Session(SessionRejection),
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::AccessDenied(chrome) => (
                StatusCode::FORBIDDEN,
                AccessDeniedTemplate { chrome: *chrome },
            )
                .into_response(),
            Self::Session(rejection) => rejection.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = SessionContext::from_request_parts(parts, state)
            .await
            .map_err(AdminRejection::Session)?;

        let admin = match &ctx.user {
            Some(user) => match user.role {
                Role::Admin => Some(user.clone()),
                Role::Customer => None,
            },
            None => None,
        };

        match admin {
            Some(user) => Ok(Self { ctx, user }),
            None => {
                tracing::warn!(
                    path = %parts.uri.path(),
                    username = ctx.user.as_ref().map(|u| u.username.as_str()),
                    "Access denied to admin screen"
                );
                let chrome = ctx
                    .chrome()
                    .await
                    .map_err(|e| AdminRejection::Session(SessionRejection::Store(e)))?;
                Err(AdminRejection::AccessDenied(Box::new(chrome)))
            }
        }
    }
}
