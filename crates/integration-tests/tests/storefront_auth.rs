//! Login, logout, account and admin access against a stub backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use carrito_integration_tests::{TestContext, location, session_cookie};
use reqwest::{StatusCode, header::CONTENT_TYPE};

// =============================================================================
// Login & Logout
// =============================================================================

#[tokio::test]
async fn test_login_shows_user_and_role_in_header() {
    let ctx = TestContext::new().await;
    ctx.login("ana", "ana12345").await;

    let (_, body) = ctx.get("/").await;
    assert!(body.contains("ana (customer)"));
    assert!(body.contains("Log out"));
    assert!(!body.contains("/manage-products"));
}

#[tokio::test]
async fn test_wrong_password_rerenders_login() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_form("/login", &[("username", "ana"), ("password", "wrong")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid credentials"));
    assert!(body.contains(r#"value="ana""#));

    let (_, body) = ctx.get("/").await;
    assert!(body.contains("Log in"));
}

#[tokio::test]
async fn test_logout_clears_user_but_keeps_cart() {
    let ctx = TestContext::new().await;
    ctx.load_catalog().await;
    ctx.login("ana", "ana12345").await;
    ctx.post_form("/cart/add", &[("product_id", "p1")]).await;

    let response = ctx.post_form("/logout", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let (_, body) = ctx.get("/cart").await;
    assert!(!body.contains("ana (customer)"));
    assert!(body.contains("Subtotal (1 items)"));

    // Account pages now send the visitor to log in
    let response = ctx.client.get(ctx.url("/pedidos")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_login_issues_new_session_id() {
    let ctx = TestContext::new().await;
    ctx.load_catalog().await;

    let response = ctx.post_form("/cart/add", &[("product_id", "p1")]).await;
    let before = session_cookie(&response).unwrap();

    let response = ctx
        .post_form("/login", &[("username", "ana"), ("password", "ana12345")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let after = session_cookie(&response).unwrap();
    assert_ne!(before, after);

    // Same visitor under the new id
    let (_, body) = ctx.get("/cart").await;
    assert!(body.contains("ana (customer)"));
    assert!(body.contains("Subtotal (1 items)"));
}

#[tokio::test]
async fn test_register_redirects_to_login() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_form(
            "/register",
            &[
                ("username", "nuevo"),
                ("email", "nuevo@example.com"),
                ("password", "longenough1"),
                ("password_confirm", "longenough1"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?registered=1");

    let (_, body) = ctx.get("/login?registered=1").await;
    assert!(body.contains("notice-success"));
}

#[tokio::test]
async fn test_register_shows_backend_rejection() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_form(
            "/register",
            &[
                ("username", "ana"),
                ("email", "ana@example.com"),
                ("password", "longenough1"),
                ("password_confirm", "longenough1"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Username already exists"));
}

#[tokio::test]
async fn test_register_checks_password_confirmation_locally() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_form(
            "/register",
            &[
                ("username", "nuevo"),
                ("email", "nuevo@example.com"),
                ("password", "longenough1"),
                ("password_confirm", "different1"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("notice-error"));
}

// =============================================================================
// Session Events
// =============================================================================

#[tokio::test]
async fn test_logout_reaches_open_event_stream() {
    let ctx = TestContext::new().await;
    ctx.login("ana", "ana12345").await;

    let mut stream = ctx
        .client
        .get(ctx.url("/session/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(stream.status(), StatusCode::OK);
    assert!(
        stream
            .headers()
            .get(CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    // A second request of the same visitor, as another tab would send
    let response = ctx.post_form("/logout", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let received = tokio::time::timeout(Duration::from_secs(5), async {
        let mut text = String::new();
        while !text.contains("logged_out") {
            let chunk = stream.chunk().await.unwrap().unwrap();
            text.push_str(&String::from_utf8_lossy(&chunk));
        }
        text
    })
    .await
    .unwrap();
    assert!(received.contains("event: session"));
    assert!(received.contains(r#"{"kind":"logged_out","username":null}"#));
}

// =============================================================================
// Admin Access
// =============================================================================

#[tokio::test]
async fn test_anonymous_visitor_gets_inline_access_denied() {
    let ctx = TestContext::new().await;

    for path in ["/manage-products", "/manage-orders"] {
        let (status, body) = ctx.get(path).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{path}");
        assert!(body.contains("Access denied"));
    }
}

#[tokio::test]
async fn test_customer_gets_access_denied() {
    let ctx = TestContext::new().await;
    ctx.login("ana", "ana12345").await;

    let (status, body) = ctx.get("/manage-products").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Access denied"));

    let response = ctx
        .post_form("/manage-products/p1/delete", &[])
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_sees_management_screens() {
    let ctx = TestContext::new().await;
    ctx.login("admin", "admin123").await;

    let (_, body) = ctx.get("/").await;
    assert!(body.contains("admin (admin)"));
    assert!(body.contains("/manage-products"));

    let (status, body) = ctx.get("/manage-products").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Manage products"));
    assert!(body.contains("Widget"));

    let (status, body) = ctx.get("/manage-orders").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No orders yet"));
}

#[tokio::test]
async fn test_product_screen_leaves_shopper_catalog_alone() {
    let ctx = TestContext::new().await;
    ctx.login("admin", "admin123").await;

    let (status, body) = ctx.get("/manage-products").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Widget"));

    // Nobody has opened the home view yet
    let shopper = ctx.other_visitor();
    let response = shopper
        .post(ctx.url("/cart/add"))
        .form(&[("product_id", "p1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    shopper.get(ctx.url("/")).send().await.unwrap();
    let response = shopper
        .post(ctx.url("/cart/add"))
        .form(&[("product_id", "p1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_admin_loses_access_after_logout() {
    let ctx = TestContext::new().await;
    ctx.login("admin", "admin123").await;
    ctx.post_form("/logout", &[]).await;

    let (status, _) = ctx.get("/manage-products").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_updates_order_status() {
    let ctx = TestContext::new().await;
    ctx.load_catalog().await;
    ctx.login("admin", "admin123").await;
    ctx.post_form("/cart/add", &[("product_id", "p1")]).await;
    ctx.post_form(
        "/invoice",
        &[
            ("name", "Admin"),
            ("document_id", "1"),
            ("address", "HQ"),
            ("email", "admin@example.com"),
            ("payment_method", "cash"),
        ],
    )
    .await;

    let (_, body) = ctx.get("/manage-orders").await;
    assert!(body.contains("o-1"));

    let response = ctx
        .post_form("/manage-orders/o-1/status", &[("estado", "enviado")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/manage-orders?notice=status");

    let updates = ctx.backend.inspect(|log| log.status_updates.clone());
    assert_eq!(updates, vec![("o-1".to_string(), "enviado".to_string())]);
}

#[tokio::test]
async fn test_invalid_product_form_rerenders_with_error() {
    let ctx = TestContext::new().await;
    ctx.login("admin", "admin123").await;

    let response = ctx
        .post_form(
            "/manage-products",
            &[("name", "Thing"), ("price", "free"), ("image", "")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("is not a valid price"));
    assert!(body.contains(r#"value="Thing""#));
}
