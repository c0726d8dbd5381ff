use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use dreambook_api::app::services::AppServices;
use dreambook_auth::{
    AccountRole, JwtClaims, RegisterUser, RevokedToken, Role, TokenKind, UserAccount, hash_password,
};
use dreambook_core::UserId;
use dreambook_infra::Store;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";
const PASSWORD: &str = "testpass123";

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory stores, ephemeral port.
        let services = Arc::new(AppServices::in_memory(JWT_SECRET));
        let app = dreambook_api::app::build_app(services.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Admins cannot self-register, so they are written straight to the store.
    async fn seed_admin(&self, username: &str) -> UserAccount {
        let cmd = registration(username, Some(AccountRole::Admin));
        let hash = hash_password(PASSWORD).unwrap();
        let account = UserAccount::register(&cmd, hash, true, Utc::now()).unwrap();
        self.services
            .stores
            .users
            .insert(account.id, account.clone())
            .await
            .unwrap();
        account
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn registration(username: &str, role: Option<AccountRole>) -> RegisterUser {
    serde_json::from_value(json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": PASSWORD,
        "password2": PASSWORD,
        "first_name": "Test",
        "last_name": username,
        "role": role,
    }))
    .unwrap()
}

fn mint_jwt(user: UserId, kind: TokenKind, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user,
        jti: uuid::Uuid::now_v7(),
        token_type: kind,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

struct Session {
    access: String,
    refresh: String,
    user_id: String,
}

async fn register(client: &reqwest::Client, srv: &TestServer, username: &str, role: &str) -> Session {
    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": PASSWORD,
            "password2": PASSWORD,
            "first_name": "Test",
            "last_name": username,
            "role": role,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    session(res.json().await.unwrap())
}

async fn login(client: &reqwest::Client, srv: &TestServer, email: &str) -> Session {
    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    session(res.json().await.unwrap())
}

fn session(body: Value) -> Session {
    Session {
        access: body["access_token"].as_str().unwrap().to_string(),
        refresh: body["refresh_token"].as_str().unwrap().to_string(),
        user_id: body["user"]["id"].as_str().unwrap().to_string(),
    }
}

async fn create_listing(client: &reqwest::Client, srv: &TestServer, token: &str, price: u64) -> String {
    let res = client
        .post(srv.url("/api/listings"))
        .bearer_auth(token)
        .json(&json!({
            "title": "Seaside flat",
            "description": "Two rooms by the beach",
            "price_per_night": price,
            "location": "Gdańsk",
            "latitude": 54.35,
            "longitude": 18.65,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

fn booking(listing_id: &str, check_in: &str, check_out: &str) -> Value {
    json!({
        "listing_id": listing_id,
        "check_in": check_in,
        "check_out": check_out,
        "guests_adults": 2,
        "guest": {
            "first_name": "Gina",
            "last_name": "Guest",
            "email": "gina@example.com",
            "phone": "+48123456789",
        },
    })
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn validly_signed_token_for_unknown_user_is_rejected() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new(), TokenKind::Access, vec![Role::new("admin")]);

    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_tokens_are_not_bearer_tokens() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let guest = register(&client, &srv, "rita", "guest").await;

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(&guest.refresh)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_refresh_logout_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let registered = register(&client, &srv, "ada", "guest").await;

    let me: Value = client
        .get(srv.url("/auth/me"))
        .bearer_auth(&registered.access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], "ada@example.com");
    assert_eq!(me["role"], "guest");
    assert!(me.get("password_hash").is_none());

    let session = login(&client, &srv, "ADA@example.com").await;
    assert_eq!(session.user_id, registered.user_id);

    let res = client
        .post(srv.url("/auth/refresh"))
        .json(&json!({ "refresh_token": session.refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["access_token"].as_str().is_some());

    let res = client
        .post(srv.url("/auth/logout"))
        .bearer_auth(&session.access)
        .json(&json!({ "refresh_token": session.refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/auth/refresh"))
        .json(&json!({ "refresh_token": session.refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_failures() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv, "bob", "guest").await;

    let res = client
        .post(srv.url("/api/login"))
        .json(&json!({ "email": "bob@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/api/login"))
        .json(&json!({ "email": "bob@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({
            "username": "bob",
            "email": "other@example.com",
            "password": PASSWORD,
            "password2": PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn guests_cannot_create_listings_and_strangers_cannot_edit_them() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let guest = register(&client, &srv, "gus", "guest").await;
    let owner = register(&client, &srv, "olga", "landlord").await;
    let other = register(&client, &srv, "lena", "landlord").await;

    let res = client
        .post(srv.url("/api/listings"))
        .bearer_auth(&guest.access)
        .json(&json!({ "title": "Nope", "price_per_night": 100, "location": "Nowhere" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let listing_id = create_listing(&client, &srv, &owner.access, 12_000).await;

    let res = client
        .patch(srv.url(&format!("/api/listings/{listing_id}")))
        .bearer_auth(&other.access)
        .json(&json!({ "title": "Mine now" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url("/api/listings?sort=price_asc&location=gda"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listings: Value = res.json().await.unwrap();
    assert_eq!(listings.as_array().unwrap().len(), 1);
    assert_eq!(listings[0]["owner"], owner.user_id);
}

#[tokio::test]
async fn booking_flow_from_quote_to_review() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let host = register(&client, &srv, "hana", "landlord").await;
    let guest = register(&client, &srv, "gina", "guest").await;
    let rival = register(&client, &srv, "rick", "guest").await;

    let listing_id = create_listing(&client, &srv, &host.access, 10_000).await;

    let res = client
        .get(srv.url(&format!(
            "/api/reservations/availability?listing_id={listing_id}&start_date=2030-06-01&end_date=2030-06-03"
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["available"], true);

    let res = client
        .post(srv.url("/api/reservations/quote"))
        .json(&json!({ "listing_id": listing_id, "check_in": "2030-06-01", "check_out": "2030-06-03" }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["quote"]["total_nights"], 2);
    assert_eq!(body["quote"]["subtotal"], 20_000);
    assert_eq!(body["quote"]["taxes_and_fees"], 3_000);
    assert_eq!(body["quote"]["total_amount"], 23_000);

    let res = client
        .post(srv.url("/api/reservations"))
        .bearer_auth(&guest.access)
        .json(&booking(&listing_id, "2030-06-01", "2030-06-03"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let reservation: Value = res.json().await.unwrap();
    assert_eq!(reservation["status"], "pending");
    assert_eq!(reservation["total_amount"], 23_000);
    assert!(reservation["confirmation_number"].as_str().unwrap().starts_with("DB-"));
    let reservation_id = reservation["id"].as_str().unwrap().to_string();

    // Overlapping stay on the same listing.
    let res = client
        .post(srv.url("/api/reservations"))
        .bearer_auth(&rival.access)
        .json(&booking(&listing_id, "2030-06-02", "2030-06-05"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Strangers cannot see it.
    let res = client
        .get(srv.url(&format!("/api/reservations/{reservation_id}")))
        .bearer_auth(&rival.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let review = json!({ "reservation": reservation_id, "rating": 5, "text": "Lovely stay" });
    let res = client
        .post(srv.url("/api/reviews"))
        .bearer_auth(&guest.access)
        .json(&review)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = client
        .post(srv.url(&format!("/api/reservations/{reservation_id}/pay")))
        .bearer_auth(&guest.access)
        .json(&json!({ "amount": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url(&format!("/api/reservations/{reservation_id}/pay")))
        .bearer_auth(&guest.access)
        .json(&json!({ "amount": 23_000, "card_brand": "visa", "card_last_four": "4242" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["payment_status"], "paid");

    let res = client
        .post(srv.url(&format!("/api/reservations/{reservation_id}/confirm")))
        .bearer_auth(&guest.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "confirmed");

    let res = client
        .post(srv.url("/api/reviews"))
        .bearer_auth(&guest.access)
        .json(&review)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(srv.url("/api/reviews"))
        .bearer_auth(&guest.access)
        .json(&review)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let summary: Value = client
        .get(srv.url(&format!("/api/reviews/summary/{listing_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["count"], 1);
    assert_eq!(summary["average"], 5.0);

    let res = client
        .post(srv.url(&format!("/api/reservations/{reservation_id}/cancel")))
        .bearer_auth(&guest.access)
        .json(&json!({ "reason": "plans changed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "cancelled");

    let body: Value = client
        .get(srv.url(&format!(
            "/api/reservations/availability?listing_id={listing_id}&start_date=2030-06-01&end_date=2030-06-03"
        )))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["available"], true);
}

#[tokio::test]
async fn property_search_filters_and_sorts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let host = register(&client, &srv, "pia", "landlord").await;

    for (title, price, amenities) in [
        ("Budget room", 5_000, vec!["wifi"]),
        ("Pool villa", 30_000, vec!["wifi", "pool"]),
        ("City loft", 15_000, vec!["wifi", "pool", "parking"]),
    ] {
        let res = client
            .post(srv.url("/api/properties"))
            .bearer_auth(&host.access)
            .json(&json!({
                "title": title,
                "location": "Kraków",
                "price_per_night": price,
                "max_guests": 2,
                "available_from": "2030-01-01",
                "available_to": "2030-12-31",
                "rating": 4.5,
                "amenities": amenities,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(srv.url("/api/properties?amenities=wifi&amenities=pool&sort=price_asc"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let results: Value = res.json().await.unwrap();
    let titles: Vec<&str> = results
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["City loft", "Pool villa"]);

    let res = client
        .get(srv.url("/api/properties?sort=cheapest"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_user_api_requires_admin() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = srv.seed_admin("root").await;
    let admin_session = login(&client, &srv, &admin.email).await;
    let guest = register(&client, &srv, "gabe", "guest").await;

    let res = client
        .get(srv.url("/api/admin/users/stats"))
        .bearer_auth(&guest.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url("/api/admin/users/stats"))
        .bearer_auth(&admin_session.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let stats: Value = res.json().await.unwrap();
    assert_eq!(stats["total_users"], 2);
    assert_eq!(stats["role_distribution"]["admin"], 1);
    assert_eq!(stats["role_distribution"]["guest"], 1);
    assert_eq!(stats["role_distribution"]["landlord"], 0);

    // Promotion applies on the next request without a new token.
    let res = client
        .post(srv.url(&format!("/api/admin/users/{}/change_role", guest.user_id)))
        .bearer_auth(&admin_session.access)
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(srv.url("/api/admin/users?search=gabe"))
        .bearer_auth(&guest.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["count"], 1);

    let res = client
        .post(srv.url(&format!("/api/admin/users/{}/deactivate", admin.id)))
        .bearer_auth(&admin_session.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn directory_grants_extend_the_builtin_policy() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = srv.seed_admin("root").await;
    let admin_session = login(&client, &srv, &admin.email).await;
    let guest = register(&client, &srv, "gail", "guest").await;

    let role: Value = client
        .post(srv.url("/api/roles"))
        .bearer_auth(&admin_session.access)
        .json(&json!({ "name": "curator" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let permission: Value = client
        .post(srv.url("/api/permissions"))
        .bearer_auth(&admin_session.access)
        .json(&json!({ "name": "hosts.write" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let res = client
        .post(srv.url("/api/check-access"))
        .bearer_auth(&guest.access)
        .json(&json!({ "user_id": guest.user_id, "permission_name": "hosts.write" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url("/api/assign-permission-to-role"))
        .bearer_auth(&admin_session.access)
        .json(&json!({ "role_id": role["id"], "permission_id": permission["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/api/assign-role-to-user"))
        .bearer_auth(&admin_session.access)
        .json(&json!({ "user_id": guest.user_id, "role_id": role["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(srv.url("/api/assign-role-to-user"))
        .bearer_auth(&admin_session.access)
        .json(&json!({ "user_id": guest.user_id, "role_id": role["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["created"], false);

    let res = client
        .post(srv.url("/api/hosts"))
        .bearer_auth(&guest.access)
        .json(&json!({
            "name": "Anna",
            "location": "Kraków",
            "image": "https://example.com/anna.jpg",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

async fn create_json(client: &reqwest::Client, srv: &TestServer, token: &str, path: &str, body: Value) -> Value {
    let res = client
        .post(srv.url(path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED, "POST {path}");
    res.json().await.unwrap()
}

async fn get_json(client: &reqwest::Client, srv: &TestServer, path: &str) -> Value {
    let res = client.get(srv.url(path)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK, "GET {path}");
    res.json().await.unwrap()
}

#[tokio::test]
async fn logout_drops_expired_revocations() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let session = register(&client, &srv, "otto", "guest").await;

    let stale = RevokedToken {
        jti: uuid::Uuid::now_v7(),
        user_id: UserId::new(),
        expires_at: Utc::now() - ChronoDuration::hours(1),
    };
    srv.services
        .stores
        .revoked_tokens
        .insert(stale.jti, stale.clone())
        .await
        .unwrap();

    let res = client
        .post(srv.url("/auth/logout"))
        .bearer_auth(&session.access)
        .json(&json!({ "refresh_token": session.refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let revoked = srv.services.stores.revoked_tokens.list().await.unwrap();
    assert_eq!(revoked.len(), 1);
    assert_ne!(revoked[0].jti, stale.jti);
}

#[tokio::test]
async fn advertisements_anonymous_drafts_views_and_ownership() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let owner = register(&client, &srv, "adam", "landlord").await;
    let other = register(&client, &srv, "abel", "landlord").await;

    let res = client
        .post(srv.url("/api/advertisements"))
        .json(&json!({
            "title": "Cabin in the woods",
            "advertisement_type": "private",
            "location": "Zakopane",
            "status": "active",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let anonymous: Value = res.json().await.unwrap();
    assert_eq!(anonymous["status"], "draft");
    assert!(anonymous["user"].is_null());

    let ad = create_json(
        &client,
        &srv,
        &owner.access,
        "/api/advertisements",
        json!({ "title": "Old town studio", "advertisement_type": "private", "location": "Kraków" }),
    )
    .await;
    assert_eq!(ad["user"], owner.user_id);
    let path = format!("/api/advertisements/{}", ad["id"].as_str().unwrap());

    assert_eq!(get_json(&client, &srv, &path).await["statistics"]["view_count"], 1);
    assert_eq!(get_json(&client, &srv, &path).await["statistics"]["view_count"], 2);

    let res = client
        .patch(srv.url(&path))
        .bearer_auth(&other.access)
        .json(&json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(srv.url(&path))
        .bearer_auth(&other.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(srv.url(&path))
        .bearer_auth(&owner.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn concurrent_views_keep_edits_and_every_view() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let owner = register(&client, &srv, "vera", "landlord").await;

    let ad = create_json(
        &client,
        &srv,
        &owner.access,
        "/api/advertisements",
        json!({ "title": "Before", "advertisement_type": "private", "location": "Łódź" }),
    )
    .await;
    let url = srv.url(&format!("/api/advertisements/{}", ad["id"].as_str().unwrap()));

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let (client, url) = (client.clone(), url.clone());
        tasks.push(tokio::spawn(async move {
            client.get(url).send().await.unwrap().status()
        }));
    }
    let (patch_client, patch_url, token) = (client.clone(), url.clone(), owner.access.clone());
    tasks.push(tokio::spawn(async move {
        patch_client
            .patch(patch_url)
            .bearer_auth(token)
            .json(&json!({ "title": "After" }))
            .send()
            .await
            .unwrap()
            .status()
    }));
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let body: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["title"], "After");
    assert_eq!(body["statistics"]["view_count"], 21);
}

#[tokio::test]
async fn manual_blocks_conflict_and_reservation_blocks_are_protected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let host = register(&client, &srv, "bea", "landlord").await;
    let guest = register(&client, &srv, "bart", "guest").await;
    let listing_id = create_listing(&client, &srv, &host.access, 9_000).await;

    let manual = create_json(
        &client,
        &srv,
        &host.access,
        "/api/availability-blocks",
        json!({ "listing": listing_id, "start_date": "2030-08-01", "end_date": "2030-08-05", "block_reason": "painting" }),
    )
    .await;

    let res = client
        .post(srv.url("/api/availability-blocks"))
        .bearer_auth(&host.access)
        .json(&json!({ "listing": listing_id, "start_date": "2030-08-04", "end_date": "2030-08-06" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    create_json(
        &client,
        &srv,
        &guest.access,
        "/api/reservations",
        booking(&listing_id, "2030-09-01", "2030-09-03"),
    )
    .await;

    let blocks = get_json(&client, &srv, &format!("/api/availability-blocks?listing_id={listing_id}")).await;
    let held = blocks
        .as_array()
        .unwrap()
        .iter()
        .find(|b| !b["reservation"].is_null())
        .unwrap();

    let res = client
        .delete(srv.url(&format!("/api/availability-blocks/{}", held["id"].as_str().unwrap())))
        .bearer_auth(&host.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .delete(srv.url(&format!("/api/availability-blocks/{}", manual["id"].as_str().unwrap())))
        .bearer_auth(&host.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn listing_delete_waits_for_live_reservations_then_cascades() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let host = register(&client, &srv, "lars", "landlord").await;
    let guest = register(&client, &srv, "lily", "guest").await;
    let listing_id = create_listing(&client, &srv, &host.access, 8_000).await;

    create_json(
        &client,
        &srv,
        &host.access,
        "/api/availability-blocks",
        json!({ "listing": listing_id, "start_date": "2030-10-01", "end_date": "2030-10-04" }),
    )
    .await;
    create_json(
        &client,
        &srv,
        &host.access,
        "/api/special-offers",
        json!({
            "listing": listing_id,
            "name": "Autumn",
            "discount_percent": 10,
            "start_date": "2030-11-01",
            "end_date": "2030-11-30",
        }),
    )
    .await;
    let reservation = create_json(
        &client,
        &srv,
        &guest.access,
        "/api/reservations",
        booking(&listing_id, "2030-11-10", "2030-11-12"),
    )
    .await;
    let reservation_path = format!("/api/reservations/{}", reservation["id"].as_str().unwrap());
    let listing_path = format!("/api/listings/{listing_id}");

    let res = client
        .delete(srv.url(&listing_path))
        .bearer_auth(&host.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url(&format!("{reservation_path}/cancel")))
        .bearer_auth(&guest.access)
        .json(&json!({ "reason": "cannot travel" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(srv.url(&listing_path))
        .bearer_auth(&host.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let blocks = get_json(&client, &srv, &format!("/api/availability-blocks?listing_id={listing_id}")).await;
    assert!(blocks.as_array().unwrap().is_empty());
    let offers = get_json(&client, &srv, "/api/special-offers").await;
    assert!(offers.as_array().unwrap().is_empty());

    let res = client
        .get(srv.url(&reservation_path))
        .bearer_auth(&guest.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn locations_nearby_items_and_cascade() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let user = register(&client, &srv, "mia", "guest").await;

    let mut ids = Vec::new();
    for (name, lat, lon) in [
        ("Warsaw", 52.2297, 21.0122),
        ("Wieliczka", 49.9870, 20.0640),
        ("Main Square", 50.0617, 19.9373),
    ] {
        let location = create_json(
            &client,
            &srv,
            &user.access,
            "/api/locations",
            json!({ "name": name, "location": "Poland", "latitude": lat, "longitude": lon }),
        )
        .await;
        ids.push(location["id"].as_str().unwrap().to_string());
    }

    let hits = get_json(&client, &srv, "/api/locations/nearby?lat=50.06&lon=19.94&radius_km=20").await;
    let names: Vec<&str> = hits
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["location"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Main Square", "Wieliczka"]);
    assert!(hits[0]["distance_km"].as_f64().unwrap() < hits[1]["distance_km"].as_f64().unwrap());

    let res = client
        .post(srv.url("/api/map-markers"))
        .bearer_auth(&user.access)
        .json(&json!({ "location": uuid::Uuid::now_v7().to_string(), "label": "Nowhere" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let square = &ids[2];
    create_json(
        &client,
        &srv,
        &user.access,
        "/api/map-markers",
        json!({ "location": square, "label": "Cloth Hall" }),
    )
    .await;
    create_json(
        &client,
        &srv,
        &user.access,
        "/api/map-annotations",
        json!({ "location": square, "text": "Busy on weekends" }),
    )
    .await;

    let res = client
        .delete(srv.url(&format!("/api/locations/{square}")))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    assert!(get_json(&client, &srv, "/api/map-markers").await.as_array().unwrap().is_empty());
    assert!(get_json(&client, &srv, "/api/map-annotations").await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn host_records_are_single_where_required_and_die_with_the_host() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let landlord = register(&client, &srv, "hugo", "landlord").await;

    let host = create_json(
        &client,
        &srv,
        &landlord.access,
        "/api/hosts",
        json!({ "name": "Hugo", "location": "Gdynia", "image": "https://example.com/hugo.jpg" }),
    )
    .await;
    let host_id = host["id"].as_str().unwrap();

    create_json(
        &client,
        &srv,
        &landlord.access,
        "/api/host-availability",
        json!({ "host": host_id, "start_date": "2030-06-01", "end_date": "2030-06-30" }),
    )
    .await;
    let policy = json!({ "host": host_id, "cancellation_policy": "Free cancellation up to 48h" });
    create_json(&client, &srv, &landlord.access, "/api/host-reservation-policy", policy.clone()).await;

    let res = client
        .post(srv.url("/api/host-reservation-policy"))
        .bearer_auth(&landlord.access)
        .json(&policy)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .delete(srv.url(&format!("/api/hosts/{host_id}")))
        .bearer_auth(&landlord.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    assert!(get_json(&client, &srv, "/api/host-availability").await.as_array().unwrap().is_empty());
    assert!(
        get_json(&client, &srv, "/api/host-reservation-policy")
            .await
            .as_array()
            .unwrap()
            .is_empty()
    );
}
