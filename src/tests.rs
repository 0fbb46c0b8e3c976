//! Integration tests for the Pet Pals client.
//!
//! A stub backend stands in for the real record/object/session services:
//! an in-memory axum server exposing the same `/rest/v1`, `/storage/v1`
//! and `/auth/v1` surfaces the client speaks to.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query as UrlQuery, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CreateAnimalRequest, Profile, UpdateProfileRequest};
use crate::pedigree::{self, PedigreeView};
use crate::screens;
use crate::screens::compose::PostDraft;
use crate::screens::images::ImageAttachment;
use crate::session::{self, Session, SessionContext};
use crate::store::{fetch_one, tables, RestClient, SessionService};

/// In-memory backend state shared by all stub handlers.
#[derive(Default)]
struct StubState {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    objects: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
}

fn stub_router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/auth/v1/token", post(auth_token))
        .route("/auth/v1/signup", post(auth_signup))
        .route("/auth/v1/logout", post(auth_logout))
        .route("/auth/v1/user", put(auth_update_user))
        .route(
            "/rest/v1/{table}",
            get(rest_select).post(rest_insert).patch(rest_update),
        )
        .route("/storage/v1/object/{bucket}/{*key}", post(storage_upload))
        .with_state(state)
}

fn auth_body(email: &str) -> Value {
    let user_id = format!("uid-{}", email.split('@').next().unwrap_or("anon"));
    json!({
        "access_token": format!("token-{}", user_id),
        "refresh_token": "refresh-token",
        "user": { "id": user_id, "email": email }
    })
}

async fn auth_token(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"].as_str() != Some("secret") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error_description": "Invalid login credentials" })),
        );
    }
    (StatusCode::OK, Json(auth_body(email)))
}

async fn auth_signup(Json(body): Json<Value>) -> Json<Value> {
    let email = body["email"].as_str().unwrap_or_default();
    Json(auth_body(email))
}

async fn auth_logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn auth_update_user(Json(_body): Json<Value>) -> Json<Value> {
    Json(json!({}))
}

/// Split the PostgREST-style query string into equality filters, an
/// optional descending order column and an optional limit.
fn parse_query(params: Vec<(String, String)>) -> (Vec<(String, String)>, Option<String>, Option<usize>) {
    let mut filters = Vec::new();
    let mut order = None;
    let mut limit = None;
    for (key, value) in params {
        if key == "order" {
            order = value.strip_suffix(".desc").map(str::to_string);
        } else if key == "limit" {
            limit = value.parse().ok();
        } else if let Some(value) = value.strip_prefix("eq.") {
            filters.push((key, value.to_string()));
        }
    }
    (filters, order, limit)
}

fn row_matches(row: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(column, value)| {
        row.get(column).and_then(Value::as_str) == Some(value.as_str())
    })
}

async fn rest_select(
    State(state): State<Arc<StubState>>,
    Path(table): Path<String>,
    UrlQuery(params): UrlQuery<Vec<(String, String)>>,
) -> Json<Value> {
    let (filters, order, limit) = parse_query(params);

    let tables = state.tables.lock().unwrap();
    let mut rows: Vec<Value> = tables
        .get(&table)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|row| row_matches(row, &filters))
        .collect();

    if let Some(column) = order {
        rows.sort_by(|a, b| {
            let a = a.get(&column).and_then(Value::as_str).unwrap_or("");
            let b = b.get(&column).and_then(Value::as_str).unwrap_or("");
            b.cmp(a)
        });
    }
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    Json(Value::Array(rows))
}

async fn rest_insert(
    State(state): State<Arc<StubState>>,
    Path(table): Path<String>,
    Json(row): Json<Value>,
) -> Json<Value> {
    state
        .tables
        .lock()
        .unwrap()
        .entry(table)
        .or_default()
        .push(row.clone());
    Json(json!([row]))
}

async fn rest_update(
    State(state): State<Arc<StubState>>,
    Path(table): Path<String>,
    UrlQuery(params): UrlQuery<Vec<(String, String)>>,
    Json(patch): Json<Value>,
) -> Json<Value> {
    let (filters, _, _) = parse_query(params);

    let mut tables = state.tables.lock().unwrap();
    let mut updated = Vec::new();
    if let Some(rows) = tables.get_mut(&table) {
        for row in rows.iter_mut().filter(|row| row_matches(row, &filters)) {
            if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
    }
    Json(Value::Array(updated))
}

async fn storage_upload(
    State(state): State<Arc<StubState>>,
    Path((bucket, key)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    if state.fail_uploads.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Storage unavailable" })),
        );
    }
    let stored = format!("{}/{}", bucket, key);
    state.objects.lock().unwrap().push(stored.clone());
    (StatusCode::OK, Json(json!({ "Key": stored })))
}

/// Test fixture: a running stub backend plus a client wired to it.
struct TestFixture {
    client: RestClient,
    context: Arc<SessionContext>,
    state: Arc<StubState>,
    config: Config,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let state = Arc::new(StubState::default());
        let app = stub_router(state.clone());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = Config {
            api_url: format!("http://{}", addr),
            api_key: Some("test-api-key".to_string()),
            session_path: temp_dir.path().join("session.json"),
            log_level: "warn".to_string(),
        };

        let context = Arc::new(SessionContext::new(None));
        let client = RestClient::new(&config, context.clone()).expect("Failed to build client");

        TestFixture {
            client,
            context,
            state,
            config,
            _temp_dir: temp_dir,
        }
    }

    fn seed(&self, table: &str, row: Value) {
        self.state
            .tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    async fn sign_in(&self) -> Session {
        screens::auth::sign_in(&self.client, "owner@example.com", "secret")
            .await
            .expect("sign-in failed")
    }

    fn image(&self) -> ImageAttachment {
        ImageAttachment {
            file_name: "walk.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8, 0xff],
        }
    }
}

#[tokio::test]
async fn test_sign_in_wrong_password_is_unauthorized() {
    let fixture = TestFixture::new().await;

    let err = screens::auth::sign_in(&fixture.client, "owner@example.com", "wrong")
        .await
        .unwrap_err();

    match err {
        AppError::Unauthorized(message) => assert_eq!(message, "Invalid login credentials"),
        other => panic!("expected Unauthorized, got {:?}", other),
    }
    assert!(fixture.context.current().is_none());
}

#[tokio::test]
async fn test_sign_in_publishes_session_transition() {
    let fixture = TestFixture::new().await;
    let mut watch = fixture.context.subscribe();

    let session = fixture.sign_in().await;
    assert_eq!(session.user_id, "uid-owner");
    assert_eq!(session.email.as_deref(), Some("owner@example.com"));

    let transition = watch.next().await.expect("context dropped");
    assert_eq!(transition, Some(session.clone()));
    assert_eq!(fixture.context.current(), Some(session));
}

#[tokio::test]
async fn test_register_creates_profile_row() {
    let fixture = TestFixture::new().await;

    let form = screens::auth::RegisterForm {
        email: "ada@example.com".to_string(),
        password: "pw".to_string(),
        confirm_password: "pw".to_string(),
        username: "ada".to_string(),
        full_name: Some("Ada L.".to_string()),
    };
    let (session, profile) = screens::auth::register(&fixture.client, &fixture.client, &form)
        .await
        .unwrap();

    assert_eq!(session.user_id, "uid-ada");
    assert_eq!(profile.id, "uid-ada");
    assert_eq!(profile.username, "ada");

    let stored: Option<Profile> = fetch_one(&fixture.client, tables::PROFILES, "uid-ada")
        .await
        .unwrap();
    assert_eq!(stored.unwrap().full_name.as_deref(), Some("Ada L."));
}

#[tokio::test]
async fn test_register_pet_list_and_detail() {
    let fixture = TestFixture::new().await;
    let session = fixture.sign_in().await;

    let request = CreateAnimalRequest {
        name: "Rex".to_string(),
        species: "Dog".to_string(),
        breed: Some("Labrador".to_string()),
        ..CreateAnimalRequest::default()
    };
    let animal = screens::pets::register_pet(&fixture.client, &fixture.client, &session, request, None)
        .await
        .unwrap();
    assert_eq!(animal.owner_id, "uid-owner");

    let pets = screens::pets::list_pets(&fixture.client, &session).await.unwrap();
    assert_eq!(pets.len(), 1);
    assert_eq!(pets[0].name, "Rex");
    assert_eq!(pets[0].lineage(), "Labrador");

    let detail = screens::pets::pet_detail(&fixture.client, &animal.id).await.unwrap();
    assert_eq!(detail.id, animal.id);

    let err = screens::pets::pet_detail(&fixture.client, "no-such-id")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_register_pet_uploads_photo_first() {
    let fixture = TestFixture::new().await;
    let session = fixture.sign_in().await;

    let request = CreateAnimalRequest {
        name: "Milo".to_string(),
        species: "Cat".to_string(),
        breed: Some("Siamese".to_string()),
        ..CreateAnimalRequest::default()
    };
    let photo = fixture.image();
    let animal = screens::pets::register_pet(
        &fixture.client,
        &fixture.client,
        &session,
        request,
        Some(&photo),
    )
    .await
    .unwrap();

    assert_eq!(fixture.state.objects.lock().unwrap().len(), 1);
    let url = animal.profile_picture.unwrap();
    assert!(url.contains("/storage/v1/object/public/images/public/"));
    assert!(url.ends_with("walk.jpg"));
}

fn animal_row(id: &str, name: &str, father: Option<&str>, mother: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "Dog",
        "breed": "Labrador",
        "owner_id": "uid-owner",
        "father_id": father,
        "mother_id": mother,
        "has_pedigree": true
    })
}

#[tokio::test]
async fn test_pedigree_over_rest() {
    let fixture = TestFixture::new().await;
    fixture.seed(tables::ANIMALS, animal_row("root", "Rex", Some("f"), Some("m")));
    fixture.seed(tables::ANIMALS, animal_row("f", "Bruno", Some("ff"), None));
    fixture.seed(tables::ANIMALS, animal_row("m", "Luna", None, None));
    fixture.seed(tables::ANIMALS, animal_row("ff", "Caesar", None, None));

    let view = pedigree::resolve_pedigree(&fixture.client, "root").await;
    let PedigreeView::Ready(tree) = view else {
        panic!("expected a resolved pedigree");
    };

    assert_eq!(tree.root.name, "Rex");
    assert_eq!(tree.father.as_ref().map(|a| a.name.as_str()), Some("Bruno"));
    assert_eq!(tree.mother.as_ref().map(|a| a.name.as_str()), Some("Luna"));
    assert_eq!(
        tree.paternal_grandfather.as_ref().map(|a| a.name.as_str()),
        Some("Caesar")
    );
    assert!(tree.paternal_grandmother.is_none());
    assert!(tree.maternal_grandfather.is_none());
    assert!(tree.maternal_grandmother.is_none());
}

#[tokio::test]
async fn test_pedigree_missing_root() {
    let fixture = TestFixture::new().await;

    let view = pedigree::resolve_pedigree(&fixture.client, "no-such-animal").await;
    assert!(matches!(view, PedigreeView::RootNotFound));
}

#[tokio::test]
async fn test_compose_round_trip() {
    let fixture = TestFixture::new().await;
    let session = fixture.sign_in().await;
    fixture.seed(
        tables::PROFILES,
        json!({ "id": "uid-owner", "username": "ada" }),
    );

    let draft = PostDraft {
        caption: "First walk".to_string(),
        image: Some(fixture.image()),
        location: Some("The park".to_string()),
        ..PostDraft::default()
    };
    let post = screens::compose::submit(&fixture.client, &fixture.client, Some(&session), &draft)
        .await
        .unwrap();

    assert_eq!(fixture.state.objects.lock().unwrap().len(), 1);

    let feed = screens::feed::load_feed(&fixture.client).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, post.id);
    assert_eq!(feed[0].caption, "First walk");

    let author = screens::feed::author_display(&fixture.client, &feed[0]).await;
    assert_eq!(author, "ada");
}

#[tokio::test]
async fn test_compose_upload_failure_inserts_nothing() {
    let fixture = TestFixture::new().await;
    let session = fixture.sign_in().await;
    fixture.state.fail_uploads.store(true, Ordering::SeqCst);

    let draft = PostDraft {
        caption: "First walk".to_string(),
        image: Some(fixture.image()),
        ..PostDraft::default()
    };
    let err = screens::compose::submit(&fixture.client, &fixture.client, Some(&session), &draft)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Remote(_)));
    assert!(fixture.rows(tables::POSTS).is_empty());
}

#[tokio::test]
async fn test_animal_authored_post_shows_animal_name() {
    let fixture = TestFixture::new().await;
    let session = fixture.sign_in().await;
    fixture.seed(tables::ANIMALS, animal_row("a9", "Rex", None, None));

    let draft = PostDraft {
        caption: "Posted as Rex".to_string(),
        image: Some(fixture.image()),
        author_animal: Some("a9".to_string()),
        ..PostDraft::default()
    };
    screens::compose::submit(&fixture.client, &fixture.client, Some(&session), &draft)
        .await
        .unwrap();

    let feed = screens::feed::load_feed(&fixture.client).await.unwrap();
    assert_eq!(feed[0].author.animal_id(), Some("a9"));
    assert_eq!(feed[0].author.posted_by(), "uid-owner");

    let author = screens::feed::author_display(&fixture.client, &feed[0]).await;
    assert_eq!(author, "Rex");
}

fn post_row(id: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "user_id": "uid-owner",
        "caption": format!("post {}", id),
        "image_url": "https://img/1.jpg",
        "created_at": created_at
    })
}

#[tokio::test]
async fn test_feed_orders_newest_first() {
    let fixture = TestFixture::new().await;
    fixture.seed(tables::POSTS, post_row("p1", "2025-01-01T00:00:00Z"));
    fixture.seed(tables::POSTS, post_row("p3", "2025-03-01T00:00:00Z"));
    fixture.seed(tables::POSTS, post_row("p2", "2025-02-01T00:00:00Z"));

    let feed = screens::feed::load_feed(&fixture.client).await.unwrap();
    let ids: Vec<&str> = feed.iter().map(|post| post.id.as_str()).collect();
    assert_eq!(ids, vec!["p3", "p2", "p1"]);
}

#[tokio::test]
async fn test_user_page_collects_profile_animals_posts() {
    let fixture = TestFixture::new().await;
    fixture.seed(
        tables::PROFILES,
        json!({ "id": "uid-owner", "username": "ada" }),
    );
    fixture.seed(tables::ANIMALS, animal_row("a1", "Rex", None, None));
    fixture.seed(tables::POSTS, post_row("p1", "2025-01-01T00:00:00Z"));

    let page = screens::profile::user_page(&fixture.client, "uid-owner")
        .await
        .unwrap();
    assert_eq!(page.profile.username, "ada");
    assert_eq!(page.animals.len(), 1);
    assert_eq!(page.posts.len(), 1);

    let err = screens::profile::user_page(&fixture.client, "uid-ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_animal_page_resolves_owner() {
    let fixture = TestFixture::new().await;
    fixture.seed(
        tables::PROFILES,
        json!({ "id": "uid-owner", "username": "ada" }),
    );
    fixture.seed(tables::ANIMALS, animal_row("a1", "Rex", None, None));

    let page = screens::profile::animal_page(&fixture.client, "a1").await.unwrap();
    assert_eq!(page.animal.name, "Rex");
    assert_eq!(page.owner.username, "ada");
}

#[tokio::test]
async fn test_edit_profile_patches_row() {
    let fixture = TestFixture::new().await;
    let session = fixture.sign_in().await;
    fixture.seed(
        tables::PROFILES,
        json!({ "id": "uid-owner", "username": "ada" }),
    );

    let empty = UpdateProfileRequest::default();
    let err = screens::profile::edit_profile(&fixture.client, &session, &empty)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let update = UpdateProfileRequest {
        bio: Some("Dog person.".to_string()),
        ..UpdateProfileRequest::default()
    };
    let profile = screens::profile::edit_profile(&fixture.client, &session, &update)
        .await
        .unwrap();
    assert_eq!(profile.username, "ada");
    assert_eq!(profile.bio.as_deref(), Some("Dog person."));
}

#[tokio::test]
async fn test_change_password_requires_session() {
    let fixture = TestFixture::new().await;

    let err = screens::profile::change_password(&fixture.client, "newpw", "newpw")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    fixture.sign_in().await;
    screens::profile::change_password(&fixture.client, "newpw", "newpw")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sign_out_clears_context() {
    let fixture = TestFixture::new().await;
    fixture.sign_in().await;
    assert!(fixture.context.current().is_some());

    fixture.client.sign_out().await.unwrap();
    assert!(fixture.context.current().is_none());
}

#[tokio::test]
async fn test_session_survives_a_new_client() {
    let fixture = TestFixture::new().await;
    let session = fixture.sign_in().await;

    session::store(&fixture.config.session_path, &session)
        .await
        .unwrap();

    let restored = session::load(&fixture.config.session_path).await;
    let context = Arc::new(SessionContext::new(restored));
    let client = RestClient::new(&fixture.config, context.clone()).unwrap();

    assert_eq!(client.current_session(), Some(session));
}
