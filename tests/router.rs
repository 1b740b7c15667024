use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use menuboard::application::catalog::{
    CatalogService, DishService, MenuService, SubmenuService,
};
use menuboard::cache::{CacheClient, CacheConfig, MemoryCache};
use menuboard::infra::http::{ApiState, build_router};
use menuboard::infra::memory::MemoryCatalog;

struct TestApp {
    router: Router,
    cache: Arc<MemoryCache>,
}

fn build_app() -> TestApp {
    let store = Arc::new(MemoryCatalog::new());
    let config = CacheConfig::default();
    let cache = Arc::new(MemoryCache::new(&config));
    let client = CacheClient::new(cache.clone(), &config);

    let state = ApiState {
        menus: Arc::new(MenuService::new(store.clone(), store.clone(), client.clone())),
        submenus: Arc::new(SubmenuService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            client.clone(),
        )),
        dishes: Arc::new(DishService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            client,
        )),
        catalog: Arc::new(CatalogService::new(store)),
    };

    TestApp {
        router: build_router(state),
        cache,
    }
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be json")
    };
    (status, value)
}

async fn create_menu(app: &TestApp, title: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/menus",
        Some(json!({"title": title, "description": "menu description"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("menu id").to_string()
}

async fn create_submenu(app: &TestApp, menu_id: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        &format!("/api/v1/menus/{menu_id}/submenus"),
        Some(json!({"title": title, "description": "submenu description"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("submenu id").to_string()
}

async fn create_dish(app: &TestApp, menu_id: &str, submenu_id: &str, price: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        &format!("/api/v1/menus/{menu_id}/submenus/{submenu_id}/dishes"),
        Some(json!({"title": "Soup", "description": "hot", "price": price})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("dish id").to_string()
}

#[tokio::test]
async fn create_menu_returns_created_with_zero_counts() {
    let app = build_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/menus",
        Some(json!({"title": "Lunch", "description": "Weekdays"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Lunch");
    assert_eq!(body["description"], "Weekdays");
    assert_eq!(body["submenus_count"], 0);
    assert_eq!(body["dishes_count"], 0);
}

#[tokio::test]
async fn menu_counts_cover_the_whole_subtree() {
    let app = build_app();
    let menu_id = create_menu(&app, "Dinner").await;
    let submenu_id = create_submenu(&app, &menu_id, "Mains").await;
    create_dish(&app, &menu_id, &submenu_id, "12.50").await;
    create_dish(&app, &menu_id, &submenu_id, "8").await;

    let (status, menu) = send(&app, Method::GET, &format!("/api/v1/menus/{menu_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(menu["submenus_count"], 1);
    assert_eq!(menu["dishes_count"], 2);

    let (_, submenu) = send(
        &app,
        Method::GET,
        &format!("/api/v1/menus/{menu_id}/submenus/{submenu_id}"),
        None,
    )
    .await;
    assert_eq!(submenu["dishes_count"], 2);
}

#[tokio::test]
async fn dish_price_is_stored_as_sent() {
    let app = build_app();
    let menu_id = create_menu(&app, "Dinner").await;
    let submenu_id = create_submenu(&app, &menu_id, "Mains").await;
    let dish_id = create_dish(&app, &menu_id, &submenu_id, "12.50").await;

    let (status, dish) = send(
        &app,
        Method::GET,
        &format!("/api/v1/menus/{menu_id}/submenus/{submenu_id}/dishes/{dish_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dish["price"], "12.50");
}

#[tokio::test]
async fn missing_ancestors_yield_not_found() {
    let app = build_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/menus/missing/submenus",
        Some(json!({"title": "Orphan"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["message"], "menu not found");

    let menu_id = create_menu(&app, "Lunch").await;
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/menus/{menu_id}/submenus/missing/dishes"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "submenu not found");
}

#[tokio::test]
async fn submenu_is_addressed_through_its_own_menu() {
    let app = build_app();
    let first = create_menu(&app, "First").await;
    let second = create_menu(&app, "Second").await;
    let submenu_id = create_submenu(&app, &first, "Starters").await;

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/menus/{second}/submenus/{submenu_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_input_is_rejected() {
    let app = build_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/menus",
        Some(json!({"description": "no title"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/menus",
        Some(json!({"title": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
    assert_eq!(body["error"]["hint"], "title");

    let menu_id = create_menu(&app, "Lunch").await;
    let submenu_id = create_submenu(&app, &menu_id, "Mains").await;
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/menus/{menu_id}/submenus/{submenu_id}/dishes"),
        Some(json!({"title": "Soup", "price": "cheap"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["hint"], "price");
}

#[tokio::test]
async fn read_update_read_reflects_the_update() {
    let app = build_app();
    let menu_id = create_menu(&app, "Lunch").await;
    let uri = format!("/api/v1/menus/{menu_id}");
    let key = format!("menu:{menu_id}");

    let (_, before) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(before["title"], "Lunch");
    assert!(app.cache.contains(&key));

    let (status, patched) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"title": "Brunch"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["title"], "Brunch");
    assert_eq!(patched["description"], "menu description");
    assert!(!app.cache.contains(&key));

    let (_, after) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(after["title"], "Brunch");
}

#[tokio::test]
async fn creating_a_child_refreshes_cached_collections() {
    let app = build_app();
    let menu_id = create_menu(&app, "Lunch").await;
    let submenus_uri = format!("/api/v1/menus/{menu_id}/submenus");

    let (_, empty) = send(&app, Method::GET, &submenus_uri, None).await;
    assert_eq!(empty, json!([]));
    assert!(app.cache.contains(&format!("submenus:{menu_id}:0:100")));

    create_submenu(&app, &menu_id, "Mains").await;

    let (_, listed) = send(&app, Method::GET, &submenus_uri, None).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    let (_, menus) = send(&app, Method::GET, "/api/v1/menus", None).await;
    assert_eq!(menus[0]["submenus_count"], 1);
}

#[tokio::test]
async fn deleting_a_menu_cascades_to_children() {
    let app = build_app();
    let menu_id = create_menu(&app, "Dinner").await;
    let submenu_id = create_submenu(&app, &menu_id, "Mains").await;
    let dish_id = create_dish(&app, &menu_id, &submenu_id, "10").await;

    let dish_uri = format!("/api/v1/menus/{menu_id}/submenus/{submenu_id}/dishes/{dish_id}");
    let (status, _) = send(&app, Method::GET, &dish_uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/v1/menus/{menu_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Menu deleted");
    assert_eq!(body["deleted"], json!({"menus": 1, "submenus": 1, "dishes": 1}));

    let (status, _) = send(&app, Method::GET, &dish_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/menus/{menu_id}/submenus/{submenu_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, tree) = send(&app, Method::GET, "/api/v1/catalog", None).await;
    assert_eq!(tree, json!([]));
}

#[tokio::test]
async fn deleting_a_missing_entity_is_not_found() {
    let app = build_app();
    let (status, _) = send(&app, Method::DELETE, "/api/v1/menus/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_all_dishes_empties_one_submenu() {
    let app = build_app();
    let menu_id = create_menu(&app, "Dinner").await;
    let mains = create_submenu(&app, &menu_id, "Mains").await;
    let desserts = create_submenu(&app, &menu_id, "Desserts").await;
    create_dish(&app, &menu_id, &mains, "10").await;
    create_dish(&app, &menu_id, &mains, "11").await;
    create_dish(&app, &menu_id, &desserts, "5").await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/menus/{menu_id}/submenus/{mains}/dishes"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"]["dishes"], 2);

    let (_, menu) = send(&app, Method::GET, &format!("/api/v1/menus/{menu_id}"), None).await;
    assert_eq!(menu["dishes_count"], 1);
}

#[tokio::test]
async fn list_honours_skip_and_limit() {
    let app = build_app();
    for title in ["One", "Two", "Three"] {
        create_menu(&app, title).await;
    }

    let (_, page) = send(&app, Method::GET, "/api/v1/menus?skip=1&limit=1", None).await;
    let titles: Vec<_> = page
        .as_array()
        .expect("list body")
        .iter()
        .map(|menu| menu["title"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(titles, ["Two"]);
    assert!(!app.cache.contains("menus:1:1"));
}

#[tokio::test]
async fn catalog_returns_the_nested_tree() {
    let app = build_app();
    let menu_id = create_menu(&app, "Dinner").await;
    let submenu_id = create_submenu(&app, &menu_id, "Mains").await;
    create_dish(&app, &menu_id, &submenu_id, "9.5").await;

    let (status, tree) = send(&app, Method::GET, "/api/v1/catalog", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree[0]["id"], menu_id.as_str());
    assert_eq!(tree[0]["submenus"][0]["id"], submenu_id.as_str());
    assert_eq!(tree[0]["submenus"][0]["dishes"][0]["price"], "9.5");
}

#[tokio::test]
async fn health_probe_reports_no_content() {
    let app = build_app();
    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = build_app();
    let request = Request::builder()
        .uri("/api/v1/menus")
        .header("x-request-id", "trace-123")
        .body(Body::empty())
        .expect("request should build");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("trace-123")
    );
}
