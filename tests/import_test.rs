//! Integration tests for importing remote posts into the SQLite store.

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wp_rest_client::config::Config;
use wp_rest_client::{
    ClientError, ImportIdPolicy, Importer, PendingTerms, SqlitePostStore, WpClient,
};

async fn setup_store() -> (Arc<SqlitePostStore>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("posts.sqlite");
    let store = SqlitePostStore::new(&db_path)
        .await
        .expect("Failed to open store");
    (Arc::new(store), temp_dir)
}

fn importer(store: &Arc<SqlitePostStore>, policy: ImportIdPolicy) -> Importer<Arc<SqlitePostStore>> {
    Importer::new(store.clone(), policy).with_listener(store.clone())
}

fn remote_post(id: i64, title: &str) -> Value {
    json!({
        "ID": id,
        "title": title,
        "content": "<p>Body</p>",
        "slug": title.to_lowercase(),
        "status": "publish",
        "type": "post",
        "parent": 0,
        "excerpt": "",
        "date": "2024-01-01T10:00:00",
        "author": {"ID": 9, "name": "admin"},
        "format": "standard",
        "terms": {
            "category": [{"ID": 3, "name": "News", "slug": "news"}],
            "post_tag": [{"ID": 4, "name": "rust", "slug": "rust"}]
        }
    })
}

#[tokio::test]
async fn test_fetch_then_import_listing() {
    let (store, _temp_dir) = setup_store().await;

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/posts"))
        .and(query_param("type[]", "post"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([remote_post(10, "First"), remote_post(11, "Second")])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = WpClient::new(Config::for_testing(&mock_server.uri())).unwrap();
    let listing = client.fetch_posts("post", None).await.unwrap();

    let results = importer(&store, ImportIdPolicy::ReuseIfFree)
        .import_all(listing)
        .await;
    let ids: Vec<i64> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(ids, vec![10, 11]);

    let post = store.get_post(10).await.unwrap().unwrap();
    assert_eq!(post.post_title.as_deref(), Some("First"));
    assert_eq!(post.post_name.as_deref(), Some("first"));
    assert_eq!(post.post_status.as_deref(), Some("publish"));
    assert_eq!(post.post_author, Some(9));
    assert_eq!(post.import_id, Some(10));
    assert_eq!(post.extra_json.as_deref(), Some(r#"{"format":"standard"}"#));

    assert_eq!(
        store.get_terms(10).await.unwrap(),
        vec![
            ("category".to_string(), "News".to_string()),
            ("post_tag".to_string(), "rust".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_reuse_if_free_allocates_new_id_on_collision() {
    let (store, _temp_dir) = setup_store().await;
    let importer = importer(&store, ImportIdPolicy::ReuseIfFree);

    let first = importer.import(remote_post(5, "Original")).await.unwrap();
    let second = importer.import(remote_post(5, "Copy")).await.unwrap();

    assert_eq!(first, 5);
    assert_ne!(second, 5);
    assert_eq!(store.count_posts().await.unwrap(), 2);
    assert_eq!(
        store.get_post(5).await.unwrap().unwrap().post_title.as_deref(),
        Some("Original")
    );
}

#[tokio::test]
async fn test_overwrite_replaces_existing_post() {
    let (store, _temp_dir) = setup_store().await;
    let importer = importer(&store, ImportIdPolicy::Overwrite);

    importer.import(remote_post(5, "Original")).await.unwrap();
    let mut replacement = remote_post(5, "Replacement");
    replacement["terms"] = json!({"category": ["updates"]});
    let id = importer.import(replacement).await.unwrap();

    assert_eq!(id, 5);
    assert_eq!(store.count_posts().await.unwrap(), 1);
    assert_eq!(
        store.get_post(5).await.unwrap().unwrap().post_title.as_deref(),
        Some("Replacement")
    );
    assert_eq!(
        store.get_terms(5).await.unwrap(),
        vec![("category".to_string(), "updates".to_string())]
    );
}

#[tokio::test]
async fn test_always_create_ignores_remote_id() {
    let (store, _temp_dir) = setup_store().await;
    let importer = importer(&store, ImportIdPolicy::AlwaysCreate);

    let id = importer.import(remote_post(500, "Fresh")).await.unwrap();

    assert_eq!(id, 1);
    let post = store.get_post(id).await.unwrap().unwrap();
    assert_eq!(post.import_id, Some(500));
    assert!(store.get_post(500).await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_optional_fields_are_omitted() {
    let (store, _temp_dir) = setup_store().await;
    let importer = importer(&store, ImportIdPolicy::default());

    let id = importer
        .import(json!({"title": "Bare", "author": {"id": 1}}))
        .await
        .unwrap();

    let post = store.get_post(id).await.unwrap().unwrap();
    assert_eq!(post.post_title.as_deref(), Some("Bare"));
    assert_eq!(post.post_excerpt, None);
    assert_eq!(post.post_type, "post");
    assert_eq!(post.import_id, None);
    assert!(store.get_terms(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pending_terms_alongside_store() {
    let (store, _temp_dir) = setup_store().await;
    let pending = Arc::new(PendingTerms::new());
    let importer = Importer::new(store.clone(), ImportIdPolicy::default())
        .with_listener(pending.clone());

    let id = importer.import(remote_post(8, "Queued")).await.unwrap();

    let events = pending.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].post_id, id);
    assert_eq!(events[0].import_id, Some(json!(8)));
    assert_eq!(events[0].terms["category"][0]["slug"], "news");
    // The store was not registered as a listener here
    assert!(store.get_terms(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_posts_do_not_touch_store() {
    let (store, _temp_dir) = setup_store().await;
    let importer = importer(&store, ImportIdPolicy::default());

    let results = importer
        .import_all(json!([42, {"title": "no author"}]))
        .await;

    assert!(matches!(results[0], Err(ClientError::InvalidInput { .. })));
    assert!(matches!(results[1], Err(ClientError::MissingField { .. })));
    assert_eq!(store.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_embedded_title_and_parent_are_stored() {
    let (store, _temp_dir) = setup_store().await;
    let importer = importer(&store, ImportIdPolicy::default());

    let id = importer
        .import(json!({
            "ID": 20,
            "title": {"rendered": "Hello"},
            "parent": {"ID": 7, "title": "Parent post", "slug": "parent-post"},
            "author": {"ID": 1}
        }))
        .await
        .unwrap();

    let post = store.get_post(id).await.unwrap().unwrap();
    assert_eq!(post.post_title.as_deref(), Some("Hello"));
    assert_eq!(post.post_parent, Some(7));
    assert_eq!(post.post_author, Some(1));
    assert_eq!(post.extra_json, None);
}

#[tokio::test]
async fn test_values_without_a_column_shape_land_in_extra_json() {
    let (store, _temp_dir) = setup_store().await;
    let importer = importer(&store, ImportIdPolicy::default());

    let id = importer
        .import(json!({
            "ID": 21,
            "title": {"raw": "Hello"},
            "parent": {"slug": "orphan"},
            "author": {"ID": "admin"}
        }))
        .await
        .unwrap();

    let post = store.get_post(id).await.unwrap().unwrap();
    assert_eq!(post.post_title, None);
    assert_eq!(post.post_parent, None);
    assert_eq!(post.post_author, None);

    let extra: Value = serde_json::from_str(post.extra_json.as_deref().unwrap()).unwrap();
    assert_eq!(
        extra,
        json!({
            "post_author": "admin",
            "post_parent": {"slug": "orphan"},
            "post_title": {"raw": "Hello"}
        })
    );
}
