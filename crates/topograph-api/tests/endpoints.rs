use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use std::path::Path;
use topograph_api::{create_router, AppState};
use topograph_core::Settings;
use topograph_graph::{write_node_link_graph, FilterGraph};
use tower::ServiceExt;

fn fixture_settings(root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.storage.data_dir = root.join("data");
    settings.storage.cache_dir = root.join("cache");
    settings.storage.source_dir = root.join("data/source");

    let mut graph = FilterGraph::new();
    graph.add_edge("a", "b", None);
    graph.add_edge("b", "c", None);
    graph.add_edge("c", "a", None);

    let small = settings.storage.data_dir.join("small");
    fs::create_dir_all(&small).unwrap();
    write_node_link_graph(&small.join("toy.json"), &graph).unwrap();

    let results = small.join("toy");
    fs::create_dir_all(&results).unwrap();
    fs::write(
        results.join("ecc.json"),
        r#"{"name":"eccentricity","process_time":0.01,"data":{"a":1.0,"b":2.0,"c":3.0}}"#,
    )
    .unwrap();

    settings
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn datasets_reflects_the_scanned_catalog() {
    let tmp = tempfile::tempdir().unwrap();
    let app = create_router(AppState::new(fixture_settings(tmp.path())));

    let response = app
        .oneshot(Request::get("/datasets").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let catalog = body_json(response).await;
    assert_eq!(catalog["small"]["toy.json"]["ecc"], "Eccentricity");
}

#[tokio::test]
async fn filter_function_serves_normalized_values() {
    let tmp = tempfile::tempdir().unwrap();
    let app = create_router(AppState::new(fixture_settings(tmp.path())));

    let response = app
        .oneshot(
            Request::get("/filter_function?dataset=small&datafile=toy.json&filter_func=ecc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let values = body_json(response).await;
    assert_eq!(values["a"], 0.0);
    assert_eq!(values["b"], 0.5);
    assert_eq!(values["c"], 1.0);
}

#[tokio::test]
async fn unknown_dataset_answers_an_empty_object() {
    let tmp = tempfile::tempdir().unwrap();
    let app = create_router(AppState::new(fixture_settings(tmp.path())));

    let response = app
        .oneshot(
            Request::get("/filter_function?dataset=nope&datafile=toy.json&filter_func=ecc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({}));
}

#[tokio::test]
async fn graph_request_populates_the_layout_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = fixture_settings(tmp.path());
    let cache_dir = settings.storage.cache_dir.clone();
    let app = create_router(AppState::new(settings));

    let response = app
        .oneshot(
            Request::get("/graph?dataset=small&datafile=toy.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let graph = body_json(response).await;
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 3);
    assert!(graph["nodes"][0]["x"].is_number());

    let cached = cache_dir
        .join("small")
        .join("toy.json")
        .join("graph_layout.json");
    assert!(cached.exists());
}

#[tokio::test]
async fn summary_graph_round_trip_and_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = fixture_settings(tmp.path());
    let cache_dir = settings.storage.cache_dir.clone();
    let app = create_router(AppState::new(settings));

    let uri = "/mog?dataset=small&datafile=toy.json&filter_func=ecc&coverN=2&coverOverlap=0.5\
               &component_method=connected_components&link_method=shared_nodes\
               &mapper_node_size_filter=0";
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let summary = body_json(response).await;
    assert!(summary["nodes"].as_array().unwrap().len() >= 1);

    // the build-side artifact is cached with the sorted parameter suffix
    let entries: Vec<String> = fs::read_dir(cache_dir.join("small").join("toy.json"))
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(entries.iter().any(|name| name.starts_with("summary_graph_")));

    // second request hits the cache and parses identically
    let again = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::OK);
    let cached = body_json(again).await;
    assert_eq!(cached["nodes"], summary["nodes"]);
}

#[tokio::test]
async fn layout_upload_is_served_back() {
    let tmp = tempfile::tempdir().unwrap();
    let app = create_router(AppState::new(fixture_settings(tmp.path())));

    let upload = app
        .clone()
        .oneshot(
            Request::post("/graph_layout?dataset=small&datafile=toy.json")
                .body(Body::from(r#"{"nodes":[{"id":"a","x":1.0,"y":2.0}],"links":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(upload.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::get("/graph?dataset=small&datafile=toy.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let graph = body_json(response).await;
    assert_eq!(graph["nodes"][0]["x"], 1.0);
}
