use crate::{ApiError, ApiResult, AppState};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use topograph_cache::{cache_path, load_filter_values, serve_cached, store, CacheParams};
use topograph_core::{ArtifactKind, DatasetCatalog};
use topograph_graph::{initialize_radial_layout, read_node_link_graph};
use topograph_mapper::{Cover, SummaryGraph};
use tracing::{debug, info};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Deserialize)]
pub struct GraphQuery {
    pub dataset: String,
    pub datafile: String,
}

#[derive(Deserialize)]
pub struct FilterFunctionQuery {
    pub dataset: String,
    pub datafile: String,
    pub filter_func: String,
    #[serde(default)]
    pub rank_filter: Option<String>,
}

#[derive(Deserialize)]
pub struct SummaryGraphQuery {
    pub dataset: String,
    pub datafile: String,
    pub filter_func: String,
    #[serde(rename = "coverN")]
    pub cover_n: String,
    #[serde(rename = "coverOverlap")]
    pub cover_overlap: String,
    pub component_method: String,
    pub link_method: String,
    pub mapper_node_size_filter: String,
    #[serde(default)]
    pub rank_filter: Option<String>,
    #[serde(default)]
    pub gcc_only: Option<String>,
}

/// Unset boolean-ish request flags default to the literal "false"; the raw
/// string participates in the cache key exactly as received.
fn flag(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "false".to_string())
}

fn is_true(value: &Option<String>) -> bool {
    value.as_deref() == Some("true")
}

/// Unknown dataset/datafile/filter combinations answer an empty JSON
/// object rather than an error.
fn empty_object() -> Response {
    Json(json!({})).into_response()
}

fn json_bytes(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], bytes).into_response()
}

async fn catalog_snapshot(state: &AppState) -> DatasetCatalog {
    state.catalog.read().await.clone()
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: option_env!("CARGO_PKG_VERSION").unwrap_or("0.1.0").to_string(),
    })
}

pub async fn datasets(State(state): State<AppState>) -> Json<DatasetCatalog> {
    Json(catalog_snapshot(&state).await)
}

pub async fn rescan_datasets(State(state): State<AppState>) -> Json<DatasetCatalog> {
    let fresh = state.rescan().await;
    info!("catalog rescanned");
    Json(fresh)
}

pub async fn get_graph(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> ApiResult<Response> {
    let catalog = catalog_snapshot(&state).await;
    if !catalog.contains_datafile(&query.dataset, &query.datafile) {
        return Ok(empty_object());
    }

    let cache_file = cache_path(
        &state.settings.storage.cache_dir,
        ArtifactKind::GraphLayout,
        &query.dataset,
        &query.datafile,
        &CacheParams::new(),
    )?;
    let data_file = state
        .settings
        .storage
        .data_dir
        .join(&query.dataset)
        .join(&query.datafile);

    let bytes = tokio::task::spawn_blocking(move || {
        serve_cached(&cache_file, || {
            let mut graph = read_node_link_graph(&data_file)?;
            initialize_radial_layout(&mut graph);
            Ok(serde_json::to_vec(&graph.to_node_link())?)
        })
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(json_bytes(bytes))
}

pub async fn store_graph_layout(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
    body: Bytes,
) -> ApiResult<Response> {
    let cache_file = cache_path(
        &state.settings.storage.cache_dir,
        ArtifactKind::GraphLayout,
        &query.dataset,
        &query.datafile,
        &CacheParams::new(),
    )?;
    store(&cache_file, &body)?;
    Ok(empty_object())
}

pub async fn get_filter_function(
    State(state): State<AppState>,
    Query(query): Query<FilterFunctionQuery>,
) -> ApiResult<Response> {
    let catalog = catalog_snapshot(&state).await;
    if !catalog.contains_filter(&query.dataset, &query.datafile, &query.filter_func) {
        return Ok(empty_object());
    }

    let data_root = state.settings.storage.data_dir.clone();
    let ranked = is_true(&query.rank_filter);
    let values = tokio::task::spawn_blocking(move || {
        load_filter_values(
            &data_root,
            &query.dataset,
            &query.datafile,
            &query.filter_func,
            ranked,
        )
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(values).into_response())
}

fn summary_layout_params(query: &SummaryGraphQuery) -> CacheParams {
    let mut params = summary_build_params(query);
    params.insert(
        "mapper_node_size_filter".to_string(),
        query.mapper_node_size_filter.clone(),
    );
    params.insert("gcc_only".to_string(), flag(&query.gcc_only));
    params
}

fn summary_build_params(query: &SummaryGraphQuery) -> CacheParams {
    CacheParams::from([
        ("filter_func".to_string(), query.filter_func.clone()),
        ("coverN".to_string(), query.cover_n.clone()),
        ("coverOverlap".to_string(), query.cover_overlap.clone()),
        ("component_method".to_string(), query.component_method.clone()),
        ("link_method".to_string(), query.link_method.clone()),
        ("rank_filter".to_string(), flag(&query.rank_filter)),
    ])
}

pub async fn get_summary_graph(
    State(state): State<AppState>,
    Query(query): Query<SummaryGraphQuery>,
) -> ApiResult<Response> {
    let catalog = catalog_snapshot(&state).await;
    if !catalog.contains_filter(&query.dataset, &query.datafile, &query.filter_func) {
        return Ok(empty_object());
    }

    // a cached client layout supersedes rebuilding the summary graph
    let layout_file = cache_path(
        &state.settings.storage.cache_dir,
        ArtifactKind::SummaryLayout,
        &query.dataset,
        &query.datafile,
        &summary_layout_params(&query),
    )?;
    if layout_file.exists() {
        debug!("{} found in summary layout cache", query.datafile);
        return Ok(json_bytes(std::fs::read(&layout_file).map_err(
            |e| ApiError::Topograph(e.into()),
        )?));
    }

    let intervals: usize = query
        .cover_n
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("bad coverN: {}", query.cover_n)))?;
    let overlap: f64 = query
        .cover_overlap
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("bad coverOverlap: {}", query.cover_overlap)))?;
    let node_size_filter: usize = query.mapper_node_size_filter.parse().map_err(|_| {
        ApiError::BadRequest(format!(
            "bad mapper_node_size_filter: {}",
            query.mapper_node_size_filter
        ))
    })?;

    let summary_file = cache_path(
        &state.settings.storage.cache_dir,
        ArtifactKind::SummaryGraph,
        &query.dataset,
        &query.datafile,
        &summary_build_params(&query),
    )?;

    let data_root = state.settings.storage.data_dir.clone();
    let ranked = is_true(&query.rank_filter);
    let gcc_only = is_true(&query.gcc_only);

    let bytes = tokio::task::spawn_blocking(move || -> topograph_core::Result<Vec<u8>> {
        let bytes = serve_cached(&summary_file, || {
            let data_file = data_root.join(&query.dataset).join(&query.datafile);
            let graph = read_node_link_graph(&data_file)?;
            info!(
                "input graph: {} nodes, {} edges",
                graph.node_count(),
                graph.edge_count()
            );
            let values = load_filter_values(
                &data_root,
                &query.dataset,
                &query.datafile,
                &query.filter_func,
                ranked,
            )?;
            let cover = Cover::new(&values, intervals, overlap);
            let mut summary = SummaryGraph::build(
                &graph,
                &values,
                &cover,
                &query.component_method,
                &query.link_method,
            )?;
            if graph.node_count() > 5000 {
                summary.strip_components_from_nodes();
            }
            summary.to_json_bytes()
        })?;

        let mut summary = SummaryGraph::from_json_bytes(&bytes)?;
        info!(
            "summary graph: {} nodes in {:.3}s",
            summary.node_count(),
            summary.compute_time()
        );
        if node_size_filter > 0 {
            summary.filter_by_node_size(node_size_filter);
        }
        if gcc_only {
            summary.extract_greatest_connected_component();
        }
        summary.to_json_bytes()
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(json_bytes(bytes))
}

pub async fn store_summary_layout(
    State(state): State<AppState>,
    Query(query): Query<SummaryGraphQuery>,
    body: Bytes,
) -> ApiResult<Response> {
    let layout_file = cache_path(
        &state.settings.storage.cache_dir,
        ArtifactKind::SummaryLayout,
        &query.dataset,
        &query.datafile,
        &summary_layout_params(&query),
    )?;
    store(&layout_file, &body)?;
    Ok(empty_object())
}
