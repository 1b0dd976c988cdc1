//! Filter-function batch scheduler. Eight fixed tasks run against one
//! read-only graph on dedicated OS threads, sharing nothing but the
//! filesystem, under a single wall-clock deadline computed at dispatch.
//! The scheduler then joins the tasks in a fixed order, each join bounded
//! by `max(1s, deadline - now)`: tasks joined later inherit whatever budget
//! the earlier joins left over, a first-come-first-served degradation under
//! time pressure rather than a per-task budget. A task cancelled by an
//! expired join suppresses its pending write, so an abandoned task leaves
//! no partial artifact and is retried on the next invocation.

use serde_json::json;
use std::cmp;
use std::collections::BTreeMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use topograph_core::{atomic_write_json, FilterResult, Result, TopographError, FILTER_FUNCTIONS};
use topograph_filters::{
    average_geodesic_distance, density, eccentricity, eigen_function, fiedler_vector, pagerank,
    EigenOutcome, FilterOutcome, FilterValues,
};
use topograph_graph::{read_node_link_graph, FilterGraph};
use tracing::{debug, info, warn};

const PAGERANK_ALPHA: f64 = 0.85;
const DENSITY_EPS: f64 = 0.5;
const EIGEN_INDICES: RangeInclusive<usize> = 1..=5;
/// Minimum bounded wait per join, mirroring the per-task floor the batch
/// always grants even once the deadline has passed.
const JOIN_FLOOR: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum TaskOutcome {
    /// Artifacts written, with the shared compute time in seconds.
    Written { files: usize, secs: f64 },
    /// Every artifact this task owns already exists.
    UpToDate,
    /// Structural or shape failure: logged, nothing written.
    Skipped { reason: String },
    /// The task observed its cancellation token and abandoned its write.
    Cancelled,
    /// Non-fatal runtime failure; siblings are unaffected.
    Failed(TopographError),
}

#[derive(Debug, Clone, Copy)]
enum TaskKind {
    AverageGeodesic,
    Eccentricity,
    PageRank,
    Fiedler { normalized: bool },
    Density,
    Eigen { normalized: bool },
}

#[derive(Debug, Clone, Copy)]
pub struct FilterTask {
    label: &'static str,
    kind: TaskKind,
}

impl FilterTask {
    /// The eight fixed tasks of one batch, in join order.
    pub fn standard_batch() -> Vec<FilterTask> {
        vec![
            FilterTask { label: "agd", kind: TaskKind::AverageGeodesic },
            FilterTask { label: "ecc", kind: TaskKind::Eccentricity },
            FilterTask { label: "pr_0_85", kind: TaskKind::PageRank },
            FilterTask { label: "fv", kind: TaskKind::Fiedler { normalized: false } },
            FilterTask { label: "fv_norm", kind: TaskKind::Fiedler { normalized: true } },
            FilterTask { label: "den_0_5", kind: TaskKind::Density },
            FilterTask { label: "ev", kind: TaskKind::Eigen { normalized: false } },
            FilterTask { label: "ev_norm", kind: TaskKind::Eigen { normalized: true } },
        ]
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    fn write_single(
        &self,
        path: &Path,
        name: &str,
        parameters: BTreeMap<String, serde_json::Value>,
        secs: f64,
        data: FilterValues,
    ) -> TaskOutcome {
        let result = FilterResult {
            name: name.to_string(),
            parameters,
            process_time: secs,
            data,
        };
        match atomic_write_json(path, &result) {
            Ok(()) => TaskOutcome::Written { files: 1, secs },
            Err(err) => TaskOutcome::Failed(err),
        }
    }

    /// Runs the task to completion against its output directory. The
    /// cancellation token is checked immediately before every write; a
    /// cancelled task therefore leaves the filesystem untouched.
    pub fn execute(&self, graph: &FilterGraph, out_dir: &Path, token: &CancellationToken) -> TaskOutcome {
        match self.kind {
            TaskKind::Eigen { normalized } => self.execute_eigen(graph, out_dir, token, normalized),
            _ => {
                let path = out_dir.join(format!("{}.json", self.label));
                if path.exists() {
                    return TaskOutcome::UpToDate;
                }
                info!("generating {}", self.label);
                let start = Instant::now();
                let (name, parameters, computed) = match self.kind {
                    TaskKind::AverageGeodesic => (
                        "agd",
                        BTreeMap::new(),
                        FilterOutcome::Values(average_geodesic_distance(graph)),
                    ),
                    TaskKind::Eccentricity => (
                        "eccentricity",
                        BTreeMap::new(),
                        FilterOutcome::Values(eccentricity(graph)),
                    ),
                    TaskKind::PageRank => (
                        "pagerank",
                        BTreeMap::from([("alpha".to_string(), json!(PAGERANK_ALPHA))]),
                        FilterOutcome::Values(pagerank(graph, PAGERANK_ALPHA)),
                    ),
                    TaskKind::Density => (
                        "density",
                        BTreeMap::from([("eps".to_string(), json!(DENSITY_EPS))]),
                        FilterOutcome::Values(density(graph, DENSITY_EPS)),
                    ),
                    TaskKind::Fiedler { normalized } => (
                        "fiedler",
                        BTreeMap::from([("normalized".to_string(), json!(normalized))]),
                        fiedler_vector(graph, normalized),
                    ),
                    TaskKind::Eigen { .. } => unreachable!("handled above"),
                };
                let secs = start.elapsed().as_secs_f64();
                let data = match computed {
                    FilterOutcome::Values(data) => data,
                    FilterOutcome::Skipped { reason } => return TaskOutcome::Skipped { reason },
                };
                if token.is_cancelled() {
                    return TaskOutcome::Cancelled;
                }
                self.write_single(&path, name, parameters, secs, data)
            }
        }
    }

    fn execute_eigen(
        &self,
        graph: &FilterGraph,
        out_dir: &Path,
        token: &CancellationToken,
        normalized: bool,
    ) -> TaskOutcome {
        // only indices strictly below the node count, and only those whose
        // artifact is still missing
        let pending: Vec<usize> = EIGEN_INDICES
            .filter(|&idx| idx < graph.node_count())
            .filter(|idx| !out_dir.join(format!("{}_{}.json", self.label, idx)).exists())
            .collect();
        if pending.is_empty() {
            return TaskOutcome::UpToDate;
        }

        info!("generating {} for indices {:?}", self.label, pending);
        let start = Instant::now();
        let pairs = match eigen_function(graph, normalized) {
            EigenOutcome::Pairs(pairs) => pairs,
            EigenOutcome::Skipped { reason } => return TaskOutcome::Skipped { reason },
        };
        let secs = start.elapsed().as_secs_f64();

        let mut files = 0;
        for idx in pending {
            let Some((_, data)) = pairs.get(idx) else {
                debug!("{}_{} unavailable: only {} eigenpairs", self.label, idx, pairs.len());
                continue;
            };
            if token.is_cancelled() {
                return TaskOutcome::Cancelled;
            }
            let path = out_dir.join(format!("{}_{}.json", self.label, idx));
            let result = FilterResult {
                name: "eigen".to_string(),
                parameters: BTreeMap::from([
                    ("eigen".to_string(), json!(idx)),
                    ("normalized".to_string(), json!(normalized)),
                ]),
                process_time: secs,
                data: data.clone(),
            };
            if let Err(err) = atomic_write_json(&path, &result) {
                return TaskOutcome::Failed(err);
            }
            files += 1;
        }
        TaskOutcome::Written { files, secs }
    }
}

/// Expected artifact file names for one complete batch.
fn expected_artifacts() -> Vec<String> {
    FILTER_FUNCTIONS
        .iter()
        .map(|(id, _)| format!("{}.json", id))
        .collect()
}

/// Gate for the whole batch: true when every expected output already
/// exists. The artifact names are tested as bare relative paths, without
/// the dataset-specific directory prefix.
/// TODO: join these against `out_dir` so the gate inspects the dataset's
/// own artifact directory instead of the process working directory.
fn batch_already_complete() -> bool {
    expected_artifacts()
        .iter()
        .all(|name| Path::new(name).exists())
}

/// Remaining wait for the next join: whatever the shared deadline leaves,
/// but never below the one-second floor. Because the deadline is fixed at
/// dispatch, every elapsed join shrinks what the next one gets.
fn bounded_wait(deadline: Instant) -> Duration {
    cmp::max(JOIN_FLOOR, deadline.saturating_duration_since(Instant::now()))
}

/// Runs the filter-function batch for one canonical graph under a shared
/// wall-clock budget.
pub fn run_batch(canonical: &Path, budget: Duration) -> Result<()> {
    info!("processing graph: {}", canonical.display());

    if batch_already_complete() {
        debug!("all filter artifacts present, skipping batch");
        return Ok(());
    }

    let graph = Arc::new(read_node_link_graph(canonical)?);
    let out_dir: PathBuf = canonical.with_extension("");
    fs::create_dir_all(&out_dir)?;

    let deadline = Instant::now() + budget;
    let mut joins = Vec::new();
    for task in FilterTask::standard_batch() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let worker_graph = Arc::clone(&graph);
        let worker_dir = out_dir.clone();
        thread::Builder::new()
            .name(format!("filter-{}", task.label()))
            .spawn(move || {
                let outcome = task.execute(&worker_graph, &worker_dir, &worker_token);
                let _ = tx.send(outcome);
            })?;
        joins.push((task.label(), rx, token));
    }

    for (label, rx, token) in joins {
        match rx.recv_timeout(bounded_wait(deadline)) {
            Ok(TaskOutcome::Written { files, secs }) => {
                info!("{}: {} artifact(s) in {:.3}s", label, files, secs);
            }
            Ok(TaskOutcome::UpToDate) => debug!("{}: up to date", label),
            Ok(TaskOutcome::Skipped { reason }) => warn!("{} skipped: {}", label, reason),
            Ok(TaskOutcome::Cancelled) => debug!("{}: cancelled before writing", label),
            Ok(TaskOutcome::Failed(err)) => warn!("{} failed: {}", label, err),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                token.cancel();
                warn!("{} exceeded the batch deadline, abandoned", label);
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                warn!("{} worker died without reporting", label);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use topograph_graph::write_node_link_graph;

    fn canonical_fixture(dir: &Path, edges: &[(&str, &str)]) -> PathBuf {
        let mut graph = FilterGraph::new();
        for &(a, b) in edges {
            graph.add_edge(a, b, None);
        }
        let data_dir = dir.join("data").join("small");
        fs::create_dir_all(&data_dir).unwrap();
        let path = data_dir.join("toy.json");
        write_node_link_graph(&path, &graph).unwrap();
        path
    }

    fn triangle_plus_tail(dir: &Path) -> PathBuf {
        canonical_fixture(dir, &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")])
    }

    #[test]
    fn batch_emits_all_artifacts_for_a_small_graph() {
        let tmp = tempfile::tempdir().unwrap();
        let canonical = triangle_plus_tail(tmp.path());
        run_batch(&canonical, Duration::from_secs(30)).unwrap();

        let out_dir = canonical.with_extension("");
        for name in ["agd", "ecc", "pr_0_85", "fv", "fv_norm", "den_0_5"] {
            assert!(out_dir.join(format!("{}.json", name)).exists(), "{} missing", name);
        }
        // 4-node graph: eigen indices 1..=3 qualify
        for idx in 1..=3 {
            assert!(out_dir.join(format!("ev_{}.json", idx)).exists());
            assert!(out_dir.join(format!("ev_norm_{}.json", idx)).exists());
        }
        for idx in 4..=5 {
            assert!(!out_dir.join(format!("ev_{}.json", idx)).exists());
            assert!(!out_dir.join(format!("ev_norm_{}.json", idx)).exists());
        }
    }

    #[test]
    fn rerun_is_idempotent_byte_for_byte() {
        let tmp = tempfile::tempdir().unwrap();
        let canonical = triangle_plus_tail(tmp.path());
        run_batch(&canonical, Duration::from_secs(30)).unwrap();

        let out_dir = canonical.with_extension("");
        let agd = out_dir.join("agd.json");
        let before = fs::read(&agd).unwrap();
        run_batch(&canonical, Duration::from_secs(30)).unwrap();
        assert_eq!(fs::read(&agd).unwrap(), before);
    }

    #[test]
    fn eigen_gating_on_a_three_node_graph() {
        let tmp = tempfile::tempdir().unwrap();
        let canonical = canonical_fixture(tmp.path(), &[("a", "b"), ("b", "c")]);
        run_batch(&canonical, Duration::from_secs(30)).unwrap();

        let out_dir = canonical.with_extension("");
        assert!(out_dir.join("ev_1.json").exists());
        assert!(out_dir.join("ev_2.json").exists());
        for idx in 3..=5 {
            assert!(!out_dir.join(format!("ev_{}.json", idx)).exists());
        }
    }

    #[test]
    fn waits_shrink_toward_the_floor() {
        let generous = Instant::now() + Duration::from_secs(60);
        assert!(bounded_wait(generous) > Duration::from_secs(55));

        // an exhausted deadline still grants the one-second floor, so a
        // task joined after the budget ran out gets exactly that
        let exhausted = Instant::now();
        assert_eq!(bounded_wait(exhausted), JOIN_FLOOR);
    }

    #[test]
    fn cancelled_task_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut graph = FilterGraph::new();
        graph.add_edge("a", "b", None);
        graph.add_edge("b", "c", None);

        let token = CancellationToken::new();
        token.cancel();
        let task = FilterTask { label: "agd", kind: TaskKind::AverageGeodesic };
        let outcome = task.execute(&graph, tmp.path(), &token);
        assert!(matches!(outcome, TaskOutcome::Cancelled));
        assert!(!tmp.path().join("agd.json").exists());
    }

    #[test]
    fn fiedler_task_declines_disconnected_input_without_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut graph = FilterGraph::new();
        graph.add_edge("a", "b", None);
        graph.add_edge("x", "y", None);

        let token = CancellationToken::new();
        let task = FilterTask { label: "fv", kind: TaskKind::Fiedler { normalized: false } };
        let outcome = task.execute(&graph, tmp.path(), &token);
        assert!(matches!(outcome, TaskOutcome::Skipped { .. }));
        assert!(!tmp.path().join("fv.json").exists());
    }

    #[test]
    fn task_result_files_parse_back_as_filter_results() {
        let tmp = tempfile::tempdir().unwrap();
        let canonical = triangle_plus_tail(tmp.path());
        run_batch(&canonical, Duration::from_secs(30)).unwrap();

        let out_dir = canonical.with_extension("");
        let result: FilterResult =
            topograph_core::read_json(&out_dir.join("pr_0_85.json")).unwrap();
        assert_eq!(result.name, "pagerank");
        assert_eq!(result.parameters.get("alpha"), Some(&json!(0.85)));
        assert_eq!(result.data.len(), 4);
        assert!(result.process_time >= 0.0);
    }
}
