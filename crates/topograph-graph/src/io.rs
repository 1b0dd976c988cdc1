//! Format decoders and canonical node-link storage. Each supported raw
//! format gets a decoder registered in [`DecoderRegistry`]; the ingestor
//! resolves decoders by lowercased file extension.

use crate::{FilterGraph, NodeLinkData};
use std::fs;
use std::path::Path;
use topograph_core::{atomic_write_json, read_json, Result, TopographError};

pub trait GraphDecoder: Send + Sync {
    fn extensions(&self) -> &'static [&'static str];
    fn decode(&self, path: &Path) -> Result<FilterGraph>;
}

fn decode_error(path: &Path, reason: impl Into<String>) -> TopographError {
    TopographError::Decode {
        file: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Node-link JSON, the same shape the canonical tree uses.
pub struct NodeLinkJsonDecoder;

impl GraphDecoder for NodeLinkJsonDecoder {
    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn decode(&self, path: &Path) -> Result<FilterGraph> {
        let bytes = fs::read(path)?;
        let data: NodeLinkData = serde_json::from_slice(&bytes)
            .map_err(|e| decode_error(path, e.to_string()))?;
        Ok(FilterGraph::from_node_link(data))
    }
}

/// Plain-text edge list: one edge per line, whitespace-separated
/// `source target [weight]`, `#` starts a comment. A line with a single
/// token declares an isolated node.
pub struct EdgeListDecoder;

/// Tab-separated edge list with the same row shape as [`EdgeListDecoder`].
pub struct TsvDecoder;

fn parse_edge_list(path: &Path, graph: &mut FilterGraph, split_tabs: bool) -> Result<()> {
    let text = fs::read_to_string(path)?;
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = if split_tabs {
            line.split('\t').map(str::trim).filter(|f| !f.is_empty()).collect()
        } else {
            line.split_whitespace().collect()
        };
        match fields.as_slice() {
            [node] => {
                graph.add_node(node);
            }
            [source, target] => graph.add_edge(source, target, None),
            [source, target, weight, ..] => {
                let value: f64 = weight.parse().map_err(|_| {
                    decode_error(
                        path,
                        format!("line {}: bad edge weight {:?}", line_no + 1, weight),
                    )
                })?;
                graph.add_edge(source, target, Some(value));
            }
            [] => {}
        }
    }
    Ok(())
}

impl GraphDecoder for EdgeListDecoder {
    fn extensions(&self) -> &'static [&'static str] {
        &["graph"]
    }

    fn decode(&self, path: &Path) -> Result<FilterGraph> {
        let mut graph = FilterGraph::new();
        parse_edge_list(path, &mut graph, false)?;
        Ok(graph)
    }
}

impl GraphDecoder for TsvDecoder {
    fn extensions(&self) -> &'static [&'static str] {
        &["tsv"]
    }

    fn decode(&self, path: &Path) -> Result<FilterGraph> {
        let mut graph = FilterGraph::new();
        parse_edge_list(path, &mut graph, true)?;
        Ok(graph)
    }
}

pub struct DecoderRegistry {
    decoders: Vec<Box<dyn GraphDecoder>>,
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self {
            decoders: vec![
                Box::new(NodeLinkJsonDecoder),
                Box::new(EdgeListDecoder),
                Box::new(TsvDecoder),
            ],
        }
    }

    pub fn decoder_for(&self, extension: &str) -> Option<&dyn GraphDecoder> {
        let extension = extension.to_ascii_lowercase();
        self.decoders
            .iter()
            .find(|d| d.extensions().contains(&extension.as_str()))
            .map(|d| d.as_ref())
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.decoder_for(extension).is_some()
    }
}

pub fn read_node_link_graph(path: &Path) -> Result<FilterGraph> {
    let data: NodeLinkData = read_json(path)?;
    Ok(FilterGraph::from_node_link(data))
}

pub fn write_node_link_graph(path: &Path, graph: &FilterGraph) -> Result<()> {
    atomic_write_json(path, &graph.to_node_link())
}
