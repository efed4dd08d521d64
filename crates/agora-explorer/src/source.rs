// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph content sources.
//!
//! A source only produces [`GraphData`]; validation and replacement happen
//! in the explorer so a bad delivery never reaches the live graph.

use crate::error::ExplorerError;
use agora_graph::{generate_graph, GenerationParams, GraphData, NodeId};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

/// Supplies `{nodes, links}` for a graph load.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Fetch a complete graph.
    async fn fetch(&self) -> Result<GraphData, ExplorerError>;
}

/// Random connected graph from node count, density and seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProceduralSource {
    /// Generation inputs (sanitized before use).
    pub params: GenerationParams,
}

impl ProceduralSource {
    /// Source for `params`.
    pub fn new(params: GenerationParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl GraphSource for ProceduralSource {
    async fn fetch(&self) -> Result<GraphData, ExplorerError> {
        Ok(generate_graph(self.params))
    }
}

#[derive(Debug, Clone)]
enum Document {
    Inline(Vec<u8>),
    File(PathBuf),
}

/// JSON `{nodes, links}` document, optionally narrowed to one thematic tag.
#[derive(Debug, Clone)]
pub struct JsonSource {
    document: Document,
    tag: Option<String>,
}

impl JsonSource {
    /// Document held in memory.
    pub fn inline(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            document: Document::Inline(bytes.into()),
            tag: None,
        }
    }

    /// Document read from `path` on every fetch.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            document: Document::File(path.into()),
            tag: None,
        }
    }

    /// Keep only nodes whose payload carries `tag`, and the links between them.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    async fn bytes(&self) -> Result<Vec<u8>, ExplorerError> {
        match &self.document {
            Document::Inline(bytes) => Ok(bytes.clone()),
            Document::File(path) => tokio::fs::read(path)
                .await
                .map_err(|e| ExplorerError::GraphSource(format!("{}: {e}", path.display()))),
        }
    }
}

#[async_trait]
impl GraphSource for JsonSource {
    async fn fetch(&self) -> Result<GraphData, ExplorerError> {
        let data = GraphData::from_json(&self.bytes().await?)?;
        Ok(match &self.tag {
            Some(tag) => filter_by_tag(data, tag),
            None => data,
        })
    }
}

/// Restrict `data` to nodes tagged `tag`; links leaving the subset are dropped.
pub fn filter_by_tag(data: GraphData, tag: &str) -> GraphData {
    let nodes: Vec<_> = data
        .nodes
        .into_iter()
        .filter(|n| n.payload.as_ref().is_some_and(|p| p.tags.iter().any(|t| t == tag)))
        .collect();
    let kept: BTreeSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
    let links = data
        .links
        .into_iter()
        .filter(|l| kept.contains(&l.source) && kept.contains(&l.target))
        .collect();
    debug!(tag, nodes = nodes.len(), "graph filtered by tag");
    GraphData { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_graph::{GraphLink, NodePayload, NodeRecord};

    fn tagged(id: &str, tags: &[&str]) -> NodeRecord {
        NodeRecord {
            payload: Some(NodePayload {
                text: format!("quote {id}"),
                author: None,
                tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            }),
            ..NodeRecord::bare(id)
        }
    }

    #[test]
    fn tag_filter_keeps_internal_links_only() {
        let data = GraphData {
            nodes: vec![
                tagged("a", &["love"]),
                tagged("b", &["love", "truth"]),
                tagged("c", &["truth"]),
                NodeRecord::bare("d"),
            ],
            links: vec![
                GraphLink::new("a", "b"),
                GraphLink::new("b", "c"),
                GraphLink::new("a", "d"),
            ],
        };
        let love = filter_by_tag(data, "love");
        let ids: Vec<_> = love.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(love.links, vec![GraphLink::new("a", "b")]);
    }

    #[tokio::test]
    async fn procedural_source_is_deterministic() {
        let params = GenerationParams {
            node_count: 12,
            density: 0.5,
            seed: 42,
        };
        let a = ProceduralSource::new(params).fetch().await.unwrap();
        let b = ProceduralSource::new(params).fetch().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.nodes.len(), 12);
    }

    #[tokio::test]
    async fn inline_json_parses_and_reports_garbage() {
        let ok = JsonSource::inline(r#"{"nodes":[{"id":"x"}],"links":[]}"#)
            .fetch()
            .await
            .unwrap();
        assert_eq!(ok.nodes.len(), 1);

        let err = JsonSource::inline("not json").fetch().await.unwrap_err();
        assert!(matches!(err, ExplorerError::Graph(_)));
    }

    #[tokio::test]
    async fn missing_file_is_a_source_error() {
        let err = JsonSource::file("/definitely/not/here.json")
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::GraphSource(_)));
    }
}
