// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory [`QuoteLookup`]: cosine similarity over term-frequency vectors
//! of the quotes carried by graph node payloads.

use crate::error::DispatchError;
use crate::ports::{QuoteLookup, QuoteMatch};
use agora_graph::{GraphStore, NodePayload};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

type TermVector = HashMap<String, f32>;

#[derive(Debug, Clone)]
struct Entry {
    payload: NodePayload,
    terms: TermVector,
    norm: f32,
}

/// Quote index rebuilt whenever the graph is replaced.
#[derive(Debug, Default)]
pub struct LexicalQuoteIndex {
    entries: RwLock<Vec<Entry>>,
}

impl LexicalQuoteIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every payload in `graph`.
    pub fn from_graph(graph: &GraphStore) -> Self {
        let index = Self::new();
        index.rebuild(graph);
        index
    }

    /// Index explicit payloads.
    pub fn from_payloads(payloads: impl IntoIterator<Item = NodePayload>) -> Self {
        let index = Self::new();
        index.replace(payloads);
        index
    }

    /// Replace the indexed quotes with those carried by `graph`.
    pub fn rebuild(&self, graph: &GraphStore) {
        self.replace(graph.nodes().filter_map(|n| n.payload().cloned()));
    }

    /// Replace the indexed quotes.
    pub fn replace(&self, payloads: impl IntoIterator<Item = NodePayload>) {
        let entries: Vec<Entry> = payloads
            .into_iter()
            .filter_map(|payload| {
                let terms = term_vector(&payload.text);
                let norm = norm(&terms);
                (norm > 0.0).then_some(Entry {
                    payload,
                    terms,
                    norm,
                })
            })
            .collect();
        debug!(quotes = entries.len(), "quote index rebuilt");
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = entries;
    }

    /// Number of indexed quotes.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Synchronous best match (ties go to the earlier quote).
    pub fn search(&self, query: &str) -> Option<QuoteMatch> {
        let query = term_vector(query);
        let query_norm = norm(&query);
        if query_norm == 0.0 {
            return None;
        }
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut best: Option<(&Entry, f32)> = None;
        for entry in entries.iter() {
            let dot: f32 = query
                .iter()
                .filter_map(|(term, w)| entry.terms.get(term).map(|v| w * v))
                .sum();
            let score = dot / (query_norm * entry.norm);
            let better = match best {
                Some((_, s)) => score > s,
                None => true,
            };
            if score > 0.0 && better {
                best = Some((entry, score));
            }
        }
        best.map(|(entry, score)| QuoteMatch {
            text: entry.payload.text.clone(),
            author: entry.payload.author.clone(),
            tags: entry.payload.tags.clone(),
            score,
        })
    }
}

#[async_trait]
impl QuoteLookup for LexicalQuoteIndex {
    async fn best_match(&self, query: &str) -> Result<Option<QuoteMatch>, DispatchError> {
        Ok(self.search(query))
    }
}

fn term_vector(text: &str) -> TermVector {
    let mut terms = TermVector::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
    {
        *terms.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
    }
    terms
}

fn norm(terms: &TermVector) -> f32 {
    terms.values().map(|v| v * v).sum::<f32>().sqrt()
}
