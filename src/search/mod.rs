//! # Motor de Búsqueda
//! src/search/mod.rs
//!
//! El router solo conoce el trait `QueryEngine`:
//!
//! ```text
//! ["foo", "bar"] → QueryEngine → [(doc, rank), ...] ordenado por rank desc
//! ```
//!
//! `QueryProcessor` es la implementación sobre uno o más `InvertedIndex`:
//! un documento aparece solo si contiene todas las palabras, y su rank es la
//! suma de las ocurrencias de cada una.

pub mod index;

pub use index::{IndexError, InvertedIndex};

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Un documento encontrado y su relevancia
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub document_name: String,
    pub rank: u32,
}

/// Contrato del motor de búsqueda que consume el router
pub trait QueryEngine: Send + Sync {
    /// `terms` ya viene en minúsculas y tokenizado
    fn process_query(&self, terms: &[String]) -> Vec<QueryResult>;
}

/// Procesa consultas sobre un conjunto de índices (solo lectura)
#[derive(Debug, Default)]
pub struct QueryProcessor {
    indices: Vec<InvertedIndex>,
}

impl QueryProcessor {
    pub fn new(indices: Vec<InvertedIndex>) -> Self {
        Self { indices }
    }

    /// Carga todos los archivos de índice
    pub fn load(paths: &[PathBuf]) -> Result<Self, IndexError> {
        let mut indices = Vec::with_capacity(paths.len());

        for path in paths {
            let index = InvertedIndex::load(path)?;
            info!(
                index = %path.display(),
                words = index.word_count(),
                documents = index.document_count(),
                "index loaded"
            );
            indices.push(index);
        }

        Ok(Self::new(indices))
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Documentos de un índice que contienen todas las palabras
    fn matches_in(index: &InvertedIndex, terms: &[String]) -> BTreeMap<String, u32> {
        let (first, rest) = match terms.split_first() {
            Some(split) => split,
            None => return BTreeMap::new(),
        };

        let mut matches = match index.postings(first) {
            Some(postings) => postings.clone(),
            None => return BTreeMap::new(),
        };

        for term in rest {
            let postings = match index.postings(term) {
                Some(p) => p,
                None => return BTreeMap::new(),
            };

            matches.retain(|doc, _| postings.contains_key(doc));
            for (doc, rank) in matches.iter_mut() {
                *rank += postings[doc];
            }
        }

        matches
    }
}

impl QueryEngine for QueryProcessor {
    fn process_query(&self, terms: &[String]) -> Vec<QueryResult> {
        let mut results: Vec<QueryResult> = self
            .indices
            .iter()
            .flat_map(|index| Self::matches_in(index, terms))
            .map(|(document_name, rank)| QueryResult { document_name, rank })
            .collect();

        results.sort_by(|a, b| {
            b.rank
                .cmp(&a.rank)
                .then_with(|| a.document_name.cmp(&b.document_name))
        });

        results
    }
}
