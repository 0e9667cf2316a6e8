//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Decide, por request, a qué colaborador delegar:
//!
//! ```text
//! /static/<archivo>  → FileReader  → 200 + Content-Type | 404
//! cualquier otra URI → QueryEngine → página de búsqueda (siempre 200)
//! ```
//!
//! El router no guarda estado mutable: se comparte entre workers con `Arc`.

pub mod pages;

use crate::files::{content_type_for, FileReader};
use crate::http::{Request, Response, StatusCode};
use crate::search::QueryEngine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Prefijo de las URIs de archivos estáticos
pub const STATIC_PREFIX: &str = "/static/";

/// Marca de una URI que trae una consulta
const QUERY_MARKER: &str = "query?terms=";

/// Tipo de ruta de un request (se usa también como etiqueta de métricas)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    StaticFile,
    Query,
}

impl Route {
    /// Clasifica una URI cruda
    ///
    /// # Ejemplo
    /// ```
    /// use search_server::router::Route;
    ///
    /// assert_eq!(Route::of("/static/logo.png"), Route::StaticFile);
    /// assert_eq!(Route::of("/query?terms=rust"), Route::Query);
    /// assert_eq!(Route::of("/static"), Route::Query);
    /// ```
    pub fn of(uri: &str) -> Self {
        if uri.starts_with(STATIC_PREFIX) {
            Route::StaticFile
        } else {
            Route::Query
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::StaticFile => "static",
            Route::Query => "query",
        }
    }
}

/// Router de archivos estáticos y consultas
pub struct Router {
    static_dir: PathBuf,
    engine: Arc<dyn QueryEngine>,
}

impl Router {
    pub fn new(static_dir: impl Into<PathBuf>, engine: Arc<dyn QueryEngine>) -> Self {
        Self {
            static_dir: static_dir.into(),
            engine,
        }
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Produce la respuesta para un request
    pub fn route(&self, request: &Request) -> Response {
        match Route::of(request.uri()) {
            Route::StaticFile => self.serve_file(request),
            Route::Query => self.serve_query(request),
        }
    }

    fn serve_file(&self, request: &Request) -> Response {
        let url = request.url();
        let file_name = url.path.strip_prefix(STATIC_PREFIX).unwrap_or_default();

        match FileReader::new(&self.static_dir, file_name).read_file() {
            Ok(contents) => Response::new(StatusCode::Ok)
                .with_content_type(content_type_for(file_name))
                .with_body_bytes(contents),
            Err(e) => {
                debug!(file = %file_name, error = %e, "static file not served");
                Response::html(StatusCode::NotFound, &pages::file_not_found(file_name))
            }
        }
    }

    fn serve_query(&self, request: &Request) -> Response {
        let mut response = Response::html(StatusCode::Ok, pages::LANDING_PAGE);

        if let Some(query) = query_terms(request) {
            let terms: Vec<String> = query.split_whitespace().map(str::to_string).collect();
            let results = self.engine.process_query(&terms);
            debug!(query = %query, results = results.len(), "query processed");

            response.append_to_body(&pages::results_section(&query, &results));
        }

        response.append_to_body(pages::PAGE_FOOTER);
        response
    }
}

/// Argumento `terms` normalizado (sin espacios en los bordes, en minúsculas)
///
/// `None` si la URI no trae consulta o la consulta queda vacía.
fn query_terms(request: &Request) -> Option<String> {
    if !request.uri().contains(QUERY_MARKER) {
        return None;
    }

    let url = request.url();
    let query = url.arg("terms")?.trim().to_lowercase();

    if query.is_empty() {
        None
    } else {
        Some(query)
    }
}
