//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Convierte un bloque de headers (sin el terminador `\r\n\r\n`) en un
//! `Request`. No se modela método, versión ni body.
//!
//! ## Formato
//!
//! ```text
//! GET /query?terms=foo HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Connection: close
//! ```
//!
//! ## Recuperación ante entrada malformada
//!
//! El parser nunca falla:
//! - Request line que no tiene exactamente 3 tokens → URI `/`
//! - Línea de header sin `": "` → se descarta
//! - Header repetido → gana la última ocurrencia

use super::url::{UrlParser, ParsedUrl};
use std::collections::HashMap;

/// URI usada cuando la request line es inválida
pub const DEFAULT_URI: &str = "/";

/// Representa un request HTTP parseado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// URI tal cual llegó en la request line (ej: "/static/a.html")
    uri: String,

    /// Headers con el nombre en minúsculas (ej: {"host": "localhost:8080"})
    headers: HashMap<String, String>,
}

impl Request {
    /// Crea un request vacío para la URI dada
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            headers: HashMap::new(),
        }
    }

    /// Parsea un bloque de headers
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use search_server::http::Request;
    ///
    /// let request = Request::parse_header_block("GET /hello HTTP/1.1\r\nConnection: close");
    ///
    /// assert_eq!(request.uri(), "/hello");
    /// assert_eq!(request.header("connection"), Some("close"));
    /// ```
    pub fn parse_header_block(block: &str) -> Self {
        let mut lines = block
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|line| !line.is_empty());

        // 1. Request line: METHOD URI VERSION
        let uri = lines
            .next()
            .and_then(Self::parse_request_line)
            .unwrap_or(DEFAULT_URI);

        let mut request = Self::new(uri);

        // 2. Headers: "Name: Value", los malformados se ignoran
        for line in lines {
            if let Some((name, value)) = line.split_once(": ") {
                request.add_header(name, value);
            }
        }

        request
    }

    /// Retorna la URI si la línea tiene exactamente tres tokens
    fn parse_request_line(line: &str) -> Option<&str> {
        let tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();

        match tokens.as_slice() {
            [_method, uri, _version] => Some(*uri),
            _ => None,
        }
    }

    /// Agrega un header; el nombre se pasa a minúsculas y pisa al anterior
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header sin importar mayúsculas/minúsculas del nombre
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    /// Indica si el cliente pidió cerrar la conexión (`Connection: close`)
    pub fn wants_close(&self) -> bool {
        self.header("connection") == Some("close")
    }

    /// Path y argumentos decodificados de la URI
    pub fn url(&self) -> ParsedUrl {
        UrlParser::parse(&self.uri)
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new(DEFAULT_URI)
    }
}
