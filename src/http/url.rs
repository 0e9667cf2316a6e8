//! # Utilidades de URL y HTML
//! src/http/url.rs
//!
//! - `UrlParser`: separa path y query string, decodificando `%XX` y `+`
//! - `escape_html`: escapa texto del usuario antes de insertarlo en HTML

use std::collections::HashMap;

/// URI descompuesta en path y argumentos
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Path decodificado (ej: "/static/mi archivo.txt")
    pub path: String,

    /// Argumentos de la query string decodificados
    pub args: HashMap<String, String>,
}

impl ParsedUrl {
    /// Obtiene un argumento específico
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(|s| s.as_str())
    }
}

pub struct UrlParser;

impl UrlParser {
    /// Parsea una URI
    ///
    /// Ejemplo: "/query?terms=foo+bar&x=1"
    /// Retorna: ParsedUrl { path: "/query", args: {"terms": "foo bar", "x": "1"} }
    pub fn parse(uri: &str) -> ParsedUrl {
        let (raw_path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };

        ParsedUrl {
            path: percent_decode(raw_path, false),
            args: query.map(Self::parse_query_string).unwrap_or_default(),
        }
    }

    /// Parsea "a=1&b=2" en un HashMap; un parámetro sin '=' queda con valor vacío
    fn parse_query_string(query: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();

        for param in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = param.split_once('=').unwrap_or((param, ""));
            params.insert(percent_decode(key, true), percent_decode(value, true));
        }

        params
    }
}

/// Decodifica secuencias `%XX`; con `plus_as_space` también `+` → espacio
///
/// Secuencias inválidas se copian tal cual. Bytes que no forman UTF-8
/// válido se reemplazan por U+FFFD.
pub fn percent_decode(s: &str, plus_as_space: bool) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        decoded.push((hi << 4) | lo);
                        i += 3;
                        continue;
                    }
                    _ => decoded.push(b'%'),
                }
            }
            b'+' if plus_as_space => decoded.push(b' '),
            b => decoded.push(b),
        }
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Escapa los caracteres especiales de HTML
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
