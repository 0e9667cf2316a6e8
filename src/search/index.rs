//! # Índice Invertido
//! src/search/index.rs
//!
//! palabra → (documento → cantidad de ocurrencias)
//!
//! Se persiste como JSON:
//!
//! ```json
//! {"words": {"rust": {"docs/intro.txt": 3, "faq.html": 1}}}
//! ```
//!
//! y se construye recorriendo un directorio de archivos de texto.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Secuencias de letras: lo que cuenta como palabra al indexar
const WORD_PATTERN: &str = r"\p{Alphabetic}+";

/// Errores al cargar, guardar o construir un índice
#[derive(Debug)]
pub enum IndexError {
    /// Error de lectura/escritura
    Io(io::Error),

    /// JSON inválido
    Format(serde_json::Error),

    /// Patrón de tokenización inválido
    Pattern(regex::Error),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Io(e) => write!(f, "Index I/O error: {}", e),
            IndexError::Format(e) => write!(f, "Invalid index file: {}", e),
            IndexError::Pattern(e) => write!(f, "Invalid tokenizer pattern: {}", e),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::Io(e) => Some(e),
            IndexError::Format(e) => Some(e),
            IndexError::Pattern(e) => Some(e),
        }
    }
}

impl From<io::Error> for IndexError {
    fn from(e: io::Error) -> Self {
        IndexError::Io(e)
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(e: serde_json::Error) -> Self {
        IndexError::Format(e)
    }
}

impl From<regex::Error> for IndexError {
    fn from(e: regex::Error) -> Self {
        IndexError::Pattern(e)
    }
}

/// Índice invertido de un conjunto de documentos
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    words: BTreeMap<String, BTreeMap<String, u32>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carga un índice desde un archivo JSON
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Guarda el índice (escritura atómica vía archivo temporal + rename)
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let temp_path = path.with_extension("tmp");
        let mut writer = BufWriter::new(File::create(&temp_path)?);

        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;

        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Construye el índice recorriendo `root` recursivamente
    ///
    /// Los nombres de documento son paths relativos a `root` con `/`.
    pub fn build_from_dir(root: &Path) -> Result<Self, IndexError> {
        let tokenizer = Regex::new(WORD_PATTERN)?;
        let mut index = Self::new();
        index.crawl(root, root, &tokenizer)?;
        Ok(index)
    }

    fn crawl(&mut self, root: &Path, dir: &Path, tokenizer: &Regex) -> Result<(), IndexError> {
        let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                self.crawl(root, &path, tokenizer)?;
            } else if file_type.is_file() {
                let bytes = fs::read(&path)?;
                let text = String::from_utf8_lossy(&bytes);
                let name = document_name(root, &path);
                debug!(document = %name, "indexing");
                self.add_document(&name, &text, tokenizer);
            }
        }

        Ok(())
    }

    /// Agrega las palabras de un documento (en minúsculas)
    pub fn add_document(&mut self, name: &str, text: &str, tokenizer: &Regex) {
        for word in tokenizer.find_iter(text) {
            let word = word.as_str().to_lowercase();
            *self
                .words
                .entry(word)
                .or_default()
                .entry(name.to_string())
                .or_insert(0) += 1;
        }
    }

    /// Documentos que contienen la palabra, con su cantidad de ocurrencias
    pub fn postings(&self, word: &str) -> Option<&BTreeMap<String, u32>> {
        self.words.get(word)
    }

    /// Cantidad de palabras distintas
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Cantidad de documentos distintos
    pub fn document_count(&self) -> usize {
        let mut docs: Vec<&String> = self.words.values().flat_map(|p| p.keys()).collect();
        docs.sort();
        docs.dedup();
        docs.len()
    }
}

/// Path relativo a `root`, siempre con `/`
fn document_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
