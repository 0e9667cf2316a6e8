//! # Archivos Estáticos
//! src/files/mod.rs
//!
//! Lectura de archivos bajo un directorio base y mapeo extensión → MIME.
//!
//! Un path que resuelve fuera del directorio base (`..`, symlinks hacia
//! afuera) se rechaza igual que un archivo inexistente.

use crate::net::io::reliable_read;
use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Tamaño de bloque para leer archivos
const READ_BLOCK: usize = 8192;

/// Tabla fija de extensiones conocidas
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("txt", "text/plain"),
    ("js", "text/javascript"),
    ("css", "text/css"),
    ("xml", "text/xml"),
    ("gif", "image/gif"),
];

/// Tipo por defecto para extensiones desconocidas o sin extensión
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Deduce el Content-Type a partir de la extensión del nombre
///
/// # Ejemplo
/// ```
/// use search_server::files::content_type_for;
///
/// assert_eq!(content_type_for("index.html"), "text/html");
/// assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
/// assert_eq!(content_type_for("README"), "application/octet-stream");
/// ```
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return DEFAULT_CONTENT_TYPE,
    };

    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Lector de un archivo relativo a un directorio base
pub struct FileReader<'a> {
    base_dir: &'a Path,
    file_name: &'a str,
}

impl<'a> FileReader<'a> {
    pub fn new(base_dir: &'a Path, file_name: &'a str) -> Self {
        Self { base_dir, file_name }
    }

    /// Lee el archivo completo
    ///
    /// Retorna `PermissionDenied` si el path escapa del directorio base.
    pub fn read_file(&self) -> io::Result<Vec<u8>> {
        let path = self.resolve()?;
        let mut file = File::open(&path)?;

        let mut contents = Vec::new();
        let mut block = vec![0u8; READ_BLOCK];
        loop {
            let n = reliable_read(&mut file, &mut block)?;
            contents.extend_from_slice(&block[..n]);
            if n < block.len() {
                break;
            }
        }

        Ok(contents)
    }

    /// Path canónico del archivo, verificando que quede dentro de la base
    fn resolve(&self) -> io::Result<PathBuf> {
        let base = self.base_dir.canonicalize()?;
        let path = base.join(self.file_name.trim_start_matches('/')).canonicalize()?;

        if !path.starts_with(&base) {
            return Err(io::Error::new(
                ErrorKind::PermissionDenied,
                format!("{} is outside of {}", path.display(), base.display()),
            ));
        }
        if !path.is_file() {
            return Err(io::Error::new(ErrorKind::NotFound, "not a regular file"));
        }

        Ok(path)
    }
}
