//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de búsqueda con soporte para argumentos CLI y
//! variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./search_server --port 5555 \
//!   --static-dir ./test_tree \
//!   --index ./indices/books.idx \
//!   --index ./indices/wiki.idx \
//!   --workers 100
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! SEARCH_PORT=5555 STATIC_DIR=./test_tree SEARCH_INDICES=a.idx,b.idx ./search_server
//! ```
//!
//! ### Construir un índice
//! ```bash
//! ./search_server --build-index ./test_tree/books --out ./indices/books.idx
//! ```

use crate::net::socket::{wildcard_candidates, AddressFamily};
use clap::{ArgAction, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

/// Configuración del servidor de búsqueda
#[derive(Debug, Clone, Parser)]
#[command(name = "search_server")]
#[command(about = "Servidor HTTP/1.1 concurrente de archivos estáticos y búsqueda")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor (0 = lo elige el sistema)
    #[arg(short, long, default_value = "8080", env = "SEARCH_PORT")]
    pub port: u16,

    /// Familia de direcciones pedida; ipv6 es dual-stack con fallback a ipv4
    #[arg(long, value_enum, default_value_t = AddressFamily::Ipv6, env = "SEARCH_FAMILY")]
    pub family: AddressFamily,

    /// Directorio servido bajo /static/
    #[arg(long = "static-dir", default_value = "./static", env = "STATIC_DIR")]
    pub static_dir: PathBuf,

    /// Archivos de índice a cargar (repetible)
    #[arg(long = "index", env = "SEARCH_INDICES", value_delimiter = ',')]
    pub indices: Vec<PathBuf>,

    // === Concurrencia ===

    /// Número de workers (conexiones procesándose a la vez)
    #[arg(long, default_value = "100", env = "WORKERS")]
    pub workers: usize,

    /// Bytes pedidos al socket en cada lectura
    #[arg(long = "read-chunk", default_value = "1024", env = "READ_CHUNK")]
    pub read_chunk: usize,

    /// Desactiva el DNS inverso de clientes y servidor en cada accept
    #[arg(long = "no-reverse-dns", action = ArgAction::SetFalse)]
    pub reverse_dns: bool,

    // === Logging ===

    /// Nivel de log (se ignora si RUST_LOG está definido)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    // === Construcción de índices ===

    /// Construye un índice a partir de este directorio y termina
    #[arg(long = "build-index", requires = "out")]
    pub build_index: Option<PathBuf>,

    /// Archivo destino del índice construido
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección comodín preferida para el bind
    ///
    /// # Ejemplo
    /// ```rust
    /// use search_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address().to_string(), "[::]:8080");
    /// ```
    pub fn address(&self) -> SocketAddr {
        wildcard_candidates(self.family, self.port)[0]
    }

    /// Indica si se pidió el modo de construcción de índice
    pub fn is_build_mode(&self) -> bool {
        self.build_index.is_some()
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if let Some(dir) = &self.build_index {
            if self.out.is_none() {
                return Err("--build-index requires --out".to_string());
            }
            if !dir.is_dir() {
                return Err(format!("Index source {} is not a directory", dir.display()));
            }
            return Ok(());
        }

        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.read_chunk == 0 {
            return Err("Read chunk must be >= 1".to_string());
        }
        if !self.static_dir.is_dir() {
            return Err(format!(
                "Static directory {} is not a directory",
                self.static_dir.display()
            ));
        }
        if let Some(missing) = self.indices.iter().find(|p| !p.is_file()) {
            return Err(format!("Index file {} does not exist", missing.display()));
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        info!("Search server configuration");
        info!("  Address:      {} (family {})", self.address(), self.family);
        info!("  Static dir:   {}", self.static_dir.display());
        info!("  Workers:      {}", self.workers);
        info!("  Read chunk:   {} bytes", self.read_chunk);
        info!("  Reverse DNS:  {}", if self.reverse_dns { "enabled" } else { "disabled" });

        if self.indices.is_empty() {
            info!("  Indices:      none (every query returns no results)");
        } else {
            for index in &self.indices {
                info!("  Index:        {}", index.display());
            }
        }
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            family: AddressFamily::Ipv6,
            static_dir: PathBuf::from("./static"),
            indices: Vec::new(),
            workers: 100,
            read_chunk: 1024,
            reverse_dns: true,
            log_level: "info".to_string(),
            build_index: None,
            out: None,
        }
    }
}
