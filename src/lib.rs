//! # Search Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 concurrente que sirve archivos estáticos y resultados de
//! búsqueda sobre índices invertidos.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `net`: lecturas/escrituras confiables y socket de escucha dual-stack
//! - `http`: framing de requests (pipelining), parsing y responses
//! - `pool`: pool de workers de tamaño fijo sobre una cola FIFO
//! - `files`: lectura de archivos estáticos y tipos MIME
//! - `search`: índice invertido y procesamiento de consultas
//! - `router`: decide entre archivo estático y página de búsqueda
//! - `server`: loop de `accept` y ciclo de vida de cada conexión
//! - `metrics`: contadores de conexiones y requests
//! - `config`: argumentos CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use search_server::config::Config;
//! use search_server::search::QueryProcessor;
//! use search_server::server::Server;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let engine = QueryProcessor::load(&config.indices).unwrap();
//! let server = Server::bind(config, Arc::new(engine)).unwrap();
//! server.run().unwrap();
//! ```

pub mod config;
pub mod files;
pub mod http;
pub mod metrics;
pub mod net;
pub mod pool;
pub mod router;
pub mod search;
pub mod server;
