//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! El thread principal solo acepta conexiones y las encola; cada conexión
//! la procesa completa un worker del pool:
//!
//! ```text
//! accept ──▶ WorkerPool ──▶ next_request ─▶ Router ─▶ write_response ─┐
//!                               ▲                                     │
//!                               └──────────── keep-alive ─────────────┘
//! ```

pub mod tcp;

pub use tcp::{handle_connection, Server};

use crate::net::SocketError;
use std::fmt;
use std::io;

/// Errores que impiden arrancar o mantener el servidor
#[derive(Debug)]
pub enum ServerError {
    /// Configuración inválida
    Config(String),

    /// No se pudo crear el socket de escucha
    Socket(SocketError),

    /// No se pudieron crear los threads del pool
    Pool(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            ServerError::Socket(e) => write!(f, "{}", e),
            ServerError::Pool(e) => write!(f, "Couldn't start the worker pool: {}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Config(_) => None,
            ServerError::Socket(e) => Some(e),
            ServerError::Pool(e) => Some(e),
        }
    }
}

impl From<SocketError> for ServerError {
    fn from(e: SocketError) -> Self {
        ServerError::Socket(e)
    }
}
