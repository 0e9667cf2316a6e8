//! # Capa de red
//! src/net/mod.rs
//!
//! - `io`: lecturas/escrituras que reintentan errores transitorios
//! - `socket`: socket de escucha dual-stack y `accept` con resolución de extremos

pub mod io;
pub mod socket;

pub use socket::{AcceptedConnection, AddressFamily, Endpoint, ServerSocket, ShutdownHandle, SocketError};
