//! # Módulo HTTP
//!
//! Implementa el framing HTTP/1.1 que necesita el servidor, sin librerías de
//! alto nivel:
//!
//! - Lectura incremental de requests (incluido pipelining)
//! - Parsing tolerante del bloque de headers
//! - Construcción y serialización de responses
//! - Decodificación de URLs y escape de HTML
//!
//! ### Formato de Request
//!
//! ```text
//! GET /query?terms=foo+bar HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! No se soportan bodies en los requests, chunked encoding ni HTTP/2.

pub mod connection; // Buffer por conexión y framing
pub mod request;    // Parsing del bloque de headers
pub mod response;   // Construcción de HTTP responses
pub mod status;     // Códigos de estado HTTP
pub mod url;        // Path, query string y escape HTML

// Re-exportamos los tipos principales para facilitar su uso
pub use connection::Connection;
pub use request::Request;
pub use response::Response;
pub use status::StatusCode;
