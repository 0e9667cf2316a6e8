//! # Conexión HTTP
//! src/http/connection.rs
//!
//! Encapsula un stream y el buffer de bytes todavía no consumidos.
//!
//! ```text
//! buffer: [GET /a ...\r\n\r\n][GET /b ...\r\n\r\n][GET /c ...]
//!          └── next_request #1 ─┘└── next_request #2 ─┘└─ espera más bytes
//! ```
//!
//! Después de cada `next_request` exitoso el buffer contiene solo los bytes
//! posteriores al terminador del request devuelto. Así los requests
//! pipelined salen en orden y sin releer el socket.

use super::{Request, Response};
use crate::net::io::{read_available, reliable_write};
use std::io::{self, Read, Write};
use tracing::debug;

/// Fin del bloque de headers
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Tamaño de lectura por defecto
pub const DEFAULT_READ_CHUNK: usize = 1024;

/// Conexión con un cliente; el stream se cierra al hacer drop
pub struct Connection<S> {
    stream: S,
    buffer: Vec<u8>,
    read_chunk: usize,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self::with_read_chunk(stream, DEFAULT_READ_CHUNK)
    }

    pub fn with_read_chunk(stream: S, read_chunk: usize) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
            read_chunk: read_chunk.max(1),
        }
    }

    /// Lee y parsea el próximo request
    ///
    /// Si el buffer ya tiene un bloque completo no se lee del socket.
    /// Retorna `None` si la lectura falla o el cliente cierra antes de
    /// completar un bloque (un request truncado nunca se devuelve).
    pub fn next_request(&mut self) -> Option<Request> {
        let pos = self.fill_until_terminator()?;

        let block = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
        let request = Request::parse_header_block(&block);

        self.buffer.drain(..pos + HEADER_TERMINATOR.len());

        Some(request)
    }

    /// Lee hasta que aparece el terminador; retorna su posición
    fn fill_until_terminator(&mut self) -> Option<usize> {
        let mut scanned = 0;
        let mut chunk = vec![0u8; self.read_chunk];

        loop {
            if let Some(pos) = find_terminator(&self.buffer, scanned) {
                return Some(pos);
            }
            // El terminador puede quedar partido entre dos lecturas
            scanned = self.buffer.len().saturating_sub(HEADER_TERMINATOR.len() - 1);

            match read_available(&mut self.stream, &mut chunk) {
                Ok(0) => {
                    if !self.buffer.is_empty() {
                        debug!(pending = self.buffer.len(), "peer closed mid-request");
                    }
                    return None;
                }
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    debug!(error = %e, "read failed");
                    return None;
                }
            }
        }
    }

    /// Serializa y escribe la respuesta completa
    ///
    /// Un error (incluida una escritura corta) implica cerrar la conexión.
    pub fn write_response(&mut self, response: &Response) -> io::Result<()> {
        let bytes = response.to_bytes();
        reliable_write(&mut self.stream, &bytes)?;
        Ok(())
    }

    /// Bytes recibidos que todavía no forman parte de un request devuelto
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Busca `\r\n\r\n` a partir de `from`
fn find_terminator(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
        .map(|p| p + from)
}
