//! # Primitivas de I/O confiables
//! src/net/io.rs
//!
//! Envoltorios sobre `Read`/`Write` que reintentan los errores transitorios
//! (`Interrupted`, `WouldBlock`) y las lecturas/escrituras cortas.
//!
//! - `reliable_read`: intenta llenar exactamente `buf.len()` bytes; solo
//!   retorna menos al llegar a EOF.
//! - `read_available`: una sola lectura exitosa (lo que haya disponible).
//! - `reliable_write`: escribe todo el buffer o falla.

use std::io::{self, ErrorKind, Read, Write};

/// Indica si un error es transitorio y debe reintentarse
fn is_transient(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock)
}

/// Lee hasta llenar `buf` o hasta EOF
///
/// Retorna la cantidad de bytes leídos. Un valor menor a `buf.len()`
/// significa que el otro extremo cerró el stream.
///
/// # Ejemplo
/// ```
/// use search_server::net::io::reliable_read;
///
/// let mut src: &[u8] = b"hola mundo";
/// let mut buf = [0u8; 4];
/// assert_eq!(reliable_read(&mut src, &mut buf).unwrap(), 4);
/// assert_eq!(&buf, b"hola");
/// ```
pub fn reliable_read<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;

    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if is_transient(&e) => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(total)
}

/// Hace una única lectura exitosa, reintentando errores transitorios
///
/// Retorna `Ok(0)` solo si el otro extremo cerró la conexión.
pub fn read_available<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if is_transient(&e) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Escribe todo `buf`, reintentando escrituras parciales
///
/// Si el writer deja de aceptar bytes (`Ok(0)`) retorna `WriteZero`.
pub fn reliable_write<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> io::Result<usize> {
    let mut total = 0;

    while total < buf.len() {
        match writer.write(&buf[total..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    format!("wrote {} of {} bytes", total, buf.len()),
                ));
            }
            Ok(n) => total += n,
            Err(e) if is_transient(&e) => continue,
            Err(e) => return Err(e),
        }
    }

    writer.flush()?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader que entrega de a `step` bytes e intercala errores transitorios
    struct Choppy {
        data: Vec<u8>,
        pos: usize,
        step: usize,
        hiccup: bool,
    }

    impl Read for Choppy {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.hiccup = !self.hiccup;
            if self.hiccup {
                return Err(io::Error::new(ErrorKind::Interrupted, "EINTR"));
            }
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Writer que acepta de a `step` bytes y luego se llena
    struct Narrow {
        out: Vec<u8>,
        step: usize,
        capacity: usize,
    }

    impl Write for Narrow {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.capacity - self.out.len();
            let n = self.step.min(buf.len()).min(room);
            self.out.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_reliable_read_retries_short_and_interrupted_reads() {
        let mut src = Choppy { data: b"abcdefghij".to_vec(), pos: 0, step: 3, hiccup: false };
        let mut buf = [0u8; 8];

        assert_eq!(reliable_read(&mut src, &mut buf).unwrap(), 8);
        assert_eq!(&buf, b"abcdefgh");
    }

    #[test]
    fn test_reliable_read_stops_at_eof() {
        let mut src = Choppy { data: b"abc".to_vec(), pos: 0, step: 2, hiccup: false };
        let mut buf = [0u8; 16];

        assert_eq!(reliable_read(&mut src, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn test_read_available_returns_single_chunk() {
        let mut src = Choppy { data: b"abcdef".to_vec(), pos: 0, step: 4, hiccup: false };
        let mut buf = [0u8; 16];

        assert_eq!(read_available(&mut src, &mut buf).unwrap(), 4);
        assert_eq!(read_available(&mut src, &mut buf).unwrap(), 2);
        assert_eq!(read_available(&mut src, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_reliable_write_retries_partial_writes() {
        let mut sink = Narrow { out: Vec::new(), step: 3, capacity: 100 };

        assert_eq!(reliable_write(&mut sink, b"hello world").unwrap(), 11);
        assert_eq!(sink.out, b"hello world");
    }

    #[test]
    fn test_reliable_write_reports_write_zero() {
        let mut sink = Narrow { out: Vec::new(), step: 3, capacity: 5 };

        let err = reliable_write(&mut sink, b"hello world").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteZero);
    }

    #[test]
    fn test_reliable_read_propagates_hard_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::ConnectionReset, "reset"))
            }
        }

        let mut buf = [0u8; 4];
        let err = reliable_read(&mut Broken, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    }
}
