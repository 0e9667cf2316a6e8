//! # Socket de escucha dual-stack
//! src/net/socket.rs
//!
//! Crea el socket de escucha (IPv6 aceptando direcciones IPv4-mapeadas cuando
//! es posible) y acepta conexiones resolviendo la información de ambos
//! extremos: dirección, puerto y nombre DNS del cliente, y la dirección local
//! del servidor tal como la ve esa conexión en particular.
//!
//! ## Fallback de familia
//!
//! ```text
//! Ipv6 pedido → [::]:port (V6ONLY=0) → 0.0.0.0:port
//! Ipv4 pedido → 0.0.0.0:port
//! ```
//!
//! La familia efectivamente usada queda registrada en `ServerSocket::family()`.

use socket2::{Domain, Protocol, Socket, Type};
use std::fmt;
use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, SocketAddrV4, SocketAddrV6, TcpStream};
use std::sync::Arc;
use tracing::{debug, warn};

/// Largo máximo de un hostname devuelto por getnameinfo (NI_MAXHOST)
const HOST_LEN: usize = 1025;

/// Familia de direcciones para el bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AddressFamily {
    /// IPv4 únicamente
    Ipv4,

    /// IPv6 dual-stack (acepta clientes IPv4 como `::ffff:a.b.c.d`)
    Ipv6,
}

impl AddressFamily {
    /// Dirección comodín de esta familia
    fn wildcard(self, port: u16) -> SocketAddr {
        match self {
            AddressFamily::Ipv4 => SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)),
            AddressFamily::Ipv6 => SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, port, 0, 0)),
        }
    }

    fn of(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => AddressFamily::Ipv4,
            SocketAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "ipv4"),
            AddressFamily::Ipv6 => write!(f, "ipv6"),
        }
    }
}

/// Errores del socket de escucha
#[derive(Debug)]
pub enum SocketError {
    /// Ningún candidato pudo hacer bind
    Bind(io::Error),

    /// Falló `listen()` sobre el socket ya enlazado
    Listen(io::Error),

    /// Falló `accept()` (o la consulta de direcciones de la conexión)
    Accept(io::Error),
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketError::Bind(e) => write!(f, "Couldn't bind the listening socket: {}", e),
            SocketError::Listen(e) => write!(f, "Couldn't listen on the socket: {}", e),
            SocketError::Accept(e) => write!(f, "Accept failed: {}", e),
        }
    }
}

impl std::error::Error for SocketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SocketError::Bind(e) | SocketError::Listen(e) | SocketError::Accept(e) => Some(e),
        }
    }
}

/// Un extremo de la conexión: dirección numérica, puerto y nombre DNS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: String,
    pub port: u16,
    pub dns_name: String,
}

impl Endpoint {
    /// Construye el endpoint; si `reverse_dns` es falso el nombre es la IP
    pub fn resolve(sockaddr: &SocketAddr, reverse_dns: bool) -> Self {
        let addr = sockaddr.ip().to_string();
        let dns_name = if reverse_dns {
            lookup_name(sockaddr).unwrap_or_else(|| addr.clone())
        } else {
            addr.clone()
        };

        Self {
            addr,
            port: sockaddr.port(),
            dns_name,
        }
    }
}

/// Conexión recién aceptada junto con la información de ambos extremos
#[derive(Debug)]
pub struct AcceptedConnection {
    pub stream: TcpStream,
    pub client: Endpoint,
    pub server: Endpoint,
}

/// Socket de escucha del servidor
pub struct ServerSocket {
    socket: Arc<Socket>,
    family: AddressFamily,
    local_addr: SocketAddr,
    reverse_dns: bool,
}

impl ServerSocket {
    /// Crea el socket, hace bind y lo pone a escuchar
    ///
    /// Prueba cada candidato en orden; el primero que logra `bind` gana.
    /// Si ninguno lo logra, el servidor no puede arrancar.
    pub fn bind_and_listen(family: AddressFamily, port: u16) -> Result<Self, SocketError> {
        let mut last_err = io::Error::new(ErrorKind::AddrNotAvailable, "no candidate address");
        let mut bound = None;

        for candidate in wildcard_candidates(family, port) {
            match Self::try_bind(&candidate) {
                Ok(socket) => {
                    bound = Some((socket, candidate));
                    break;
                }
                Err(e) => {
                    debug!(address = %candidate, error = %e, "bind candidate failed");
                    last_err = e;
                }
            }
        }

        let (socket, candidate) = bound.ok_or(SocketError::Bind(last_err))?;

        socket.listen(libc::SOMAXCONN).map_err(SocketError::Listen)?;

        let local_addr = socket
            .local_addr()
            .ok()
            .and_then(|a| a.as_socket())
            .unwrap_or(candidate);

        let actual = AddressFamily::of(&candidate);
        if actual != family {
            warn!(requested = %family, actual = %actual, "fell back to another address family");
        }

        Ok(Self {
            socket: Arc::new(socket),
            family: actual,
            local_addr,
            reverse_dns: true,
        })
    }

    fn try_bind(addr: &SocketAddr) -> io::Result<Socket> {
        let socket = Socket::new(Domain::for_address(*addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        if addr.is_ipv6() {
            socket.set_only_v6(false)?;
        }
        socket.bind(&(*addr).into())?;
        Ok(socket)
    }

    /// Activa o desactiva la resolución DNS inversa en `accept`
    pub fn with_reverse_dns(mut self, enabled: bool) -> Self {
        self.reverse_dns = enabled;
        self
    }

    /// Familia efectivamente usada en el bind
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Puerto local (útil cuando se pidió el puerto 0)
    pub fn local_port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle para cerrar el socket desde otro thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            socket: Arc::clone(&self.socket),
        }
    }

    /// Bloquea hasta que llegue una conexión
    ///
    /// Los errores transitorios (`EINTR`, `EAGAIN`) se reintentan. Cualquier
    /// otro error se reporta: el loop principal lo toma como señal de apagado.
    ///
    /// La dirección local se consulta sobre el socket aceptado (no sobre el
    /// de escucha) porque en dual-stack varía según cómo conectó el cliente.
    pub fn accept(&self) -> Result<AcceptedConnection, SocketError> {
        let (conn, peer) = loop {
            match self.socket.accept() {
                Ok(pair) => break pair,
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => continue,
                Err(e) => return Err(SocketError::Accept(e)),
            }
        };

        let peer = peer.as_socket().ok_or_else(|| {
            SocketError::Accept(io::Error::new(ErrorKind::InvalidData, "peer is not an IP socket"))
        })?;

        let local = conn
            .local_addr()
            .map_err(SocketError::Accept)?
            .as_socket()
            .ok_or_else(|| {
                SocketError::Accept(io::Error::new(ErrorKind::InvalidData, "local end is not an IP socket"))
            })?;

        Ok(AcceptedConnection {
            stream: conn.into(),
            client: Endpoint::resolve(&peer, self.reverse_dns),
            server: Endpoint::resolve(&local, self.reverse_dns),
        })
    }
}

/// Cierra el socket de escucha; el `accept` bloqueado falla y el loop termina
///
/// Depende de Linux: ahí `shutdown` sobre un socket en escucha despierta al
/// `accept` bloqueado con un error. En macOS y los BSD la llamada devuelve
/// `ENOTCONN` y el `accept` sigue bloqueado hasta la próxima conexión.
#[derive(Clone)]
pub struct ShutdownHandle {
    socket: Arc<Socket>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if let Err(e) = self.socket.shutdown(Shutdown::Both) {
            debug!(error = %e, "listening socket shutdown");
        }
    }
}

/// Direcciones comodín a probar, en orden de preferencia
pub fn wildcard_candidates(family: AddressFamily, port: u16) -> Vec<SocketAddr> {
    match family {
        AddressFamily::Ipv6 => vec![
            AddressFamily::Ipv6.wildcard(port),
            AddressFamily::Ipv4.wildcard(port),
        ],
        AddressFamily::Ipv4 => vec![AddressFamily::Ipv4.wildcard(port)],
    }
}

/// DNS inverso vía getnameinfo
///
/// Sin `NI_NAMEREQD`, getnameinfo devuelve la forma numérica cuando no hay
/// nombre registrado. `None` solo si la llamada falla.
fn lookup_name(addr: &SocketAddr) -> Option<String> {
    let mut host = [0 as libc::c_char; HOST_LEN];

    // SAFETY: las estructuras se inicializan en cero y se completan campo a
    // campo; getnameinfo escribe a lo sumo HOST_LEN bytes terminados en NUL.
    let rc = unsafe {
        match addr {
            SocketAddr::V4(a) => {
                let mut raw: libc::sockaddr_in = std::mem::zeroed();
                raw.sin_family = libc::AF_INET as libc::sa_family_t;
                raw.sin_port = a.port().to_be();
                raw.sin_addr = libc::in_addr {
                    s_addr: u32::from_ne_bytes(a.ip().octets()),
                };
                libc::getnameinfo(
                    (&raw as *const libc::sockaddr_in).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
                    host.as_mut_ptr(),
                    HOST_LEN as _,
                    std::ptr::null_mut(),
                    0,
                    0,
                )
            }
            SocketAddr::V6(a) => {
                let mut raw: libc::sockaddr_in6 = std::mem::zeroed();
                raw.sin6_family = libc::AF_INET6 as libc::sa_family_t;
                raw.sin6_port = a.port().to_be();
                raw.sin6_flowinfo = a.flowinfo();
                raw.sin6_scope_id = a.scope_id();
                raw.sin6_addr = libc::in6_addr {
                    s6_addr: a.ip().octets(),
                };
                libc::getnameinfo(
                    (&raw as *const libc::sockaddr_in6).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
                    host.as_mut_ptr(),
                    HOST_LEN as _,
                    std::ptr::null_mut(),
                    0,
                    0,
                )
            }
        }
    };

    if rc != 0 {
        return None;
    }

    // SAFETY: getnameinfo terminó con éxito, `host` contiene un string C válido
    let name = unsafe { std::ffi::CStr::from_ptr(host.as_ptr()) };
    Some(name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::thread;

    #[test]
    fn test_candidates_ipv6_falls_back_to_ipv4() {
        let candidates = wildcard_candidates(AddressFamily::Ipv6, 8080);
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].is_ipv6());
        assert!(candidates[1].is_ipv4());
        assert!(candidates.iter().all(|c| c.port() == 8080 && c.ip().is_unspecified()));
    }

    #[test]
    fn test_candidates_ipv4_only() {
        let candidates = wildcard_candidates(AddressFamily::Ipv4, 9000);
        assert_eq!(candidates, vec!["0.0.0.0:9000".parse::<SocketAddr>().unwrap()]);
    }

    #[test]
    fn test_endpoint_without_reverse_dns_uses_numeric_name() {
        let addr: SocketAddr = "127.0.0.1:4242".parse().unwrap();
        let endpoint = Endpoint::resolve(&addr, false);

        assert_eq!(endpoint.addr, "127.0.0.1");
        assert_eq!(endpoint.port, 4242);
        assert_eq!(endpoint.dns_name, "127.0.0.1");
    }

    #[test]
    fn test_endpoint_mapped_ipv4_keeps_ipv6_form() {
        let addr: SocketAddr = "[::ffff:127.0.0.1]:80".parse().unwrap();
        let endpoint = Endpoint::resolve(&addr, false);

        assert_eq!(endpoint.addr, "::ffff:127.0.0.1");
        assert_eq!(endpoint.port, 80);
    }

    #[test]
    fn test_lookup_name_loopback() {
        let addr: SocketAddr = "127.0.0.1:80".parse().unwrap();
        let name = lookup_name(&addr).expect("getnameinfo");
        assert!(!name.is_empty());
    }

    #[test]
    fn test_bind_accept_reports_both_ends() {
        let server = ServerSocket::bind_and_listen(AddressFamily::Ipv4, 0)
            .unwrap()
            .with_reverse_dns(false);
        let port = server.local_port();
        assert_ne!(port, 0);
        assert_eq!(server.family(), AddressFamily::Ipv4);

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
            stream.write_all(b"ping").unwrap();
            stream.local_addr().unwrap().port()
        });

        let mut accepted = server.accept().unwrap();
        let client_port = client.join().unwrap();

        assert_eq!(accepted.client.addr, "127.0.0.1");
        assert_eq!(accepted.client.port, client_port);
        assert_eq!(accepted.server.addr, "127.0.0.1");
        assert_eq!(accepted.server.port, port);

        let mut buf = [0u8; 4];
        accepted.stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[test]
    fn test_dual_stack_accepts_ipv4_client() {
        let server = match ServerSocket::bind_and_listen(AddressFamily::Ipv6, 0) {
            Ok(s) => s.with_reverse_dns(false),
            Err(_) => return, // host sin soporte de sockets
        };
        let port = server.local_port();

        let client = thread::spawn(move || TcpStream::connect(("127.0.0.1", port)).unwrap());
        let accepted = server.accept().unwrap();
        drop(client.join().unwrap());

        match server.family() {
            AddressFamily::Ipv6 => assert_eq!(accepted.client.addr, "::ffff:127.0.0.1"),
            AddressFamily::Ipv4 => assert_eq!(accepted.client.addr, "127.0.0.1"),
        }
    }

    #[test]
    fn test_shutdown_unblocks_accept() {
        let server = ServerSocket::bind_and_listen(AddressFamily::Ipv4, 0).unwrap();
        let handle = server.shutdown_handle();

        let waiter = thread::spawn(move || server.accept().is_err());
        thread::sleep(std::time::Duration::from_millis(50));
        handle.shutdown();

        assert!(waiter.join().unwrap());
    }
}
