//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Loop de `accept` + pool de workers de tamaño fijo. Cada worker procesa
//! una conexión completa (todos sus requests) antes de tomar la siguiente.

use crate::config::Config;
use crate::http::Connection;
use crate::metrics::MetricsCollector;
use crate::net::{AcceptedConnection, Endpoint, ServerSocket, ShutdownHandle};
use crate::pool::WorkerPool;
use crate::router::{Route, Router};
use crate::search::QueryEngine;
use super::ServerError;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Servidor HTTP/1.1 de archivos estáticos y búsqueda
pub struct Server {
    config: Config,
    socket: ServerSocket,
    router: Arc<Router>,
    metrics: Arc<MetricsCollector>,
}

impl Server {
    /// Valida la configuración y crea el socket de escucha
    ///
    /// El servidor todavía no acepta conexiones: eso empieza en `run()`.
    pub fn bind(config: Config, engine: Arc<dyn QueryEngine>) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let socket = ServerSocket::bind_and_listen(config.family, config.port)?
            .with_reverse_dns(config.reverse_dns);
        info!(address = %socket.local_addr(), family = %socket.family(), "listening");

        let router = Router::new(config.static_dir.clone(), engine);
        info!(static_dir = %router.static_dir().display(), "serving static files");

        Ok(Self {
            config,
            socket,
            router: Arc::new(router),
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Puerto efectivo (el elegido por el sistema si se pidió 0)
    pub fn local_port(&self) -> u16 {
        self.socket.local_port()
    }

    /// Handle para detener `run()` desde otro thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.socket.shutdown_handle()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// Acepta conexiones hasta que `accept` falle
    ///
    /// Un fallo de `accept` (por ejemplo tras `ShutdownHandle::shutdown`) es
    /// un apagado intencional: se deja de aceptar, los workers terminan las
    /// conexiones pendientes y `run()` retorna `Ok`.
    pub fn run(self) -> Result<(), ServerError> {
        let pool = WorkerPool::new(self.config.workers).map_err(ServerError::Pool)?;
        info!(workers = pool.size(), "accepting connections");

        loop {
            let accepted = match self.socket.accept() {
                Ok(accepted) => accepted,
                Err(e) => {
                    info!(error = %e, "accept loop stopped");
                    break;
                }
            };

            self.metrics.record_connection();

            let router = Arc::clone(&self.router);
            let metrics = Arc::clone(&self.metrics);
            let read_chunk = self.config.read_chunk;

            let dispatched = pool.dispatch(move || {
                let AcceptedConnection { stream, client, server } = accepted;
                info!(
                    client = %client.dns_name,
                    client_addr = %client.addr,
                    port = client.port,
                    server = %server.dns_name,
                    server_addr = %server.addr,
                    "client connected"
                );
                handle_connection(stream, &client, &router, &metrics, read_chunk);
            });

            if dispatched.is_err() {
                warn!("worker pool closed, dropping connection");
                break;
            }
            debug!(pending = pool.pending(), "connection queued");
        }

        pool.shutdown();
        info!(metrics = %self.metrics.get_metrics_json(), "server stopped");
        Ok(())
    }
}

/// Marca la conexión como activa mientras viva
struct ActiveConnection<'a>(&'a MetricsCollector);

impl<'a> ActiveConnection<'a> {
    fn open(metrics: &'a MetricsCollector) -> Self {
        metrics.connection_opened();
        Self(metrics)
    }
}

impl Drop for ActiveConnection<'_> {
    fn drop(&mut self) {
        self.0.connection_closed();
    }
}

/// Procesa todos los requests de una conexión
///
/// ```text
/// OPEN ─ next_request ─┬─ Some(req) ─ route ─ write ─┬─ Ok, sin "close" ─▶ OPEN
///                      │                              ├─ Ok, "close"     ─▶ CLOSED
///                      │                              └─ Err             ─▶ CLOSED
///                      └─ None ─────────────────────────────────────────▶ CLOSED
/// ```
///
/// Un request con `Connection: close` recibe su respuesta antes del cierre.
///
/// El stream se cierra al retornar (drop), por cualquier camino.
pub fn handle_connection<S: Read + Write>(
    stream: S,
    client: &Endpoint,
    router: &Router,
    metrics: &MetricsCollector,
    read_chunk: usize,
) {
    let _active = ActiveConnection::open(metrics);
    let mut connection = Connection::with_read_chunk(stream, read_chunk);

    loop {
        let request = match connection.next_request() {
            Some(request) => request,
            None => {
                debug!(client = %client.addr, port = client.port, "client disconnected");
                break;
            }
        };

        let start = Instant::now();
        let route = Route::of(request.uri());
        let response = router.route(&request);
        let status = response.status_code();

        if let Err(e) = connection.write_response(&response) {
            debug!(client = %client.addr, error = %e, "write failed, closing");
            break;
        }

        debug!(uri = %request.uri(), status, route = route.as_str(), "request served");
        metrics.record_request(route.as_str(), status, start.elapsed());

        if request.wants_close() {
            debug!(client = %client.addr, port = client.port, "client asked to close");
            break;
        }
    }
}
