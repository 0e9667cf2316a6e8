//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta contadores de conexiones y requests en tiempo real. Se comparte
//! entre el loop de `accept` y los workers vía `Arc`.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Máximo de latencias a guardar (para calcular percentiles)
const MAX_LATENCIES: usize = 10_000;

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

/// Datos internos de métricas
#[derive(Default)]
struct MetricsData {
    /// Conexiones aceptadas desde el arranque
    connections_accepted: u64,

    /// Conexiones que un worker está procesando ahora
    active_connections: u64,

    /// Contador total de requests respondidos
    total_requests: u64,

    /// Requests por código de estado
    status_codes: BTreeMap<u16, u64>,

    /// Requests por tipo de ruta ("static", "query")
    requests_per_route: BTreeMap<&'static str, u64>,

    /// Latencias registradas (en microsegundos), ventana deslizante
    latencies: VecDeque<u64>,
}

impl MetricsCollector {
    /// Crea un nuevo collector de métricas
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData::default())),
            start_time: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra una conexión aceptada por el loop principal
    pub fn record_connection(&self) {
        self.lock().connections_accepted += 1;
    }

    /// Un worker tomó una conexión
    pub fn connection_opened(&self) {
        self.lock().active_connections += 1;
    }

    /// Un worker liberó una conexión
    pub fn connection_closed(&self) {
        let mut data = self.lock();
        data.active_connections = data.active_connections.saturating_sub(1);
    }

    /// Registra un request respondido
    pub fn record_request(&self, route: &'static str, status_code: u16, latency: Duration) {
        let mut data = self.lock();

        data.total_requests += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;
        *data.requests_per_route.entry(route).or_insert(0) += 1;

        if data.latencies.len() >= MAX_LATENCIES {
            data.latencies.pop_front();
        }
        data.latencies.push_back(latency.as_micros() as u64);
    }

    /// Obtiene el número de conexiones activas
    pub fn active_connections(&self) -> u64 {
        self.lock().active_connections
    }

    /// Obtiene un snapshot de las métricas
    pub fn get_snapshot(&self) -> MetricsSnapshot {
        let data = self.lock();
        let (p50, p95, p99, avg) = calculate_percentiles(&data.latencies);

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            connections_accepted: data.connections_accepted,
            active_connections: data.active_connections,
            total_requests: data.total_requests,
            status_codes: data.status_codes.clone(),
            requests_per_route: data
                .requests_per_route
                .iter()
                .map(|(route, count)| (route.to_string(), *count))
                .collect(),
            latency_p50_us: p50,
            latency_p95_us: p95,
            latency_p99_us: p99,
            latency_avg_us: avg,
        }
    }

    /// Métricas actuales en formato JSON
    pub fn get_metrics_json(&self) -> String {
        serde_json::to_string(&self.get_snapshot()).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Calcula percentiles de latencia: (p50, p95, p99, promedio)
fn calculate_percentiles(latencies: &VecDeque<u64>) -> (u64, u64, u64, u64) {
    if latencies.is_empty() {
        return (0, 0, 0, 0);
    }

    let mut sorted: Vec<u64> = latencies.iter().copied().collect();
    sorted.sort_unstable();

    let len = sorted.len();
    let p50 = sorted[len * 50 / 100];
    let p95 = sorted[len * 95 / 100];
    let p99 = sorted[len * 99 / 100];
    let avg = sorted.iter().sum::<u64>() / len as u64;

    (p50, p95, p99, avg)
}

/// Snapshot de métricas (para logs y tests)
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub connections_accepted: u64,
    pub active_connections: u64,
    pub total_requests: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub requests_per_route: BTreeMap<String, u64>,
    pub latency_p50_us: u64,
    pub latency_p95_us: u64,
    pub latency_p99_us: u64,
    pub latency_avg_us: u64,
}
