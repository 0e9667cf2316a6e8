//! # Pool de Workers
//! src/pool/mod.rs
//!
//! Número fijo de threads que consumen una `TaskQueue` compartida.
//!
//! ```text
//! accept loop ──push──▶ [ TaskQueue (FIFO, sin límite) ] ──pop──▶ worker-0..N
//! ```
//!
//! Cada worker ejecuta una tarea completa (una conexión con todos sus
//! requests) antes de tomar la siguiente, así que el tamaño del pool acota
//! la cantidad de conexiones procesándose a la vez. Las tareas son valores
//! con dueño: el worker que la toma es el único responsable de liberarla.

pub mod queue;

pub use queue::{QueueClosed, TaskQueue};

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Tarea que ejecuta un worker
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Pool de tamaño fijo definido al arrancar
pub struct WorkerPool {
    queue: TaskQueue<Task>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Crea el pool e inicia `size` workers
    ///
    /// Falla si el sistema no puede crear alguno de los threads.
    pub fn new(size: usize) -> io::Result<Self> {
        let queue = TaskQueue::new();
        let mut workers = Vec::with_capacity(size);

        for i in 0..size {
            let worker_queue = queue.clone();
            let handle = thread::Builder::new()
                .name(format!("worker-{}", i))
                .spawn(move || Self::worker_loop(i, worker_queue));

            match handle {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    queue.close();
                    return Err(e);
                }
            }
        }

        Ok(Self { queue, workers })
    }

    /// Loop principal del worker
    fn worker_loop(id: usize, queue: TaskQueue<Task>) {
        debug!(worker = id, "worker started");

        while let Some(task) = queue.pop() {
            // Un panic en una conexión no debe matar al worker
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                error!(worker = id, "task panicked");
            }
        }

        debug!(worker = id, "worker stopped");
    }

    /// Encola una tarea para el próximo worker libre
    pub fn dispatch<F>(&self, task: F) -> Result<(), QueueClosed<Task>>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(task))
    }

    /// Cantidad de workers
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Tareas aceptadas que todavía esperan un worker
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Cierra la cola y espera a que los workers vacíen las tareas pendientes
    pub fn shutdown(mut self) {
        self.join_all();
    }

    fn join_all(&mut self) {
        self.queue.close();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join_all();
    }
}
