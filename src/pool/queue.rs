//! # Cola FIFO de Tareas
//! src/pool/queue.rs
//!
//! Cola thread-safe sin límite de capacidad: el loop de `accept` encola y
//! los workers desencolan bloqueándose cuando está vacía.
//!
//! Una vez cerrada no acepta más tareas, pero los workers terminan de
//! vaciar las pendientes antes de recibir `None`.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Error al encolar sobre una cola cerrada; devuelve la tarea
pub struct QueueClosed<T>(pub T);

// Las tareas son closures: el Debug no puede exigir `T: Debug`
impl<T> std::fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("QueueClosed(..)")
    }
}

impl<T> std::fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task queue is closed")
    }
}

impl<T> std::error::Error for QueueClosed<T> {}

struct State<T> {
    tasks: VecDeque<T>,
    closed: bool,
}

/// Cola FIFO thread-safe
pub struct TaskQueue<T> {
    state: Arc<Mutex<State<T>>>,

    /// Condvar para notificar cuando hay nuevas tareas o se cierra
    condvar: Arc<Condvar>,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                tasks: VecDeque::new(),
                closed: false,
            })),
            condvar: Arc::new(Condvar::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola una tarea al final
    pub fn push(&self, task: T) -> Result<(), QueueClosed<T>> {
        let mut state = self.lock();

        if state.closed {
            return Err(QueueClosed(task));
        }

        state.tasks.push_back(task);

        // Notificar a un worker esperando
        self.condvar.notify_one();

        Ok(())
    }

    /// Desencola la tarea más antigua
    ///
    /// Bloquea hasta que haya una tarea. Retorna `None` solo cuando la cola
    /// está cerrada y vacía.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();

        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.closed {
                return None;
            }

            state = self.condvar.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_pop(&self) -> Option<T> {
        self.lock().tasks.pop_front()
    }

    /// Cierra la cola y despierta a todos los workers
    pub fn close(&self) {
        self.lock().closed = true;
        self.condvar.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TaskQueue<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            condvar: Arc::clone(&self.condvar),
        }
    }
}
