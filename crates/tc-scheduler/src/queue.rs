//! `CommandQueue` — thread-safe priority queue feeding the allocation worker.
//!
//! Any thread may [`push`](CommandQueue::push); pushing never blocks beyond
//! the short critical section of the heap insert.  The worker either polls
//! with [`try_pop`](CommandQueue::try_pop) or parks on
//! [`pop_blocking`](CommandQueue::pop_blocking) until a command arrives or
//! the queue is shut down.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use parking_lot::{Condvar, Mutex};

use tc_core::ClientId;

use crate::{AllocatorCommand, CommandKind};

#[derive(Default)]
struct Inner {
    heap:     BinaryHeap<Reverse<AllocatorCommand>>,
    next_seq: u64,
    shutdown: bool,
}

/// Min-ordered queue of [`AllocatorCommand`]s.
#[derive(Default)]
pub struct CommandQueue {
    inner:     Mutex<Inner>,
    available: Condvar,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a command for `client` and wake the worker.
    pub fn push(&self, kind: CommandKind, client: ClientId) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let command = AllocatorCommand::new(kind, client, seq);
        tracing::trace!(%command, "command queued");
        inner.heap.push(Reverse(command));
        drop(inner);
        self.available.notify_one();
    }

    /// The highest-priority command, if any.
    pub fn try_pop(&self) -> Option<AllocatorCommand> {
        self.inner.lock().heap.pop().map(|Reverse(c)| c)
    }

    /// Wait for the next command.  Returns `None` once the queue is shut down;
    /// commands still queued at that point are dropped.
    pub fn pop_blocking(&self) -> Option<AllocatorCommand> {
        let mut inner = self.inner.lock();
        loop {
            if inner.shutdown {
                return None;
            }
            if let Some(Reverse(command)) = inner.heap.pop() {
                return Some(command);
            }
            self.available.wait(&mut inner);
        }
    }

    /// Discard every queued command of `client`.  Returns how many were dropped.
    pub fn purge(&self, client: &ClientId) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.heap.len();
        inner.heap.retain(|Reverse(c)| &c.client != client);
        before - inner.heap.len()
    }

    /// Stop the worker.  Idempotent.
    pub fn shutdown(&self) {
        self.inner.lock().shutdown = true;
        self.available.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().shutdown
    }

    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }
}
