//! Bounded, thread-safe FIFO of compressed packets — the jitter buffer
//! between the demuxer and a decoder stage.
//!
//! One `parking_lot::Mutex` guarding a `VecDeque` plus two `Condvar`s
//! (not-empty, not-full). A bounded multi-item queue with two overflow
//! policies, built on the familiar `Arc<(Mutex<T>, Condvar)>` shape.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

use livepull_core::{OverflowPolicy, Packet};

struct Inner {
    queue: VecDeque<Packet>,
    capacity: usize,
    closed: bool,
    dropped: u64,
}

pub struct PacketQueue {
    inner: Mutex<Inner>,
    not_empty: Condvar,
    not_full: Condvar,
    policy: OverflowPolicy,
}

impl PacketQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity.min(256)),
                capacity,
                closed: false,
                dropped: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            policy,
        }
    }

    /// Under `Block`, waits until capacity is available, the queue closes,
    /// or `running` goes false. Under `DropOldest`, evicts the oldest
    /// entries until there is room, then always enqueues. Returns `false`
    /// iff the queue is closed or `running` is false at the moment the
    /// decision to (not) enqueue is made.
    pub fn push(&self, packet: Packet, running: &AtomicBool) -> bool {
        let mut inner = self.inner.lock();
        match self.policy {
            OverflowPolicy::Block => loop {
                if inner.closed || !running.load(Ordering::Relaxed) {
                    return false;
                }
                if inner.queue.len() < inner.capacity {
                    inner.queue.push_back(packet);
                    break;
                }
                self.not_full.wait(&mut inner);
            },
            OverflowPolicy::DropOldest => {
                if inner.closed || !running.load(Ordering::Relaxed) {
                    return false;
                }
                while inner.queue.len() >= inner.capacity {
                    if inner.queue.pop_front().is_some() {
                        inner.dropped += 1;
                    } else {
                        break;
                    }
                }
                inner.queue.push_back(packet);
            }
        }
        drop(inner);
        self.not_empty.notify_one();
        true
    }

    /// Waits until the queue is non-empty, closed, or `running` is false.
    /// Returns `None` once closed/stopped and drained.
    pub fn pop(&self, running: &AtomicBool) -> Option<Packet> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(p) = inner.queue.pop_front() {
                drop(inner);
                self.not_full.notify_one();
                return Some(p);
            }
            if inner.closed || !running.load(Ordering::Relaxed) {
                return None;
            }
            self.not_empty.wait(&mut inner);
        }
    }

    /// Releases all buffered packets and wakes any blocked pusher.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.queue.clear();
        drop(inner);
        self.not_full.notify_all();
    }

    /// No further pushes succeed; pending pops drain what remains and then
    /// return `None`. Wakes every waiter on both condvars.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        drop(inner);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn open(&self) {
        self.inner.lock().closed = false;
    }

    /// Updates capacity; under `DropOldest` immediately trims any excess
    /// from the front.
    pub fn set_max_size(&self, n: usize) {
        let mut inner = self.inner.lock();
        inner.capacity = n;
        if self.policy == OverflowPolicy::DropOldest {
            while inner.queue.len() > inner.capacity {
                if inner.queue.pop_front().is_some() {
                    inner.dropped += 1;
                } else {
                    break;
                }
            }
        }
        drop(inner);
        self.not_full.notify_all();
    }

    pub fn size(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    pub fn is_open(&self) -> bool {
        !self.inner.lock().closed
    }

    pub fn dropped_count(&self) -> u64 {
        self.inner.lock().dropped
    }

    pub fn reset_dropped_count(&self) {
        self.inner.lock().dropped = 0;
    }
}
