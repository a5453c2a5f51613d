// Copyright 2025 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded queues of slot indices.
//!
//! A queue constructed with a power-of-two `size` holds at most `size - 1` indices; the spare
//! slot keeps full and empty distinguishable.

use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crossbeam_queue::ArrayQueue;
use crossbeam_utils::CachePadded;

/// A fixed-capacity queue of slot indices with non-blocking operations.
pub trait BoundedQueue: Send + Sync + fmt::Debug + 'static {
    /// Creates a queue for a power-of-two `size`, holding at most `size - 1` indices.
    fn with_capacity(size: usize) -> Self;

    /// Appends `index`; returns `false` if the queue is full.
    fn try_enqueue(&self, index: usize) -> bool;

    /// Removes the next index, if any.
    fn try_dequeue(&self) -> Option<usize>;

    /// Returns the number of queued indices.
    ///
    /// The value is a snapshot and may be stale by the time it is observed.
    fn approx_len(&self) -> usize;
}

/// A lock-free ring for exactly one enqueuing and one dequeuing thread.
///
/// The ring only ever touches atomics. Calling it from more threads than that may lose or
/// repeat indices, but never reads or writes out of bounds.
pub struct SpscRing {
    cells: Box<[AtomicUsize]>,
    mask: usize,
    /// Next position to read; written by the consumer only.
    head: CachePadded<AtomicUsize>,
    /// Next position to write; written by the producer only.
    tail: CachePadded<AtomicUsize>,
}

impl fmt::Debug for SpscRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpscRing")
            .field("size", &self.cells.len())
            .field("len", &self.approx_len())
            .finish()
    }
}

impl BoundedQueue for SpscRing {
    fn with_capacity(size: usize) -> Self {
        assert!(
            size.is_power_of_two(),
            "ring size must be a power of two (actual: {size})"
        );

        let cells = (0..size).map(|_| AtomicUsize::new(usize::MAX)).collect();
        Self {
            cells,
            mask: size - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    fn try_enqueue(&self, index: usize) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= self.mask {
            return false;
        }

        self.cells[tail & self.mask].store(index, Ordering::Relaxed);
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }

    fn try_dequeue(&self) -> Option<usize> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        let index = self.cells[head & self.mask].load(Ordering::Relaxed);
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Some(index)
    }

    fn approx_len(&self) -> usize {
        // head first: tail never falls behind a head observed earlier
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head).min(self.mask)
    }
}

impl BoundedQueue for ArrayQueue<usize> {
    fn with_capacity(size: usize) -> Self {
        assert!(
            size.is_power_of_two() && size >= 2,
            "queue size must be a power of two >= 2 (actual: {size})"
        );
        ArrayQueue::new(size - 1)
    }

    fn try_enqueue(&self, index: usize) -> bool {
        self.push(index).is_ok()
    }

    fn try_dequeue(&self) -> Option<usize> {
        self.pop()
    }

    fn approx_len(&self) -> usize {
        self.len()
    }
}
