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

//! Producer/consumer disciplines.
//!
//! A discipline declares how many threads may enqueue into and dequeue from each of the pool's
//! two queues at the same time, and picks the queue implementation accordingly. The same
//! discipline governs the free queue (`release` enqueues, `acquire` dequeues) and the ready queue
//! (`produce` enqueues, `consume_*` dequeues). When the thread pattern differs between the two
//! queues, choose [`Mpmc`].

use crossbeam_queue::ArrayQueue;

use crate::queue::BoundedQueue;
use crate::queue::SpscRing;

mod sealed {
    pub trait Sealed {}
}

/// The runtime name of a [`Discipline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisciplineKind {
    /// Single producer, single consumer.
    Spsc,
    /// Multiple producers, single consumer.
    Mpsc,
    /// Single producer, multiple consumers.
    Spmc,
    /// Multiple producers, multiple consumers.
    Mpmc,
}

/// A producer/consumer discipline, fixed for the lifetime of a pool as a type parameter.
///
/// This trait is sealed.
pub trait Discipline: sealed::Sealed + Send + Sync + 'static {
    /// The queue implementation for this discipline.
    type Queue: BoundedQueue;

    /// The runtime name of this discipline.
    const KIND: DisciplineKind;
}

/// Single producer, single consumer. Resources are handed off in FIFO order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spsc;

/// Multiple producers, single consumer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mpsc;

/// Single producer, multiple consumers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spmc;

/// Multiple producers, multiple consumers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mpmc;

impl sealed::Sealed for Spsc {}
impl sealed::Sealed for Mpsc {}
impl sealed::Sealed for Spmc {}
impl sealed::Sealed for Mpmc {}

impl Discipline for Spsc {
    type Queue = SpscRing;
    const KIND: DisciplineKind = DisciplineKind::Spsc;
}

// The MPMC array queue is correct for every pattern that restricts one of the sides.
impl Discipline for Mpsc {
    type Queue = ArrayQueue<usize>;
    const KIND: DisciplineKind = DisciplineKind::Mpsc;
}

impl Discipline for Spmc {
    type Queue = ArrayQueue<usize>;
    const KIND: DisciplineKind = DisciplineKind::Spmc;
}

impl Discipline for Mpmc {
    type Queue = ArrayQueue<usize>;
    const KIND: DisciplineKind = DisciplineKind::Mpmc;
}
