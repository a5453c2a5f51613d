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

use crate::ConsumeMode;

/// An error raised while constructing a [`Pool`](crate::Pool).
///
/// Construction errors are programming errors rather than retryable conditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The requested size is not a power of two greater than or equal to 4.
    #[error("size must be a power of two and >= 4 (actual: {size})")]
    InvalidSize {
        /// The rejected size.
        size: usize,
    },
    /// Seeding the free queue failed.
    #[error("failed to enqueue free resource {index} during construction")]
    Seed {
        /// The slot index that could not be enqueued.
        index: usize,
    },
}

/// An error returned by a steady-state pool operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The bounded number of tries or the wait deadline was exhausted.
    #[error("timed out")]
    Timeout,
    /// The underlying queue or wait primitive misbehaved.
    ///
    /// This does not happen under correct usage and indicates a more serious fault.
    #[error("internal error: {0}")]
    Internal(#[from] InternalError),
    /// The pool already committed to the other consume path.
    ///
    /// See [`ConsumeMode`].
    #[error("consume path conflicts with the active consume mode {active:?}")]
    ModeConflict {
        /// The consume mode the pool is committed to.
        active: ConsumeMode,
    },
}

/// The root cause of a [`PoolError::Internal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum InternalError {
    /// A queue rejected an enqueue although no more than its capacity is ever in flight.
    #[error("queue is unexpectedly full")]
    QueueFull,
    /// The ready queue was empty after the semaphore granted a permit.
    #[error("ready queue is unexpectedly empty")]
    QueueEmpty,
    /// A queue returned an index outside of the slot arena.
    #[error("slot index {0} is out of range")]
    SlotOutOfRange(usize),
    /// A queue returned a slot that another thread already holds.
    #[error("slot {0} is already held")]
    SlotAlreadyHeld(usize),
}
