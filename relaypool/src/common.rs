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

use std::time::Duration;

/// The bound on busy-polling for [`Pool::acquire`] and [`Pool::consume_busy`].
///
/// [`Pool::acquire`]: crate::Pool::acquire
/// [`Pool::consume_busy`]: crate::Pool::consume_busy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Tries {
    /// Give up after this many attempts.
    ///
    /// `Limited(0)` makes no attempt at all.
    Limited(u32),
    /// Spin until an attempt succeeds.
    #[default]
    Unlimited,
}

impl Tries {
    /// Runs `f` until it returns `Some` or the tries are used up.
    pub(crate) fn poll<T>(self, mut f: impl FnMut() -> Option<T>) -> Option<T> {
        match self {
            Tries::Limited(n) => {
                for _ in 0..n {
                    if let Some(t) = f() {
                        return Some(t);
                    }
                    std::hint::spin_loop();
                }
                None
            }
            Tries::Unlimited => loop {
                if let Some(t) = f() {
                    return Some(t);
                }
                std::hint::spin_loop();
            },
        }
    }
}

/// The bound on suspension for [`Pool::consume_wait`].
///
/// [`Pool::consume_wait`]: crate::Pool::consume_wait
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Block until a resource is produced.
    #[default]
    Forever,
    /// Block for at most this long.
    Timeout(Duration),
}

/// Which consume path a pool accepts.
///
/// [`Pool::consume_busy`] drains the ready queue without decrementing the ready semaphore, so
/// mixing it with [`Pool::consume_wait`] would let the semaphore overstate the ready resources.
/// A pool therefore serves only one of the two paths for its lifetime.
///
/// [`Pool::consume_busy`]: crate::Pool::consume_busy
/// [`Pool::consume_wait`]: crate::Pool::consume_wait
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeMode {
    /// The first consume call decides.
    #[default]
    Auto,
    /// Only [`Pool::consume_busy`](crate::Pool::consume_busy) is allowed.
    Busy,
    /// Only [`Pool::consume_wait`](crate::Pool::consume_wait) is allowed.
    Wait,
}

impl ConsumeMode {
    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            ConsumeMode::Auto => 0,
            ConsumeMode::Busy => 1,
            ConsumeMode::Wait => 2,
        }
    }

    pub(crate) const fn from_u8(v: u8) -> Self {
        match v {
            1 => ConsumeMode::Busy,
            2 => ConsumeMode::Wait,
            _ => ConsumeMode::Auto,
        }
    }
}
