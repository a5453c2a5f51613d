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

//! A fixed-capacity object pool that doubles as a producer/consumer hand-off channel.
//!
//! A thread [acquires](Pool::acquire) a free resource, fills it in and [produces](Pool::produce)
//! it. Another thread [consumes](Pool::consume_wait) it, reads it and [releases](Pool::release)
//! it back to the free set. Resources are allocated once, when the pool is created.
//!
//! # Example
//!
//! ```
//! use relaypool::Pool;
//! use relaypool::PoolConfig;
//! use relaypool::Spsc;
//! use relaypool::Tries;
//! use relaypool::Wait;
//!
//! let pool = Pool::<u64, Spsc>::new(PoolConfig::new(8)).unwrap();
//! assert_eq!(pool.capacity(), 7);
//!
//! std::thread::scope(|s| {
//!     s.spawn(|| {
//!         for i in 0..100 {
//!             let mut r = pool.acquire(Tries::Unlimited).unwrap();
//!             *r = i;
//!             pool.produce(r).unwrap();
//!         }
//!     });
//!
//!     for i in 0..100 {
//!         let r = pool.consume_wait(Wait::Forever).unwrap();
//!         assert_eq!(*r, i);
//!         pool.release(r).unwrap();
//!     }
//! });
//!
//! assert_eq!(pool.available(), pool.capacity());
//! ```

pub mod discipline;
pub mod queue;

mod common;
mod error;
mod pool;
mod semaphore;

pub use common::ConsumeMode;
pub use common::Tries;
pub use common::Wait;
pub use discipline::Discipline;
pub use discipline::DisciplineKind;
pub use discipline::Mpmc;
pub use discipline::Mpsc;
pub use discipline::Spmc;
pub use discipline::Spsc;
pub use error::ConfigError;
pub use error::InternalError;
pub use error::PoolError;
pub use pool::Acquired;
pub use pool::Consumed;
pub use pool::Pool;
pub use pool::PoolConfig;
pub use pool::PoolStatus;
