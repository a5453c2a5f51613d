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

//! The resource pool.
//!
//! A [`Pool`] owns a fixed arena of `size - 1` resources and moves them between two bounded
//! queues:
//!
//! ```text
//! FREE --acquire--> ACQUIRED --produce--> READY --consume--> CONSUMED --release--> FREE
//! ```
//!
//! Resources in the `ACQUIRED` and `CONSUMED` states are represented by the [`Acquired`] and
//! [`Consumed`] handles, which give exclusive access to the resource. Only the hand-off is
//! synchronized; what a thread does with the resource while it holds the handle is up to it.
//!
//! Dropping a handle instead of passing it on returns the resource to the free queue.

use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::ConfigError;
use crate::ConsumeMode;
use crate::InternalError;
use crate::PoolError;
use crate::Tries;
use crate::Wait;
use crate::discipline::Discipline;
use crate::discipline::DisciplineKind;
use crate::discipline::Mpmc;
use crate::queue::BoundedQueue;
use crate::semaphore::Semaphore;

/// The configuration of [`Pool`].
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Size of both internal queues: a power of two, at least 4.
    ///
    /// The pool holds `size - 1` resources.
    pub size: usize,

    /// Which consume path the pool accepts.
    pub consume_mode: ConsumeMode,
}

impl PoolConfig {
    /// Creates a new [`PoolConfig`].
    pub fn new(size: usize) -> Self {
        Self {
            size,
            consume_mode: ConsumeMode::default(),
        }
    }

    /// Returns a new [`PoolConfig`] with the specified consume mode.
    pub fn with_consume_mode(mut self, consume_mode: ConsumeMode) -> Self {
        self.consume_mode = consume_mode;
        self
    }

    /// Checks that `size` is a power of two and at least 4.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size >= 4 && self.size.is_power_of_two() {
            Ok(())
        } else {
            Err(ConfigError::InvalidSize { size: self.size })
        }
    }
}

/// The current pool status.
///
/// See [`Pool::status`].
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct PoolStatus {
    /// The number of resources the pool manages.
    pub capacity: usize,

    /// The number of free resources.
    pub available: usize,

    /// The number of produced resources not yet consumed.
    pub ready: usize,

    /// The number of threads blocked in [`Pool::consume_wait`].
    pub wait_count: usize,

    /// The consume path the pool is committed to, or [`ConsumeMode::Auto`] if none yet.
    pub consume_mode: ConsumeMode,
}

struct Slot<T> {
    /// Set while a thread holds the slot outside of both queues.
    held: AtomicBool,
    value: UnsafeCell<T>,
}

/// A fixed-capacity object pool that doubles as a producer/consumer channel.
///
/// `D` is the [`Discipline`] that both internal queues are built for. It defaults to [`Mpmc`],
/// which is correct for any thread pattern.
///
/// # Teardown
///
/// Dropping a pool frees its storage only if every resource is back in the free queue. Otherwise
/// (a handle was leaked with [`std::mem::forget`], or produced resources were never consumed) the
/// arena and queues are leaked on purpose and a warning is logged. Use [`Pool::force_close`] to
/// free the storage regardless.
pub struct Pool<T, D: Discipline = Mpmc> {
    size: usize,
    slots: ManuallyDrop<Box<[Slot<T>]>>,
    /// Indices of resources available to `acquire`.
    free: ManuallyDrop<D::Queue>,
    /// Indices of resources awaiting `consume`.
    ready: ManuallyDrop<D::Queue>,
    /// Mirrors the ready queue for `consume_wait`.
    ready_sem: Semaphore,
    mode: AtomicU8,
    /// The number of threads blocked in `consume_wait`.
    waiters: AtomicUsize,
    force_closed: bool,
}

// SAFETY: a slot's value is only reached through a handle, and handles are only created after
// winning the slot's `held` flag, so at most one thread accesses each value at a time.
unsafe impl<T: Send, D: Discipline> Sync for Pool<T, D> {}

impl<T, D: Discipline> fmt::Debug for Pool<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("discipline", &D::KIND)
            .field("capacity", &self.capacity())
            .field("free", &*self.free)
            .field("ready", &*self.ready)
            .field("ready_sem", &self.ready_sem)
            .field("consume_mode", &self.consume_mode())
            .field("waiters", &self.waiters)
            .finish()
    }
}

impl<T: Default, D: Discipline> Pool<T, D> {
    /// Creates a new [`Pool`] of `config.size - 1` default resources.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        Self::with_init(config, |_| T::default())
    }
}

impl<T, D: Discipline> Pool<T, D> {
    /// Creates a new [`Pool`], building the resource in each slot with `init(index)`.
    pub fn with_init(
        config: PoolConfig,
        mut init: impl FnMut(usize) -> T,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.size;
        let capacity = size - 1;
        let slots = (0..capacity)
            .map(|index| Slot {
                held: AtomicBool::new(false),
                value: UnsafeCell::new(init(index)),
            })
            .collect::<Box<[_]>>();

        let free = D::Queue::with_capacity(size);
        let ready = D::Queue::with_capacity(size);
        for index in 0..capacity {
            if !free.try_enqueue(index) {
                tracing::error!(index, size, "failed to seed free queue");
                return Err(ConfigError::Seed { index });
            }
        }

        tracing::debug!(size, capacity, discipline = ?D::KIND, "created resource pool");
        Ok(Self {
            size,
            slots: ManuallyDrop::new(slots),
            free: ManuallyDrop::new(free),
            ready: ManuallyDrop::new(ready),
            ready_sem: Semaphore::new(0),
            mode: AtomicU8::new(config.consume_mode.to_u8()),
            waiters: AtomicUsize::new(0),
            force_closed: false,
        })
    }

    /// Acquires a free resource, busily retrying as bounded by `tries`.
    ///
    /// Returns [`PoolError::Timeout`] once the tries are used up.
    pub fn acquire(&self, tries: Tries) -> Result<Acquired<'_, T, D>, PoolError> {
        let index = tries
            .poll(|| self.free.try_dequeue())
            .ok_or(PoolError::Timeout)?;
        let held = self.take(index)?;
        Ok(Acquired(held))
    }

    /// Publishes an acquired resource for consumption.
    ///
    /// The ready semaphore is posted only once the resource is in the ready queue. If the ready
    /// queue rejects it, the resource goes back to the free queue.
    ///
    /// # Panics
    ///
    /// Panics if `resource` was acquired from another pool.
    pub fn produce(&self, resource: Acquired<'_, T, D>) -> Result<(), PoolError> {
        let index = self.own_index(&resource.0);
        let slot = &self.slots[index];

        slot.held.store(false, Ordering::Release);
        if self.ready.try_enqueue(index) {
            resource.0.disarm();
            self.ready_sem.post();
            Ok(())
        } else {
            // still exclusively ours: it never entered a queue
            slot.held.store(true, Ordering::Relaxed);
            tracing::error!(index, "ready queue rejected a produced resource");
            Err(InternalError::QueueFull.into())
        }
    }

    /// Consumes a ready resource, busily retrying as bounded by `tries`.
    ///
    /// This path does not touch the ready semaphore. It cannot be mixed with
    /// [`Pool::consume_wait`] on the same pool; see [`ConsumeMode`].
    ///
    /// Returns [`PoolError::Timeout`] once the tries are used up.
    pub fn consume_busy(&self, tries: Tries) -> Result<Consumed<'_, T, D>, PoolError> {
        self.enter_mode(ConsumeMode::Busy)?;

        let index = tries
            .poll(|| self.ready.try_dequeue())
            .ok_or(PoolError::Timeout)?;
        let held = self.take(index)?;
        Ok(Consumed(held))
    }

    /// Consumes a ready resource, suspending the calling thread until one is produced or `wait`
    /// runs out.
    ///
    /// It cannot be mixed with [`Pool::consume_busy`] on the same pool; see [`ConsumeMode`].
    ///
    /// Returns [`PoolError::Timeout`] if the wait runs out.
    pub fn consume_wait(&self, wait: Wait) -> Result<Consumed<'_, T, D>, PoolError> {
        self.enter_mode(ConsumeMode::Wait)?;

        let granted = {
            self.waiters.fetch_add(1, Ordering::Relaxed);
            let _waiting = scopeguard::guard((), |()| {
                self.waiters.fetch_sub(1, Ordering::Relaxed);
            });

            match wait {
                Wait::Forever => {
                    self.ready_sem.wait();
                    true
                }
                Wait::Timeout(timeout) => self.ready_sem.wait_timeout(timeout),
            }
        };

        if !granted {
            return Err(PoolError::Timeout);
        }

        let Some(index) = self.ready.try_dequeue() else {
            tracing::error!("ready queue empty after the semaphore granted a permit");
            return Err(InternalError::QueueEmpty.into());
        };
        let held = self.take(index)?;
        Ok(Consumed(held))
    }

    /// Returns a consumed resource to the free queue.
    ///
    /// # Panics
    ///
    /// Panics if `resource` was consumed from another pool.
    pub fn release(&self, resource: Consumed<'_, T, D>) -> Result<(), PoolError> {
        let index = self.own_index(&resource.0);
        resource.0.disarm();
        self.release_index(index).map_err(PoolError::from)
    }

    /// Returns an acquired resource to the free queue without producing it.
    ///
    /// # Panics
    ///
    /// Panics if `resource` was acquired from another pool.
    pub fn release_acquired(&self, resource: Acquired<'_, T, D>) -> Result<(), PoolError> {
        let index = self.own_index(&resource.0);
        resource.0.disarm();
        self.release_index(index).map_err(PoolError::from)
    }

    /// Returns the number of resources this pool manages.
    pub fn capacity(&self) -> usize {
        self.size - 1
    }

    /// Returns the number of free resources.
    ///
    /// The value is a snapshot and is only exact while no other thread uses the pool.
    pub fn available(&self) -> usize {
        self.free.approx_len()
    }

    /// Returns the number of produced resources not yet consumed.
    ///
    /// The value is a snapshot and is only exact while no other thread uses the pool.
    pub fn ready_count(&self) -> usize {
        self.ready.approx_len()
    }

    /// Returns the discipline both internal queues are built for.
    pub fn discipline(&self) -> DisciplineKind {
        D::KIND
    }

    /// Returns the consume path the pool is committed to.
    ///
    /// [`ConsumeMode::Auto`] means no consume call has been made yet.
    pub fn consume_mode(&self) -> ConsumeMode {
        ConsumeMode::from_u8(self.mode.load(Ordering::Relaxed))
    }

    /// Returns the current status of the pool.
    ///
    /// The fields are read one after another and are not consistent with each other under
    /// concurrent use.
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            capacity: self.capacity(),
            available: self.available(),
            ready: self.ready_count(),
            wait_count: self.waiters.load(Ordering::Relaxed),
            consume_mode: self.consume_mode(),
        }
    }

    /// Drops the pool and frees its storage even if resources are outstanding.
    ///
    /// No live handle can exist at this point, so outstanding resources can only be ones whose
    /// handles were forgotten or that were produced and never consumed. Their destructors run.
    pub fn force_close(mut self) {
        self.force_closed = true;
    }

    fn take(&self, index: usize) -> Result<Held<'_, T, D>, InternalError> {
        let Some(slot) = self.slots.get(index) else {
            tracing::error!(index, "queue returned an out-of-range slot");
            return Err(InternalError::SlotOutOfRange(index));
        };

        if slot
            .held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            tracing::error!(
                index,
                discipline = ?D::KIND,
                "queue returned a slot that is already held"
            );
            return Err(InternalError::SlotAlreadyHeld(index));
        }

        Ok(Held {
            pool: self,
            index,
            _marker: PhantomData,
        })
    }

    fn release_index(&self, index: usize) -> Result<(), InternalError> {
        let slot = &self.slots[index];

        slot.held.store(false, Ordering::Release);
        if self.free.try_enqueue(index) {
            Ok(())
        } else {
            // the slot stays out of both queues; it is lost to the pool
            slot.held.store(true, Ordering::Relaxed);
            tracing::error!(index, "free queue rejected a released resource");
            Err(InternalError::QueueFull)
        }
    }

    fn own_index(&self, held: &Held<'_, T, D>) -> usize {
        assert!(
            std::ptr::eq(held.pool, self),
            "resource handle belongs to another pool"
        );
        held.index
    }

    fn enter_mode(&self, requested: ConsumeMode) -> Result<(), PoolError> {
        let requested = requested.to_u8();
        let auto = ConsumeMode::Auto.to_u8();
        match self
            .mode
            .compare_exchange(auto, requested, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => Ok(()),
            Err(active) if active == requested => Ok(()),
            Err(active) => Err(PoolError::ModeConflict {
                active: ConsumeMode::from_u8(active),
            }),
        }
    }
}

impl<T, D: Discipline> Drop for Pool<T, D> {
    fn drop(&mut self) {
        let capacity = self.capacity();
        let available = self.available();

        if available == capacity || self.force_closed {
            // SAFETY: the fields are dropped exactly once, here, and never touched again.
            unsafe {
                ManuallyDrop::drop(&mut self.free);
                ManuallyDrop::drop(&mut self.ready);
                ManuallyDrop::drop(&mut self.slots);
            }
        } else {
            tracing::warn!(
                capacity,
                available,
                "pool dropped with outstanding resources; leaking its storage"
            );
        }
    }
}

/// Exclusive access to one slot, returned to the free queue on drop unless disarmed.
struct Held<'a, T, D: Discipline> {
    pool: &'a Pool<T, D>,
    index: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<T, D: Discipline> Held<'_, T, D> {
    fn disarm(self) {
        std::mem::forget(self);
    }

    fn get(&self) -> &T {
        // SAFETY: this handle won the slot's `held` flag, so no other reference to the value
        // exists until the flag is cleared, which only happens after the handle is consumed.
        unsafe { &*self.pool.slots[self.index].value.get() }
    }

    fn get_mut(&mut self) -> &mut T {
        // SAFETY: as in `get`, and `&mut self` rules out aliasing through this handle.
        unsafe { &mut *self.pool.slots[self.index].value.get() }
    }
}

impl<T, D: Discipline> Drop for Held<'_, T, D> {
    fn drop(&mut self) {
        if let Err(err) = self.pool.release_index(self.index) {
            tracing::warn!(index = self.index, %err, "failed to return a dropped resource");
        }
    }
}

/// A resource taken from the free queue by [`Pool::acquire`].
///
/// Fill it in, then hand it to [`Pool::produce`]. Dropping it returns the resource to the free
/// queue.
pub struct Acquired<'a, T, D: Discipline = Mpmc>(Held<'a, T, D>);

/// A resource taken from the ready queue by [`Pool::consume_busy`] or [`Pool::consume_wait`].
///
/// Hand it to [`Pool::release`] when done. Dropping it has the same effect.
pub struct Consumed<'a, T, D: Discipline = Mpmc>(Held<'a, T, D>);

macro_rules! impl_handle {
    ($name:ident) => {
        impl<T, D: Discipline> $name<'_, T, D> {
            /// Returns the index of the resource's slot in the pool.
            pub fn index(&self) -> usize {
                self.0.index
            }
        }

        impl<T, D: Discipline> Deref for $name<'_, T, D> {
            type Target = T;

            fn deref(&self) -> &T {
                self.0.get()
            }
        }

        impl<T, D: Discipline> DerefMut for $name<'_, T, D> {
            fn deref_mut(&mut self) -> &mut T {
                self.0.get_mut()
            }
        }

        impl<T, D: Discipline> AsRef<T> for $name<'_, T, D> {
            fn as_ref(&self) -> &T {
                self
            }
        }

        impl<T, D: Discipline> AsMut<T> for $name<'_, T, D> {
            fn as_mut(&mut self) -> &mut T {
                self
            }
        }

        impl<T: fmt::Debug, D: Discipline> fmt::Debug for $name<'_, T, D> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("index", &self.0.index)
                    .field("value", self.0.get())
                    .finish()
            }
        }
    };
}

impl_handle!(Acquired);
impl_handle!(Consumed);
