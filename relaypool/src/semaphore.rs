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

use std::fmt;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

/// A counting semaphore that suspends waiters instead of spinning.
///
/// The count is guarded by a mutex whose poisoning is ignored: no code path panics while holding
/// the lock, so the count is always consistent.
pub(crate) struct Semaphore {
    count: Mutex<usize>,
    cond: Condvar,
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("count", &self.count())
            .finish()
    }
}

impl Semaphore {
    pub(crate) const fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Increments the count and wakes one waiter, if any.
    pub(crate) fn post(&self) {
        let mut count = self.lock();
        *count += 1;
        drop(count);
        self.cond.notify_one();
    }

    /// Blocks until the count is positive, then decrements it.
    pub(crate) fn wait(&self) {
        let mut count = self.lock();
        while *count == 0 {
            count = self.cond.wait(count).unwrap_or_else(PoisonError::into_inner);
        }
        *count -= 1;
    }

    /// Like [`Semaphore::wait`], but gives up once `timeout` has elapsed.
    ///
    /// Returns `true` if the count was decremented.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            // unrepresentable deadline
            self.wait();
            return true;
        };

        let mut count = self.lock();
        loop {
            if *count > 0 {
                *count -= 1;
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            let (guard, _) = self
                .cond
                .wait_timeout(count, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            count = guard;
        }
    }

    /// Returns the current count.
    pub(crate) fn count(&self) -> usize {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_post_then_wait() {
        let sem = Semaphore::new(0);
        sem.post();
        sem.post();
        assert_eq!(sem.count(), 2);
        sem.wait();
        assert!(sem.wait_timeout(Duration::from_millis(1)));
        assert_eq!(sem.count(), 0);
        assert!(!sem.wait_timeout(Duration::ZERO));
    }

    #[test]
    fn test_wait_timeout_elapses() {
        let sem = Semaphore::new(0);
        let timeout = Duration::from_millis(50);
        let start = Instant::now();
        assert!(!sem.wait_timeout(timeout));
        assert!(start.elapsed() >= timeout);
    }

    #[test]
    fn test_post_wakes_waiter() {
        let sem = Arc::new(Semaphore::new(0));
        let s = sem.clone();
        let waiter = thread::spawn(move || s.wait_timeout(Duration::from_secs(10)));

        thread::sleep(Duration::from_millis(20));
        sem.post();
        assert!(waiter.join().unwrap());
        assert_eq!(sem.count(), 0);
    }

    #[test]
    fn test_poisoned_semaphore() {
        let sem = Arc::new(Semaphore::new(1));
        let s = sem.clone();
        let handle = thread::spawn(move || {
            let _guard = s.count.lock().unwrap();
            panic!("poison");
        });
        let _ = handle.join();
        assert!(sem.count.is_poisoned());

        sem.post();
        assert_eq!(sem.count(), 2);
        sem.wait();
        sem.wait();
        assert_eq!(sem.count(), 0);
    }
}
