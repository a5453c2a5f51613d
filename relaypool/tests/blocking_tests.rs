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

//! Integration tests: blocking tests.

use std::thread;
use std::time::Duration;
use std::time::Instant;

use relaypool::Mpmc;
use relaypool::Pool;
use relaypool::PoolConfig;
use relaypool::PoolError;
use relaypool::Spsc;
use relaypool::Tries;
use relaypool::Wait;

#[test]
fn test_wait_forever_blocks_until_produce() {
    let pool = Pool::<u64, Spsc>::new(PoolConfig::new(8)).unwrap();

    thread::scope(|s| {
        let consumer = s.spawn(|| {
            let res = pool.consume_wait(Wait::Forever).unwrap();
            let v = *res;
            pool.release(res).unwrap();
            v
        });

        while pool.status().wait_count == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(50));
        assert!(!consumer.is_finished(), "consumer must block on an empty pool");

        let mut res = pool.acquire(Tries::Unlimited).unwrap();
        *res = 0xfeed;
        pool.produce(res).unwrap();

        assert_eq!(consumer.join().unwrap(), 0xfeed);
    });

    assert_eq!(pool.available(), pool.capacity());
}

#[test]
fn test_wait_timeout_elapses() {
    let pool = Pool::<u64, Mpmc>::new(PoolConfig::new(4)).unwrap();
    let timeout = Duration::from_millis(100);

    let start = Instant::now();
    let err = pool.consume_wait(Wait::Timeout(timeout)).unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(err, PoolError::Timeout);
    assert!(elapsed >= timeout, "returned after {elapsed:?}, before {timeout:?}");
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    assert_eq!(pool.status().wait_count, 0);
}

#[test]
fn test_wait_timeout_succeeds_when_ready() {
    let pool = Pool::<u64, Mpmc>::new(PoolConfig::new(4)).unwrap();
    let res = pool.acquire(Tries::Limited(1)).unwrap();
    pool.produce(res).unwrap();

    let res = pool
        .consume_wait(Wait::Timeout(Duration::from_secs(5)))
        .unwrap();
    pool.release(res).unwrap();

    // the semaphore was drained along with the queue
    assert_eq!(
        pool.consume_wait(Wait::Timeout(Duration::from_millis(10)))
            .unwrap_err(),
        PoolError::Timeout
    );
}

#[test]
fn test_many_waiters_each_get_one() {
    const WAITERS: usize = 4;
    let pool = Pool::<usize, Mpmc>::new(PoolConfig::new(8)).unwrap();

    thread::scope(|s| {
        let consumers = (0..WAITERS)
            .map(|_| {
                s.spawn(|| {
                    let res = pool.consume_wait(Wait::Timeout(Duration::from_secs(10)))?;
                    let v = *res;
                    pool.release(res)?;
                    Ok::<_, PoolError>(v)
                })
            })
            .collect::<Vec<_>>();

        while pool.status().wait_count < WAITERS {
            thread::sleep(Duration::from_millis(1));
        }

        for i in 0..WAITERS {
            let mut res = pool.acquire(Tries::Unlimited).unwrap();
            *res = i;
            pool.produce(res).unwrap();
        }

        let mut got = consumers
            .into_iter()
            .map(|c| c.join().unwrap().unwrap())
            .collect::<Vec<_>>();
        got.sort_unstable();
        assert_eq!(got, (0..WAITERS).collect::<Vec<_>>());
    });

    assert_eq!(pool.available(), pool.capacity());
}
