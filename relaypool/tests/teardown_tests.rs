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

//! Integration tests: teardown tests.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use relaypool::Pool;
use relaypool::PoolConfig;
use relaypool::Spsc;
use relaypool::Tries;

struct DropCounter {
    dropped: Arc<AtomicUsize>,
    payload: Vec<u8>,
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

fn make_pool(dropped: &Arc<AtomicUsize>) -> Pool<DropCounter, Spsc> {
    Pool::with_init(PoolConfig::new(8), |index| DropCounter {
        dropped: dropped.clone(),
        payload: vec![index as u8; 64],
    })
    .unwrap()
}

#[test]
fn test_quiesced_pool_frees_storage() {
    let dropped = Arc::new(AtomicUsize::new(0));
    let pool = make_pool(&dropped);

    let res = pool.acquire(Tries::Limited(1)).unwrap();
    pool.produce(res).unwrap();
    let res = pool.consume_busy(Tries::Limited(1)).unwrap();
    assert_eq!(res.payload, vec![res.index() as u8; 64]);
    pool.release(res).unwrap();

    drop(pool);
    assert_eq!(dropped.load(Ordering::SeqCst), 7);
}

#[test]
fn test_outstanding_handle_leaks_storage() {
    let dropped = Arc::new(AtomicUsize::new(0));
    let pool = make_pool(&dropped);

    let res = pool.acquire(Tries::Limited(1)).unwrap();
    std::mem::forget(res);
    assert!(pool.available() < pool.capacity());

    drop(pool);
    assert_eq!(dropped.load(Ordering::SeqCst), 0, "storage must be leaked");
}

#[test]
fn test_unconsumed_resource_leaks_storage() {
    let dropped = Arc::new(AtomicUsize::new(0));
    let pool = make_pool(&dropped);

    let res = pool.acquire(Tries::Limited(1)).unwrap();
    pool.produce(res).unwrap();
    assert_eq!(pool.ready_count(), 1);

    drop(pool);
    assert_eq!(dropped.load(Ordering::SeqCst), 0, "storage must be leaked");
}

#[test]
fn test_force_close_frees_storage() {
    let dropped = Arc::new(AtomicUsize::new(0));
    let pool = make_pool(&dropped);

    let res = pool.acquire(Tries::Limited(1)).unwrap();
    std::mem::forget(res);
    let res = pool.acquire(Tries::Limited(1)).unwrap();
    pool.produce(res).unwrap();

    pool.force_close();
    assert_eq!(dropped.load(Ordering::SeqCst), 7);
}
