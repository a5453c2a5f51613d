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

//! Measures hand-off throughput of a multi-producer, multi-consumer pool.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use relaypool::Mpmc;
use relaypool::Pool;
use relaypool::PoolConfig;
use relaypool::Tries;
use tracing_subscriber::EnvFilter;

const POOL_SIZE: usize = 16;
const PRODUCERS: usize = 1;
const CONSUMERS: usize = 1;
const RUN_FOR: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct Token {
    pid: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let pool = Pool::<Token, Mpmc>::new(PoolConfig::new(POOL_SIZE)).unwrap();
    let stay_alive = AtomicBool::new(true);
    let total = AtomicU64::new(0);

    let start = Instant::now();
    std::thread::scope(|s| {
        for cid in 0..CONSUMERS {
            let (pool, stay_alive, total) = (&pool, &stay_alive, &total);
            s.spawn(move || {
                let mut count = 0u64;
                while stay_alive.load(Ordering::Relaxed) {
                    let Ok(res) = pool.consume_busy(Tries::Limited(100)) else {
                        continue;
                    };
                    std::hint::black_box(res.pid);
                    count += 1;
                    pool.release(res).unwrap();
                }
                println!("consumer {cid} consumed {count} resources");
                total.fetch_add(count, Ordering::Relaxed);
            });
        }
        println!("Started {CONSUMERS} consumer thread(s)");

        for pid in 0..PRODUCERS {
            let (pool, stay_alive) = (&pool, &stay_alive);
            s.spawn(move || {
                while stay_alive.load(Ordering::Relaxed) {
                    let Ok(mut res) = pool.acquire(Tries::Limited(100)) else {
                        continue;
                    };
                    res.pid = pid;
                    pool.produce(res).unwrap();
                }
            });
        }
        println!("Started {PRODUCERS} producer thread(s)");

        std::thread::sleep(RUN_FOR);
        stay_alive.store(false, Ordering::Relaxed);
    });
    let elapsed = start.elapsed();

    // drain what the consumers left behind so the pool frees its storage
    while let Ok(res) = pool.consume_busy(Tries::Limited(1)) {
        pool.release(res).unwrap();
    }
    tracing::debug!(status = ?pool.status(), "pool drained");

    let total = total.load(Ordering::Relaxed);
    println!("total consume count = {total}");
    println!("duration = {}ns", elapsed.as_nanos());
    println!(
        "throughput = {:.2}res/sec",
        total as f64 / elapsed.as_secs_f64()
    );
}
