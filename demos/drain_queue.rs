//! Queue draining example
//!
//! Preloads a private queue with one item per priority level, starts a pool
//! whose workers drain it, pushes a burst of low-priority items, grows the
//! pool, then tears both down.
//!
//! Run with: RUST_LOG=debug cargo run --example drain_queue

use rust_workq::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const NAMES: [&str; 10] = [
    "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
];

struct Consumer {
    queue: PriorityQueue,
    received: AtomicUsize,
}

fn print_item(consumer: &Consumer) -> RunOutcome {
    let Some(item) = consumer.queue.get_timeout(Duration::from_millis(50))? else {
        return Ok(());
    };
    let received = consumer.received.fetch_add(1, Ordering::Relaxed) + 1;
    if received <= NAMES.len() || received % 250 == 0 {
        println!(
            "  {}: got \"{}\" priority {} (#{})",
            thread::current().name().unwrap_or("worker"),
            String::from_utf8_lossy(item.payload()),
            item.priority(),
            received
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Rust WorkQ - Queue Draining Example ===\n");

    let consumer = Arc::new(Consumer {
        queue: PriorityQueue::init(None, 0)?,
        received: AtomicUsize::new(0),
    });

    println!("1. Preloading queue");
    for (level, name) in (1..=PRIORITY_LEVELS).zip(NAMES) {
        consumer.queue.add(name.as_bytes(), level)?;
        println!("  Added \"{}\" priority {}", name, level);
    }

    println!("\n2. Starting pool with 1 worker");
    let pool = WorkerPool::builder(Arc::clone(&consumer))
        .workers(1)
        .thread_name_prefix("drain")
        .run_function(run_function(|consumer: &Arc<Consumer>| print_item(consumer)))
        .build()?;

    println!("\n3. Adding 1000 more items at the lowest priority");
    for _ in 0..1000 {
        consumer.queue.add(b"More", PRIORITY_LEVELS)?;
    }

    println!("\n4. Growing pool by 3 workers");
    pool.add(3, None)?;
    println!("  Pool size: {}", pool.get_size());

    while !consumer.queue.is_empty() {
        thread::sleep(Duration::from_millis(10));
    }

    println!("\n5. Statistics");
    let stats = pool.stats();
    println!("  Items received: {}", consumer.received.load(Ordering::Relaxed));
    println!("  Invocations: {}", stats.invocations_completed);
    println!("  Failures: {}", stats.invocations_failed);

    println!("\n6. Deleting pool and destroying queue");
    pool.delete()?;
    consumer.queue.destroy()?;

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
