//! Stack throughput benchmarks
//!
//! Compares the pool-backed stack against the standard heap for the same
//! push-all/pop-all workload, repeated so that later rounds hit the free list.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use nebula_mempool::pool::{MemoryPool, PoolConfig};
use nebula_mempool::Stack;
use std::collections::LinkedList;
use std::hint::black_box;

const REPS: usize = 50;

/// Push then pop `elems` values, `REPS` times
fn bench_push_pop_rounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop_rounds");

    for elems in [1_000usize, 10_000, 100_000] {
        group.throughput(Throughput::Elements((elems * REPS) as u64));

        // Pool-backed stack
        group.bench_with_input(BenchmarkId::new("pool_stack", elems), &elems, |b, &n| {
            b.iter(|| {
                let mut stack = Stack::with_config(PoolConfig::production()).unwrap();
                for _ in 0..REPS {
                    for i in 0..n {
                        stack.push(black_box(i)).unwrap();
                    }
                    while let Some(value) = stack.pop() {
                        black_box(value);
                    }
                }
            });
        });

        // Pool-backed stack with large blocks
        group.bench_with_input(BenchmarkId::new("pool_stack_64k", elems), &elems, |b, &n| {
            b.iter(|| {
                let mut stack = Stack::with_config(PoolConfig::performance()).unwrap();
                for _ in 0..REPS {
                    for i in 0..n {
                        stack.push(black_box(i)).unwrap();
                    }
                    while let Some(value) = stack.pop() {
                        black_box(value);
                    }
                }
            });
        });

        // Node-per-allocation list on the global heap (baseline)
        group.bench_with_input(BenchmarkId::new("heap_list", elems), &elems, |b, &n| {
            b.iter(|| {
                let mut list = LinkedList::new();
                for _ in 0..REPS {
                    for i in 0..n {
                        list.push_front(black_box(i));
                    }
                    while let Some(value) = list.pop_front() {
                        black_box(value);
                    }
                }
            });
        });

        // Contiguous vector (reference point, not node based)
        group.bench_with_input(BenchmarkId::new("vec", elems), &elems, |b, &n| {
            b.iter(|| {
                let mut vec = Vec::new();
                for _ in 0..REPS {
                    for i in 0..n {
                        vec.push(black_box(i));
                    }
                    while let Some(value) = vec.pop() {
                        black_box(value);
                    }
                }
            });
        });
    }

    group.finish();
}

/// Single slot allocate/deallocate on a warm pool
fn bench_slot_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("slot_cycle");

    group.bench_function("pool_64b", |b| {
        let mut pool = MemoryPool::<[u8; 64]>::with_config(PoolConfig::production()).unwrap();

        b.iter(|| unsafe {
            let ptr = pool.allocate().unwrap();
            pool.deallocate(ptr);
            black_box(ptr);
        });
    });

    // System allocator (baseline)
    group.bench_function("system_64b", |b| {
        b.iter(|| {
            let boxed = Box::new([0u8; 64]);
            black_box(boxed);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_push_pop_rounds, bench_slot_cycle);
criterion_main!(benches);
