//! Performance benchmarks for user-store
//!
//! This benchmark suite measures:
//! - InMemory backend operations (set, get)
//! - EntityStore reads (cache hit vs read-through miss)
//! - EntityStore writes (create, update)
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use user_store::backend::{CacheBackend, InMemoryBackend};
use user_store::repository::{DataRepository, InMemoryRepository};
use user_store::{CacheStrategy, EntityStore, RequestContext, User, UserFilter};

/// Repository that materializes a user for any id, with a `size`-byte name.
#[derive(Clone)]
struct BenchRepository {
    size: usize,
}

impl DataRepository<User> for BenchRepository {
    async fn insert(&self, _entity: &User) -> user_store::Result<u64> {
        Ok(1)
    }

    async fn fetch_by_id(&self, id: &u64) -> user_store::Result<Option<User>> {
        Ok(Some(
            User::new("x".repeat(self.size), "bench@x.com", "pw").with_id(*id),
        ))
    }

    async fn update_by_id(&self, _id: &u64, _entity: &User) -> user_store::Result<()> {
        Ok(())
    }

    async fn delete_by_id(&self, _id: &u64) -> user_store::Result<()> {
        Ok(())
    }

    async fn fetch_all(&self, _filter: &UserFilter) -> user_store::Result<Vec<User>> {
        Ok(Vec::new())
    }
}

// ============================================================================
// Group 1: InMemory Backend Benchmarks
// ============================================================================

fn inmemory_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_backend");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                let value = vec![1u8; size];

                b.to_async(&rt).iter(|| async {
                    backend
                        .set(black_box("1"), black_box(value.clone()), None)
                        .await
                        .expect("Failed to set")
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                rt.block_on(async {
                    backend
                        .set("1", vec![1u8; size], None)
                        .await
                        .expect("Failed to set");
                });

                b.to_async(&rt).iter(|| async { backend.get(black_box("1")).await });
            });
    }

    group.finish();
}

// ============================================================================
// Group 2: EntityStore Read Benchmarks
// ============================================================================

fn read_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_read");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    let ctx = RequestContext::new();

    for size in [100, 1_000, 10_000].iter() {
        // Measures: cache lookup + deserialization
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("hit", size), size, |b, &size| {
                let store = EntityStore::new(
                    BenchRepository { size },
                    InMemoryBackend::new(),
                    Duration::from_secs(300),
                );
                rt.block_on(async {
                    store.read(&ctx, &1).await.expect("Failed to warm cache");
                });

                b.to_async(&rt)
                    .iter(|| async { store.read(black_box(&ctx), black_box(&1)).await });
            });

        // Measures: cache lookup + repository fetch + serialization + cache store
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("miss", size), size, |b, &size| {
                let store = EntityStore::new(
                    BenchRepository { size },
                    InMemoryBackend::new(),
                    Duration::from_secs(300),
                );
                let counter = Arc::new(AtomicU64::new(1));

                b.to_async(&rt).iter(|| {
                    let store = store.clone();
                    let ctx = ctx.clone();
                    // Unique id per iteration forces a miss
                    let id = counter.fetch_add(1, Ordering::Relaxed);
                    async move { store.read(&ctx, black_box(&id)).await }
                });
            });
    }

    // Measures: repository fetch + cache store, skipping the lookup
    group.bench_function("bypass", |b| {
        let store = EntityStore::new(
            BenchRepository { size: 1_000 },
            InMemoryBackend::new(),
            Duration::from_secs(300),
        );

        b.to_async(&rt).iter(|| async {
            store
                .read_with(black_box(&ctx), black_box(&1), CacheStrategy::Bypass)
                .await
        });
    });

    group.finish();
}

// ============================================================================
// Group 3: EntityStore Write Benchmarks
// ============================================================================

fn write_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_write");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    let ctx = RequestContext::new();

    // Measures: insert + serialization + cache store
    group.bench_function("create", |b| {
        let store = EntityStore::new(
            InMemoryRepository::<User>::new(),
            InMemoryBackend::new(),
            Duration::from_secs(300),
        );

        b.to_async(&rt).iter(|| async {
            store
                .create(&ctx, black_box(User::new("Alice", "alice@x.com", "pw")))
                .await
        });
    });

    // Measures: update + invalidate + repository fetch + cache store
    group.bench_function("update", |b| {
        let store = EntityStore::new(
            BenchRepository { size: 100 },
            InMemoryBackend::new(),
            Duration::from_secs(300),
        );

        b.to_async(&rt).iter(|| async {
            store
                .update(&ctx, black_box(&1), User::new("Alice2", "alice2@x.com", "pw"))
                .await
        });
    });

    group.finish();
}

criterion_group!(benches, inmemory_benchmarks, read_benchmarks, write_benchmarks);
criterion_main!(benches);
