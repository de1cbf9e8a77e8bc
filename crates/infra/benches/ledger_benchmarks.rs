use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use std::sync::Arc;
use stockroom_auth::{Actor, Role};
use stockroom_core::{ActorId, LocationId, ProductId};
use stockroom_infra::InventoryEngine;
use stockroom_infra::directory::{InMemoryAssignments, InMemoryBundleCatalog};
use stockroom_infra::ledger::{InMemoryLedger, InventoryLedger, LedgerBatch};
use stockroom_infra::movement_log::InMemoryMovementLog;
use stockroom_inventory::{BundleComponent, OrderLine, StockChange, StockKey};

type BenchEngine = InventoryEngine<
    Arc<InMemoryLedger>,
    Arc<InMemoryMovementLog>,
    Arc<InMemoryBundleCatalog>,
    Arc<InMemoryAssignments>,
>;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn engine() -> (BenchEngine, Arc<InMemoryLedger>, Arc<InMemoryBundleCatalog>) {
    let ledger = Arc::new(InMemoryLedger::new());
    let catalog = Arc::new(InMemoryBundleCatalog::new());
    let engine = InventoryEngine::new(
        ledger.clone(),
        Arc::new(InMemoryMovementLog::new()),
        catalog.clone(),
        Arc::new(InMemoryAssignments::new()),
    );
    (engine, ledger, catalog)
}

fn bench_reserve_release_cycle(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("reservation_lifecycle");

    group.bench_function("reserve_then_release", |b| {
        let (engine, ledger, _) = engine();
        let actor = Actor::new(ActorId::new(), vec![Role::ADMIN]);
        let line = OrderLine {
            product_id: ProductId::new(),
            location_id: LocationId::new(),
            quantity: 1,
            order_id: None,
        };
        ledger
            .seed(StockKey::new(line.product_id, line.location_id), 1_000_000, 0)
            .unwrap();

        b.iter(|| {
            rt.block_on(async {
                engine.reserve_stock(&actor, black_box(&line)).await.unwrap();
                engine.release_stock(&actor, black_box(&line)).await.unwrap();
            })
        });
    });

    group.finish();
}

fn bench_batch_commit(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("ledger_batch_commit");

    for batch_size in [1usize, 10, 100].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("return_batch", batch_size),
            batch_size,
            |b, &size| {
                let ledger = InMemoryLedger::new();
                let location = LocationId::new();
                let keys: Vec<StockKey> = (0..size)
                    .map(|_| StockKey::new(ProductId::new(), location))
                    .collect();
                b.iter(|| {
                    let mut batch = LedgerBatch::new(Utc::now());
                    for key in &keys {
                        batch.push(*key, StockChange::Return(1));
                    }
                    rt.block_on(ledger.commit(black_box(batch))).unwrap();
                });
            },
        );
    }

    group.finish();
}

fn bench_bundle_fan_out(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("bundle_fan_out");

    for components in [2usize, 8, 32].iter() {
        group.bench_with_input(
            BenchmarkId::new("reserve_release_bundle", components),
            components,
            |b, &count| {
                let (engine, ledger, catalog) = engine();
                let actor = Actor::new(ActorId::new(), vec![Role::ADMIN]);
                let bundle = ProductId::new();
                let location = LocationId::new();
                let parts: Vec<BundleComponent> = (0..count)
                    .map(|_| BundleComponent::new(ProductId::new(), 2))
                    .collect();
                for part in &parts {
                    ledger
                        .seed(StockKey::new(part.component_id, location), 1_000_000, 0)
                        .unwrap();
                }
                catalog.define(bundle, parts).unwrap();
                let line = OrderLine {
                    product_id: bundle,
                    location_id: location,
                    quantity: 1,
                    order_id: None,
                };

                b.iter(|| {
                    rt.block_on(async {
                        engine.reserve_bundle_stock(&actor, &line).await.unwrap();
                        engine.release_bundle_stock(&actor, &line).await.unwrap();
                    })
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_reserve_release_cycle,
    bench_batch_commit,
    bench_bundle_fan_out
);
criterion_main!(benches);
