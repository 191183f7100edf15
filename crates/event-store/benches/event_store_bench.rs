use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    AppendOptions, EventEnvelope, EventStore, EventStoreExt, InMemoryEventStore, StreamAppend,
    Version,
};

fn make_event(aggregate_id: AggregateId, aggregate_type: &str, version: i64) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type(aggregate_type)
        .event_type("LineItemAdded")
        .version(Version::new(version))
        .payload_raw(serde_json::json!({
            "type": "LineItemAdded",
            "data": { "sku": "MALA-108", "quantity": 1 }
        }))
        .build()
        .unwrap()
}

fn bench_append_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let cart = AggregateId::new();
                store
                    .append(vec![make_event(cart, "Cart", 1)], AppendOptions::expect_new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_commit_order_with_stock(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/commit_order_and_5_products", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let order = AggregateId::new();
                let mut appends = vec![StreamAppend::new(
                    vec![make_event(order, "Order", 1)],
                    AppendOptions::expect_new(),
                )];
                appends.extend((0..5).map(|_| {
                    StreamAppend::new(
                        vec![make_event(AggregateId::new(), "Product", 1)],
                        AppendOptions::expect_new(),
                    )
                }));
                store.commit(appends).await.unwrap();
            });
        });
    });
}

fn bench_load_aggregate(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let cart = AggregateId::new();

    rt.block_on(async {
        let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(cart, "Cart", v)).collect();
        store.append(events, AppendOptions::new()).await.unwrap();
    });

    c.bench_function("event_store/load_aggregate_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.load_aggregate(cart).await.unwrap();
            });
        });
    });
}

fn bench_stream_all_events(c: &mut Criterion) {
    use futures_util::StreamExt;

    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    rt.block_on(async {
        for _ in 0..10 {
            let cart = AggregateId::new();
            let events: Vec<EventEnvelope> =
                (1..=100).map(|v| make_event(cart, "Cart", v)).collect();
            store.append(events, AppendOptions::new()).await.unwrap();
        }
    });

    c.bench_function("event_store/stream_1000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut stream = store.stream_all_events().await.unwrap();
                let mut count = 0;
                while let Some(result) = stream.next().await {
                    result.unwrap();
                    count += 1;
                }
                assert_eq!(count, 1000);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single_event,
    bench_commit_order_with_stock,
    bench_load_aggregate,
    bench_stream_all_events,
);
criterion_main!(benches);
