use commerce::{
    CatalogService, CustomerId, CustomerInfo, ListProduct, LogNotifier, Money, OrderService,
    PlaceOrder, PlaceOrderItem, ShippingAddress,
};
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::InMemoryEventStore;
use projections::{
    CartActivityView, CustomerOrdersView, OrderBoardView, ProjectionProcessor, StockLevelsView,
};

fn place_order_cmd() -> PlaceOrder {
    PlaceOrder::new(
        CustomerInfo {
            name: "Bench Customer".into(),
            email: "bench@example.in".into(),
            phone: "0000000000".into(),
        },
        ShippingAddress {
            line1: "1 Bench Road".into(),
            line2: None,
            city: "Mysuru".into(),
            state: "Karnataka".into(),
            postal_code: "570001".into(),
            country: "IN".into(),
        },
        vec![PlaceOrderItem::new("MALA-108", 1), PlaceOrderItem::new("LAMP-01", 2)],
    )
    .for_customer(CustomerId::new())
}

/// Lists two products and places `n` orders against them. Each order writes
/// three events: the order and one stock decrement per product.
fn populated_store(rt: &tokio::runtime::Runtime, n: usize) -> InMemoryEventStore {
    let store = InMemoryEventStore::new();
    let catalog = CatalogService::new(store.clone());
    let orders = OrderService::new(store.clone(), LogNotifier);
    rt.block_on(async {
        for (sku, price) in [("MALA-108", 500), ("LAMP-01", 300)] {
            catalog
                .list_product(ListProduct::new(sku, sku, "Puja", Money::from_units(price), u32::MAX))
                .await
                .unwrap();
        }
        for _ in 0..n {
            orders.place_order(place_order_cmd()).await.unwrap();
        }
    });
    store
}

fn processor_for(store: InMemoryEventStore) -> ProjectionProcessor<InMemoryEventStore> {
    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(OrderBoardView::new()));
    processor.register(Box::new(CustomerOrdersView::new()));
    processor.register(Box::new(StockLevelsView::new()));
    processor.register(Box::new(CartActivityView::new()));
    processor
}

fn bench_cold_catch_up(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = populated_store(&rt, 500);

    c.bench_function("projections/cold_catch_up_1500_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                processor_for(store.clone()).run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_warm_catch_up(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = populated_store(&rt, 500);
    let processor = processor_for(store);
    rt.block_on(async { processor.run_catch_up().await.unwrap() });

    c.bench_function("projections/warm_catch_up_no_new_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_board_page(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = populated_store(&rt, 1000);
    let board = OrderBoardView::new();
    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(board.clone()));
    rt.block_on(async { processor.run_catch_up().await.unwrap() });

    c.bench_function("projections/order_board_page_of_1000", |b| {
        b.iter(|| rt.block_on(board.list(None, 3, 20)));
    });
}

criterion_group!(benches, bench_cold_catch_up, bench_warm_catch_up, bench_board_page);
criterion_main!(benches);
