use std::sync::Arc;

use commerce::{
    AddToCart, Aggregate, CartService, CatalogService, CustomerId, CustomerInfo, ListProduct,
    LogNotifier, Money, OrderService, PlaceOrder, PlaceOrderItem, ShippingAddress,
};
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::InMemoryEventStore;

const SKUS: [&str; 5] = ["MALA-108", "LAMP-01", "BELL-02", "INCENSE-12", "KUMKUM-3"];

fn seeded_store(rt: &tokio::runtime::Runtime) -> InMemoryEventStore {
    let store = InMemoryEventStore::new();
    let catalog = CatalogService::new(store.clone());
    rt.block_on(async {
        for (i, sku) in SKUS.iter().enumerate() {
            catalog
                .list_product(ListProduct::new(
                    *sku,
                    format!("Item {i}"),
                    "Puja",
                    Money::from_units(100 * (i as i64 + 1)),
                    u32::MAX,
                ))
                .await
                .unwrap();
        }
    });
    store
}

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
        SKUS.iter().map(|sku| PlaceOrderItem::new(*sku, 1)).collect(),
    )
}

fn bench_cart_add(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = seeded_store(&rt);
    let carts = CartService::new(store.clone(), Arc::new(CatalogService::new(store)));
    let customer = CustomerId::new();

    c.bench_function("commerce/cart_add_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                carts
                    .add_item(customer, AddToCart::new("MALA-108", 1))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = seeded_store(&rt);
    let orders = OrderService::new(store, LogNotifier);

    c.bench_function("commerce/place_order_5_products", |b| {
        b.iter(|| {
            rt.block_on(async {
                orders.place_order(place_order_cmd()).await.unwrap();
            });
        });
    });
}

fn bench_order_pricing(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = seeded_store(&rt);
    let orders = OrderService::new(store, LogNotifier);
    let order = rt.block_on(async { orders.place_order(place_order_cmd()).await.unwrap() });
    assert!(order.id().is_some());

    c.bench_function("commerce/order_pricing", |b| {
        b.iter(|| order.pricing());
    });
}

criterion_group!(benches, bench_cart_add, bench_place_order, bench_order_pricing);
criterion_main!(benches);
