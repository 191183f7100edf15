//! Integration tests: commerce services -> ProjectionProcessor -> every view.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use commerce::{
    AddToCart, Aggregate, CartService, CatalogService, CustomerId, CustomerInfo, InMemoryNotifier,
    ListProduct, Money, OrderService, OrderStatus, PaymentStatus, PlaceOrder, PlaceOrderItem,
    ProductId, ShippingAddress,
};
use event_store::InMemoryEventStore;
use projections::{
    CartActivityView, CustomerOrdersView, OrderBoardView, ProjectionProcessor, ReadModel,
    StockLevelsView,
};

struct Harness {
    catalog: Arc<CatalogService<InMemoryEventStore>>,
    carts: CartService<InMemoryEventStore, Arc<CatalogService<InMemoryEventStore>>>,
    orders: OrderService<InMemoryEventStore, InMemoryNotifier>,
    processor: ProjectionProcessor<InMemoryEventStore>,
    board: OrderBoardView,
    customers: CustomerOrdersView,
    stock: StockLevelsView,
    activity: CartActivityView,
}

async fn setup() -> Harness {
    let store = InMemoryEventStore::new();
    let catalog = Arc::new(CatalogService::new(store.clone()));
    for (sku, name, price, stock) in [
        ("MALA-108", "Rudraksha Mala", 500, 10),
        ("LAMP-01", "Brass Diya", 300, 5),
        ("BELL-02", "Temple Bell", 700, 1),
    ] {
        catalog
            .list_product(ListProduct::new(sku, name, "Puja", Money::from_units(price), stock))
            .await
            .unwrap();
    }

    let board = OrderBoardView::new();
    let customers = CustomerOrdersView::new();
    let stock = StockLevelsView::new();
    let activity = CartActivityView::new();

    let mut processor = ProjectionProcessor::new(store.clone());
    processor.register(Box::new(board.clone()));
    processor.register(Box::new(customers.clone()));
    processor.register(Box::new(stock.clone()));
    processor.register(Box::new(activity.clone()));

    Harness {
        carts: CartService::new(store.clone(), Arc::clone(&catalog)),
        orders: OrderService::new(store, InMemoryNotifier::new()),
        catalog,
        processor,
        board,
        customers,
        stock,
        activity,
    }
}

fn order_for(customer: CustomerId, items: &[(&str, u32)]) -> PlaceOrder {
    PlaceOrder::new(
        CustomerInfo {
            name: "Asha Rao".into(),
            email: "asha@example.in".into(),
            phone: "9800000000".into(),
        },
        ShippingAddress {
            line1: "12 Temple Street".into(),
            line2: None,
            city: "Udupi".into(),
            state: "Karnataka".into(),
            postal_code: "576101".into(),
            country: "IN".into(),
        },
        items
            .iter()
            .map(|(sku, quantity)| PlaceOrderItem::new(*sku, *quantity))
            .collect(),
    )
    .for_customer(customer)
}

#[tokio::test]
async fn order_lifecycle_reaches_every_view() {
    let h = setup().await;
    let customer = CustomerId::new();

    let order = h
        .orders
        .place_order(order_for(customer, &[("LAMP-01", 2), ("BELL-02", 1)]))
        .await
        .unwrap();
    let order_id = order.id().unwrap();
    h.orders
        .update_status(order_id, OrderStatus::Delivered, None)
        .await
        .unwrap();

    h.processor.run_catch_up().await.unwrap();

    let summary = h.board.get(order_id).await.unwrap();
    assert_eq!(summary.status, OrderStatus::Delivered);
    assert_eq!(summary.payment_status, PaymentStatus::Paid);
    assert_eq!(summary.total, order.total());
    assert_eq!(summary.order_number, order.order_number());

    let history = h.customers.get(customer).await.unwrap();
    assert_eq!(history.order_ids, vec![order_id]);
    assert_eq!(history.delivered, 1);
    assert_eq!(history.total_spent, order.total());

    let lamp = h.stock.get(&ProductId::new("LAMP-01")).await.unwrap();
    assert_eq!(lamp.stock, 3);
    let bell = h.stock.get(&ProductId::new("BELL-02")).await.unwrap();
    assert_eq!(bell.stock, 0);
    assert!(!bell.in_stock);
}

#[tokio::test]
async fn cancellation_restocks_and_shows_on_the_board() {
    let h = setup().await;
    let customer = CustomerId::new();
    let order = h
        .orders
        .place_order(order_for(customer, &[("MALA-108", 4)]))
        .await
        .unwrap();
    let order_id = order.id().unwrap();
    h.orders.cancel_order(order_id, "duplicate order").await.unwrap();

    h.processor.run_catch_up().await.unwrap();

    let cancelled = h.board.list(Some(OrderStatus::Cancelled), 1, 10).await;
    assert_eq!(cancelled.total, 1);
    assert_eq!(cancelled.orders[0].order_id, order_id);
    assert_eq!(h.stock.get(&ProductId::new("MALA-108")).await.unwrap().stock, 10);

    let history = h.customers.get(customer).await.unwrap();
    assert_eq!(history.cancelled, 1);
    assert_eq!(history.active, 0);
}

#[tokio::test]
async fn catalog_admin_changes_update_stock_levels() {
    let h = setup().await;
    let lamp = ProductId::new("LAMP-01");
    h.catalog.reprice(&lamp, Money::from_units(320)).await.unwrap();
    h.catalog.restock(&lamp, 10).await.unwrap();

    h.processor.run_catch_up().await.unwrap();

    let level = h.stock.get(&lamp).await.unwrap();
    assert_eq!(level.price, Money::from_units(320));
    assert_eq!(level.stock, 15);
    assert_eq!(h.stock.count(), 3);
    let low: Vec<_> = h.stock.low_stock(1).await.into_iter().map(|l| l.sku).collect();
    assert_eq!(low, vec![ProductId::new("BELL-02")]);
}

#[tokio::test]
async fn idle_carts_are_found_and_purged() {
    let h = setup().await;
    let idle = CustomerId::new();
    h.carts
        .add_item(idle, AddToCart::new("MALA-108", 2))
        .await
        .unwrap();

    h.processor.run_catch_up().await.unwrap();
    let activity = h.activity.get(idle).await.unwrap();
    assert_eq!(activity.line_count, 1);
    assert_eq!(activity.item_count, 2);

    let later = Utc::now() + TimeDelta::days(31);
    assert!(h.activity.idle_since(Utc::now() - TimeDelta::days(30)).await.is_empty());

    let candidates = h.activity.idle_since(later - TimeDelta::days(30)).await;
    assert_eq!(candidates, vec![idle]);
    let purged = h.carts.purge_idle_carts(candidates, later).await.unwrap();
    assert_eq!(purged, 1);

    h.processor.run_catch_up().await.unwrap();
    assert_eq!(h.activity.get(idle).await.unwrap().line_count, 0);
    assert!(h.carts.get_cart(idle).await.unwrap().is_empty());
}

#[tokio::test]
async fn rebuild_reproduces_the_same_views() {
    let h = setup().await;
    let customer = CustomerId::new();
    for _ in 0..3 {
        h.orders
            .place_order(order_for(customer, &[("LAMP-01", 1)]))
            .await
            .unwrap();
    }
    h.carts
        .add_item(customer, AddToCart::new("MALA-108", 1))
        .await
        .unwrap();

    let log_len = h.processor.run_catch_up().await.unwrap();
    let before = h.board.list(None, 1, 10).await;
    let spent_before = h.customers.get(customer).await.unwrap();

    assert_eq!(h.processor.rebuild_all().await.unwrap(), log_len);

    let after = h.board.list(None, 1, 10).await;
    assert_eq!(after.total, before.total);
    let ids = |page: &projections::OrderPage| page.orders.iter().map(|o| o.order_id).collect::<Vec<_>>();
    assert_eq!(ids(&after), ids(&before));
    assert_eq!(h.customers.get(customer).await.unwrap().placed, spent_before.placed);
    assert_eq!(h.stock.get(&ProductId::new("LAMP-01")).await.unwrap().stock, 2);
    assert_eq!(h.activity.count(), 1);
}
