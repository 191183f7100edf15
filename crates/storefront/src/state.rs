//! Shared application state.

use std::sync::Arc;

use commerce::{CartService, CatalogService, LogNotifier, OrderService};
use event_store::EventStore;
use projections::{
    CartActivityView, CustomerOrdersView, OrderBoardView, ProjectionProcessor, StockLevelsView,
};

use crate::error::ApiError;

/// Services and read models every handler can reach.
pub struct AppState<S: EventStore> {
    pub store: S,
    pub catalog: Arc<CatalogService<S>>,
    pub carts: CartService<S, Arc<CatalogService<S>>>,
    pub orders: OrderService<S, LogNotifier>,
    pub processor: ProjectionProcessor<S>,
    pub order_board: OrderBoardView,
    pub customer_orders: CustomerOrdersView,
    pub stock_levels: StockLevelsView,
    pub cart_activity: CartActivityView,
}

impl<S: EventStore + Clone + 'static> AppState<S> {
    /// Wires every service and view over one store.
    pub fn new(store: S) -> Self {
        let catalog = Arc::new(CatalogService::new(store.clone()));
        let order_board = OrderBoardView::new();
        let customer_orders = CustomerOrdersView::new();
        let stock_levels = StockLevelsView::new();
        let cart_activity = CartActivityView::new();

        let mut processor = ProjectionProcessor::new(store.clone());
        processor.register(Box::new(order_board.clone()));
        processor.register(Box::new(customer_orders.clone()));
        processor.register(Box::new(stock_levels.clone()));
        processor.register(Box::new(cart_activity.clone()));

        Self {
            carts: CartService::new(store.clone(), Arc::clone(&catalog)),
            orders: OrderService::new(store.clone(), LogNotifier),
            catalog,
            processor,
            order_board,
            customer_orders,
            stock_levels,
            cart_activity,
            store,
        }
    }

    /// Applies any events the views have not seen yet. Called before every
    /// read-model query.
    pub async fn refresh_views(&self) -> Result<(), ApiError> {
        self.processor.run_catch_up().await?;
        Ok(())
    }
}
