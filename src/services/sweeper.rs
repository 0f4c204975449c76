//! Background auto-completion of deliveries nobody confirmed.

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;

use crate::services::OrderService;
use crate::Result;

const MIN_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

pub struct Sweeper {
    orders: OrderService,
    interval: std::time::Duration,
    max_age: Duration,
}

impl Sweeper {
    pub fn new(orders: OrderService, interval: std::time::Duration, max_age: Duration) -> Self {
        Self { orders, interval: interval.max(MIN_INTERVAL), max_age }
    }

    /// One pass at `now`. Each order is delivered in its own transaction, so
    /// one failure does not hold back the rest. Returns how many were delivered.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<usize> {
        let overdue = self.orders.overdue_deliveries(now, self.max_age).await?;
        let mut delivered = 0;
        for order_id in overdue {
            match self.orders.auto_deliver(&order_id, now, self.max_age).await {
                Ok(true) => {
                    delivered += 1;
                    tracing::info!(%order_id, "order auto-delivered");
                }
                Ok(false) => tracing::debug!(%order_id, "order moved before auto-delivery"),
                Err(e) => tracing::error!(%order_id, error = %e, "auto-delivery failed"),
            }
        }
        Ok(delivered)
    }

    /// Runs forever; the first pass happens immediately.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            match self.sweep_once(Utc::now()).await {
                Ok(0) => tracing::debug!("sweep found no overdue deliveries"),
                Ok(n) => tracing::info!(delivered = n, "sweep complete"),
                Err(e) => tracing::error!(error = %e, "sweep failed"),
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Cart, OrderStatus, PaymentMethod};
    use crate::notify::LogNotifier;
    use crate::services::orders::tests::{delivery, line, seed_product};
    use crate::store::test_store;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sweep_delivers_only_overdue_orders() {
        let store = test_store().await;
        let orders = OrderService::new(store.clone(), Arc::new(LogNotifier));
        let p = seed_product(&store, "Noodles", 1200, 10).await;

        let mut ids = vec![];
        for _ in 0..2 {
            let order = orders.create_order(Cart::from_iter([line(&p, 1)]), delivery(PaymentMethod::CashOnDelivery)).await.unwrap();
            let id = order.id().to_string();
            orders.accept_order(&id).await.unwrap();
            orders.advance_status(&id, OrderStatus::OutForDelivery, None).await.unwrap();
            ids.push(id);
        }
        let pending = orders.create_order(Cart::from_iter([line(&p, 1)]), delivery(PaymentMethod::CashOnDelivery)).await.unwrap();

        let sweeper = Sweeper::new(orders.clone(), std::time::Duration::from_secs(3600), Duration::hours(24));
        assert_eq!(sweeper.sweep_once(Utc::now() + Duration::hours(23)).await.unwrap(), 0);
        assert_eq!(orders.get_order(&ids[0]).await.unwrap().status(), OrderStatus::OutForDelivery);

        orders.mark_received(&ids[1]).await.unwrap();
        assert_eq!(sweeper.sweep_once(Utc::now() + Duration::hours(25)).await.unwrap(), 1);
        assert_eq!(orders.get_order(&ids[0]).await.unwrap().status(), OrderStatus::Delivered);
        assert_eq!(orders.get_order(pending.id().as_str()).await.unwrap().status(), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_zero_interval_does_not_kill_the_loop() {
        let store = test_store().await;
        let orders = OrderService::new(store, Arc::new(LogNotifier));
        let handle = Sweeper::new(orders, std::time::Duration::ZERO, Duration::hours(24)).spawn();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}
