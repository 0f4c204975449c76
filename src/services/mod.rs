//! Use cases. Each mutating call is one write transaction; notifications and
//! other side effects run only after it commits.

use std::sync::Arc;

use crate::domain::events::{DomainEvent, OrderEvent, ReturnEvent};
use crate::notify::{self, Notifier};
use crate::store::{users, Store};

pub mod accounts;
pub mod catalog;
pub mod orders;
pub mod returns;
pub mod sweeper;

pub use accounts::{UserService, UserUpdate};
pub use catalog::CatalogService;
pub use orders::{CancelOutcome, OrderService, SalesSummary};
pub use returns::{Evidence, ReturnService};
pub use sweeper::Sweeper;

/// Logs committed events and fans out the customer-facing ones.
pub(crate) async fn announce(store: &Store, notifier: &Arc<dyn Notifier>, events: Vec<DomainEvent>) {
    for event in events {
        match event {
            DomainEvent::Order(OrderEvent::Placed { order_id, .. }) => tracing::info!(%order_id, "order placed"),
            DomainEvent::Order(OrderEvent::Accepted { order_id, user_id }) => {
                tracing::info!(%order_id, "order accepted");
                let Some(user_id) = user_id else { continue };
                let recipient = match store.pool().acquire().await {
                    Ok(mut conn) => users::get(&mut conn, user_id).await.map(|u| u.username().to_string()),
                    Err(e) => Err(e.into()),
                };
                match recipient {
                    Ok(recipient) => notify::dispatch(notifier.clone(), notify::order_accepted(&recipient, &order_id)),
                    Err(e) => tracing::warn!(%order_id, error = %e, "no recipient for acceptance notice"),
                }
            }
            DomainEvent::Order(OrderEvent::StatusChanged { order_id, from, to }) => {
                tracing::info!(%order_id, %from, %to, "order status changed");
            }
            DomainEvent::Order(OrderEvent::Cancelled { order_id, status, reason }) => {
                tracing::info!(%order_id, %status, reason = reason.as_deref().unwrap_or(""), "order cancelled, stock restored");
            }
            DomainEvent::Order(OrderEvent::EstimateUpdated { order_id }) => tracing::info!(%order_id, "delivery estimate updated"),
            DomainEvent::Return(ReturnEvent::Submitted { request_id, order_id }) => {
                tracing::info!(%request_id, %order_id, "return/refund request submitted");
            }
            DomainEvent::Return(ReturnEvent::StatusChanged { request_id, from, to }) => {
                tracing::info!(%request_id, %from, %to, "return/refund request status changed");
            }
        }
    }
}
