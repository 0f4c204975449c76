//! Domain events
use crate::domain::aggregates::order::OrderStatus;
use crate::domain::aggregates::return_request::ReturnStatus;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Order(OrderEvent),
    Return(ReturnEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrderEvent {
    Placed { order_id: String, user_id: Option<Uuid> },
    Accepted { order_id: String, user_id: Option<Uuid> },
    StatusChanged { order_id: String, from: OrderStatus, to: OrderStatus },
    Cancelled { order_id: String, status: OrderStatus, reason: Option<String> },
    EstimateUpdated { order_id: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReturnEvent {
    Submitted { request_id: Uuid, order_id: String },
    StatusChanged { request_id: Uuid, from: ReturnStatus, to: ReturnStatus },
}
