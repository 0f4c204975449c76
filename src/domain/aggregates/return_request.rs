//! Return/Refund Request Aggregate
//!
//! `Pending -> Approved | Rejected`, then `Approved -> Returned` for returns and
//! `Approved -> Refunded` for refunds. Admins may override the graph explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::aggregates::order::Order;
use crate::domain::events::{DomainEvent, ReturnEvent};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    #[default]
    Return,
    Refund,
}

impl RequestType {
    pub const fn as_str(&self) -> &'static str {
        match self { Self::Return => "Return", Self::Refund => "Refund" }
    }
}

impl FromStr for RequestType {
    type Err = ReturnError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Return" => Ok(Self::Return),
            "Refund" => Ok(Self::Refund),
            other => Err(ReturnError::UnknownRequestType(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnStatus {
    Pending,
    Approved,
    Returned,
    Refunded,
    Rejected,
}

impl ReturnStatus {
    pub const ALL: [ReturnStatus; 5] = [Self::Pending, Self::Approved, Self::Returned, Self::Refunded, Self::Rejected];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Returned => "Returned",
            Self::Refunded => "Refunded",
            Self::Rejected => "Rejected",
        }
    }

    pub fn next_statuses(&self, request_type: RequestType) -> &'static [ReturnStatus] {
        match (self, request_type) {
            (Self::Pending, _) => &[Self::Approved, Self::Rejected],
            (Self::Approved, RequestType::Return) => &[Self::Returned],
            (Self::Approved, RequestType::Refund) => &[Self::Refunded],
            _ => &[],
        }
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ReturnStatus {
    type Err = ReturnError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| ReturnError::UnknownStatus(s.to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct ReturnRequest {
    id: Uuid,
    order_id: String,
    user_id: Option<Uuid>,
    reason: String,
    image_path: Option<String>,
    request_type: RequestType,
    status: ReturnStatus,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl ReturnRequest {
    /// Customer submission; only fulfilled orders are eligible.
    pub fn submit(
        order: &Order, reason: &str, request_type: RequestType, image_path: Option<String>, now: DateTime<Utc>,
    ) -> Result<Self, ReturnError> {
        if !order.status().is_fulfilled() {
            return Err(ReturnError::OrderNotEligible { order_id: order.id().to_string(), status: order.status().to_string() });
        }
        Self::open(order, reason, request_type, image_path, now)
    }

    /// Refund opened automatically when a prepaid order is cancelled.
    pub fn auto_refund(order: &Order, cancel_reason: &str, now: DateTime<Utc>) -> Result<Self, ReturnError> {
        Self::open(order, &format!("Order cancelled - {}", cancel_reason.trim()), RequestType::Refund, None, now)
    }

    fn open(
        order: &Order, reason: &str, request_type: RequestType, image_path: Option<String>, now: DateTime<Utc>,
    ) -> Result<Self, ReturnError> {
        let reason = reason.trim();
        if reason.is_empty() { return Err(ReturnError::MissingReason); }
        let mut request = Self {
            id: Uuid::now_v7(), order_id: order.id().to_string(), user_id: order.user_id(), reason: reason.to_string(),
            image_path, request_type, status: ReturnStatus::Pending, admin_notes: None,
            created_at: now, updated_at: now, events: vec![],
        };
        request.events.push(DomainEvent::Return(ReturnEvent::Submitted { request_id: request.id, order_id: request.order_id.clone() }));
        Ok(request)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: Uuid, order_id: String, user_id: Option<Uuid>, reason: String, image_path: Option<String>,
        request_type: RequestType, status: ReturnStatus, admin_notes: Option<String>,
        created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, order_id, user_id, reason, image_path, request_type, status, admin_notes, created_at, updated_at, events: vec![] }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_id(&self) -> &str { &self.order_id }
    pub fn user_id(&self) -> Option<Uuid> { self.user_id }
    pub fn reason(&self) -> &str { &self.reason }
    pub fn image_path(&self) -> Option<&str> { self.image_path.as_deref() }
    pub fn request_type(&self) -> RequestType { self.request_type }
    pub fn status(&self) -> ReturnStatus { self.status }
    pub fn admin_notes(&self) -> Option<&str> { self.admin_notes.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Moves along the graph unless `admin_override` is set. Notes are replaced.
    pub fn set_status(
        &mut self, to: ReturnStatus, admin_notes: Option<String>, admin_override: bool, now: DateTime<Utc>,
    ) -> Result<ReturnStatus, ReturnError> {
        let allowed = self.status.next_statuses(self.request_type);
        if !admin_override && !allowed.contains(&to) {
            return Err(ReturnError::InvalidTransition { from: self.status, to, allowed: allowed.to_vec() });
        }
        let from = self.status;
        self.status = to;
        self.admin_notes = admin_notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.updated_at = now;
        self.events.push(DomainEvent::Return(ReturnEvent::StatusChanged { request_id: self.id, from, to }));
        Ok(from)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnError {
    MissingReason,
    OrderNotEligible { order_id: String, status: String },
    InvalidTransition { from: ReturnStatus, to: ReturnStatus, allowed: Vec<ReturnStatus> },
    UnknownStatus(String),
    UnknownRequestType(String),
}

impl std::error::Error for ReturnError {}
impl fmt::Display for ReturnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReason => write!(f, "Reason is required"),
            Self::OrderNotEligible { order_id, status } => write!(f, "Order {order_id} is {status}"),
            Self::InvalidTransition { from, to, .. } => write!(f, "Cannot change request from \"{from}\" to \"{to}\""),
            Self::UnknownStatus(s) => write!(
                f, "Invalid status \"{s}\". Must be one of: {}",
                ReturnStatus::ALL.map(|st| st.as_str()).join(", ")
            ),
            Self::UnknownRequestType(s) => write!(f, "Invalid request type \"{s}\". Must be Return or Refund"),
        }
    }
}

impl From<ReturnError> for crate::GroceryError {
    fn from(e: ReturnError) -> Self {
        match e {
            ReturnError::OrderNotEligible { order_id, status } => Self::OrderNotEligible { order_id, status },
            ReturnError::InvalidTransition { from, to, allowed } => Self::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
                allowed: allowed.iter().map(ToString::to_string).collect(),
            },
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_branches_by_request_type() {
        assert_eq!(ReturnStatus::Approved.next_statuses(RequestType::Return), &[ReturnStatus::Returned]);
        assert_eq!(ReturnStatus::Approved.next_statuses(RequestType::Refund), &[ReturnStatus::Refunded]);
        assert!(ReturnStatus::Rejected.next_statuses(RequestType::Return).is_empty());
    }

    #[test]
    fn test_set_status_enforces_graph_unless_overridden() {
        let now = Utc::now();
        let mut r = ReturnRequest::rehydrate(
            Uuid::now_v7(), "ORD-20240101-0001".into(), None, "bruised".into(), None,
            RequestType::Refund, ReturnStatus::Pending, None, now, now,
        );
        let err = r.set_status(ReturnStatus::Refunded, None, false, now).unwrap_err();
        assert!(matches!(err, ReturnError::InvalidTransition { .. }));
        r.set_status(ReturnStatus::Approved, Some("ok".into()), false, now).unwrap();
        assert!(r.set_status(ReturnStatus::Returned, None, false, now).is_err());
        assert_eq!(r.set_status(ReturnStatus::Returned, None, true, now).unwrap(), ReturnStatus::Approved);
        assert_eq!(r.status(), ReturnStatus::Returned);
        assert_eq!(r.take_events().len(), 2);
    }

    #[test]
    fn test_unknown_status_message() {
        let err = "Lost".parse::<ReturnStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid status \"Lost\". Must be one of: Pending, Approved, Returned, Refunded, Rejected");
    }
}
