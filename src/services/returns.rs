//! Return/refund workflow.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{RequestType, ReturnRequest, ReturnStatus};
use crate::notify::Notifier;
use crate::services::announce;
use crate::store::evidence::EvidenceStore;
use crate::store::returns::ReturnRequestView;
use crate::store::{orders, returns, Store};
use crate::Result;

/// An uploaded evidence image.
#[derive(Debug, Clone)]
pub struct Evidence {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ReturnService {
    store: Store,
    evidence: EvidenceStore,
    notifier: Arc<dyn Notifier>,
}

impl ReturnService {
    pub fn new(store: Store, evidence: EvidenceStore, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, evidence, notifier }
    }

    /// Opens a Pending request against a Delivered or Completed order. The
    /// evidence file is removed again if the request cannot be recorded.
    pub async fn submit_request(
        &self, order_id: &str, reason: &str, request_type: Option<RequestType>, evidence: Option<Evidence>,
    ) -> Result<ReturnRequest> {
        let now = Utc::now();
        let mut tx = self.store.begin_write().await?;
        let order = orders::get(tx.conn(), order_id).await?;

        let image_path = match &evidence {
            Some(e) => Some(self.evidence.path_for(order.id().as_str(), now.timestamp_millis(), &e.file_name)?),
            None => None,
        };
        let mut request = ReturnRequest::submit(&order, reason, request_type.unwrap_or_default(), image_path.clone(), now)?;

        if let (Some(path), Some(e)) = (&image_path, &evidence) {
            self.evidence.write(path, &e.bytes).await?;
        }
        let recorded = async {
            returns::insert(tx.conn(), &request).await?;
            tx.commit().await
        };
        if let Err(e) = recorded.await {
            if let Some(path) = &image_path {
                self.evidence.remove(path).await;
            }
            return Err(e);
        }

        announce(&self.store, &self.notifier, request.take_events()).await;
        Ok(request)
    }

    /// Changes a request's status. Off-graph moves need `admin_override`.
    /// Entering Returned also forces the order to Returned.
    pub async fn set_status(
        &self, request_id: Uuid, to: ReturnStatus, admin_notes: Option<String>, admin_override: bool,
    ) -> Result<ReturnRequest> {
        let now = Utc::now();
        let mut tx = self.store.begin_write().await?;
        let mut request = returns::get(tx.conn(), request_id).await?;
        request.set_status(to, admin_notes, admin_override, now)?;
        returns::save(tx.conn(), &request).await?;

        let mut order_events = vec![];
        if to == ReturnStatus::Returned {
            let mut order = orders::get(tx.conn(), request.order_id()).await?;
            order.mark_returned(now);
            orders::save(tx.conn(), &order).await?;
            order_events = order.take_events();
        }
        tx.commit().await?;

        let mut events = request.take_events();
        events.extend(order_events);
        announce(&self.store, &self.notifier, events).await;
        Ok(request)
    }

    /// Newest first; `user_id` narrows to requests the user filed or whose order they own.
    pub async fn list_requests(&self, user_id: Option<Uuid>) -> Result<Vec<ReturnRequestView>> {
        let mut conn = self.store.pool().acquire().await?;
        returns::list(&mut conn, user_id).await
    }
}
