//! In-process registry of live subscriber channels, keyed by user id.
//!
//! The registry is the only shared mutable state in the service. Each
//! WebSocket connection registers an unbounded sender here; handlers push
//! newly stored records through [`SubscriptionRegistry::broadcast`], and the
//! connection task pumps its receiver into the socket. Delivery is
//! best-effort and at-most-once: there is no acknowledgment, no replay, and a
//! handle whose receiver is gone is dropped from the registry instead of
//! retried.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Utf8Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::models::processed_agent_data::ProcessedAgentDataResponse;
use crate::types::{SubscriberId, UserId};

/// Registry of live update channels per user id.
///
/// DashMap shards serialize concurrent subscribe/unsubscribe/broadcast for
/// the same user id; different user ids do not contend.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    channels: DashMap<UserId, HashMap<SubscriberId, mpsc::UnboundedSender<Utf8Bytes>>>,
    next_subscriber_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber for `user_id`. Returns the handle id to
    /// deregister with and the receiving end of the push channel.
    pub fn subscribe(&self, user_id: UserId) -> (SubscriberId, mpsc::UnboundedReceiver<Utf8Bytes>) {
        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels.entry(user_id).or_default().insert(subscriber_id, tx);
        debug!(user_id, subscriber_id, "subscriber registered");
        (subscriber_id, rx)
    }

    /// Remove a subscriber handle. Dropping the last handle for a user id
    /// removes the user's entry entirely.
    pub fn unsubscribe(&self, user_id: UserId, subscriber_id: SubscriberId) {
        if let Some(mut handles) = self.channels.get_mut(&user_id) {
            handles.remove(&subscriber_id);
            let now_empty = handles.is_empty();
            drop(handles);
            if now_empty {
                self.channels.remove_if(&user_id, |_, handles| handles.is_empty());
            }
        }
        debug!(user_id, subscriber_id, "subscriber deregistered");
    }

    /// Send `record` to every handle currently registered under its user id.
    ///
    /// Each delivery is independent: a failed send (receiver dropped) drops
    /// that handle only and never propagates to the caller. No registered
    /// handles is a silent no-op. Returns the number of handles delivered to.
    pub fn broadcast(&self, user_id: UserId, record: &ProcessedAgentDataResponse) -> usize {
        let Some(mut handles) = self.channels.get_mut(&user_id) else {
            return 0;
        };

        let payload: Utf8Bytes = match serde_json::to_string(record) {
            Ok(json) => json.into(),
            Err(err) => {
                warn!(user_id, error = %err, "failed to serialize record for broadcast");
                return 0;
            }
        };

        let before = handles.len();
        handles.retain(|subscriber_id, tx| {
            let delivered = tx.send(payload.clone()).is_ok();
            if !delivered {
                debug!(user_id, subscriber_id, "dropping dead subscriber handle");
            }
            delivered
        });
        let delivered = handles.len();
        let now_empty = handles.is_empty();
        drop(handles);
        if now_empty {
            self.channels.remove_if(&user_id, |_, handles| handles.is_empty());
        }

        if delivered < before {
            debug!(user_id, removed = before - delivered, "pruned dead subscriber handles");
        }
        delivered
    }

    /// Number of handles currently registered for `user_id`.
    pub fn subscriber_count(&self, user_id: UserId) -> usize {
        self.channels.get(&user_id).map(|handles| handles.len()).unwrap_or(0)
    }
}
