//! Bounded in-memory record of recent request outcomes.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use uuid::Uuid;

use crate::models::ResponseEnvelope;

/// Keeps the most recent response summaries for status lookups.
///
/// Stored entries never carry decrypted content. When full, the oldest entry
/// is evicted.
#[derive(Debug)]
pub struct RequestLog {
    capacity: usize,
    inner: Mutex<LogInner>,
}

#[derive(Debug, Default)]
struct LogInner {
    order: VecDeque<Uuid>,
    entries: HashMap<Uuid, ResponseEnvelope>,
}

impl RequestLog {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(LogInner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a response, stripped of its content.
    pub fn record(&self, response: &ResponseEnvelope) {
        let mut inner = self.lock();
        let id = response.request_id;
        if inner.entries.insert(id, response.summary()).is_none() {
            inner.order.push_back(id);
        }
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    pub fn get(&self, request_id: Uuid) -> Option<ResponseEnvelope> {
        self.lock().entries.get(&request_id).cloned()
    }

    /// Drop an entry. Returns the removed summary.
    pub fn remove(&self, request_id: Uuid) -> Option<ResponseEnvelope> {
        let mut inner = self.lock();
        let removed = inner.entries.remove(&request_id);
        if removed.is_some() {
            inner.order.retain(|id| *id != request_id);
        }
        removed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::new(lethe_core::defaults::REQUEST_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestStatus;
    use chrono::Utc;
    use lethe_core::{new_v7, MediaKind};

    fn completed() -> ResponseEnvelope {
        ResponseEnvelope {
            request_id: new_v7(),
            media_id: "m".into(),
            status: RequestStatus::Completed,
            content: Some(vec![1, 2, 3]),
            media_kind: Some(MediaKind::Text),
            probability: 1.0,
            denial: None,
            response_time: Utc::now(),
        }
    }

    #[test]
    fn test_record_strips_content() {
        let log = RequestLog::new(4);
        let resp = completed();
        log.record(&resp);

        let stored = log.get(resp.request_id).unwrap();
        assert!(stored.content.is_none());
        assert_eq!(stored.status, RequestStatus::Completed);
    }

    #[test]
    fn test_evicts_oldest() {
        let log = RequestLog::new(2);
        let a = completed();
        let b = completed();
        let c = completed();
        log.record(&a);
        log.record(&b);
        log.record(&c);

        assert_eq!(log.len(), 2);
        assert!(log.get(a.request_id).is_none());
        assert!(log.get(b.request_id).is_some());
        assert!(log.get(c.request_id).is_some());
    }

    #[test]
    fn test_rerecord_does_not_duplicate() {
        let log = RequestLog::new(2);
        let a = completed();
        log.record(&a);
        log.record(&a);
        let b = completed();
        log.record(&b);
        assert!(log.get(a.request_id).is_some());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_remove() {
        let log = RequestLog::default();
        assert_eq!(log.capacity(), 256);
        let a = completed();
        log.record(&a);
        assert!(log.remove(a.request_id).is_some());
        assert!(log.remove(a.request_id).is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let log = RequestLog::new(0);
        assert_eq!(log.capacity(), 1);
    }
}
