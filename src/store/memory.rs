//! In-process store used by the test suites.

use super::{Subscription, SubscriptionStore};
use crate::error::{AppError, AppResult};
use crate::models::UsageKind;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
pub struct InMemorySubscriptionStore {
    records: Mutex<HashMap<String, Subscription>>,
    unavailable: AtomicBool,
    atomic_increment_broken: AtomicBool,
    /// Record slipped in right before the next insert, as a concurrent writer would.
    preempt_insert: Mutex<Option<Subscription>>,
    increment_gate: Mutex<Option<Arc<Notify>>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, record: Subscription) {
        self.records
            .lock()
            .unwrap()
            .insert(record.user_email.clone(), record);
    }

    pub fn get(&self, identity: &str) -> Option<Subscription> {
        self.records.lock().unwrap().get(identity).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn break_atomic_increment(&self) {
        self.atomic_increment_broken.store(true, Ordering::SeqCst);
    }

    pub fn preempt_next_insert(&self, winner: Subscription) {
        *self.preempt_insert.lock().unwrap() = Some(winner);
    }

    /// Blocks increments until the returned handle is notified.
    pub fn hold_increments(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.increment_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::storage("connection refused"));
        }
        Ok(())
    }

    fn counter(record: &mut Subscription, kind: UsageKind) -> &mut i32 {
        match kind {
            UsageKind::Message => &mut record.messages_used,
            UsageKind::Image => &mut record.images_used,
        }
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find(&self, identity: &str) -> AppResult<Option<Subscription>> {
        self.check_available()?;
        Ok(self.get(identity))
    }

    async fn insert_if_absent(&self, record: Subscription) -> AppResult<Option<Subscription>> {
        self.check_available()?;
        let preempted = self.preempt_insert.lock().unwrap().take();
        let mut records = self.records.lock().unwrap();
        if let Some(winner) = preempted {
            records.insert(winner.user_email.clone(), winner);
        }
        if records.contains_key(&record.user_email) {
            return Ok(None);
        }
        records.insert(record.user_email.clone(), record.clone());
        Ok(Some(record))
    }

    async fn increment_usage(&self, identity: &str, kind: UsageKind) -> AppResult<bool> {
        let gate = self.increment_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_available()?;
        if self.atomic_increment_broken.load(Ordering::SeqCst) {
            return Err(AppError::storage("function increment_usage does not exist"));
        }
        let mut records = self.records.lock().unwrap();
        match records.get_mut(identity) {
            Some(record) => {
                *Self::counter(record, kind) += 1;
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn raise_usage(&self, identity: &str, kind: UsageKind, value: i32) -> AppResult<bool> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.get_mut(identity) else {
            return Ok(false);
        };
        let counter = Self::counter(record, kind);
        if *counter >= value {
            return Ok(false);
        }
        *counter = value;
        record.updated_at = Utc::now();
        Ok(true)
    }
}
