//! In-memory stand-ins for every collaborator, used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::cache::{Cache, CacheError};
use crate::config::Config;
use crate::models::funds::FundTransaction;
use crate::models::profile::AccountFreeze;
use crate::services::notification_service::{Notification, Notifier, NotifyError};
use crate::state::AppState;
use crate::store::Store;
use crate::tradelab::{TradelabClient, TransportError, VendorReply, VendorRequest, VendorTransport};

enum Scripted {
    Reply(VendorReply),
    Timeout,
}

/// Replays scripted replies in order and records every request.
#[derive(Default)]
pub struct StubTransport {
    replies: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<VendorRequest>>,
}

impl StubTransport {
    pub fn push_json(&self, status: u16, body: Value) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::Reply(VendorReply {
                status,
                body: body.to_string(),
            }));
    }

    pub fn push_success(&self, data: Value) {
        self.push_json(
            200,
            serde_json::json!({ "status": "success", "message": "", "data": data }),
        );
    }

    pub fn push_timeout(&self) {
        self.replies.lock().unwrap().push_back(Scripted::Timeout);
    }

    pub fn requests(&self) -> Vec<VendorRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VendorTransport for StubTransport {
    async fn send(&self, request: &VendorRequest) -> Result<VendorReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Timeout) | None => Err(TransportError::Timeout),
        }
    }
}

/// HashMap cache remembering the TTL of each write. `fail()` makes every call
/// error; `slow()` makes every call yield first, like a network round trip.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
    failing: AtomicBool,
    yielding: AtomicBool,
}

impl MemoryCache {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn slow(&self) {
        self.yielding.store(true, Ordering::SeqCst);
    }

    async fn round_trip(&self) -> Result<(), CacheError> {
        if self.yielding.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        self.check()
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "cache down",
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.round_trip().await?;
        Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.round_trip().await?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.round_trip().await?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.round_trip().await?;
        Ok(self.entries.lock().unwrap().remove(key).map(|(v, _)| v))
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        self.round_trip().await?;
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| ("0".to_string(), ttl));
        let count = entry.0.parse::<i64>().unwrap_or(0) + 1;
        entry.0 = count.to_string();
        Ok(count)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.round_trip().await
    }
}

/// Vec-backed store. `fail()` makes every call return a pool timeout.
#[derive(Default)]
pub struct MemoryStore {
    pub fund_transactions: Mutex<Vec<FundTransaction>>,
    pub ipo_documents: Mutex<Vec<Value>>,
    pub freezes: Mutex<HashMap<String, AccountFreeze>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_fund_transaction(
        &self,
        transaction: &FundTransaction,
    ) -> Result<(), sqlx::Error> {
        self.check()?;
        self.fund_transactions
            .lock()
            .unwrap()
            .push(transaction.clone());
        Ok(())
    }

    async fn ipo_metadata_documents(&self) -> Result<Vec<Value>, sqlx::Error> {
        self.check()?;
        Ok(self.ipo_documents.lock().unwrap().clone())
    }

    async fn upsert_account_freeze(&self, freeze: &AccountFreeze) -> Result<(), sqlx::Error> {
        self.check()?;
        self.freezes
            .lock()
            .unwrap()
            .insert(freeze.client_id.clone(), freeze.clone());
        Ok(())
    }

    async fn find_account_freeze(
        &self,
        client_id: &str,
    ) -> Result<Option<AccountFreeze>, sqlx::Error> {
        self.check()?;
        Ok(self.freezes.lock().unwrap().get(client_id).cloned())
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.check()
    }
}

/// Forwards every delivery attempt to a channel so tests can await it.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<Notification>,
    succeed: bool,
}

impl RecordingNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, succeed: true }, rx)
    }

    pub fn failing() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, succeed: false }, rx)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let _ = self.tx.send(notification.clone());
        if self.succeed {
            Ok(())
        } else {
            Err(NotifyError::Rejected(503))
        }
    }
}

/// Handles to every fake behind an [`AppState`].
pub struct Harness {
    pub state: AppState,
    pub transport: Arc<StubTransport>,
    pub cache: Arc<MemoryCache>,
    pub store: Arc<MemoryStore>,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

impl Harness {
    pub fn new() -> Self {
        let transport = Arc::new(StubTransport::default());
        let cache = Arc::new(MemoryCache::default());
        let store = Arc::new(MemoryStore::default());
        let (notifier, notifications) = RecordingNotifier::new();

        let state = AppState {
            config: Arc::new(Config::for_tests()),
            tradelab: TradelabClient::new(transport.clone()),
            cache: cache.clone(),
            store: store.clone(),
            notifier: Arc::new(notifier),
        };

        Self {
            state,
            transport,
            cache,
            store,
            notifications,
        }
    }
}
