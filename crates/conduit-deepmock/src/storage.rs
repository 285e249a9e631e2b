// crates/conduit-deepmock/src/storage.rs
// ============================================================================
// Module: Deep Mock Storage
// Description: Concurrent object -> id -> record store with change observers.
// Purpose: Hold mock records with deep-copy isolation and CDC fan-out.
// Dependencies: conduit-core, tracing
// ============================================================================

//! ## Overview
//! [`Storage`] keeps every record of every object behind one reader-writer
//! lock. Records are copied on the way in and on the way out, so no caller
//! can mutate stored state through a value it holds. Stored records are
//! shared as [`Arc`] snapshots so the copy on egress happens after the lock
//! is released.
//!
//! Observers receive a private copy of every committed change. Changes are
//! queued in commit order while the write lock is held and delivered after it
//! is released, by whichever thread finds the queue idle. An observer may
//! therefore call back into the store without deadlocking.
//!
//! ## Invariants
//! - For objects with an id-field, every stored key equals the record's
//!   string-coerced id-field value.
//! - Observer delivery order equals commit order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::Record;
use conduit_core::SpecialFields;
use conduit_core::Timestamp;
use conduit_core::coerce_id;
use tracing::debug;
use tracing::error;

// ============================================================================
// SECTION: Change Events
// ============================================================================

/// Kind of committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreAction {
    /// A new record was stored.
    Create,
    /// An existing record was replaced.
    Update,
    /// A record was removed.
    Delete,
}

impl StoreAction {
    /// Returns the wire label of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for StoreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Committed change delivered to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Mutation kind.
    pub action: StoreAction,
    /// Object the record belongs to.
    pub object_name: String,
    /// Storage key of the record.
    pub record_id: String,
    /// Record after the change, or before it for deletes.
    pub record: Record,
}

/// Observer callback.
pub type Observer = dyn Fn(&ChangeEvent) + Send + Sync;

/// Registration handle returned by [`Storage::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverHandle(u64);

// ============================================================================
// SECTION: Storage
// ============================================================================

/// Records keyed by object name, then by record id.
type RecordMap = BTreeMap<String, BTreeMap<String, Arc<Record>>>;

/// Pending observer deliveries.
#[derive(Default)]
struct Dispatch {
    /// Events in commit order.
    queue: VecDeque<ChangeEvent>,
    /// True while some thread is delivering the queue.
    draining: bool,
}

/// Thread-safe in-memory record store.
pub struct Storage {
    /// Records protected by the store lock.
    data: RwLock<RecordMap>,
    /// Id-field per object.
    id_fields: BTreeMap<String, String>,
    /// Updated-field per object.
    updated_fields: BTreeMap<String, String>,
    /// Registered observers in registration order.
    observers: RwLock<Vec<(ObserverHandle, Arc<Observer>)>>,
    /// Next observer handle value.
    next_handle: AtomicU64,
    /// Pending deliveries.
    dispatch: Mutex<Dispatch>,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

impl Storage {
    /// Creates a store that knows each object's special fields.
    #[must_use]
    pub fn new(special_fields: &BTreeMap<String, SpecialFields>) -> Self {
        let mut id_fields = BTreeMap::new();
        let mut updated_fields = BTreeMap::new();
        for (object_name, fields) in special_fields {
            if let Some(id_field) = &fields.id_field {
                id_fields.insert(object_name.clone(), id_field.clone());
            }
            if let Some(updated_field) = &fields.updated_field {
                updated_fields.insert(object_name.clone(), updated_field.clone());
            }
        }
        Self {
            data: RwLock::new(BTreeMap::new()),
            id_fields,
            updated_fields,
            observers: RwLock::new(Vec::new()),
            next_handle: AtomicU64::new(1),
            dispatch: Mutex::new(Dispatch::default()),
        }
    }

    /// Stores a copy of `record` under `(object_name, record_id)`.
    ///
    /// Observers see `create` when the key was vacant and `update` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Cancelled`] for a cancelled context,
    /// [`ConnectorError::InvalidParameter`] when the record's id-field does not
    /// match `record_id`, or [`ConnectorError::Internal`] for a poisoned lock.
    pub fn store(
        &self,
        ctx: &Context,
        object_name: &str,
        record_id: &str,
        record: &Record,
    ) -> Result<StoreAction, ConnectorError> {
        ctx.check()?;
        self.check_id(object_name, record_id, record)?;
        let snapshot = Arc::new(record.clone());
        let action = {
            let mut data = self.write_data()?;
            let previous = data
                .entry(object_name.to_string())
                .or_default()
                .insert(record_id.to_string(), Arc::clone(&snapshot));
            let action = if previous.is_some() { StoreAction::Update } else { StoreAction::Create };
            self.enqueue(object_name, record_id, action, &snapshot)?;
            action
        };
        self.deliver()?;
        Ok(action)
    }

    /// Returns a copy of one record.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::RecordNotFound`] when the object or id is absent.
    pub fn get(
        &self,
        ctx: &Context,
        object_name: &str,
        record_id: &str,
    ) -> Result<Record, ConnectorError> {
        ctx.check()?;
        let snapshot = {
            let data = self.read_data()?;
            data.get(object_name).and_then(|records| records.get(record_id)).cloned()
        };
        snapshot
            .map(|record| record.as_ref().clone())
            .ok_or_else(|| not_found(object_name, record_id))
    }

    /// Returns copies of every record of an object, ordered by record id.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Cancelled`] or [`ConnectorError::Internal`].
    pub fn get_all(&self, ctx: &Context, object_name: &str) -> Result<Vec<Record>, ConnectorError> {
        Ok(self
            .snapshots(ctx, object_name)?
            .into_iter()
            .map(|(_, record)| record.as_ref().clone())
            .collect())
    }

    /// Removes one record and returns its last state.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::RecordNotFound`] when the object or id is absent.
    pub fn delete(
        &self,
        ctx: &Context,
        object_name: &str,
        record_id: &str,
    ) -> Result<Record, ConnectorError> {
        ctx.check()?;
        let removed = {
            let mut data = self.write_data()?;
            let removed = data
                .get_mut(object_name)
                .and_then(|records| records.remove(record_id))
                .ok_or_else(|| not_found(object_name, record_id))?;
            self.enqueue(object_name, record_id, StoreAction::Delete, &removed)?;
            removed
        };
        self.deliver()?;
        Ok(removed.as_ref().clone())
    }

    /// Returns copies of the records whose updated-field lies in `[since, until]`.
    ///
    /// With no bounds every record is returned. With any bound set, records
    /// lacking a parseable updated-field are skipped, and objects without an
    /// updated-field yield nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Cancelled`] or [`ConnectorError::Internal`].
    pub fn list(
        &self,
        ctx: &Context,
        object_name: &str,
        since: Option<Timestamp>,
        until: Option<Timestamp>,
    ) -> Result<Vec<(String, Record)>, ConnectorError> {
        let snapshots = self.snapshots(ctx, object_name)?;
        let bounded = since.is_some() || until.is_some();
        let updated_field = self.updated_fields.get(object_name);
        if bounded && updated_field.is_none() {
            return Ok(Vec::new());
        }
        Ok(snapshots
            .into_iter()
            .filter(|(_, record)| {
                if !bounded {
                    return true;
                }
                let stamp = updated_field
                    .and_then(|field| record.get(field))
                    .and_then(Timestamp::parse_value);
                stamp.is_some_and(|stamp| {
                    since.is_none_or(|since| since <= stamp)
                        && until.is_none_or(|until| stamp <= until)
                })
            })
            .map(|(id, record)| (id, record.as_ref().clone()))
            .collect())
    }

    /// Returns the number of records stored for an object.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Internal`] for a poisoned lock.
    pub fn count(&self, object_name: &str) -> Result<usize, ConnectorError> {
        Ok(self.read_data()?.get(object_name).map_or(0, BTreeMap::len))
    }

    /// Registers an observer and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Internal`] for a poisoned lock.
    pub fn register(&self, observer: Arc<Observer>) -> Result<ObserverHandle, ConnectorError> {
        let handle = ObserverHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .map_err(|_| poisoned("observer list"))?
            .push((handle, observer));
        debug!(handle = handle.0, "storage observer registered");
        Ok(handle)
    }

    /// Removes an observer; returns false when the handle was unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Internal`] for a poisoned lock.
    pub fn unregister(&self, handle: ObserverHandle) -> Result<bool, ConnectorError> {
        let mut observers = self.observers.write().map_err(|_| poisoned("observer list"))?;
        let before = observers.len();
        observers.retain(|(candidate, _)| *candidate != handle);
        let removed = observers.len() != before;
        drop(observers);
        if removed {
            debug!(handle = handle.0, "storage observer unregistered");
        }
        Ok(removed)
    }

    /// Rejects records whose id-field disagrees with the storage key.
    fn check_id(
        &self,
        object_name: &str,
        record_id: &str,
        record: &Record,
    ) -> Result<(), ConnectorError> {
        if record_id.is_empty() {
            return Err(ConnectorError::MissingRecordId(format!(
                "store into {object_name} requires a record id"
            )));
        }
        let Some(id_field) = self.id_fields.get(object_name) else {
            return Ok(());
        };
        match record.get(id_field).and_then(coerce_id) {
            Some(id) if id == record_id => Ok(()),
            Some(id) => Err(ConnectorError::InvalidParameter(format!(
                "record id {id} in {object_name}.{id_field} does not match key {record_id}"
            ))),
            None => Err(ConnectorError::InvalidParameter(format!(
                "record for {object_name} lacks a string or integer {id_field}"
            ))),
        }
    }

    /// Clones the record handles of an object under the read lock.
    fn snapshots(
        &self,
        ctx: &Context,
        object_name: &str,
    ) -> Result<Vec<(String, Arc<Record>)>, ConnectorError> {
        ctx.check()?;
        let data = self.read_data()?;
        Ok(data
            .get(object_name)
            .map(|records| {
                records.iter().map(|(id, record)| (id.clone(), Arc::clone(record))).collect()
            })
            .unwrap_or_default())
    }

    /// Queues a change; called with the write lock held.
    fn enqueue(
        &self,
        object_name: &str,
        record_id: &str,
        action: StoreAction,
        record: &Arc<Record>,
    ) -> Result<(), ConnectorError> {
        let mut dispatch = self.lock_dispatch()?;
        dispatch.queue.push_back(ChangeEvent {
            action,
            object_name: object_name.to_string(),
            record_id: record_id.to_string(),
            record: record.as_ref().clone(),
        });
        Ok(())
    }

    /// Delivers queued changes unless another thread already is.
    fn deliver(&self) -> Result<(), ConnectorError> {
        {
            let mut dispatch = self.lock_dispatch()?;
            if dispatch.draining {
                return Ok(());
            }
            dispatch.draining = true;
        }
        loop {
            let event = {
                let mut dispatch = self.lock_dispatch()?;
                let Some(event) = dispatch.queue.pop_front() else {
                    dispatch.draining = false;
                    return Ok(());
                };
                event
            };
            let observers: Vec<Arc<Observer>> = match self.observers.read() {
                Ok(observers) => {
                    observers.iter().map(|(_, observer)| Arc::clone(observer)).collect()
                }
                Err(_) => {
                    self.lock_dispatch()?.draining = false;
                    return Err(poisoned("observer list"));
                }
            };
            for observer in observers {
                let outcome = catch_unwind(AssertUnwindSafe(|| observer(&event)));
                if let Err(payload) = outcome {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|text| (*text).to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!(
                        object = %event.object_name,
                        action = %event.action,
                        panic = %message,
                        "storage observer panicked"
                    );
                }
            }
        }
    }

    /// Acquires the record map for reading.
    fn read_data(&self) -> Result<std::sync::RwLockReadGuard<'_, RecordMap>, ConnectorError> {
        self.data.read().map_err(|_| poisoned("record store"))
    }

    /// Acquires the record map for writing.
    fn write_data(&self) -> Result<std::sync::RwLockWriteGuard<'_, RecordMap>, ConnectorError> {
        self.data.write().map_err(|_| poisoned("record store"))
    }

    /// Acquires the dispatch queue.
    fn lock_dispatch(&self) -> Result<MutexGuard<'_, Dispatch>, ConnectorError> {
        self.dispatch.lock().map_err(|_| poisoned("observer queue"))
    }
}

/// Builds the not-found error for a key.
fn not_found(object_name: &str, record_id: &str) -> ConnectorError {
    ConnectorError::RecordNotFound(format!("{object_name}/{record_id}"))
}

/// Builds the error for a poisoned lock.
fn poisoned(what: &str) -> ConnectorError {
    ConnectorError::Internal(format!("{what} lock poisoned"))
}
