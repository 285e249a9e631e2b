// crates/conduit-deepmock/src/connector.rs
// ============================================================================
// Module: Deep Mock Connector
// Description: In-memory connector over the schema registry and storage.
// Purpose: Serve every capability without a provider behind it.
// Dependencies: conduit-core, serde_json, tracing, uuid
// ============================================================================

//! ## Overview
//! [`DeepMockConnector`] implements read, write, delete, metadata listing,
//! batch reads, and subscriptions against [`Storage`]. Every written record is
//! validated against its object's compiled schema before it is stored.
//!
//! Read pages are addressed by decimal offsets. A token that does not parse
//! restarts at offset zero.
//!
//! ## Write flow
//! Create fills a missing id-field with a generated id and a missing
//! updated-field with the current time. Update merges the payload over the
//! stored record (payload wins per key) and refreshes the updated-field
//! unless the payload sets it. Both paths validate, then store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use conduit_core::BatchRecordReader;
use conduit_core::Connector;
use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::Deleter;
use conduit_core::DeleteParams;
use conduit_core::DeleteResult;
use conduit_core::ListObjectMetadataResult;
use conduit_core::NextPage;
use conduit_core::ReadParams;
use conduit_core::ReadResult;
use conduit_core::ReadResultRow;
use conduit_core::Reader;
use conduit_core::Record;
use conduit_core::SchemaProvider;
use conduit_core::SubscribeParams;
use conduit_core::Subscriber;
use conduit_core::SubscriptionResult;
use conduit_core::SubscriptionStatus;
use conduit_core::WebhookMessage;
use conduit_core::WriteParams;
use conduit_core::WriteResult;
use conduit_core::Writer;
use conduit_core::coerce_id;
use conduit_core::select_fields;
use serde_json::Value;
use tracing::debug;
use tracing::info;
use uuid::Uuid;

use crate::config::DeepMockConfig;
use crate::generator::RecordGenerator;
use crate::generator::generate_id;
use crate::generator::generate_timestamp;
use crate::registry::SchemaEntry;
use crate::registry::SchemaRegistry;
use crate::registry::SchemaSources;
use crate::storage::Observer;
use crate::storage::ObserverHandle;
use crate::storage::Storage;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Provider name reported by the connector.
pub const PROVIDER_NAME: &str = "deepmock";

// ============================================================================
// SECTION: Connector
// ============================================================================

/// In-memory connector backed by JSON Schema validated storage.
pub struct DeepMockConnector {
    /// Compiled schemas, read-only after construction.
    registry: SchemaRegistry,
    /// Record store.
    storage: Storage,
    /// Random record generator.
    generator: RecordGenerator,
    /// Page size used when a read does not set one.
    page_size: usize,
    /// Subscription trackers keyed by subscription id.
    subscriptions: Mutex<BTreeMap<String, SubscriptionResult>>,
}

impl DeepMockConnector {
    /// Builds a connector from settings and schema sources.
    ///
    /// Files listed in `config.schema_paths` are added as raw sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidParameter`] for a zero page size and
    /// [`ConnectorError::InvalidSchema`] when a schema cannot be loaded.
    pub fn new(config: &DeepMockConfig, sources: SchemaSources) -> Result<Self, ConnectorError> {
        if config.page_size == 0 {
            return Err(ConnectorError::InvalidParameter(
                "deep mock page size must be positive".to_string(),
            ));
        }
        let sources = sources.with_files(&config.schema_paths)?;
        let registry = SchemaRegistry::from_sources(sources)?;
        let storage = Storage::new(&registry.special_fields());
        info!(
            objects = registry.len(),
            page_size = config.page_size,
            seeded = config.seed.is_some(),
            "deep mock connector ready"
        );
        Ok(Self {
            registry,
            storage,
            generator: RecordGenerator::from_config(config),
            page_size: config.page_size,
            subscriptions: Mutex::new(BTreeMap::new()),
        })
    }

    /// Returns the schema registry.
    #[must_use]
    pub const fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Generates a random record that validates against the object's schema.
    ///
    /// The record is not stored.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SchemaNotFound`] for unknown objects, or the
    /// generator's schema and exhaustion errors.
    pub fn generate_random_record(&self, object_name: &str) -> Result<Record, ConnectorError> {
        let entry = self.registry.get(object_name)?;
        self.generator.generate_record(entry)
    }

    /// Registers a change observer on the store.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Internal`] for a poisoned lock.
    pub fn register_observer(
        &self,
        observer: Arc<Observer>,
    ) -> Result<ObserverHandle, ConnectorError> {
        self.storage.register(observer)
    }

    /// Removes a change observer; returns false for unknown handles.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Internal`] for a poisoned lock.
    pub fn unregister_observer(&self, handle: ObserverHandle) -> Result<bool, ConnectorError> {
        self.storage.unregister(handle)
    }

    /// Returns the active subscriptions ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Internal`] for a poisoned lock.
    pub fn subscriptions(&self) -> Result<Vec<SubscriptionResult>, ConnectorError> {
        Ok(self.lock_subscriptions()?.values().cloned().collect())
    }

    /// Prepares a create: fills generated fields and picks the storage key.
    fn prepare_create(
        entry: &SchemaEntry,
        mut record: Record,
    ) -> Result<(String, Record), ConnectorError> {
        if let Some(updated_field) = entry.updated_field()
            && !record.contains_key(updated_field)
        {
            let stamp = generate_timestamp(entry.schema(), updated_field)?;
            record.insert(updated_field.to_string(), stamp);
        }
        let Some(id_field) = entry.id_field() else {
            return Ok((Uuid::new_v4().to_string(), record));
        };
        if !record.contains_key(id_field) {
            record.insert(id_field.to_string(), generate_id(entry.schema(), id_field));
        }
        let record_id = record.get(id_field).and_then(coerce_id).ok_or_else(|| {
            ConnectorError::InvalidParameter(format!(
                "{id_field} of {} must be a non-empty string or an integer",
                entry.object_name()
            ))
        })?;
        Ok((record_id, record))
    }

    /// Prepares an update: merges the payload over the stored record.
    fn prepare_update(
        &self,
        ctx: &Context,
        entry: &SchemaEntry,
        record_id: &str,
        payload: Record,
    ) -> Result<Record, ConnectorError> {
        let mut merged = self.storage.get(ctx, entry.object_name(), record_id)?;
        let refresh = entry.updated_field().filter(|field| !payload.contains_key(*field));
        merged.extend(payload);
        if let Some(updated_field) = refresh {
            let stamp = generate_timestamp(entry.schema(), updated_field)?;
            merged.insert(updated_field.to_string(), stamp);
        }
        if let Some(id_field) = entry.id_field()
            && merged.get(id_field).and_then(coerce_id).as_deref() != Some(record_id)
        {
            return Err(ConnectorError::InvalidParameter(format!(
                "update of {}/{record_id} must not change {id_field}",
                entry.object_name()
            )));
        }
        Ok(merged)
    }

    /// Locks the subscription trackers.
    fn lock_subscriptions(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<String, SubscriptionResult>>, ConnectorError> {
        self.subscriptions
            .lock()
            .map_err(|_| ConnectorError::Internal("subscription lock poisoned".to_string()))
    }
}

/// Builds a read row from a stored record.
fn to_row(record_id: String, record: Record, fields: &BTreeSet<String>) -> ReadResultRow {
    ReadResultRow {
        id: record_id,
        fields: select_fields(&record, fields),
        raw: record,
    }
}

/// Extracts the JSON object payload of a write.
fn payload_record(params: &WriteParams) -> Result<Record, ConnectorError> {
    match &params.record_data {
        Some(Value::Object(record)) => Ok(record.clone()),
        _ => Err(ConnectorError::InvalidParameter(format!(
            "record data for {} must be a JSON object",
            params.object_name
        ))),
    }
}

// ============================================================================
// SECTION: Capabilities
// ============================================================================

impl Reader for DeepMockConnector {
    fn read(&self, ctx: &Context, params: &ReadParams) -> Result<ReadResult, ConnectorError> {
        params.validate(false)?;
        self.registry.get(&params.object_name)?;
        let records = self.storage.list(ctx, &params.object_name, params.since, params.until)?;
        let offset = params.next_page.as_str().parse::<usize>().unwrap_or(0);
        let page_size = params.page_size.unwrap_or(self.page_size);
        let total = records.len();
        let data: Vec<ReadResultRow> = records
            .into_iter()
            .skip(offset)
            .take(page_size)
            .map(|(record_id, record)| to_row(record_id, record, &params.fields))
            .collect();
        let end = offset.saturating_add(data.len());
        let next_page = if end < total { NextPage::new(end.to_string()) } else { NextPage::done() };
        Ok(ReadResult::new(data, next_page))
    }
}

impl Writer for DeepMockConnector {
    fn write(&self, ctx: &Context, params: &WriteParams) -> Result<WriteResult, ConnectorError> {
        params.validate()?;
        ctx.check()?;
        let entry = self.registry.get(&params.object_name)?;
        let payload = payload_record(params)?;
        let (record_id, record) = if params.is_create() {
            Self::prepare_create(entry, payload)?
        } else {
            let merged = self.prepare_update(ctx, entry, &params.record_id, payload)?;
            (params.record_id.clone(), merged)
        };
        entry.validator().validate(&Value::Object(record.clone()))?;
        let action = self.storage.store(ctx, &params.object_name, &record_id, &record)?;
        debug!(
            object = %params.object_name,
            record_id = %record_id,
            action = %action,
            "record written"
        );
        Ok(WriteResult {
            success: true,
            record_id,
            data: record,
            errors: Vec::new(),
        })
    }
}

impl Deleter for DeepMockConnector {
    fn delete(&self, ctx: &Context, params: &DeleteParams) -> Result<DeleteResult, ConnectorError> {
        params.validate()?;
        self.storage.delete(ctx, &params.object_name, &params.record_id)?;
        Ok(DeleteResult {
            success: true,
        })
    }
}

impl SchemaProvider for DeepMockConnector {
    fn list_object_metadata(
        &self,
        ctx: &Context,
        object_names: &[String],
    ) -> Result<ListObjectMetadataResult, ConnectorError> {
        if object_names.is_empty() {
            return Err(ConnectorError::MissingObjects(
                "list object metadata requires at least one object".to_string(),
            ));
        }
        ctx.check()?;
        let mut result = ListObjectMetadataResult::default();
        for object_name in object_names {
            match self.registry.get(object_name) {
                Ok(entry) => {
                    let metadata = entry.schema().to_object_metadata(object_name);
                    result.insert_metadata(object_name.clone(), metadata);
                }
                Err(err) => result.insert_error(object_name.clone(), err),
            }
        }
        Ok(result)
    }
}

impl BatchRecordReader for DeepMockConnector {
    fn get_records_by_ids(
        &self,
        ctx: &Context,
        object_name: &str,
        ids: &[String],
        fields: &BTreeSet<String>,
    ) -> Result<Vec<ReadResultRow>, ConnectorError> {
        self.registry.get(object_name)?;
        let mut rows = Vec::with_capacity(ids.len());
        for record_id in ids {
            match self.storage.get(ctx, object_name, record_id) {
                Ok(record) => rows.push(to_row(record_id.clone(), record, fields)),
                Err(ConnectorError::RecordNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(rows)
    }
}

impl Subscriber for DeepMockConnector {
    fn subscribe(
        &self,
        ctx: &Context,
        params: &SubscribeParams,
    ) -> Result<SubscriptionResult, ConnectorError> {
        ctx.check()?;
        if params.object_names.is_empty() {
            return Err(ConnectorError::MissingObjects(
                "subscribe requires at least one object".to_string(),
            ));
        }
        for object_name in &params.object_names {
            self.registry.get(object_name)?;
        }
        let subscription = SubscriptionResult {
            id: Uuid::new_v4().to_string(),
            status: SubscriptionStatus::Active,
            object_names: params.object_names.clone(),
            events: params.events.clone(),
        };
        self.lock_subscriptions()?.insert(subscription.id.clone(), subscription.clone());
        debug!(
            subscription = %subscription.id,
            objects = subscription.object_names.len(),
            "subscription recorded"
        );
        Ok(subscription)
    }

    fn unsubscribe(
        &self,
        ctx: &Context,
        subscription: &SubscriptionResult,
    ) -> Result<SubscriptionResult, ConnectorError> {
        ctx.check()?;
        let mut removed = self.lock_subscriptions()?.remove(&subscription.id).ok_or_else(|| {
            ConnectorError::InvalidParameter(format!("unknown subscription {}", subscription.id))
        })?;
        removed.status = SubscriptionStatus::Inactive;
        Ok(removed)
    }

    fn verify_webhook_message(
        &self,
        ctx: &Context,
        _message: &WebhookMessage,
    ) -> Result<bool, ConnectorError> {
        ctx.check()?;
        Ok(true)
    }
}

impl Connector for DeepMockConnector {
    fn provider(&self) -> &str {
        PROVIDER_NAME
    }

    fn as_reader(&self) -> Option<&dyn Reader> {
        Some(self)
    }

    fn as_writer(&self) -> Option<&dyn Writer> {
        Some(self)
    }

    fn as_deleter(&self) -> Option<&dyn Deleter> {
        Some(self)
    }

    fn as_schema_provider(&self) -> Option<&dyn SchemaProvider> {
        Some(self)
    }

    fn as_batch_reader(&self) -> Option<&dyn BatchRecordReader> {
        Some(self)
    }

    fn as_subscriber(&self) -> Option<&dyn Subscriber> {
        Some(self)
    }
}
