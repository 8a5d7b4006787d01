//! Single-record lookups against a managed key-value store.

mod dynamodb;
mod memory;

pub use dynamodb::{DynamoDbStore, DEFAULT_REGION};
pub use memory::MemoryStore;

use async_trait::async_trait;
use pantry_core::ToolError;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

pub type Record = BTreeMap<String, AttributeValue>;

/// Attribute as stored by the backend. Numbers keep their exact decimal text
/// until they are rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Number(String),
    Binary(Vec<u8>),
    Bool(bool),
    Null,
    List(Vec<AttributeValue>),
    Map(Record),
    StringSet(Vec<String>),
    NumberSet(Vec<String>),
    BinarySet(Vec<Vec<u8>>),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("key-value backend is unavailable: {0}")]
    Unavailable(String),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("{0}")]
    Backend(String),
    #[error("{0}")]
    Unexpected(String),
}

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => ToolError::Unavailable(reason),
            StoreError::InvalidKey(message) => ToolError::InvalidInput(message),
            StoreError::Backend(message) => ToolError::Backend(message),
            StoreError::Unexpected(message) => ToolError::Internal(message),
        }
    }
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_item(&self, table_name: &str, key: Record) -> Result<Option<Record>, StoreError>;
}

/// Connection result captured once at startup and handed to whoever needs
/// the store.
#[derive(Clone)]
pub enum BackendHandle {
    Available(Arc<dyn ItemStore>),
    Unavailable { reason: String },
}

impl BackendHandle {
    pub fn available(store: impl ItemStore + 'static) -> Self {
        Self::Available(Arc::new(store))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Connects to DynamoDB with the named profile. Failure is logged and
    /// kept for the lifetime of the handle; there is no reconnection.
    pub async fn connect_dynamodb(profile: &str) -> Self {
        match DynamoDbStore::connect(profile).await {
            Ok(store) => Self::available(store),
            Err(err) => {
                error!(profile, error = %err, "failed to connect to DynamoDB");
                Self::unavailable(err.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(_) => f.write_str("BackendHandle::Available"),
            Self::Unavailable { reason } => f
                .debug_struct("BackendHandle::Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Value),
    /// The lookup succeeded but nothing matched; `key` is the key as JSON.
    Missing { key: String },
}

#[derive(Debug, Clone)]
pub struct ItemFetcher {
    backend: BackendHandle,
}

impl ItemFetcher {
    pub fn new(backend: BackendHandle) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    pub async fn fetch(&self, table_name: &str, key: &Map<String, Value>) -> Result<Lookup, StoreError> {
        let store = match &self.backend {
            BackendHandle::Available(store) => store,
            BackendHandle::Unavailable { reason } => {
                return Err(StoreError::Unavailable(reason.clone()))
            }
        };

        let attributes = key_from_json(key)?;
        debug!(table_name, "fetching item");
        match store.get_item(table_name, attributes).await? {
            Some(record) => Ok(Lookup::Found(record_to_json(&record)?)),
            None => Ok(Lookup::Missing {
                key: Value::Object(key.clone()).to_string(),
            }),
        }
    }
}

pub fn key_from_json(key: &Map<String, Value>) -> Result<Record, StoreError> {
    key.iter()
        .map(|(name, value)| {
            let attribute = match value {
                Value::String(s) => AttributeValue::String(s.clone()),
                Value::Number(n) => AttributeValue::Number(n.to_string()),
                Value::Bool(b) => AttributeValue::Bool(*b),
                other => {
                    return Err(StoreError::InvalidKey(format!(
                        "key attribute `{name}` must be a string, number or boolean, got {other}"
                    )))
                }
            };
            Ok((name.clone(), attribute))
        })
        .collect()
}

/// Renders a record as JSON, turning every decimal number into a float.
pub fn record_to_json(record: &Record) -> Result<Value, StoreError> {
    record
        .iter()
        .map(|(name, value)| Ok((name.clone(), attribute_to_json(name, value)?)))
        .collect::<Result<Map<String, Value>, StoreError>>()
        .map(Value::Object)
}

fn attribute_to_json(name: &str, value: &AttributeValue) -> Result<Value, StoreError> {
    Ok(match value {
        AttributeValue::String(s) => Value::String(s.clone()),
        AttributeValue::Number(n) => decimal_to_json(name, n)?,
        AttributeValue::Binary(bytes) => bytes_to_json(bytes),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null => Value::Null,
        AttributeValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| attribute_to_json(name, item))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Map(record) => record_to_json(record)?,
        AttributeValue::StringSet(items) => {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::NumberSet(items) => Value::Array(
            items
                .iter()
                .map(|n| decimal_to_json(name, n))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::BinarySet(items) => {
            Value::Array(items.iter().map(|bytes| bytes_to_json(bytes)).collect())
        }
    })
}

fn decimal_to_json(name: &str, raw: &str) -> Result<Value, StoreError> {
    let parsed: f64 = raw.trim().parse().map_err(|_| {
        StoreError::Unexpected(format!("attribute `{name}` holds an invalid number: {raw}"))
    })?;
    Number::from_f64(parsed).map(Value::Number).ok_or_else(|| {
        StoreError::Unexpected(format!("attribute `{name}` is not representable as a float: {raw}"))
    })
}

fn bytes_to_json(bytes: &[u8]) -> Value {
    Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
}
