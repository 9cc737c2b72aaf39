//! Read-modify-write operators
//!
//! Each verb is one or two store round-trips. Mutating verbs read the current
//! value, change it locally and write it back with a fresh TTL. Nothing guards
//! the window between the read and the write: concurrent mutators of the same
//! key race and the last `SET` wins.

use std::future::Future;

use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult, ErrorKind};
use crate::metrics::ClientMetrics;
use crate::store::KeyValueStore;
use crate::value::{self, Shape};

/// One client verb, bound to its key and payload
#[derive(Debug, Clone, PartialEq)]
pub enum Operation<'a> {
    /// Overwrite `key` with `value`
    Save {
        key: &'a str,
        value: Value,
        ttl_seconds: u64,
    },
    /// Read `key`, `default` if absent
    Load { key: &'a str, default: Value },
    /// Remove `key`
    Delete { key: &'a str },
    /// Shallow-merge a mapping into the mapping at `key`
    Update {
        key: &'a str,
        value: Value,
        ttl_seconds: u64,
    },
    /// Push one element onto the sequence at `key`
    Append {
        key: &'a str,
        value: Value,
        ttl_seconds: u64,
    },
    /// Concatenate a sequence onto the sequence at `key`
    Extend {
        key: &'a str,
        value: Value,
        ttl_seconds: u64,
    },
}

impl<'a> Operation<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Save { .. } => "save",
            Operation::Load { .. } => "load",
            Operation::Delete { .. } => "delete",
            Operation::Update { .. } => "update",
            Operation::Append { .. } => "append",
            Operation::Extend { .. } => "extend",
        }
    }

    pub fn key(&self) -> &'a str {
        match *self {
            Operation::Save { key, .. }
            | Operation::Load { key, .. }
            | Operation::Delete { key }
            | Operation::Update { key, .. }
            | Operation::Append { key, .. }
            | Operation::Extend { key, .. } => key,
        }
    }

    /// Executes the operation, translating and logging any failure
    ///
    /// Returns the value the verb produces: the saved value for `Save`, the
    /// decoded value for `Load`, `null` for `Delete`, and the new stored value
    /// for the mutating verbs.
    pub async fn run<S>(self, store: &S) -> ClientResult<Value>
    where
        S: KeyValueStore + ?Sized,
    {
        let name = self.name();
        let key = self.key();
        instrumented(name, key, self.execute(store)).await
    }

    async fn execute<S>(self, store: &S) -> ClientResult<Value>
    where
        S: KeyValueStore + ?Sized,
    {
        match self {
            Operation::Save {
                key,
                value,
                ttl_seconds,
            } => {
                write(store, key, &value, ttl_seconds).await?;
                Ok(value)
            }
            Operation::Load { key, default } => Ok(read(store, key).await?.unwrap_or(default)),
            Operation::Delete { key } => {
                store.del(key).await?;
                Ok(Value::Null)
            }
            Operation::Update {
                key,
                value,
                ttl_seconds,
            } => {
                ensure_ttl(ttl_seconds)?;
                let current = read(store, key)
                    .await?
                    .unwrap_or_else(|| Value::Object(Map::new()));
                let merged = merge_mappings(current, value)?;
                write(store, key, &merged, ttl_seconds).await?;
                Ok(merged)
            }
            Operation::Append {
                key,
                value,
                ttl_seconds,
            } => {
                ensure_ttl(ttl_seconds)?;
                let mut items = read_sequence(store, key).await?;
                items.push(value);
                let appended = Value::Array(items);
                write(store, key, &appended, ttl_seconds).await?;
                Ok(appended)
            }
            Operation::Extend {
                key,
                value,
                ttl_seconds,
            } => {
                let incoming = match value {
                    Value::Array(items) => items,
                    other => {
                        return Err(ClientError::data_shape(format!(
                            "Data must be sequence, got {}",
                            Shape::of(&other)
                        )))
                    }
                };
                ensure_ttl(ttl_seconds)?;
                let mut items = read_sequence(store, key).await?;
                items.extend(incoming);
                let extended = Value::Array(items);
                write(store, key, &extended, ttl_seconds).await?;
                Ok(extended)
            }
        }
    }
}

/// Awaits `work` on behalf of `operation`, recording metrics and logging failures
///
/// [`Operation::run`] goes through here; so do client helpers that post-process
/// a read, so their decode failures are counted and logged the same way.
pub async fn instrumented<T, F>(operation: &'static str, key: &str, work: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    let metrics = ClientMetrics::global();
    let timer = metrics.start_operation_timer(operation);

    let result = work.await;
    timer.observe_duration();
    metrics.record_outcome(operation, result.is_ok());

    if let Err(err) = &result {
        if err.kind() == ErrorKind::Unexpected {
            tracing::error!(operation, key = %key, error = ?err, "Unexpected store failure");
        }
        tracing::error!(operation, key = %key, error = %err, "Redis operation failed");
    }

    result
}

/// Merges `incoming` over `current`; both must be mappings
pub fn merge_mappings(current: Value, incoming: Value) -> ClientResult<Value> {
    let (mut current, incoming) = match (current, incoming) {
        (Value::Object(current), Value::Object(incoming)) => (current, incoming),
        (current, incoming) => {
            let offending = if current.is_object() { &incoming } else { &current };
            return Err(ClientError::data_shape(format!(
                "Data for update must be mapping, got {}",
                Shape::of(offending)
            )));
        }
    };

    for (field, value) in incoming {
        current.insert(field, value);
    }
    Ok(Value::Object(current))
}

fn ensure_ttl(ttl_seconds: u64) -> ClientResult<()> {
    if ttl_seconds == 0 {
        return Err(ClientError::configuration(
            "Expiration must be a positive number of seconds",
        ));
    }
    Ok(())
}

pub(crate) async fn read<S>(store: &S, key: &str) -> ClientResult<Option<Value>>
where
    S: KeyValueStore + ?Sized,
{
    let raw = store.get(key).await?;
    value::decode_optional(raw)
}

async fn read_sequence<S>(store: &S, key: &str) -> ClientResult<Vec<Value>>
where
    S: KeyValueStore + ?Sized,
{
    match read(store, key).await? {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ClientError::data_shape(format!(
            "Existing data must be sequence, got {}",
            Shape::of(&other)
        ))),
    }
}

async fn write<S>(store: &S, key: &str, data: &Value, ttl_seconds: u64) -> ClientResult<()>
where
    S: KeyValueStore + ?Sized,
{
    ensure_ttl(ttl_seconds)?;
    let text = value::encode(data)?;
    store.set_ex(key, &text, ttl_seconds).await?;
    ClientMetrics::global()
        .bytes_written
        .inc_by(text.len() as u64);
    Ok(())
}
