//! Channels: one direction's payload and ready flag for one address
//!
//! A channel is an atomic message slot. Writing a message and consuming a
//! message each touch both fields inside a single store transaction, so an
//! observer never sees a fresh payload paired with a stale flag.

mod address;

pub use address::{Address, ChannelFields, ResolvedAddress, Side, channel_fields, resolve};

use keystore::{DataType, KeyValueStore, StoreError, Value};
use tracing::debug;

/// Observable state of a channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelState {
    /// Last payload written, if any
    pub payload: Option<String>,
    /// Whether the payload is pending execution
    pub ready: bool,
}

impl ChannelState {
    /// True when a payload is waiting to be consumed
    pub fn is_pending(&self) -> bool {
        self.ready
    }
}

/// The channel consumed by one side at one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    consumer: Side,
    address: Address,
    fields: ChannelFields,
}

impl Channel {
    /// Channel whose payloads are executed by `consumer`
    pub fn new(consumer: Side, address: Address) -> Self {
        let fields = channel_fields(consumer, &address);
        Self {
            consumer,
            address,
            fields,
        }
    }

    pub fn consumer(&self) -> Side {
        self.consumer
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn fields(&self) -> &ChannelFields {
        &self.fields
    }

    /// Read payload and flag in one store acquisition
    pub fn state(&self, store: &dyn KeyValueStore) -> keystore::Result<ChannelState> {
        let mut values = store
            .get_many(&[self.fields.payload.as_str(), self.fields.ready.as_str()])?
            .into_iter();

        let payload = match values.next().flatten() {
            None => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => return Err(mismatch(&self.fields.payload, DataType::String, &other)),
        };
        let ready = match values.next().flatten() {
            None => false,
            Some(Value::Bool(b)) => b,
            Some(other) => return Err(mismatch(&self.fields.ready, DataType::Bool, &other)),
        };
        Ok(ChannelState { payload, ready })
    }

    /// Store `payload` and raise the ready flag in one step
    ///
    /// An unconsumed payload is overwritten.
    pub fn post(&self, store: &dyn KeyValueStore, payload: &str) -> keystore::Result<()> {
        let mut replaced = false;
        store.update(&mut |fields| {
            replaced = fields.get(&self.fields.ready).and_then(Value::as_bool).unwrap_or(false);
            fields.insert(self.fields.payload.clone(), Value::String(payload.to_string()));
            fields.insert(self.fields.ready.clone(), Value::Bool(true));
        })?;

        if replaced {
            debug!(channel = %self.fields.payload, "Channel::post: overwrote unconsumed payload");
        }
        Ok(())
    }

    /// Take the pending payload and lower the ready flag in one step
    ///
    /// Returns `None` when nothing is pending; the store is left untouched.
    /// A raised flag with no payload yields an empty payload.
    pub fn take(&self, store: &dyn KeyValueStore) -> keystore::Result<Option<String>> {
        let mut taken = None;
        store.update(&mut |fields| {
            taken = None;
            let ready = fields.get(&self.fields.ready).and_then(Value::as_bool).unwrap_or(false);
            if !ready {
                return;
            }
            let payload = fields
                .get(&self.fields.payload)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            fields.insert(self.fields.ready.clone(), Value::Bool(false));
            taken = Some(payload);
        })?;
        Ok(taken)
    }
}

fn mismatch(key: &str, expected: DataType, found: &Value) -> StoreError {
    StoreError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.data_type(),
    }
}
