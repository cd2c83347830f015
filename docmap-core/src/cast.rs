//! Bidirectional casters between host values and stored BSON values.
//!
//! A caster is a pure pair of functions:
//!
//! - `read` turns a stored value into the value application code sees
//! - `write` turns an application value into the form written to the store
//!
//! Both casters pass unrelated values through on read and reject them on write.

use bson::{Bson, DateTime as BsonDateTime, oid::ObjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, ModelResult},
    value::Value,
};

/// Identity of a caster, as registered per attribute in a
/// [`ModelSchema`](crate::schema::ModelSchema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasterKind {
    /// Identifier handle ([`ObjectIdCaster`]).
    ObjectId,
    /// Native timestamp ([`DateTimeCaster`]).
    DateTime,
}

impl CasterKind {
    pub fn read(&self, stored: &Bson) -> Value {
        match self {
            CasterKind::ObjectId => ObjectIdCaster::read(stored),
            CasterKind::DateTime => DateTimeCaster::read(stored),
        }
    }

    pub fn write(&self, value: Value) -> ModelResult<Bson> {
        match self {
            CasterKind::ObjectId => ObjectIdCaster::write(value),
            CasterKind::DateTime => DateTimeCaster::write(value),
        }
    }
}

/// Caster for identifier handles.
///
/// Reads surface the canonical 24 character hex string; writes accept that string
/// or an existing handle.
pub struct ObjectIdCaster;

impl ObjectIdCaster {
    pub fn read(stored: &Bson) -> Value {
        match stored {
            Bson::ObjectId(oid) => Value::Bson(Bson::String(oid.to_hex())),
            other => Value::Bson(other.clone()),
        }
    }

    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIdentifier`] for malformed strings and for any input
    /// that is neither a string nor a handle.
    pub fn write(value: Value) -> ModelResult<Bson> {
        match value {
            Value::Bson(Bson::String(s)) => Ok(Bson::ObjectId(Self::parse(&s)?)),
            // Re-parse the canonical form so equal handles share one representation.
            Value::Bson(Bson::ObjectId(oid)) => Ok(Bson::ObjectId(Self::parse(&oid.to_hex())?)),
            other => Err(ModelError::InvalidIdentifier(format!(
                "cannot build an object id from {}",
                other.kind()
            ))),
        }
    }

    fn parse(s: &str) -> ModelResult<ObjectId> {
        ObjectId::parse_str(s)
            .map_err(|e| ModelError::InvalidIdentifier(format!("{s:?}: {e}")))
    }
}

/// Caster for native timestamps.
///
/// Conversions go through milliseconds since the epoch, so millisecond precision
/// survives a round trip and anything finer is truncated.
pub struct DateTimeCaster;

impl DateTimeCaster {
    pub fn read(stored: &Bson) -> Value {
        match stored {
            Bson::DateTime(dt) => match to_host(*dt) {
                Some(host) => Value::DateTime(host),
                None => Value::Bson(stored.clone()),
            },
            other => Value::Bson(other.clone()),
        }
    }

    /// # Errors
    ///
    /// Returns [`ModelError::InvalidTimestamp`] for any input that is neither a host
    /// time value nor a native timestamp.
    pub fn write(value: Value) -> ModelResult<Bson> {
        match value {
            Value::DateTime(dt) => Ok(Bson::DateTime(BsonDateTime::from_millis(dt.timestamp_millis()))),
            Value::Bson(Bson::DateTime(dt)) => Ok(Bson::DateTime(dt)),
            other => Err(ModelError::InvalidTimestamp(format!(
                "cannot build a timestamp from {}",
                other.kind()
            ))),
        }
    }
}

/// Converts a native timestamp to host time. Out of range values yield `None`.
pub(crate) fn to_host(dt: BsonDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
}
