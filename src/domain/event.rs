/// Operation log event model
///
/// One record per database operation executed against a warehouse connection.
/// Events are immutable once constructed and are routed to the index derived
/// from their (warehouse_id, connection_id) pair.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::index_name::{build_index, SEPARATOR};

/// Database operation recorded by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Select,
}

impl Operation {
    /// All operations, in declaration order
    pub const ALL: [Operation; 4] = [
        Operation::Insert,
        Operation::Update,
        Operation::Delete,
        Operation::Select,
    ];

    /// Wire name stored in the index (`INSERT`, `UPDATE`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Select => "SELECT",
        }
    }
}

/// Outcome of the recorded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Failure,
    Pending,
}

impl Status {
    /// All statuses, in declaration order
    pub const ALL: [Status; 3] = [Status::Success, Status::Failure, Status::Pending];

    /// Wire name stored in the index (`SUCCESS`, `FAILURE`, `PENDING`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failure => "FAILURE",
            Status::Pending => "PENDING",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown operation or status name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariantError {
    kind: &'static str,
    value: String,
}

impl FromStr for Operation {
    type Err = UnknownVariantError;

    /// Case-insensitive: `insert` and `INSERT` are both accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariantError {
                kind: "operation",
                value: s.to_string(),
            })
    }
}

impl FromStr for Status {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariantError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// Event construction errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    /// Identifier is empty
    #[error("{field} must not be empty")]
    EmptyIdentifier { field: &'static str },

    /// Identifier contains the index name separator and could not be routed back
    #[error("{field} must not contain '-': {value}")]
    SeparatorInIdentifier { field: &'static str, value: String },
}

/// Operation log event
///
/// Serialized as a flat document:
/// `{"warehouse_id", "connection_id", "timestamp", "operation", "status", "description"}`.
/// Deserialization runs the same identifier validation as [`Event::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord")]
pub struct Event {
    warehouse_id: String,
    connection_id: String,
    timestamp: DateTime<Utc>,
    operation: Operation,
    status: Status,
    description: String,
}

/// Unvalidated wire form of [`Event`]
#[derive(Deserialize)]
struct EventRecord {
    warehouse_id: String,
    connection_id: String,
    timestamp: DateTime<Utc>,
    operation: Operation,
    status: Status,
    description: String,
}

impl TryFrom<EventRecord> for Event {
    type Error = EventValidationError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        Event::new(
            record.warehouse_id,
            record.connection_id,
            record.timestamp,
            record.operation,
            record.status,
            record.description,
        )
    }
}

impl Event {
    /// Create a new event
    ///
    /// Rejects identifiers that are empty or contain the index separator, so
    /// that [`Event::index_name`] always splits back into the same pair.
    pub fn new(
        warehouse_id: impl Into<String>,
        connection_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        operation: Operation,
        status: Status,
        description: impl Into<String>,
    ) -> Result<Self, EventValidationError> {
        let warehouse_id = warehouse_id.into();
        let connection_id = connection_id.into();

        Self::validate_identifier("warehouse_id", &warehouse_id)?;
        Self::validate_identifier("connection_id", &connection_id)?;

        Ok(Self {
            warehouse_id,
            connection_id,
            timestamp,
            operation,
            status,
            description: description.into(),
        })
    }

    fn validate_identifier(field: &'static str, value: &str) -> Result<(), EventValidationError> {
        if value.is_empty() {
            return Err(EventValidationError::EmptyIdentifier { field });
        }
        if value.contains(SEPARATOR) {
            return Err(EventValidationError::SeparatorInIdentifier {
                field,
                value: value.to_string(),
            });
        }
        Ok(())
    }

    pub fn warehouse_id(&self) -> &str {
        &self.warehouse_id
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Index this event is routed to
    pub fn index_name(&self) -> String {
        build_index(&self.warehouse_id, &self.connection_id)
    }
}
