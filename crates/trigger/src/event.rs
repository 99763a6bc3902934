//! Storage event classification and object reference extraction.
//!
//! Two inbound event shapes are recognized:
//!
//! | Shape | Discriminator | Carries the object in |
//! |-------|---------------|-----------------------|
//! | [`FinalizedEvent`] | `kind == "storage#object"` | `id` = `<bucket>/<path>/<generation>` |
//! | [`AuditCreateEvent`] | `@type == AUDIT_LOG_ENTRY_TYPE` | `protoPayload.resourceName` |
//!
//! [`classify`] resolves an untyped envelope into a [`StorageEvent`]; each
//! variant then computes its [`ObjectReference`] with a pure function.
//! [`extract`] composes the two steps.

use serde_json::{Map, Value};

use crate::errors::ValidationError;
use crate::types::ObjectReference;

/// `kind` value of an object-finalized notification.
pub const STORAGE_OBJECT_KIND: &str = "storage#object";

/// `@type` value of an audit-log entry.
pub const AUDIT_LOG_ENTRY_TYPE: &str =
    "type.googleapis.com/google.events.cloud.audit.v1.LogEntryData";

/// Every audit resource name for a storage object starts with this.
pub const RESOURCE_NAME_PREFIX: &str = "projects/_/buckets/";

/// A classified inbound storage event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    Finalized(FinalizedEvent),
    AuditCreate(AuditCreateEvent),
}

impl StorageEvent {
    /// Computes the object this event refers to.
    pub fn object_reference(&self) -> Result<ObjectReference, ValidationError> {
        match self {
            StorageEvent::Finalized(event) => event.object_reference(),
            StorageEvent::AuditCreate(event) => event.object_reference(),
        }
    }

    /// Short label used in logs.
    pub fn shape(&self) -> &'static str {
        match self {
            StorageEvent::Finalized(_) => "finalized",
            StorageEvent::AuditCreate(_) => "audit_create",
        }
    }
}

/// Resolves an envelope into one of the recognized shapes.
///
/// Discriminators are checked in a fixed order: `kind` first, `@type` second.
/// The selected variant then validates its own required fields.
pub fn classify(envelope: &Value) -> Result<StorageEvent, ValidationError> {
    let fields = envelope.as_object().ok_or(ValidationError::NotAnObject)?;

    if fields.get("kind").and_then(Value::as_str) == Some(STORAGE_OBJECT_KIND) {
        return FinalizedEvent::from_fields(fields).map(StorageEvent::Finalized);
    }
    if fields.get("@type").and_then(Value::as_str) == Some(AUDIT_LOG_ENTRY_TYPE) {
        return AuditCreateEvent::from_fields(fields).map(StorageEvent::AuditCreate);
    }
    Err(ValidationError::UnrecognizedShape)
}

/// Classifies `envelope` and extracts the object it refers to.
pub fn extract(envelope: &Value) -> Result<ObjectReference, ValidationError> {
    let event = classify(envelope)?;
    let reference = event.object_reference()?;
    debug!(shape = event.shape(), object = %reference, "extracted object reference");
    Ok(reference)
}

// ---------------------------------------------------------------------------
// Finalized notifications
// ---------------------------------------------------------------------------

/// Object-finalized notification (`kind == "storage#object"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedEvent {
    pub kind: String,
    pub id: String,
    pub bucket: String,
    pub generation: String,
}

impl FinalizedEvent {
    /// Reads the required fields, failing on the first one that is missing.
    ///
    /// `generation` may arrive as a string or an integer.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let kind = required_str(fields, "kind")?;
        let id = required_str(fields, "id")?;
        let bucket = required_str(fields, "bucket")?;
        let generation = match fields.get("generation") {
            Some(Value::Number(n)) if n.is_u64() || n.is_i64() => n.to_string(),
            _ => required_str(fields, "generation")?.to_owned(),
        };

        Ok(Self {
            kind: kind.to_owned(),
            id: id.to_owned(),
            bucket: bucket.to_owned(),
            generation,
        })
    }

    /// Computes `{bucket, path}` from the positional layout of `id`.
    ///
    /// `id` must be exactly `<bucket>/<path>/<generation>`; occurrences of the
    /// bucket or generation elsewhere in `id` do not count.
    pub fn object_reference(&self) -> Result<ObjectReference, ValidationError> {
        if self.kind != STORAGE_OBJECT_KIND {
            return Err(ValidationError::UnexpectedKind {
                found: self.kind.clone(),
            });
        }

        let after_bucket = self
            .id
            .strip_prefix(self.bucket.as_str())
            .ok_or(ValidationError::IdMustStartWithBucket)?;
        let generation_suffix = format!("/{}", self.generation);
        let between = after_bucket
            .strip_suffix(generation_suffix.as_str())
            .ok_or(ValidationError::IdMustEndWithGeneration)?;
        let path = between
            .strip_prefix('/')
            .ok_or(ValidationError::IdMissingObjectPath)?;

        ObjectReference::new(self.bucket.as_str(), path)
            .ok_or(ValidationError::IdMissingObjectPath)
    }
}

// ---------------------------------------------------------------------------
// Audit-log create entries
// ---------------------------------------------------------------------------

/// Audit-log entry for an object creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditCreateEvent {
    /// `protoPayload.resourceName`, e.g. `projects/_/buckets/b/objects/a/b.png`.
    pub resource_name: String,
}

impl AuditCreateEvent {
    /// Reads `protoPayload.resourceName`.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let payload = match fields.get("protoPayload") {
            None | Some(Value::Null) => {
                return Err(ValidationError::MissingField {
                    field: "protoPayload",
                })
            }
            Some(Value::Object(payload)) => payload,
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: "protoPayload",
                    expected: "object",
                })
            }
        };

        let resource_name = match payload.get("resourceName") {
            None | Some(Value::Null) => {
                return Err(ValidationError::MissingField {
                    field: "protoPayload.resourceName",
                })
            }
            Some(Value::String(name)) => name.clone(),
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: "protoPayload.resourceName",
                    expected: "string",
                })
            }
        };

        Ok(Self { resource_name })
    }

    /// Splits the resource name into at most six `/`-separated parts.
    ///
    /// The last part keeps any further slashes, so nested object paths
    /// survive intact.
    pub fn object_reference(&self) -> Result<ObjectReference, ValidationError> {
        if !self.resource_name.starts_with(RESOURCE_NAME_PREFIX) {
            return Err(ValidationError::ResourceNamePrefix);
        }

        let parts: Vec<&str> = self.resource_name.splitn(6, '/').collect();
        let [_, _, _, bucket, objects, path] = parts.as_slice() else {
            return Err(ValidationError::ResourceNameFormat);
        };
        if *objects != "objects" {
            return Err(ValidationError::ResourceNameFormat);
        }

        ObjectReference::new(*bucket, *path).ok_or(ValidationError::ResourceNameFormat)
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Returns a non-empty string field. Absent, `null`, and `""` all count as
/// missing.
fn required_str<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(Value::String(value)) if value.is_empty() => {
            Err(ValidationError::MissingField { field })
        }
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "string",
        }),
    }
}
