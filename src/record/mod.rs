//! Record model for aerorepo
//!
//! Records are flat JSON field maps with a backend-assigned identifier.
//! Schemas declare the fields a collection may hold and are used both to
//! validate writes and to reject malformed query descriptors before they run.

mod errors;
mod schema;
mod types;

pub use errors::{RecordError, RecordErrorCode, RecordResult};
pub use schema::{FieldDef, FieldType, RecordSchema};
pub use types::{json_type_name, Record, RecordId, ID_FIELD};
