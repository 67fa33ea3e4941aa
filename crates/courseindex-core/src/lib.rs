//! courseindex-core — foundation for the course-registry event pipeline.
//!
//! # Architecture
//!
//! ```text
//! Pipeline (courseindex-pipeline)
//!     ├── EventRouter      (selector dispatch, address filter)
//!     │       ├── decode   (raw keys/data → typed fields)
//!     │       └── normalize (felt words → i64 / UTF-8 / bool / address)
//!     ├── CourseStore      (keyed upserts — courseindex-store)
//!     └── Cursor           (durable progress marker)
//! ```

pub mod cursor;
pub mod decode;
pub mod error;
pub mod event;
pub mod felt;
pub mod kinds;
pub mod normalize;

pub use cursor::Cursor;
pub use decode::{decode_event, DecodedEvent};
pub use error::{DecodeError, NormalizeError};
pub use event::{Block, Finality, RawEvent};
pub use kinds::{EventKind, FieldDef, FieldKind};
pub use normalize::FieldValue;
