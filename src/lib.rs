pub mod error;
pub mod logger;
pub mod nbt;
pub mod session;
pub mod structure;

// Re-export commonly used items
pub use error::{Result, StructureError};
pub use logger::{log, LogSeverity};
pub use nbt::{decode_flat, encode_flat, Tag, TagKind, TagList};
pub use structure::{combine, Offset, Structure};
