pub mod binary;
pub mod flat;
pub mod tag;

pub use binary::{decode_gzip, decode_tag_stream, encode_gzip, encode_tag_stream, NbtFile};
pub use flat::{decode_flat, encode_flat, EMPTY_LIST_PREFIX};
pub use tag::{Compound, Tag, TagKind, TagList};
