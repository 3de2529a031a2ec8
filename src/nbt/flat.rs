//! Lossless flat-text mirror of a tag tree.
//!
//! The mirror is plain JSON. Compounds become objects, lists become arrays,
//! and every other tag becomes a string literal that carries its kind:
//!
//! | tag         | flat form          |
//! |-------------|--------------------|
//! | `Byte(1)`   | `"1b"`             |
//! | `Short(1)`  | `"1s"`             |
//! | `Int(1)`    | `"1i"`             |
//! | `Long(1)`   | `"1l"`             |
//! | `Float(1.5)`| `"1.5f"`           |
//! | `Double(2)` | `"2d"`             |
//! | `String(a)` | `"\"a\""`          |
//! | arrays      | `"[1,2]b"`, `"[1,2]i"`, `"[1,2]l"` |
//! | empty list  | `["emptylist:int"]` |
//!
//! These suffixes and the empty-list prefix are a stored format. Changing
//! them breaks every mirror written before.

use crate::error::{Result, StructureError};
use crate::nbt::tag::{Compound, Tag, TagKind, TagList};
use serde_json::{Map, Value};

/// Prefix of the single marker entry standing in for an empty list.
pub const EMPTY_LIST_PREFIX: &str = "emptylist:";

const BYTE_SUFFIX: char = 'b';
const SHORT_SUFFIX: char = 's';
const INT_SUFFIX: char = 'i';
const LONG_SUFFIX: char = 'l';
const FLOAT_SUFFIX: char = 'f';
const DOUBLE_SUFFIX: char = 'd';

const BYTE_ARRAY_SUFFIX: char = 'b';
const INT_ARRAY_SUFFIX: char = 'i';
const LONG_ARRAY_SUFFIX: char = 'l';

fn malformed(msg: impl Into<String>) -> StructureError {
    StructureError::MalformedValue(msg.into())
}

pub fn encode_flat(tag: &Tag) -> Value {
    match tag {
        Tag::Compound(map) => Value::Object(
            map.iter()
                .map(|(name, child)| (name.clone(), encode_flat(child)))
                .collect::<Map<String, Value>>(),
        ),
        Tag::List(list) if list.is_empty() => Value::Array(vec![Value::String(format!(
            "{}{}",
            EMPTY_LIST_PREFIX,
            list.kind()
        ))]),
        Tag::List(list) => Value::Array(list.iter().map(encode_flat).collect()),
        Tag::Byte(v) => number_literal(v, BYTE_SUFFIX),
        Tag::Short(v) => number_literal(v, SHORT_SUFFIX),
        Tag::Int(v) => number_literal(v, INT_SUFFIX),
        Tag::Long(v) => number_literal(v, LONG_SUFFIX),
        Tag::Float(v) => number_literal(v, FLOAT_SUFFIX),
        Tag::Double(v) => number_literal(v, DOUBLE_SUFFIX),
        // A JSON string literal is always quoted, so it can never be
        // mistaken for a numeric or bracketed literal.
        Tag::String(v) => Value::String(Value::String(v.clone()).to_string()),
        Tag::ByteArray(v) => array_literal(v, BYTE_ARRAY_SUFFIX),
        Tag::IntArray(v) => array_literal(v, INT_ARRAY_SUFFIX),
        Tag::LongArray(v) => array_literal(v, LONG_ARRAY_SUFFIX),
    }
}

fn number_literal<T: std::fmt::Display>(value: &T, suffix: char) -> Value {
    Value::String(format!("{}{}", value, suffix))
}

fn array_literal<T: ToString>(values: &[T], suffix: char) -> Value {
    let body: Vec<String> = values.iter().map(ToString::to_string).collect();
    Value::String(format!("[{}]{}", body.join(","), suffix))
}

pub fn decode_flat(value: &Value) -> Result<Tag> {
    match value {
        Value::Object(map) => {
            let mut compound = Compound::with_capacity(map.len());
            for (name, child) in map {
                compound.insert(name.clone(), decode_flat(child)?);
            }
            Ok(Tag::Compound(compound))
        }
        Value::Array(items) => decode_list(items).map(Tag::List),
        Value::String(literal) => {
            if literal.starts_with(EMPTY_LIST_PREFIX) {
                return Err(malformed(format!(
                    "empty-list marker {:?} outside of a list",
                    literal
                )));
            }
            decode_literal(literal)
        }
        other => Err(malformed(format!("unexpected bare value {}", other))),
    }
}

fn decode_list(items: &[Value]) -> Result<TagList> {
    if let [Value::String(marker)] = items {
        if let Some(kind_name) = marker.strip_prefix(EMPTY_LIST_PREFIX) {
            let kind = TagKind::from_name(kind_name)
                .ok_or_else(|| malformed(format!("unknown list kind {:?}", kind_name)))?;
            return Ok(TagList::empty(kind));
        }
    }
    if items.is_empty() {
        return Err(malformed("list without elements or empty-list marker"));
    }

    let decoded = items.iter().map(decode_flat).collect::<Result<Vec<Tag>>>()?;
    TagList::from_items(decoded).map_err(|e| malformed(e.to_string()))
}

fn decode_literal(literal: &str) -> Result<Tag> {
    if literal.starts_with('"') {
        if literal.len() < 2 || !literal.ends_with('"') {
            return Err(malformed(format!("unterminated string {}", literal)));
        }
        return serde_json::from_str::<String>(literal)
            .map(Tag::String)
            .map_err(|e| malformed(format!("bad string {}: {}", literal, e)));
    }

    let suffix = literal
        .chars()
        .last()
        .ok_or_else(|| malformed("empty literal"))?;
    let body = &literal[..literal.len() - suffix.len_utf8()];

    if literal.starts_with('[') {
        if !body.ends_with(']') {
            return Err(malformed(format!("unterminated array {}", literal)));
        }
        return match suffix {
            BYTE_ARRAY_SUFFIX => parse_array(body).map(Tag::ByteArray),
            INT_ARRAY_SUFFIX => parse_array(body).map(Tag::IntArray),
            LONG_ARRAY_SUFFIX => parse_array(body).map(Tag::LongArray),
            other => Err(malformed(format!(
                "unknown array suffix {:?} in {}",
                other, literal
            ))),
        };
    }

    match suffix {
        BYTE_SUFFIX => parse_number(body, literal).map(Tag::Byte),
        SHORT_SUFFIX => parse_number(body, literal).map(Tag::Short),
        INT_SUFFIX => parse_number(body, literal).map(Tag::Int),
        LONG_SUFFIX => parse_number(body, literal).map(Tag::Long),
        FLOAT_SUFFIX => parse_number(body, literal).map(Tag::Float),
        DOUBLE_SUFFIX => parse_number(body, literal).map(Tag::Double),
        other => Err(malformed(format!(
            "unknown numeric suffix {:?} in {}",
            other, literal
        ))),
    }
}

fn parse_array<T: serde::de::DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    serde_json::from_str(body).map_err(|e| malformed(format!("bad array {}: {}", body, e)))
}

fn parse_number<T: std::str::FromStr>(body: &str, literal: &str) -> Result<T> {
    body.parse()
        .map_err(|_| malformed(format!("bad number {}", literal)))
}
