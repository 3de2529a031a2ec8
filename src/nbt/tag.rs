use crate::error::{Result, StructureError};
use indexmap::IndexMap;
use std::fmt;

/// Field map of a compound tag. Insertion order is kept for readable output.
pub type Compound = IndexMap<String, Tag>;

/// One decoded tag of a structure tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    ByteArray(Vec<i8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    List(TagList),
    Compound(Compound),
}

/// Kind of a tag, independent of its payload.
///
/// `End` never describes a value. It only shows up as the element kind of an
/// empty list read from a binary stream, where the game writes type id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    End,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    ByteArray,
    String,
    List,
    Compound,
    IntArray,
    LongArray,
}

impl TagKind {
    pub const ALL: [TagKind; 13] = [
        TagKind::End,
        TagKind::Byte,
        TagKind::Short,
        TagKind::Int,
        TagKind::Long,
        TagKind::Float,
        TagKind::Double,
        TagKind::ByteArray,
        TagKind::String,
        TagKind::List,
        TagKind::Compound,
        TagKind::IntArray,
        TagKind::LongArray,
    ];

    /// Binary type id of this kind.
    pub fn type_id(self) -> u8 {
        match self {
            TagKind::End => 0,
            TagKind::Byte => 1,
            TagKind::Short => 2,
            TagKind::Int => 3,
            TagKind::Long => 4,
            TagKind::Float => 5,
            TagKind::Double => 6,
            TagKind::ByteArray => 7,
            TagKind::String => 8,
            TagKind::List => 9,
            TagKind::Compound => 10,
            TagKind::IntArray => 11,
            TagKind::LongArray => 12,
        }
    }

    pub fn from_type_id(type_id: u8) -> Option<TagKind> {
        TagKind::ALL.get(type_id as usize).copied()
    }

    /// Stable lowercase name, used by the flat-text empty-list marker.
    pub fn name(self) -> &'static str {
        match self {
            TagKind::End => "end",
            TagKind::Byte => "byte",
            TagKind::Short => "short",
            TagKind::Int => "int",
            TagKind::Long => "long",
            TagKind::Float => "float",
            TagKind::Double => "double",
            TagKind::ByteArray => "byteArray",
            TagKind::String => "string",
            TagKind::List => "list",
            TagKind::Compound => "compound",
            TagKind::IntArray => "intArray",
            TagKind::LongArray => "longArray",
        }
    }

    pub fn from_name(name: &str) -> Option<TagKind> {
        TagKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A list tag: a declared element kind plus elements all of that kind.
///
/// The kind is kept even when the list is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TagList {
    kind: TagKind,
    items: Vec<Tag>,
}

impl TagList {
    pub fn new(kind: TagKind, items: Vec<Tag>) -> Result<Self> {
        if let Some(stray) = items.iter().find(|item| item.kind() != kind) {
            return Err(StructureError::TypeMismatch(format!(
                "list of {} cannot hold a {}",
                kind,
                stray.kind()
            )));
        }
        if kind == TagKind::End && !items.is_empty() {
            return Err(StructureError::TypeMismatch(
                "list of end must be empty".to_owned(),
            ));
        }
        Ok(TagList { kind, items })
    }

    pub fn empty(kind: TagKind) -> Self {
        TagList {
            kind,
            items: Vec::new(),
        }
    }

    /// Builds a list whose kind is taken from the first item.
    pub fn from_items(items: Vec<Tag>) -> Result<Self> {
        match items.first() {
            Some(first) => TagList::new(first.kind(), items),
            None => Ok(TagList::empty(TagKind::End)),
        }
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn items(&self) -> &[Tag] {
        &self.items
    }

    /// Mutable access to the elements. Callers must keep every element of
    /// the declared kind.
    pub(crate) fn items_mut(&mut self) -> &mut [Tag] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    pub fn push(&mut self, item: Tag) -> Result<()> {
        if self.items.is_empty() && self.kind == TagKind::End {
            self.kind = item.kind();
        } else if item.kind() != self.kind {
            return Err(StructureError::TypeMismatch(format!(
                "list of {} cannot hold a {}",
                self.kind,
                item.kind()
            )));
        }
        self.items.push(item);
        Ok(())
    }

    /// Concatenates two lists. An empty side contributes nothing, not even
    /// its kind, unless both sides are empty, in which case the left kind
    /// is kept.
    pub fn concat(&self, other: &TagList) -> Result<TagList> {
        if self.is_empty() {
            if other.is_empty() {
                return Ok(self.clone());
            }
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.kind != other.kind {
            return Err(StructureError::TypeMismatch(format!(
                "cannot concatenate a list of {} with a list of {}",
                self.kind, other.kind
            )));
        }
        let mut items = Vec::with_capacity(self.len() + other.len());
        items.extend_from_slice(&self.items);
        items.extend_from_slice(&other.items);
        Ok(TagList {
            kind: self.kind,
            items,
        })
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Byte(_) => TagKind::Byte,
            Tag::Short(_) => TagKind::Short,
            Tag::Int(_) => TagKind::Int,
            Tag::Long(_) => TagKind::Long,
            Tag::Float(_) => TagKind::Float,
            Tag::Double(_) => TagKind::Double,
            Tag::String(_) => TagKind::String,
            Tag::ByteArray(_) => TagKind::ByteArray,
            Tag::IntArray(_) => TagKind::IntArray,
            Tag::LongArray(_) => TagKind::LongArray,
            Tag::List(_) => TagKind::List,
            Tag::Compound(_) => TagKind::Compound,
        }
    }

    pub fn get_type_id(&self) -> u8 {
        self.kind().type_id()
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&TagList> {
        match self {
            Tag::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value of any integral primitive, widened to `i64`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Tag::Byte(n) => Some(i64::from(*n)),
            Tag::Short(n) => Some(i64::from(*n)),
            Tag::Int(n) => Some(i64::from(*n)),
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<TagList> for Tag {
    fn from(list: TagList) -> Self {
        Tag::List(list)
    }
}

impl From<Compound> for Tag {
    fn from(map: Compound) -> Self {
        Tag::Compound(map)
    }
}
