pub mod file;
pub mod merge;
pub mod palette;
pub mod shift;

use crate::error::{Result, StructureError};
use crate::nbt::{Compound, Tag, TagKind, TagList};
use std::fmt;

pub use file::{load_structure, save_structure};
pub use merge::combine;
pub use palette::PaletteLayout;

pub const AUTHOR: &str = "author";
pub const SIZE: &str = "size";
pub const BLOCKS: &str = "blocks";
pub const ENTITIES: &str = "entities";
pub const PALETTE: &str = "palette";
pub const PALETTES: &str = "palettes";
pub const POS: &str = "pos";
pub const BLOCK_POS: &str = "blockPos";
pub const STATE: &str = "state";

/// Integer offset applied to block and entity positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Offset { x, y, z }
    }

    pub fn axes(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[i32; 3]> for Offset {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Offset { x, y, z }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// A structure document: the root compound of a structure file.
///
/// Required fields are looked up lazily, so a value missing one of them can
/// still be held and inspected. Operations that need a field fail with
/// `MissingField` when it is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    root: Compound,
}

impl Structure {
    pub fn new(root: Compound) -> Self {
        Structure { root }
    }

    pub fn from_tag(tag: Tag) -> Result<Self> {
        match tag {
            Tag::Compound(root) => Ok(Structure { root }),
            other => Err(StructureError::TypeMismatch(format!(
                "structure root must be a compound, found {}",
                other.kind()
            ))),
        }
    }

    pub fn root(&self) -> &Compound {
        &self.root
    }

    pub fn into_tag(self) -> Tag {
        Tag::Compound(self.root)
    }

    pub fn author(&self) -> Result<&str> {
        self.field(AUTHOR)?.as_str().ok_or_else(|| {
            StructureError::TypeMismatch(format!("{} must be a string", AUTHOR))
        })
    }

    pub fn set_author(&mut self, author: &str) {
        self.root
            .insert(AUTHOR.to_owned(), Tag::String(author.to_owned()));
    }

    /// Overwrites `size`, keeping the stored representation (int list or
    /// int array) when one is present.
    pub fn set_size(&mut self, size: [i32; 3]) -> Result<()> {
        let tag = match self.root.get(SIZE) {
            Some(Tag::IntArray(_)) => Tag::IntArray(size.to_vec()),
            _ => Tag::List(TagList::new(
                TagKind::Int,
                size.iter().map(|axis| Tag::Int(*axis)).collect(),
            )?),
        };
        self.root.insert(SIZE.to_owned(), tag);
        Ok(())
    }

    pub fn blocks(&self) -> Result<&TagList> {
        self.list_field(BLOCKS)
    }

    pub fn entities(&self) -> Result<&TagList> {
        self.list_field(ENTITIES)
    }

    pub(crate) fn field(&self, name: &str) -> Result<&Tag> {
        self.root
            .get(name)
            .ok_or_else(|| StructureError::MissingField(name.to_owned()))
    }

    pub(crate) fn list_field(&self, name: &str) -> Result<&TagList> {
        self.field(name)?
            .as_list()
            .ok_or_else(|| StructureError::TypeMismatch(format!("{} must be a list", name)))
    }

    /// Replaces a field in place, keeping its position among the root fields.
    pub(crate) fn put(&mut self, name: &str, tag: Tag) {
        self.root.insert(name.to_owned(), tag);
    }

    /// Renames the field `from` to `to`, keeping its position.
    pub(crate) fn replace_field(&mut self, from: &str, to: &str, tag: Tag) {
        match self.root.get_index_of(from) {
            Some(position) => {
                self.root.shift_remove(from);
                self.root.shift_insert(position, to.to_owned(), tag);
            }
            None => {
                self.root.insert(to.to_owned(), tag);
            }
        }
    }
}

/// Returns the compound at `index` of a list field, for error reporting.
pub(crate) fn entry_compound<'a>(tag: &'a Tag, list: &str, index: usize) -> Result<&'a Compound> {
    tag.as_compound().ok_or_else(|| {
        StructureError::TypeMismatch(format!("{}[{}] must be a compound", list, index))
    })
}

pub(crate) fn entry_field<'a>(
    entry: &'a Compound,
    list: &str,
    index: usize,
    name: &str,
) -> Result<&'a Tag> {
    entry
        .get(name)
        .ok_or_else(|| StructureError::MissingField(format!("{}[{}].{}", list, index, name)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn int_list(values: &[i32]) -> Tag {
        Tag::List(TagList::new(TagKind::Int, values.iter().map(|v| Tag::Int(*v)).collect()).unwrap())
    }

    pub fn double_list(values: &[f64]) -> Tag {
        Tag::List(
            TagList::new(
                TagKind::Double,
                values.iter().map(|v| Tag::Double(*v)).collect(),
            )
            .unwrap(),
        )
    }

    pub fn compounds(items: Vec<Compound>) -> TagList {
        if items.is_empty() {
            return TagList::empty(TagKind::Compound);
        }
        TagList::new(TagKind::Compound, items.into_iter().map(Tag::Compound).collect()).unwrap()
    }

    pub fn block(pos: [i32; 3], state: i32) -> Compound {
        let mut block = Compound::new();
        block.insert(POS.to_owned(), int_list(&pos));
        block.insert(STATE.to_owned(), Tag::Int(state));
        block
    }

    pub fn entity(pos: [f64; 3], block_pos: [i32; 3]) -> Compound {
        let mut entity = Compound::new();
        entity.insert(POS.to_owned(), double_list(&pos));
        entity.insert(BLOCK_POS.to_owned(), int_list(&block_pos));
        let mut nbt = Compound::new();
        nbt.insert("id".to_owned(), Tag::String("minecraft:armor_stand".to_owned()));
        entity.insert("nbt".to_owned(), Tag::Compound(nbt));
        entity
    }

    pub fn block_state(name: &str) -> Compound {
        let mut state = Compound::new();
        state.insert("Name".to_owned(), Tag::String(name.to_owned()));
        state
    }

    pub fn palette(names: &[&str]) -> TagList {
        compounds(names.iter().map(|name| block_state(name)).collect())
    }

    /// A structure with a single palette.
    pub fn structure(
        author: &str,
        palette_names: &[&str],
        blocks: Vec<Compound>,
        entities: Vec<Compound>,
    ) -> Structure {
        let mut root = Compound::new();
        root.insert(AUTHOR.to_owned(), Tag::String(author.to_owned()));
        root.insert(SIZE.to_owned(), int_list(&[4, 4, 4]));
        root.insert(PALETTE.to_owned(), Tag::List(palette(palette_names)));
        root.insert(BLOCKS.to_owned(), Tag::List(compounds(blocks)));
        root.insert(ENTITIES.to_owned(), Tag::List(compounds(entities)));
        root.insert("DataVersion".to_owned(), Tag::Int(1343));
        Structure::new(root)
    }

    /// A structure with several palette variants.
    pub fn multi_structure(
        author: &str,
        variants: &[&[&str]],
        blocks: Vec<Compound>,
    ) -> Structure {
        let mut structure = structure(author, &[], blocks, vec![]);
        let palettes = TagList::new(
            TagKind::List,
            variants.iter().map(|names| Tag::List(palette(names))).collect(),
        )
        .unwrap();
        structure.replace_field(PALETTE, PALETTES, Tag::List(palettes));
        structure
    }

    /// `(pos, state)` of every block, in order.
    pub fn blocks_summary(list: &TagList) -> Vec<(Tag, Tag)> {
        list.iter()
            .map(|item| {
                let entry = item.as_compound().unwrap();
                (entry[POS].clone(), entry[STATE].clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_from_tag_requires_compound() {
        assert_matches!(
            Structure::from_tag(Tag::Int(1)),
            Err(StructureError::TypeMismatch(_))
        );
    }

    #[test]
    fn test_missing_fields_are_reported_by_name() {
        let structure = Structure::new(Compound::new());
        assert_matches!(structure.blocks(), Err(StructureError::MissingField(f)) if f == "blocks");
        assert_matches!(structure.author(), Err(StructureError::MissingField(f)) if f == "author");
    }

    #[test]
    fn test_set_size_keeps_representation() {
        let mut structure = structure("a", &["minecraft:stone"], vec![], vec![]);
        structure.set_size([1, 1, 1]).unwrap();
        assert_eq!(structure.root()[SIZE], int_list(&[1, 1, 1]));

        structure.put(SIZE, Tag::IntArray(vec![9, 9, 9]));
        structure.set_size([2, 3, 4]).unwrap();
        assert_eq!(structure.root()[SIZE], Tag::IntArray(vec![2, 3, 4]));
    }

    #[test]
    fn test_replace_field_keeps_position() {
        let structure = multi_structure("a", &[&["minecraft:stone"]], vec![]);
        let keys: Vec<&str> = structure.root().keys().map(String::as_str).collect();
        assert_eq!(keys, vec![AUTHOR, SIZE, PALETTES, BLOCKS, ENTITIES, "DataVersion"]);
    }

    #[test]
    fn test_offset_display() {
        assert_eq!(Offset::new(1, -2, 3).to_string(), "1 -2 3");
        assert_eq!(Offset::from([0, 0, 0]), Offset::ZERO);
    }
}
