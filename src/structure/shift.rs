use crate::error::{Result, StructureError};
use crate::logger::{log, LogSeverity::Debug};
use crate::nbt::{Tag, TagList};
use crate::structure::{entry_compound, Offset, Structure, BLOCKS, BLOCK_POS, ENTITIES, POS};

/// Adds `delta` to a numeric tag, keeping its kind.
///
/// Integral kinds fail with `TypeMismatch` when the sum leaves their range.
pub fn add_to_number(tag: &Tag, delta: i64, field: &str) -> Result<Tag> {
    let overflow = || {
        StructureError::TypeMismatch(format!(
            "{} overflows its {} when adding {}",
            field,
            tag.kind(),
            delta
        ))
    };
    match tag {
        Tag::Byte(v) => i8::try_from(i64::from(*v) + delta)
            .map(Tag::Byte)
            .map_err(|_| overflow()),
        Tag::Short(v) => i16::try_from(i64::from(*v) + delta)
            .map(Tag::Short)
            .map_err(|_| overflow()),
        Tag::Int(v) => i32::try_from(i64::from(*v) + delta)
            .map(Tag::Int)
            .map_err(|_| overflow()),
        Tag::Long(v) => v.checked_add(delta).map(Tag::Long).ok_or_else(overflow),
        Tag::Float(v) => Ok(Tag::Float((f64::from(*v) + delta as f64) as f32)),
        Tag::Double(v) => Ok(Tag::Double(v + delta as f64)),
        other => Err(StructureError::TypeMismatch(format!(
            "{} must be numeric, found {}",
            field,
            other.kind()
        ))),
    }
}

/// Returns `vector` moved by `offset`. Accepts a three element numeric list
/// or a three element int array.
pub fn shifted_vector(vector: &Tag, offset: Offset, field: &str) -> Result<Tag> {
    let axes = offset.axes();
    match vector {
        Tag::List(list) if list.len() == 3 => {
            let mut moved = list.clone();
            for (axis, delta) in moved.items_mut().iter_mut().zip(axes) {
                *axis = add_to_number(axis, i64::from(delta), field)?;
            }
            Ok(Tag::List(moved))
        }
        Tag::IntArray(values) if values.len() == 3 => values
            .iter()
            .zip(axes)
            .map(|(value, delta)| {
                value.checked_add(delta).ok_or_else(|| {
                    StructureError::TypeMismatch(format!(
                        "{} overflows its int when adding {}",
                        field, delta
                    ))
                })
            })
            .collect::<Result<Vec<i32>>>()
            .map(Tag::IntArray),
        other => Err(StructureError::TypeMismatch(format!(
            "{} must hold three coordinates, found {}",
            field,
            other.kind()
        ))),
    }
}

/// Integer block position of a `pos` or `blockPos` tag.
pub fn block_position(vector: &Tag, field: &str) -> Result<[i64; 3]> {
    let mismatch = || {
        StructureError::TypeMismatch(format!(
            "{} must hold three integer coordinates",
            field
        ))
    };
    let axes: Vec<i64> = match vector {
        Tag::List(list) => list
            .iter()
            .map(|axis| axis.as_integer().ok_or_else(mismatch))
            .collect::<Result<_>>()?,
        Tag::IntArray(values) => values.iter().map(|v| i64::from(*v)).collect(),
        _ => return Err(mismatch()),
    };
    <[i64; 3]>::try_from(axes).map_err(|_| mismatch())
}

/// Moves the named vector fields of every compound in `entries`.
pub(crate) fn shift_entries(
    entries: &TagList,
    offset: Offset,
    list_name: &str,
    fields: &[&str],
) -> Result<TagList> {
    let mut moved = entries.clone();
    for (index, entry) in moved.items_mut().iter_mut().enumerate() {
        let mut compound = entry_compound(entry, list_name, index)?.clone();
        for field in fields {
            let path = format!("{}[{}].{}", list_name, index, field);
            let vector = compound
                .get(*field)
                .ok_or_else(|| StructureError::MissingField(path.clone()))?;
            let shifted = shifted_vector(vector, offset, &path)?;
            compound.insert((*field).to_owned(), shifted);
        }
        *entry = Tag::Compound(compound);
    }
    Ok(moved)
}

impl Structure {
    /// Moves every block and entity by `offset`.
    ///
    /// Nothing is written back unless every position could be moved.
    pub fn shift(&mut self, offset: Offset) -> Result<()> {
        let blocks = shift_entries(self.list_field(BLOCKS)?, offset, BLOCKS, &[POS])?;
        let entities = shift_entries(
            self.list_field(ENTITIES)?,
            offset,
            ENTITIES,
            &[POS, BLOCK_POS],
        )?;
        log(
            format!(
                "Shifted {} blocks and {} entities by {}",
                blocks.len(),
                entities.len(),
                offset
            ),
            Debug,
        );
        self.put(BLOCKS, Tag::List(blocks));
        self.put(ENTITIES, Tag::List(entities));
        Ok(())
    }
}
