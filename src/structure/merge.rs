use crate::error::Result;
use crate::logger::{log, LogSeverity::Debug};
use crate::nbt::{Tag, TagKind, TagList};
use crate::structure::palette::PaletteLayout;
use crate::structure::shift::{add_to_number, block_position, shift_entries};
use crate::structure::{
    entry_compound, entry_field, Offset, Structure, BLOCKS, BLOCK_POS, ENTITIES, PALETTE,
    PALETTES, POS, STATE,
};
use std::collections::HashSet;

/// Places `incoming` into `base` at `offset` and returns the result.
///
/// The base keeps its author, size and every other top-level field. Incoming
/// blocks get their state indices moved past the base palette, and any base
/// block sharing a position with an incoming block is dropped. Neither input
/// is modified, so a failed merge leaves both exactly as they were.
///
/// When either side has several palette variants the output holds every
/// base variant joined with every incoming variant, so the variant count
/// multiplies with each such merge.
pub fn combine(base: &Structure, incoming: &Structure, offset: Offset) -> Result<Structure> {
    let base_layout = base.palette_layout()?;
    let incoming_layout = incoming.palette_layout()?;
    let state_offset = base_layout.palette_len()?;
    incoming_layout.palette_len()?;

    let incoming_blocks = place_blocks(incoming.blocks()?, state_offset, offset)?;
    let incoming_entities = shift_entries(
        incoming.entities()?,
        offset,
        ENTITIES,
        &[POS, BLOCK_POS],
    )?;

    let occupied = positions(&incoming_blocks)?;
    let base_blocks = base.blocks()?;
    let mut kept = Vec::with_capacity(base_blocks.len());
    for (index, item) in base_blocks.iter().enumerate() {
        let entry = entry_compound(item, BLOCKS, index)?;
        let pos = block_position(entry_field(entry, BLOCKS, index, POS)?, POS)?;
        if !occupied.contains(&pos) {
            kept.push(item.clone());
        }
    }
    let overwritten = base_blocks.len() - kept.len();
    let kept = TagList::new(base_blocks.kind(), kept)?;

    let blocks = kept.concat(&incoming_blocks)?;
    let entities = base.entities()?.concat(&incoming_entities)?;

    let mut output = base.clone();
    match (base_layout, incoming_layout) {
        (PaletteLayout::Single(first), PaletteLayout::Single(second)) => {
            output.put(PALETTE, Tag::List(first.concat(second)?));
        }
        (first, second) => {
            let first = first.variants()?;
            let second = second.variants()?;
            let mut variants = Vec::with_capacity(first.len() * second.len());
            for p in &first {
                for q in &second {
                    variants.push(Tag::List(p.concat(q)?));
                }
            }
            log(
                format!(
                    "Crossing {} palette variants with {} gives {}",
                    first.len(),
                    second.len(),
                    variants.len()
                ),
                Debug,
            );
            let palettes = Tag::List(TagList::new(TagKind::List, variants)?);
            output.replace_field(PALETTE, PALETTES, palettes);
        }
    }

    log(
        format!(
            "Merged {} blocks and {} entities at {}, {} base blocks overwritten",
            incoming_blocks.len(),
            incoming_entities.len(),
            offset,
            overwritten
        ),
        Debug,
    );
    output.put(BLOCKS, Tag::List(blocks));
    output.put(ENTITIES, Tag::List(entities));
    Ok(output)
}

/// Moves incoming blocks by `offset` and their states past the base palette.
fn place_blocks(blocks: &TagList, state_offset: usize, offset: Offset) -> Result<TagList> {
    let mut placed = shift_entries(blocks, offset, BLOCKS, &[POS])?;
    let delta = i64::try_from(state_offset).unwrap_or(i64::MAX);
    for (index, item) in placed.items_mut().iter_mut().enumerate() {
        let mut entry = entry_compound(item, BLOCKS, index)?.clone();
        let path = format!("{}[{}].{}", BLOCKS, index, STATE);
        let state = add_to_number(entry_field(&entry, BLOCKS, index, STATE)?, delta, &path)?;
        entry.insert(STATE.to_owned(), state);
        *item = Tag::Compound(entry);
    }
    Ok(placed)
}

fn positions(blocks: &TagList) -> Result<HashSet<[i64; 3]>> {
    blocks
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let entry = entry_compound(item, BLOCKS, index)?;
            block_position(entry_field(entry, BLOCKS, index, POS)?, POS)
        })
        .collect()
}
