use crate::error::{Result, StructureError};
use crate::logger::{log, LogSeverity::Info};
use crate::nbt::{Tag, TagList};
use crate::structure::{Structure, PALETTE, PALETTES};

/// How a structure stores its block-state table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaletteLayout<'a> {
    /// A `palette` field.
    Single(&'a TagList),
    /// A `palettes` field: parallel variants of equal length.
    Variants(&'a TagList),
}

impl<'a> PaletteLayout<'a> {
    pub fn variant_count(&self) -> usize {
        match self {
            PaletteLayout::Single(_) => 1,
            PaletteLayout::Variants(variants) => variants.len(),
        }
    }

    /// Every variant as a list of block states. A single palette is one variant.
    pub fn variants(&self) -> Result<Vec<&'a TagList>> {
        match *self {
            PaletteLayout::Single(palette) => Ok(vec![palette]),
            PaletteLayout::Variants(variants) => variants
                .iter()
                .enumerate()
                .map(|(index, variant)| {
                    variant.as_list().ok_or_else(|| {
                        StructureError::InvalidPaletteShape(format!(
                            "{}[{}] is not a list",
                            PALETTES, index
                        ))
                    })
                })
                .collect(),
        }
    }

    /// Length shared by every variant.
    pub fn palette_len(&self) -> Result<usize> {
        let variants = self.variants()?;
        let first = variants.first().ok_or_else(|| {
            StructureError::InvalidPaletteShape(format!("{} has no variants", PALETTES))
        })?;
        if let Some((index, odd)) = variants
            .iter()
            .enumerate()
            .find(|(_, variant)| variant.len() != first.len())
        {
            return Err(StructureError::InvalidPaletteShape(format!(
                "{}[{}] has {} states but {}[0] has {}",
                PALETTES,
                index,
                odd.len(),
                PALETTES,
                first.len()
            )));
        }
        Ok(first.len())
    }
}

impl Structure {
    pub fn palette_layout(&self) -> Result<PaletteLayout<'_>> {
        match (self.root().get(PALETTE), self.root().get(PALETTES)) {
            (Some(_), Some(_)) => Err(StructureError::InvalidPaletteShape(format!(
                "both {} and {} are present",
                PALETTE, PALETTES
            ))),
            (Some(_), None) => self.list_field(PALETTE).map(PaletteLayout::Single),
            (None, Some(_)) => self.list_field(PALETTES).map(PaletteLayout::Variants),
            (None, None) => Err(StructureError::MissingField(PALETTE.to_owned())),
        }
    }

    /// True for a `palette` field or a `palettes` field with one variant.
    pub fn has_single_palette(&self) -> Result<bool> {
        Ok(self.palette_layout()?.variant_count() == 1)
    }

    /// Collapses `palettes` down to the single variant at `index`.
    ///
    /// A structure that already has one `palette` is left alone. The other
    /// variants are dropped for good.
    pub fn select_variant(&mut self, index: usize) -> Result<()> {
        let chosen = match self.palette_layout()? {
            PaletteLayout::Single(_) => return Ok(()),
            PaletteLayout::Variants(variants) => {
                let len = variants.len();
                let variant = variants
                    .get(index)
                    .ok_or(StructureError::IndexOutOfRange { index, len })?;
                let palette = variant.as_list().ok_or_else(|| {
                    StructureError::InvalidPaletteShape(format!(
                        "{}[{}] is not a list",
                        PALETTES, index
                    ))
                })?;
                log(
                    format!("Selected palette variant {} of {}", index + 1, len),
                    Info,
                );
                palette.clone()
            }
        };
        self.replace_field(PALETTES, PALETTE, Tag::List(chosen));
        Ok(())
    }
}
