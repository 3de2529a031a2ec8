use crate::error::{Result, StructureError};
use crate::logger::{log, LogSeverity::Info};
use crate::nbt::{decode_flat, decode_gzip, encode_flat, encode_gzip, NbtFile};
use crate::structure::Structure;
use std::io;
use std::path::Path;
use tokio::fs;

/// On-disk container of a structure, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    /// Gzip-compressed binary tag stream, the game's `.nbt` files.
    Nbt,
    /// Pretty-printed flat-text mirror.
    Json,
}

impl StructureFormat {
    pub fn from_path(path: &Path) -> StructureFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => StructureFormat::Json,
            _ => StructureFormat::Nbt,
        }
    }
}

pub fn decode_structure(bytes: &[u8], format: StructureFormat) -> Result<Structure> {
    let root = match format {
        StructureFormat::Nbt => decode_gzip(bytes)?.root,
        StructureFormat::Json => {
            let value: serde_json::Value = serde_json::from_slice(bytes)
                .map_err(|e| StructureError::MalformedValue(e.to_string()))?;
            decode_flat(&value)?
        }
    };
    Structure::from_tag(root)
}

pub fn encode_structure(structure: &Structure, format: StructureFormat) -> Result<Vec<u8>> {
    match format {
        StructureFormat::Nbt => {
            let file = NbtFile::new(String::new(), structure.clone().into_tag());
            encode_gzip(&file)
        }
        StructureFormat::Json => {
            let value = encode_flat(&structure.clone().into_tag());
            serde_json::to_vec_pretty(&value).map_err(|e| StructureError::Io(e.into()))
        }
    }
}

/// Reads a structure file. A `palettes` field with a single variant is
/// collapsed to a plain `palette`.
pub async fn load_structure(path: &Path) -> Result<Structure> {
    let metadata = fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(StructureError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a file", path.display()),
        )));
    }
    let bytes = fs::read(path).await?;
    let mut structure = decode_structure(&bytes, StructureFormat::from_path(path))?;
    if structure.has_single_palette()? {
        structure.select_variant(0)?;
    }
    log(format!("Loaded structure from {}", path.display()), Info);
    Ok(structure)
}

pub async fn save_structure(structure: &Structure, path: &Path) -> Result<()> {
    let bytes = encode_structure(structure, StructureFormat::from_path(path))?;
    fs::write(path, bytes).await?;
    log(format!("Saved structure to {}", path.display()), Info);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::test_support::*;
    use crate::nbt::Tag;
    use crate::structure::{PALETTE, PALETTES};
    use assert_matches::assert_matches;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(StructureFormat::from_path(Path::new("a.nbt")), StructureFormat::Nbt);
        assert_eq!(StructureFormat::from_path(Path::new("a.JSON")), StructureFormat::Json);
        assert_eq!(StructureFormat::from_path(Path::new("a")), StructureFormat::Nbt);
    }

    #[test]
    fn test_encode_decode_both_formats() {
        let structure = structure(
            "a",
            &["minecraft:stone"],
            vec![block([1, 2, 3], 0)],
            vec![entity([0.5, 0.5, 0.5], [0, 0, 0])],
        );
        for format in [StructureFormat::Nbt, StructureFormat::Json] {
            let bytes = encode_structure(&structure, format).unwrap();
            assert_eq!(decode_structure(&bytes, format).unwrap(), structure);
        }
    }

    #[test]
    fn test_decode_errors_keep_their_kind() {
        assert_matches!(
            decode_structure(b"\x1f\x8bgarbage", StructureFormat::Nbt),
            Err(StructureError::MalformedBinary(_))
        );
        assert_matches!(
            decode_structure(b"{not json", StructureFormat::Json),
            Err(StructureError::MalformedValue(_))
        );
        assert_matches!(
            decode_structure(br#"{"author": "12q"}"#, StructureFormat::Json),
            Err(StructureError::MalformedValue(_))
        );
    }

    #[tokio::test]
    async fn test_load_collapses_single_variant() {
        let structure = multi_structure("a", &[&["minecraft:stone"]], vec![block([0, 0, 0], 0)]);
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("single.nbt");
        tokio_test::assert_ok!(save_structure(&structure, &path).await);

        let loaded = load_structure(&path).await.unwrap();

        assert!(loaded.root().get(PALETTES).is_none());
        assert_eq!(loaded.root()[PALETTE], Tag::List(palette(&["minecraft:stone"])));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("does-not-exist.nbt");
        assert_matches!(load_structure(&path).await, Err(StructureError::Io(_)));
        assert_matches!(load_structure(dir.path()).await, Err(StructureError::Io(_)));
    }
}
