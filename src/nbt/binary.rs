use crate::error::{Result, StructureError};
use crate::nbt::tag::{Compound, Tag, TagKind, TagList};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

// Lengths come from untrusted input, so buffers grow as elements arrive.
const PREALLOC_LIMIT: usize = 4096;

/// Deepest list/compound nesting accepted, the same limit the game applies.
pub const MAX_DEPTH: usize = 512;

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn invalid_input(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

fn read_length<R: Read>(reader: &mut R) -> io::Result<usize> {
    let length = reader.read_i32::<BigEndian>()?;
    usize::try_from(length).map_err(|_| invalid_data(format!("Negative length: {}", length)))
}

fn write_length<W: Write>(writer: &mut W, length: usize) -> io::Result<()> {
    let length = i32::try_from(length)
        .map_err(|_| invalid_input(format!("Length {} does not fit in an i32", length)))?;
    writer.write_i32::<BigEndian>(length)
}

fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let length = reader.read_u16::<BigEndian>()?;
    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let length = u16::try_from(value.len())
        .map_err(|_| invalid_input(format!("String of {} bytes is too long", value.len())))?;
    writer.write_u16::<BigEndian>(length)?;
    writer.write_all(value.as_bytes())
}

/// Reads one named tag. Returns `None` for the end tag closing a compound.
pub fn read_named<R: Read>(reader: &mut R) -> io::Result<Option<(String, Tag)>> {
    read_named_at(reader, 0)
}

fn read_named_at<R: Read>(reader: &mut R, depth: usize) -> io::Result<Option<(String, Tag)>> {
    let type_id = reader.read_u8()?;
    if type_id == 0 {
        return Ok(None);
    }

    let name = read_string(reader)?;
    let tag = read_payload(reader, type_id, depth)?;
    Ok(Some((name, tag)))
}

fn read_payload<R: Read>(reader: &mut R, type_id: u8, depth: usize) -> io::Result<Tag> {
    if (type_id == 9 || type_id == 10) && depth >= MAX_DEPTH {
        return Err(invalid_data(format!(
            "Tags nested deeper than {} levels",
            MAX_DEPTH
        )));
    }
    match type_id {
        1 => Ok(Tag::Byte(reader.read_i8()?)),
        2 => Ok(Tag::Short(reader.read_i16::<BigEndian>()?)),
        3 => Ok(Tag::Int(reader.read_i32::<BigEndian>()?)),
        4 => Ok(Tag::Long(reader.read_i64::<BigEndian>()?)),
        5 => Ok(Tag::Float(reader.read_f32::<BigEndian>()?)),
        6 => Ok(Tag::Double(reader.read_f64::<BigEndian>()?)),
        7 => {
            let length = read_length(reader)?;
            let mut bytes = Vec::with_capacity(length.min(PREALLOC_LIMIT));
            for _ in 0..length {
                bytes.push(reader.read_i8()?);
            }
            Ok(Tag::ByteArray(bytes))
        }
        8 => Ok(Tag::String(read_string(reader)?)),
        9 => {
            let list_type = reader.read_u8()?;
            let kind = TagKind::from_type_id(list_type)
                .ok_or_else(|| invalid_data(format!("Invalid list type: {}", list_type)))?;
            let length = read_length(reader)?;
            if kind == TagKind::End && length > 0 {
                return Err(invalid_data(format!(
                    "List of end tags with {} elements",
                    length
                )));
            }
            let mut items = Vec::with_capacity(length.min(PREALLOC_LIMIT));
            for _ in 0..length {
                items.push(read_payload(reader, list_type, depth + 1)?);
            }
            TagList::new(kind, items)
                .map(Tag::List)
                .map_err(|e| invalid_data(e.to_string()))
        }
        10 => {
            let mut compound = Compound::new();
            while let Some((name, tag)) = read_named_at(reader, depth + 1)? {
                compound.insert(name, tag);
            }
            Ok(Tag::Compound(compound))
        }
        11 => {
            let length = read_length(reader)?;
            let mut ints = Vec::with_capacity(length.min(PREALLOC_LIMIT));
            for _ in 0..length {
                ints.push(reader.read_i32::<BigEndian>()?);
            }
            Ok(Tag::IntArray(ints))
        }
        12 => {
            let length = read_length(reader)?;
            let mut longs = Vec::with_capacity(length.min(PREALLOC_LIMIT));
            for _ in 0..length {
                longs.push(reader.read_i64::<BigEndian>()?);
            }
            Ok(Tag::LongArray(longs))
        }
        _ => Err(invalid_data(format!("Invalid tag type: {}", type_id))),
    }
}

pub fn write_named<W: Write>(writer: &mut W, name: &str, tag: &Tag) -> io::Result<()> {
    writer.write_u8(tag.get_type_id())?;
    write_string(writer, name)?;
    write_payload(writer, tag)
}

fn write_payload<W: Write>(writer: &mut W, tag: &Tag) -> io::Result<()> {
    match tag {
        Tag::Byte(v) => writer.write_i8(*v),
        Tag::Short(v) => writer.write_i16::<BigEndian>(*v),
        Tag::Int(v) => writer.write_i32::<BigEndian>(*v),
        Tag::Long(v) => writer.write_i64::<BigEndian>(*v),
        Tag::Float(v) => writer.write_f32::<BigEndian>(*v),
        Tag::Double(v) => writer.write_f64::<BigEndian>(*v),
        Tag::ByteArray(v) => {
            write_length(writer, v.len())?;
            for &b in v {
                writer.write_i8(b)?;
            }
            Ok(())
        }
        Tag::String(v) => write_string(writer, v),
        Tag::List(list) => {
            writer.write_u8(list.kind().type_id())?;
            write_length(writer, list.len())?;
            for item in list {
                write_payload(writer, item)?;
            }
            Ok(())
        }
        Tag::Compound(map) => {
            for (name, child) in map {
                write_named(writer, name, child)?;
            }
            writer.write_u8(TagKind::End.type_id())
        }
        Tag::IntArray(v) => {
            write_length(writer, v.len())?;
            for &i in v {
                writer.write_i32::<BigEndian>(i)?;
            }
            Ok(())
        }
        Tag::LongArray(v) => {
            write_length(writer, v.len())?;
            for &l in v {
                writer.write_i64::<BigEndian>(l)?;
            }
            Ok(())
        }
    }
}

// NbtFile represents a complete NBT document: a named root compound.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtFile {
    pub root: Tag,
    pub name: String,
}

impl NbtFile {
    pub fn new(name: String, root: Tag) -> Self {
        NbtFile { root, name }
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let type_id = reader.read_u8()?;
        if type_id != TagKind::Compound.type_id() {
            return Err(invalid_data(format!(
                "Root tag must be a compound, found type {}",
                type_id
            )));
        }
        let name = read_string(reader)?;
        let root = read_payload(reader, type_id, 0)?;
        Ok(NbtFile { root, name })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_named(writer, &self.name, &self.root)
    }

    pub fn read_gzip<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut decoder = GzDecoder::new(reader);
        Self::read(&mut decoder)
    }

    pub fn write_gzip<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        self.write(&mut encoder)?;
        encoder.finish()?;
        Ok(())
    }
}

/// Decodes an uncompressed binary tag stream.
pub fn decode_tag_stream(bytes: &[u8]) -> Result<NbtFile> {
    let mut cursor = bytes;
    NbtFile::read(&mut cursor).map_err(|e| StructureError::MalformedBinary(e.to_string()))
}

pub fn encode_tag_stream(file: &NbtFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    file.write(&mut buffer)?;
    Ok(buffer)
}

/// Decodes a gzip-compressed structure file's bytes.
pub fn decode_gzip(bytes: &[u8]) -> Result<NbtFile> {
    let mut cursor = bytes;
    NbtFile::read_gzip(&mut cursor).map_err(|e| StructureError::MalformedBinary(e.to_string()))
}

pub fn encode_gzip(file: &NbtFile) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    file.write_gzip(&mut buffer)?;
    Ok(buffer)
}
