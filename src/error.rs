use std::error::Error;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, StructureError>;

#[derive(Debug)]
pub enum StructureError {
    /// A flat-text literal could not be parsed or carries an unknown suffix.
    MalformedValue(String),
    /// The binary tag stream is truncated or otherwise invalid.
    MalformedBinary(String),
    /// A required structure field is absent.
    MissingField(String),
    /// Palette variants of one structure disagree in length.
    InvalidPaletteShape(String),
    IndexOutOfRange { index: usize, len: usize },
    /// A field is present but holds the wrong kind or shape of value.
    TypeMismatch(String),
    Io(io::Error),
}

impl StructureError {
    /// Short name of the error kind, as reported by the editor session.
    pub fn kind(&self) -> &'static str {
        match self {
            StructureError::MalformedValue(_) => "MalformedValue",
            StructureError::MalformedBinary(_) => "MalformedBinary",
            StructureError::MissingField(_) => "MissingField",
            StructureError::InvalidPaletteShape(_) => "InvalidPaletteShape",
            StructureError::IndexOutOfRange { .. } => "IndexOutOfRange",
            StructureError::TypeMismatch(_) => "TypeMismatch",
            StructureError::Io(_) => "Io",
        }
    }
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureError::MalformedValue(msg) => write!(f, "Malformed value: {}", msg),
            StructureError::MalformedBinary(msg) => write!(f, "Malformed binary: {}", msg),
            StructureError::MissingField(field) => write!(f, "Missing field: {}", field),
            StructureError::InvalidPaletteShape(msg) => {
                write!(f, "Invalid palette shape: {}", msg)
            }
            StructureError::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range for {} palettes", index, len)
            }
            StructureError::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
            StructureError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl Error for StructureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StructureError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StructureError {
    fn from(err: io::Error) -> Self {
        StructureError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_field() {
        let err = StructureError::MissingField("blocks".to_owned());
        assert_eq!(err.to_string(), "Missing field: blocks");
        assert_eq!(err.kind(), "MissingField");
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err: StructureError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(err.source().is_some());
        assert_eq!(
            StructureError::IndexOutOfRange { index: 3, len: 2 }.to_string(),
            "Index 3 out of range for 2 palettes"
        );
    }
}
