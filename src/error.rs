use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    InvalidDocx(String),
    Layout(String),
    Zip(zip::result::ZipError),
    Xml(roxmltree::Error),
    Image(image::ImageError),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDocx(reason) => write!(f, "not a valid DOCX file: {reason}"),
            Error::Layout(reason) => write!(f, "cannot lay out signature block: {reason}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Xml(e) => write!(f, "XML error: {e}"),
            Error::Image(e) => write!(f, "image error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Failure of a whole signing call. Resource fallbacks (missing image, unknown
/// table style) never show up here; they are reported on success.
#[derive(Debug)]
pub enum SignError {
    /// The input document does not exist. Nothing was read or written.
    Precondition(PathBuf),
    /// The document could not be opened or rewritten in memory.
    Composition(Error),
    /// The signed document could not be written to its output path.
    Persistence { path: PathBuf, reason: String },
}

impl fmt::Display for SignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignError::Precondition(path) => {
                write!(f, "input document not found: {}", path.display())
            }
            SignError::Composition(e) => write!(f, "signing failed: {e}"),
            SignError::Persistence { path, reason } => {
                write!(f, "could not save {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for SignError {}

impl From<Error> for SignError {
    fn from(e: Error) -> Self {
        SignError::Composition(e)
    }
}
