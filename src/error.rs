use std::io;
use std::path::PathBuf;

/// Errors raised while converting annotations or running the detection pipeline.
///
/// Every variant is fatal for the run: it aborts the current file and propagates to the caller.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed annotation {}: {source}", .path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::DeError,
    },

    #[error("annotation {} is missing <{element}>", .path.display())]
    MissingElement {
        path: PathBuf,
        element: &'static str,
    },

    #[error("annotation {}: <{element}> holds {value:?}, expected a number", .path.display())]
    InvalidNumber {
        path: PathBuf,
        element: &'static str,
        value: String,
    },

    #[error("annotation {}: image size {width}x{height} has a zero dimension", .path.display())]
    ZeroImageSize {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("image error on {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("model {}: {message}", .path.display())]
    Model { path: PathBuf, message: String },

    #[error("font {} could not be parsed", .path.display())]
    Font { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Error::Image {
            path: path.into(),
            source,
        }
    }
}
