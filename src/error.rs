use thiserror::Error;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
}

/// Failures while resolving or decoding source files.
#[derive(Error, Debug)]
pub enum ErrorKind {
    #[cfg(feature = "json")]
    #[error("Error serializing or deserializing json: {err}")]
    SerdeJson {
        #[from]
        err: serde_json::Error,
    },
    #[error("Data file not found: path={path}")]
    DatafileNotFound { path: String },
    #[error("Mini container error: {err}")]
    Mini {
        #[from]
        err: crate::data::mini::MiniError,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { kind }
    }
}

impl std::convert::From<crate::data::mini::MiniError> for Error {
    fn from(x: crate::data::mini::MiniError) -> Error {
        Error { kind: x.into() }
    }
}

#[cfg(feature = "json")]
impl std::convert::From<serde_json::Error> for Error {
    fn from(x: serde_json::Error) -> Error {
        Error { kind: x.into() }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

pub type IResult<T> = Result<T, Error>;
