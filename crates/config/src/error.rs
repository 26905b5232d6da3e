use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration file was explicitly requested but does not exist.
    #[display("configuration file not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The file extension doesn't map to a supported format.
    #[display("unsupported configuration format: {_0} (expected .toml, .yaml, .yml or .json)")]
    UnsupportedFormat(#[error(not(source))] String),
    /// A provider failed to parse, or a value has the wrong type.
    #[display("invalid configuration")]
    Invalid,
    /// Values parsed, but don't make sense together.
    #[display("invalid value for `{key}`: {reason}")]
    Value { key: &'static str, reason: String },
}
