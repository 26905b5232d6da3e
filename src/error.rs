use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Something the operator has to supply is missing.
    #[display("{_0}")]
    Usage(#[error(not(source))] String),
    #[display("could not load configuration")]
    Config,
    #[display("could not connect to the content store")]
    Store,
    #[display("upload failed")]
    Upload,
}
