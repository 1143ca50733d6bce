use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZtnrError {
    #[error("invalid base64 blob: {0}")]
    Base64(#[from] base64::DecodeError),
}
