use surge_common::error::{BoxError, CodecError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegisterError {
    #[error("Error : {0}")]
    Error(BoxError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
