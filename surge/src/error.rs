use crate::command::ShuntStrategy;
use surge_common::error::{BoxError, CodecError};
use surge_register::error::RegisterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurgeError {
    #[error("no route found for service : {0}")]
    NotFound(String),

    #[error("no healthy address for service : {0}")]
    NoHealthyAddress(String),

    #[error("address selector invoked without candidates for service : {0}")]
    EmptyCandidates(String),

    #[error("no address selector registered for {0:?}")]
    MissingSelector(ShuntStrategy),

    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Error : {0}")]
    Error(BoxError),
}

impl From<BoxError> for SurgeError {
    fn from(error: BoxError) -> Self {
        SurgeError::Error(error)
    }
}
