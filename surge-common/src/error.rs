use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raised when an address payload read from the registry cannot be turned
/// back into an [`AddressModel`](crate::resource::address::AddressModel).
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unknown address type : {0}")]
    UnknownType(String),

    #[error("address payload does not match type {type_name} : {source}")]
    Mismatch {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("address serialize error : {0}")]
    Serialize(#[from] serde_json::Error),
}
