use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ContainerErrors {
    #[error("Packed id buffer of {0} bytes is not a multiple of 8")]
    PackedLength(usize),
    #[error("Expected a decimal 64-bit id, got `{0}`")]
    InvalidId(String),
}
