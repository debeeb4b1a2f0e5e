#[allow(missing_docs)]
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Derivation path must start with 'm': {0}")]
    PathMissingMaster(String),

    #[error("Invalid derivation path element '{element}' in {path}")]
    InvalidPathElement { path: String, element: String },

    #[error("Derivation path index {0} is out of range")]
    PathIndexOutOfRange(u64),
}
