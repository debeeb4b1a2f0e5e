#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! A crate containing the normalized transaction model shared by the callers and the device
//! signer, such as:
//!
//!   * [`SigningRequest`]: a fully normalized "sign this transaction" request, with every
//!     path-bearing item already resolved.
//!   * [`DerivationPath`]: BIP32-style paths used to address the keys on the device.
//!   * [`SigningRequest::witness_paths()`]: the ordered list of keys that must witness the
//!     transaction.
//!
//!  To avoid circular dependencies this crate must not depend on other crate of the workspace

mod error;
mod model;
mod path;
mod witness;

pub use crate::error::Error;
pub use crate::model::*;
pub use crate::path::{DerivationPath, HARDENED};
