use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Offset added to an index to mark it as hardened.
pub const HARDENED: u32 = 0x8000_0000;

/// A derivation path from the device master key, serialized as the list of child numbers.
///
/// Parses and displays as `m/1852'/1815'/0'/0/0`, hardened indexes may also be written with `h`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn master() -> Self {
        Self(vec![])
    }

    pub fn is_master(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.0.clone()
    }
}

impl From<Vec<u32>> for DerivationPath {
    fn from(path: Vec<u32>) -> Self {
        Self(path)
    }
}

impl From<&[u32]> for DerivationPath {
    fn from(path: &[u32]) -> Self {
        Self(path.to_vec())
    }
}

impl AsRef<[u32]> for DerivationPath {
    fn as_ref(&self) -> &[u32] {
        &self.0
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match parts.next() {
            Some("m") | Some("M") => (),
            _ => return Err(Error::PathMissingMaster(s.to_string())),
        }
        let mut path = vec![];
        for element in parts {
            let (number, hardened) = match element
                .strip_suffix('\'')
                .or_else(|| element.strip_suffix('h'))
            {
                Some(number) => (number, true),
                None => (element, false),
            };
            let index: u64 = number.parse().map_err(|_| Error::InvalidPathElement {
                path: s.to_string(),
                element: element.to_string(),
            })?;
            if index >= HARDENED as u64 {
                return Err(Error::PathIndexOutOfRange(index));
            }
            let index = index as u32;
            path.push(if hardened { index + HARDENED } else { index });
        }
        Ok(Self(path))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for index in &self.0 {
            if *index >= HARDENED {
                write!(f, "/{}'", index - HARDENED)?;
            } else {
                write!(f, "/{index}")?;
            }
        }
        Ok(())
    }
}
