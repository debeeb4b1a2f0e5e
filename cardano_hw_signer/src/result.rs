use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::protocol::{AuxiliaryDataSupplementResult, WitnessResult};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WitnessType {
    ByronWitness,
    ShelleyWitness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuxiliaryDataSupplementType {
    None,
    CatalystRegistrationSignature,
}

/// A signature over the transaction body by one of the device keys.
#[derive(Clone, PartialEq, Eq)]
pub struct Witness {
    pub witness_type: WitnessType,
    pub pub_key: Vec<u8>,
    pub signature: Vec<u8>,

    /// Only Byron witnesses carry a chain code
    pub chain_code: Option<Vec<u8>>,
}

impl Debug for Witness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Witness")
            .field("witness_type", &self.witness_type)
            .field("pub_key", &hex::encode(&self.pub_key))
            .field("signature", &hex::encode(&self.signature))
            .field("chain_code", &self.chain_code.as_ref().map(hex::encode))
            .finish()
    }
}

impl From<WitnessResult> for Witness {
    fn from(w: WitnessResult) -> Self {
        Self {
            witness_type: w.witness_type,
            pub_key: w.pub_key,
            signature: w.signature,
            chain_code: w.chain_code,
        }
    }
}

/// Data computed by the device about the auxiliary data, e.g. a catalyst registration signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryDataSupplement {
    pub supplement_type: AuxiliaryDataSupplementType,
    pub auxiliary_data_hash: Vec<u8>,
    pub catalyst_signature: Option<Vec<u8>>,
}

impl AuxiliaryDataSupplement {
    /// Returns `None` when the device reports no supplement.
    pub(crate) fn from_reply(reply: AuxiliaryDataSupplementResult) -> Result<Option<Self>> {
        if reply.supplement_type == AuxiliaryDataSupplementType::None {
            return Ok(None);
        }
        let auxiliary_data_hash = reply.auxiliary_data_hash.ok_or(Error::IncompleteReply {
            response: "CardanoTxAuxiliaryDataSupplement",
            field: "auxiliary_data_hash",
        })?;
        Ok(Some(Self {
            supplement_type: reply.supplement_type,
            auxiliary_data_hash,
            catalyst_signature: reply.catalyst_signature,
        }))
    }
}

/// The outcome of a signing run, the same whichever protocol was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub hash: Vec<u8>,
    pub witnesses: Vec<Witness>,
    pub auxiliary_data_supplement: Option<AuxiliaryDataSupplement>,
}

/// Collects the pieces of a [`SignedTransaction`] while the device returns them.
#[derive(Debug, Default)]
pub(crate) struct ResultAssembler {
    witnesses: Vec<Witness>,
    auxiliary_data_supplement: Option<AuxiliaryDataSupplement>,
}

impl ResultAssembler {
    pub fn with_capacity(witnesses: usize) -> Self {
        Self {
            witnesses: Vec::with_capacity(witnesses),
            auxiliary_data_supplement: None,
        }
    }

    pub fn push_witness(&mut self, witness: Witness) {
        self.witnesses.push(witness);
    }

    pub fn set_supplement(&mut self, supplement: Option<AuxiliaryDataSupplement>) {
        self.auxiliary_data_supplement = supplement;
    }

    pub fn witnesses_count(&self) -> usize {
        self.witnesses.len()
    }

    pub fn finish(self, hash: Vec<u8>) -> SignedTransaction {
        SignedTransaction {
            hash,
            witnesses: self.witnesses,
            auxiliary_data_supplement: self.auxiliary_data_supplement,
        }
    }
}
