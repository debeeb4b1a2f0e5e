//! An in-process device answering every request like firmware would, for tests.

use std::collections::VecDeque;

use crate::error::ErrorDetails;
use crate::protocol::{
    AuxiliaryDataSupplementResult, Request, Response, SignedTxChunkResult, SignedTxResult,
    TxBodyHashResult, WitnessResult,
};
use crate::result::{AuxiliaryDataSupplementType, WitnessType};
use crate::transport::Transport;
use crate::{Error, Result};

pub const DEFAULT_TX_HASH: [u8; 32] = [0x73; 32];

const HARDENED: u32 = 0x8000_0000;
const BYRON_PURPOSE: u32 = 44 | HARDENED;

/// Records every request and answers with deterministic data.
///
/// Witnesses are derived from the requested path, see [`TestDeviceEmulator::pub_key_for`].
#[derive(Debug)]
pub struct TestDeviceEmulator {
    requests: Vec<Request>,
    tx_hash: Vec<u8>,
    supplement: AuxiliaryDataSupplementResult,
    mislabel_witnesses: bool,
    legacy_chunks: VecDeque<Vec<u8>>,
    legacy_tail: Option<Vec<u8>>,
    fail_on: Option<String>,
    wrong_reply: Option<(String, Response)>,

    awaiting_auxiliary_data_ack: bool,
    hash_sent: bool,
}

impl Default for TestDeviceEmulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDeviceEmulator {
    pub fn new() -> Self {
        Self {
            requests: vec![],
            tx_hash: DEFAULT_TX_HASH.to_vec(),
            supplement: AuxiliaryDataSupplementResult {
                supplement_type: AuxiliaryDataSupplementType::None,
                auxiliary_data_hash: None,
                catalyst_signature: None,
            },
            mislabel_witnesses: false,
            legacy_chunks: VecDeque::new(),
            legacy_tail: None,
            fail_on: None,
            wrong_reply: None,
            awaiting_auxiliary_data_ack: false,
            hash_sent: false,
        }
    }

    pub fn with_tx_hash(mut self, tx_hash: Vec<u8>) -> Self {
        self.tx_hash = tx_hash;
        self
    }

    pub fn with_supplement(mut self, supplement: AuxiliaryDataSupplementResult) -> Self {
        self.supplement = supplement;
        self
    }

    /// Label every witness as Byron, whatever its path.
    pub fn with_mislabeled_witnesses(mut self) -> Self {
        self.mislabel_witnesses = true;
        self
    }

    /// Answer a legacy sign request with `chunks`, then with `tail` in the final reply.
    pub fn with_legacy_chunks(mut self, chunks: Vec<Vec<u8>>, tail: Option<Vec<u8>>) -> Self {
        self.legacy_chunks = chunks.into();
        self.legacy_tail = tail;
        self
    }

    /// Reply with a device error when a request named `name` arrives, e.g. `CardanoTxOutput`.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_string());
        self
    }

    /// Answer a request named `name` with `response`, whatever the request expects.
    pub fn replying_to(mut self, name: &str, response: Response) -> Self {
        self.wrong_reply = Some((name.to_string(), response));
        self
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn request_names(&self) -> Vec<String> {
        self.requests.iter().map(ToString::to_string).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.requests
            .iter()
            .filter(|r| r.to_string() == name)
            .count()
    }

    /// The public key returned for `path`: the big endian path elements, padded to 32 bytes.
    pub fn pub_key_for(path: &[u32]) -> Vec<u8> {
        let mut key: Vec<u8> = path.iter().flat_map(|e| e.to_be_bytes()).collect();
        key.resize(32, 0);
        key
    }

    fn witness(&self, path: &[u32]) -> WitnessResult {
        let byron = path.first() == Some(&BYRON_PURPOSE);
        let witness_type = if byron || self.mislabel_witnesses {
            WitnessType::ByronWitness
        } else {
            WitnessType::ShelleyWitness
        };
        WitnessResult {
            witness_type,
            pub_key: Self::pub_key_for(path),
            signature: vec![path.len() as u8; 64],
            chain_code: (witness_type == WitnessType::ByronWitness).then(|| vec![0xcc; 32]),
        }
    }

    fn next_legacy_reply(&mut self) -> Response {
        match self.legacy_chunks.pop_front() {
            Some(chunk) => Response::SignedTxChunk(SignedTxChunkResult {
                signed_tx_chunk: chunk,
            }),
            None => Response::SignedTx(SignedTxResult {
                tx_hash: self.tx_hash.clone(),
                serialized_tx: self.legacy_tail.take(),
            }),
        }
    }
}

impl Transport for TestDeviceEmulator {
    fn call(&mut self, request: &Request) -> Result<Response> {
        self.requests.push(request.clone());
        let name = request.to_string();
        if self.fail_on.as_deref() == Some(name.as_str()) {
            tracing::debug!("emulator rejecting {name}");
            return Err(Error::DeviceError(ErrorDetails::new(
                -32000,
                "Action rejected by user",
            )));
        }

        if let Some((_, response)) = self.wrong_reply.as_ref().filter(|(n, _)| *n == name) {
            tracing::debug!("emulator replying {response} to {name}");
            return Ok(response.clone());
        }

        let response = match request {
            Request::TxAuxiliaryData(_) => {
                self.awaiting_auxiliary_data_ack = true;
                Response::TxAuxiliaryDataSupplement(self.supplement.clone())
            }
            Request::TxWitnessRequest(params) => {
                Response::TxWitnessResponse(self.witness(&params.path))
            }
            Request::TxHostAck if self.awaiting_auxiliary_data_ack => {
                self.awaiting_auxiliary_data_ack = false;
                Response::TxItemAck
            }
            Request::TxHostAck if !self.hash_sent => {
                self.hash_sent = true;
                Response::TxBodyHash(TxBodyHashResult {
                    tx_hash: self.tx_hash.clone(),
                })
            }
            Request::TxHostAck => Response::SignTxFinished,
            Request::SignTx(_) | Request::SignedTxChunkAck => self.next_legacy_reply(),
            _ => Response::TxItemAck,
        };
        Ok(response)
    }
}
