//! The item by item signing protocol of current firmware.
//!
//! The transaction is sent in a fixed order of phases, every item in its own message:
//!
//! 1. init, declaring how many items of each kind follow
//! 2. inputs
//! 3. outputs, with their asset groups, tokens and datum/script chunks
//! 4. certificates, each followed by its pool owners and relays
//! 5. withdrawals
//! 6. auxiliary data, answered with a supplement
//! 7. minting, a header then asset groups and tokens
//! 8. collateral inputs
//! 9. required signers
//! 10. collateral return
//! 11. reference inputs
//! 12. witness requests, one per witness path
//! 13. transaction hash
//! 14. finish
//!
//! Any error aborts the run, the device state after a partial sequence is its own business.

use cardano_hw_common::{DerivationPath, SigningRequest};

use crate::auxiliary_data::auxiliary_data_params;
use crate::firmware::FirmwareFeatures;
use crate::output::send_output;
use crate::protocol::{
    wire_count, AssetGroupParams, AuxiliaryDataParams, CertificateParams, MintParams,
    PoolOwnerParams, PoolRelayParams, Request, RequiredSignerParams, Response, SignTxInitParams,
    TokenParams, TxInputParams, WithdrawalParams, WitnessRequestParams,
};
use crate::result::{AuxiliaryDataSupplement, ResultAssembler, SignedTransaction};
use crate::transport::Transport;
use crate::{Error, Result};

/// Send `request` and return the device reply.
pub(crate) fn exchange<T: Transport + ?Sized>(conn: &mut T, request: Request) -> Result<Response> {
    tracing::debug!("---> {request}");
    let response = conn.call(&request)?;
    tracing::debug!("<--- {response}");
    Ok(response)
}

/// Send `request` and expect a generic item ack.
pub(crate) fn send_item<T: Transport + ?Sized>(conn: &mut T, request: Request) -> Result<()> {
    let name = request.to_string();
    match exchange(conn, request)? {
        Response::TxItemAck => Ok(()),
        other => Err(unexpected(name, &other)),
    }
}

pub(crate) fn unexpected(request: String, response: &Response) -> Error {
    Error::UnexpectedResponse {
        request,
        response: response.to_string(),
    }
}

pub struct StreamingSigner<'a> {
    request: &'a SigningRequest,
    witness_paths: Vec<DerivationPath>,
    init: SignTxInitParams,

    /// Auxiliary data already rewritten for the connected firmware
    auxiliary_data: Option<AuxiliaryDataParams>,
}

impl<'a> StreamingSigner<'a> {
    /// Prepare every message payload that depends on the firmware, before any exchange.
    pub fn new(request: &'a SigningRequest, firmware: &FirmwareFeatures) -> Result<Self> {
        let auxiliary_data = request
            .auxiliary_data
            .as_ref()
            .map(|a| auxiliary_data_params(a, firmware))
            .transpose()?;
        let witness_paths = request.witness_paths();
        let init = SignTxInitParams::new(request, witness_paths.len())?;
        Ok(Self {
            request,
            witness_paths,
            init,
            auxiliary_data,
        })
    }

    pub fn sign<T: Transport + ?Sized>(self, conn: &mut T) -> Result<SignedTransaction> {
        let mut assembler = ResultAssembler::with_capacity(self.witness_paths.len());

        self.send_init(conn)?;
        self.send_inputs(conn)?;
        self.send_outputs(conn)?;
        self.send_certificates(conn)?;
        self.send_withdrawals(conn)?;
        self.send_auxiliary_data(conn, &mut assembler)?;
        self.send_mint(conn)?;
        self.send_collateral_inputs(conn)?;
        self.send_required_signers(conn)?;
        self.send_collateral_return(conn)?;
        self.send_reference_inputs(conn)?;
        self.collect_witnesses(conn, &mut assembler)?;
        let hash = self.tx_hash(conn)?;
        self.finish(conn)?;

        tracing::info!(
            "signed tx {} with {} witnesses",
            hex::encode(&hash),
            assembler.witnesses_count()
        );
        Ok(assembler.finish(hash))
    }

    fn send_init<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        send_item(conn, Request::SignTxInit(self.init.clone()))
    }

    fn send_inputs<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        for input in &self.request.inputs {
            send_item(conn, Request::TxInput(input.into()))?;
        }
        Ok(())
    }

    fn send_outputs<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        for output in &self.request.outputs {
            send_output(conn, output)?;
        }
        Ok(())
    }

    fn send_certificates<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        for certificate in &self.request.certificates {
            let params = CertificateParams::try_from(certificate)?;
            send_item(conn, Request::TxCertificate(params))?;
            for owner in certificate.pool_owners() {
                send_item(conn, Request::PoolOwner(PoolOwnerParams::from(owner)))?;
            }
            for relay in certificate.pool_relays() {
                send_item(conn, Request::PoolRelay(PoolRelayParams::from(relay)))?;
            }
        }
        Ok(())
    }

    fn send_withdrawals<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        for withdrawal in &self.request.withdrawals {
            send_item(conn, Request::TxWithdrawal(WithdrawalParams::from(withdrawal)))?;
        }
        Ok(())
    }

    fn send_auxiliary_data<T: Transport + ?Sized>(
        &self,
        conn: &mut T,
        assembler: &mut ResultAssembler,
    ) -> Result<()> {
        let Some(params) = self.auxiliary_data.clone() else {
            return Ok(());
        };
        let request = Request::TxAuxiliaryData(params);
        let name = request.to_string();
        match exchange(conn, request)? {
            Response::TxAuxiliaryDataSupplement(reply) => {
                assembler.set_supplement(AuxiliaryDataSupplement::from_reply(reply)?);
            }
            other => return Err(unexpected(name, &other)),
        }
        send_item(conn, Request::TxHostAck)
    }

    fn send_mint<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        let mint = &self.request.mint;
        if mint.is_empty() {
            return Ok(());
        }
        let asset_groups_count = wire_count(mint.len(), "minting asset groups")?;
        send_item(conn, Request::TxMint(MintParams { asset_groups_count }))?;
        for group in mint {
            send_item(conn, Request::AssetGroup(AssetGroupParams::try_from(group)?))?;
            for token in &group.tokens {
                send_item(conn, Request::Token(TokenParams::from(token)))?;
            }
        }
        Ok(())
    }

    fn send_collateral_inputs<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        for input in &self.request.collateral_inputs {
            send_item(conn, Request::TxCollateralInput(input.into()))?;
        }
        Ok(())
    }

    fn send_required_signers<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        for signer in &self.request.required_signers {
            send_item(
                conn,
                Request::TxRequiredSigner(RequiredSignerParams::from(signer)),
            )?;
        }
        Ok(())
    }

    fn send_collateral_return<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        match self.request.collateral_return.as_ref() {
            Some(output) => send_output(conn, output),
            None => Ok(()),
        }
    }

    fn send_reference_inputs<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        for input in &self.request.reference_inputs {
            send_item(conn, Request::TxReferenceInput(TxInputParams::from(input)))?;
        }
        Ok(())
    }

    fn collect_witnesses<T: Transport + ?Sized>(
        &self,
        conn: &mut T,
        assembler: &mut ResultAssembler,
    ) -> Result<()> {
        for path in &self.witness_paths {
            tracing::debug!("requesting witness for {path}");
            let request = Request::TxWitnessRequest(WitnessRequestParams {
                path: path.to_vec(),
            });
            let name = request.to_string();
            match exchange(conn, request)? {
                Response::TxWitnessResponse(witness) => assembler.push_witness(witness.into()),
                other => return Err(unexpected(name, &other)),
            }
        }
        Ok(())
    }

    fn tx_hash<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<Vec<u8>> {
        let request = Request::TxHostAck;
        let name = request.to_string();
        match exchange(conn, request)? {
            Response::TxBodyHash(reply) => Ok(reply.tx_hash),
            other => Err(unexpected(name, &other)),
        }
    }

    fn finish<T: Transport + ?Sized>(&self, conn: &mut T) -> Result<()> {
        let request = Request::TxHostAck;
        let name = request.to_string();
        match exchange(conn, request)? {
            Response::SignTxFinished => Ok(()),
            other => Err(unexpected(name, &other)),
        }
    }
}
