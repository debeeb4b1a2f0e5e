use cardano_hw_common::{Output, OutputDestination};

use crate::consts::MAX_CHUNK_SIZE;
use crate::protocol::{
    wire_count, AddressParametersParams, AssetGroupParams, ChunkParams, Request, TokenParams,
    TxOutputParams,
};
use crate::streaming::send_item;
use crate::transport::Transport;
use crate::{Error, Result};

/// Either a literal address or the parameters the device derives it from.
pub(crate) fn destination_params(
    destination: &OutputDestination,
) -> (Option<String>, Option<AddressParametersParams>) {
    match destination {
        OutputDestination::Address(address) => (Some(address.clone()), None),
        OutputDestination::Parameters(params) => {
            (None, Some(AddressParametersParams::from(params)))
        }
    }
}

impl TryFrom<&Output> for TxOutputParams {
    type Error = Error;

    fn try_from(output: &Output) -> Result<Self> {
        let (address, address_parameters) = destination_params(&output.destination);
        let size = |payload: &Option<Vec<u8>>, what| {
            wire_count(payload.as_ref().map_or(0, Vec::len), what)
        };
        Ok(Self {
            address,
            address_parameters,
            amount: output.amount,
            asset_groups_count: wire_count(output.token_bundle.len(), "asset groups")?,
            datum_hash: output.datum_hash.clone(),
            format: output.format,
            inline_datum_size: size(&output.inline_datum, "inline datum bytes")?,
            reference_script_size: size(&output.reference_script, "reference script bytes")?,
        })
    }
}

/// Send an output: its header, its asset groups each followed by its tokens, then the inline
/// datum and reference script chunks. Every message is acked by the device.
pub(crate) fn send_output<T: Transport + ?Sized>(conn: &mut T, output: &Output) -> Result<()> {
    send_item(conn, Request::TxOutput(output.try_into()?))?;

    for group in &output.token_bundle {
        send_item(conn, Request::AssetGroup(AssetGroupParams::try_from(group)?))?;
        for token in &group.tokens {
            send_item(conn, Request::Token(TokenParams::from(token)))?;
        }
    }

    if let Some(datum) = output.inline_datum.as_ref() {
        for chunk in datum.chunks(MAX_CHUNK_SIZE) {
            send_item(
                conn,
                Request::InlineDatumChunk(ChunkParams {
                    data: chunk.to_vec(),
                }),
            )?;
        }
    }

    if let Some(script) = output.reference_script.as_ref() {
        for chunk in script.chunks(MAX_CHUNK_SIZE) {
            send_item(
                conn,
                Request::ReferenceScriptChunk(ChunkParams {
                    data: chunk.to_vec(),
                }),
            )?;
        }
    }

    Ok(())
}
