//! Pairing payload encode/decode (C9, spec §4.9, §6).
//!
//! `vultisig://?type=<NewVault|SignTransaction>&tssType=<Keygen|Keysign>&
//! jsonData=<url-encoded-base64-of-lzma-of-binary-encoded-message>`.
//!
//! Per the Open Questions resolution in spec §9, the `jsonData` alphabet is
//! standard base64 plus `encodeURIComponent`-equivalent percent-encoding —
//! `url`'s `query_pairs_mut` already performs that percent-encoding, so
//! `vultisig_crypto::archive::compress_to_base64_standard` supplies the
//! base64 half and `url` supplies the URI-escaping half.

use crate::messages::{KeygenMessage, KeysignMessage, PairingMessage};
use url::Url;
use vultisig_core::{Result, VultisigError};

const SCHEME_PREFIX: &str = "vultisig://";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairingType {
    NewVault,
    SignTransaction,
}

impl PairingType {
    fn as_str(self) -> &'static str {
        match self {
            Self::NewVault => "NewVault",
            Self::SignTransaction => "SignTransaction",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "NewVault" => Ok(Self::NewVault),
            "SignTransaction" => Ok(Self::SignTransaction),
            other => Err(VultisigError::protocol(format!("unknown pairing type {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TssType {
    Keygen,
    Keysign,
}

impl TssType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Keygen => "Keygen",
            Self::Keysign => "Keysign",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "Keygen" => Ok(Self::Keygen),
            "Keysign" => Ok(Self::Keysign),
            other => Err(VultisigError::protocol(format!("unknown tssType {other}"))),
        }
    }
}

fn build_uri(pairing_type: PairingType, tss_type: TssType, json_data: &str) -> Result<String> {
    let mut url = Url::parse(SCHEME_PREFIX)
        .map_err(|e| VultisigError::protocol(format!("invalid pairing URI scheme: {e}")))?;
    url.query_pairs_mut()
        .append_pair("type", pairing_type.as_str())
        .append_pair("tssType", tss_type.as_str())
        .append_pair("jsonData", json_data);
    Ok(url.to_string())
}

/// Encode a `KeygenMessage` into a `type=NewVault&tssType=Keygen` pairing URI.
pub fn encode_keygen(message: &KeygenMessage) -> Result<String> {
    let bytes = bincode::serialize(message)
        .map_err(|e| VultisigError::protocol(format!("keygen message encoding failed: {e}")))?;
    let json_data = vultisig_crypto::archive::compress_to_base64_standard(&bytes)?;
    build_uri(PairingType::NewVault, TssType::Keygen, &json_data)
}

/// Encode a `KeysignMessage` into a `type=SignTransaction&tssType=Keysign` pairing URI.
pub fn encode_keysign(message: &KeysignMessage) -> Result<String> {
    let bytes = bincode::serialize(message)
        .map_err(|e| VultisigError::protocol(format!("keysign message encoding failed: {e}")))?;
    let json_data = vultisig_crypto::archive::compress_to_base64_standard(&bytes)?;
    build_uri(PairingType::SignTransaction, TssType::Keysign, &json_data)
}

/// Decode any pairing URI, validating that the declared `type`/`tssType`
/// pair is consistent with the embedded structure (spec §4.9 `Decode`).
pub fn decode(uri: &str) -> Result<PairingMessage> {
    let url = Url::parse(uri).map_err(|e| VultisigError::protocol(format!("invalid pairing URI: {e}")))?;
    if url.scheme() != "vultisig" {
        return Err(VultisigError::protocol("not a vultisig:// URI"));
    }

    let mut pairing_type = None;
    let mut tss_type = None;
    let mut json_data = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "type" => pairing_type = Some(PairingType::parse(&value)?),
            "tssType" => tss_type = Some(TssType::parse(&value)?),
            "jsonData" => json_data = Some(value.into_owned()),
            _ => {}
        }
    }

    let pairing_type = pairing_type.ok_or_else(|| VultisigError::protocol("missing type"))?;
    let tss_type = tss_type.ok_or_else(|| VultisigError::protocol("missing tssType"))?;
    let json_data = json_data.ok_or_else(|| VultisigError::protocol("missing jsonData"))?;

    let bytes = vultisig_crypto::archive::decompress_from_base64_standard(&json_data)?;

    match (pairing_type, tss_type) {
        (PairingType::NewVault, TssType::Keygen) => {
            let message: KeygenMessage = bincode::deserialize(&bytes)
                .map_err(|e| VultisigError::protocol(format!("malformed keygen message: {e}")))?;
            Ok(PairingMessage::Keygen(message))
        }
        (PairingType::SignTransaction, TssType::Keysign) => {
            let message: KeysignMessage = bincode::deserialize(&bytes)
                .map_err(|e| VultisigError::protocol(format!("malformed keysign message: {e}")))?;
            Ok(PairingMessage::Keysign(message))
        }
        _ => Err(VultisigError::protocol(
            "type/tssType pair inconsistent with embedded structure",
        )),
    }
}
