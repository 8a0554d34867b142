//! Network selection and key handling for both command-line flows.

use std::str::FromStr;

use bitcoin::key::Secp256k1;
use bitcoin::secp256k1;
use bitcoin::{Network, NetworkKind, PrivateKey, PublicKey, PubkeyHash};

use crate::error::{Error, Result};

/// The network is an explicit value threaded through every call that needs
/// it; there is no process-global setup.
pub fn parse_network(name: &str) -> Result<Network> {
    match name {
        "mainnet" | "bitcoin" => Ok(Network::Bitcoin),
        "testnet" => Ok(Network::Testnet),
        "signet" => Ok(Network::Signet),
        "regtest" => Ok(Network::Regtest),
        other => Err(Error::InvalidNetwork(other.to_string())),
    }
}

pub fn parse_public_key(hex: &str) -> Result<PublicKey> {
    PublicKey::from_str(hex).map_err(|e| Error::MalformedKey(format!("public key: {e}")))
}

/// Parse a WIF private key, warning when its network prefix disagrees with
/// the selected network.
pub fn parse_private_key(wif: &str, network: Network) -> Result<PrivateKey> {
    let key =
        PrivateKey::from_wif(wif).map_err(|e| Error::MalformedKey(format!("private key: {e}")))?;
    if key.network != NetworkKind::from(network) {
        log::warn!(
            "private key is encoded for {:?} but the selected network is {network}",
            key.network
        );
    }
    Ok(key)
}

/// Resolve the public-key hash the redeem script commits to.
///
/// Exactly one key is expected; when both are given the public key takes
/// precedence (with a warning), when neither is given this is fatal.
pub fn select_pubkey_hash<C: secp256k1::Signing>(
    secp: &Secp256k1<C>,
    public_key: Option<&str>,
    private_key: Option<&str>,
    network: Network,
) -> Result<PubkeyHash> {
    match (public_key, private_key) {
        (None, None) => Err(Error::NoKeyProvided),
        (Some(public), private) => {
            if private.is_some() {
                log::warn!("both a private and a public key were given; using the public key");
            }
            Ok(parse_public_key(public)?.pubkey_hash())
        }
        (None, Some(private)) => {
            let key = parse_private_key(private, network)?;
            Ok(key.public_key(secp).pubkey_hash())
        }
    }
}
