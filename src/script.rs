//! Redeem-script construction and P2SH address derivation.
//!
//! The redeem script is a pure function of (public-key hash, timelock) and
//! must be byte-identical whenever it is recreated, or the script hash will
//! no longer match the P2SH address and spending fails at validation.

use bitcoin::hashes::Hash;
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_CLTV, OP_DROP, OP_DUP, OP_EQUALVERIFY, OP_HASH160};
use bitcoin::script::Builder;
use bitcoin::{Address, Network, PubkeyHash, Script, ScriptBuf};

use crate::error::{Error, Result};
use crate::timelock::Timelock;

/// `<timelock> OP_CLTV OP_DROP OP_DUP OP_HASH160 <pubkey-hash>
/// OP_EQUALVERIFY OP_CHECKSIG`
///
/// `push_lock_time` takes care of the minimal little-endian script-number
/// encoding of the lock value.
pub fn redeem_script(pubkey_hash: PubkeyHash, timelock: &Timelock) -> ScriptBuf {
    Builder::new()
        .push_lock_time(timelock.lock_time())
        .push_opcode(OP_CLTV)
        .push_opcode(OP_DROP)
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_slice(pubkey_hash.to_byte_array())
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

pub fn p2sh_address(redeem: &Script, network: Network) -> Result<Address> {
    Address::p2sh(redeem, network).map_err(|e| Error::InvalidAddress(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::parse_public_key;
    use crate::EncodeHex;
    use hex_literal::hex;

    const PUBKEY: &str = "028b7f1ea5b1a092028e653916ab66d3cb5027d950a5b5d8ee1f3d8a579f1c266c";

    fn pubkey_hash() -> PubkeyHash {
        parse_public_key(PUBKEY).unwrap().pubkey_hash()
    }

    #[test]
    fn known_vector() {
        let lock = Timelock::new(150).unwrap();
        let redeem = redeem_script(pubkey_hash(), &lock);
        assert_eq!(
            redeem.hex(),
            "029600b17576a91436abac91c3bcea95a72665bd22ffdec9fa4b7e3688ac"
        );
    }

    #[test]
    fn deterministic() {
        let lock = Timelock::new(150).unwrap();
        assert_eq!(
            redeem_script(pubkey_hash(), &lock),
            redeem_script(pubkey_hash(), &lock)
        );
    }

    #[test]
    fn sensitive_to_timelock_and_key() {
        let lock = Timelock::new(150).unwrap();
        let base = redeem_script(pubkey_hash(), &lock);

        let other_lock = Timelock::new(151).unwrap();
        assert_ne!(base, redeem_script(pubkey_hash(), &other_lock));

        let other_hash = PubkeyHash::from_byte_array(hex!(
            "0000000000000000000000000000000000000001"
        ));
        assert_ne!(base, redeem_script(other_hash, &lock));
    }

    #[test]
    fn p2sh_addresses_per_network() {
        let lock = Timelock::new(150).unwrap();
        let redeem = redeem_script(pubkey_hash(), &lock);
        assert_eq!(
            p2sh_address(&redeem, Network::Regtest).unwrap().to_string(),
            "2N7ZMhYhdKtvkkgR2nV6n9KaAcbgGy4tH5D"
        );
        // Testnet shares the regtest P2SH version byte.
        assert_eq!(
            p2sh_address(&redeem, Network::Testnet).unwrap().to_string(),
            "2N7ZMhYhdKtvkkgR2nV6n9KaAcbgGy4tH5D"
        );
        assert_eq!(
            p2sh_address(&redeem, Network::Bitcoin).unwrap().to_string(),
            "3G19dombiSRQYtnV7MUuXNauQFU7A1N7MP"
        );
    }

    #[test]
    fn timestamp_lock_push_encoding() {
        // 1_700_000_000 = 0x6553F100, pushed as a minimal 4-byte
        // little-endian script number.
        let lock = Timelock::new(1_700_000_000).unwrap();
        let redeem = redeem_script(pubkey_hash(), &lock);
        assert_eq!(&redeem.as_bytes()[..5], &hex!("0400f15365"));

        // 150 has its high bit set, so it takes a two-byte encoding with a
        // trailing zero sign byte.
        let lock = Timelock::new(150).unwrap();
        let redeem = redeem_script(pubkey_hash(), &lock);
        assert_eq!(&redeem.as_bytes()[..3], &hex!("029600"));
    }
}
