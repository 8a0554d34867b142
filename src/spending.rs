//! Transaction assembly and P2SH-redeem signing.

use bitcoin::hashes::Hash;
use bitcoin::key::Secp256k1;
use bitcoin::script::{Builder, PushBytes};
use bitcoin::secp256k1::{self, Message};
use bitcoin::sighash::SighashCache;
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, EcdsaSighashType, OutPoint, PrivateKey, Script, ScriptBuf, Transaction, TxIn, TxOut,
    Witness,
};

use crate::error::{Error, Result};
use crate::timelock::Timelock;

/// Standardness floor for a P2PKH output.
pub const DUST_LIMIT: Amount = Amount::from_sat(546);

/// One unspent output of the timelocked address. Fetched from the node,
/// consumed as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utxo {
    pub outpoint: OutPoint,
    pub amount: Amount,
}

/// Build the unsigned transaction: one input per UTXO carrying the
/// locktime-enabling sequence, one output paying the input sum minus `fee`,
/// and `nLockTime` set to the timelock value.
///
/// Fails fast when the fee eats the whole input sum or leaves an output
/// under the dust floor.
pub fn build_spend_transaction(
    utxos: &[Utxo],
    destination: ScriptBuf,
    timelock: &Timelock,
    fee: Amount,
) -> Result<Transaction> {
    let available: Amount = utxos.iter().map(|u| u.amount).sum();
    let spend = available
        .checked_sub(fee)
        .filter(|amount| *amount >= DUST_LIMIT)
        .ok_or(Error::InsufficientFunds {
            available: available.to_sat(),
            required: (fee + DUST_LIMIT).to_sat(),
        })?;

    let input = utxos
        .iter()
        .map(|utxo| TxIn {
            previous_output: utxo.outpoint,
            script_sig: ScriptBuf::new(),
            sequence: timelock.input_sequence(),
            witness: Witness::default(),
        })
        .collect();

    Ok(Transaction {
        version: Version::ONE,
        lock_time: timelock.lock_time(),
        input,
        output: vec![TxOut {
            value: spend,
            script_pubkey: destination,
        }],
    })
}

/// Fill every input's `script_sig` with the standard P2SH-redeem unlocking
/// pattern `[<signature> <pubkey> <redeem-script>]`, signing the legacy
/// sighash against the redeem script with SIGHASH_ALL.
pub fn sign_inputs<C: secp256k1::Signing>(
    tx: &mut Transaction,
    secp: &Secp256k1<C>,
    private_key: &PrivateKey,
    redeem: &Script,
) -> Result<()> {
    let public_key = private_key.public_key(secp);

    let sighashes = {
        let cache = SighashCache::new(&*tx);
        (0..tx.input.len())
            .map(|index| {
                cache
                    .legacy_signature_hash(index, redeem, EcdsaSighashType::All.to_u32())
                    .map(|hash| hash.to_byte_array())
                    .map_err(|e| Error::Sighash(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?
    };

    for (txin, sighash) in tx.input.iter_mut().zip(sighashes) {
        let signature = secp.sign_ecdsa(&Message::from_digest(sighash), &private_key.inner);
        let mut sig = signature.serialize_der().to_vec();
        sig.push(EcdsaSighashType::All as u8);

        txin.script_sig = Builder::new()
            .push_slice(push_bytes(&sig)?)
            .push_key(&public_key)
            .push_slice(push_bytes(redeem.as_bytes())?)
            .into_script();
    }
    Ok(())
}

fn push_bytes(slice: &[u8]) -> Result<&PushBytes> {
    <&PushBytes>::try_from(slice).map_err(|_| Error::OversizedScriptPush(slice.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::redeem_script;
    use bitcoin::script::Instruction;
    use bitcoin::Network;
    use hex_literal::hex;

    fn test_key() -> PrivateKey {
        let secret = secp256k1::SecretKey::from_slice(&hex!(
            "3d77385fcb86bf9d6010d24ffa5319783dc6382da9aec7f0ab42607f7e3dd282"
        ))
        .unwrap();
        PrivateKey::new(secret, Network::Regtest)
    }

    fn test_utxo(vout: u32, sat: u64) -> Utxo {
        Utxo {
            outpoint: OutPoint {
                txid: "c3a5d5bbf463a62d2c6fe89fd49c121f858bbb75682f8dddac4e7a6c5ad1cff3"
                    .parse()
                    .unwrap(),
                vout,
            },
            amount: Amount::from_sat(sat),
        }
    }

    fn destination() -> ScriptBuf {
        "mkW2SYBPvto1AkfhNz33hXWh5q6tgv5KmM"
            .parse::<bitcoin::Address<_>>()
            .unwrap()
            .require_network(Network::Regtest)
            .unwrap()
            .script_pubkey()
    }

    #[test]
    fn locktime_and_sequence() {
        let timelock = Timelock::new(150).unwrap();
        let tx = build_spend_transaction(
            &[test_utxo(0, 100_000)],
            destination(),
            &timelock,
            Amount::from_sat(1_000),
        )
        .unwrap();

        assert_eq!(tx.lock_time.to_consensus_u32(), 150);
        assert_eq!(tx.input.len(), 1);
        assert!(tx.input[0].sequence.enables_absolute_lock_time());
        assert_eq!(tx.output.len(), 1);
        assert_eq!(tx.output[0].value, Amount::from_sat(99_000));
    }

    #[test]
    fn sums_multiple_inputs() {
        let timelock = Timelock::new(150).unwrap();
        let tx = build_spend_transaction(
            &[test_utxo(0, 60_000), test_utxo(1, 40_000)],
            destination(),
            &timelock,
            Amount::from_sat(2_000),
        )
        .unwrap();
        assert_eq!(tx.input.len(), 2);
        assert_eq!(tx.output[0].value, Amount::from_sat(98_000));
    }

    #[test]
    fn insufficient_funds() {
        let timelock = Timelock::new(150).unwrap();
        // Fee exceeds the inputs.
        assert!(matches!(
            build_spend_transaction(
                &[test_utxo(0, 1_000)],
                destination(),
                &timelock,
                Amount::from_sat(2_000),
            ),
            Err(Error::InsufficientFunds { available: 1_000, .. })
        ));
        // Fee leaves only dust behind.
        assert!(matches!(
            build_spend_transaction(
                &[test_utxo(0, 1_000)],
                destination(),
                &timelock,
                Amount::from_sat(600),
            ),
            Err(Error::InsufficientFunds { .. })
        ));
        // No UTXOs at all.
        assert!(matches!(
            build_spend_transaction(&[], destination(), &timelock, Amount::ZERO),
            Err(Error::InsufficientFunds { available: 0, .. })
        ));
    }

    #[test]
    fn signed_input_unlocks_with_redeem_pattern() {
        let secp = Secp256k1::new();
        let key = test_key();
        let public_key = key.public_key(&secp);
        let timelock = Timelock::new(150).unwrap();
        let redeem = redeem_script(public_key.pubkey_hash(), &timelock);

        let mut tx = build_spend_transaction(
            &[test_utxo(0, 100_000)],
            destination(),
            &timelock,
            Amount::from_sat(1_000),
        )
        .unwrap();
        sign_inputs(&mut tx, &secp, &key, &redeem).unwrap();

        let pushes: Vec<Vec<u8>> = tx.input[0]
            .script_sig
            .instructions()
            .map(|ins| match ins.unwrap() {
                Instruction::PushBytes(bytes) => bytes.as_bytes().to_vec(),
                Instruction::Op(op) => panic!("unexpected opcode {op:?}"),
            })
            .collect();
        assert_eq!(pushes.len(), 3);

        // [signature || sighash byte, pubkey, redeem script]
        let (sig, sighash_byte) = pushes[0].split_at(pushes[0].len() - 1);
        assert_eq!(sighash_byte, [EcdsaSighashType::All as u8]);
        assert_eq!(pushes[1], public_key.to_bytes());
        assert_eq!(pushes[2], redeem.as_bytes());

        // The signature must verify against the legacy sighash computed over
        // the redeem script.
        let sighash = SighashCache::new(&tx)
            .legacy_signature_hash(0, &redeem, EcdsaSighashType::All.to_u32())
            .unwrap();
        let message = Message::from_digest(sighash.to_byte_array());
        let signature = secp256k1::ecdsa::Signature::from_der(sig).unwrap();
        Secp256k1::verification_only()
            .verify_ecdsa(&message, &signature, &public_key.inner)
            .unwrap();
    }
}
