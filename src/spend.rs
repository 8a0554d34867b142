//! Spend every UTXO of a timelocked P2SH address to a P2PKH destination.
//!
//! Linear flow: validate arguments, recreate the redeem script from the
//! private key and timelock, discover UTXOs over RPC, build and sign one
//! transaction, dry-run it through `testmempoolaccept`, then broadcast.

use bitcoin::consensus::encode::serialize_hex;
use bitcoin::key::Secp256k1;
use bitcoin::{Address, Amount, Network};
use bitcoincore_rpc::RpcApi;
use clap::Parser;
use timelock_p2sh::keys::{parse_network, parse_private_key};
use timelock_p2sh::script::{p2sh_address, redeem_script};
use timelock_p2sh::spending::{build_spend_transaction, sign_inputs};
use timelock_p2sh::{fees, rpc, Error, Timelock};

#[derive(Parser)]
#[command(about = "Spend all UTXOs from a timelocked P2SH address")]
struct Args {
    /// Network to use (mainnet, testnet, signet or regtest)
    #[arg(long)]
    network: String,

    /// P2SH address holding the funds (sender)
    #[arg(long)]
    p2sh: String,

    /// Private key of the P2SH redeem script (WIF)
    #[arg(long = "private_key")]
    private_key: String,

    /// Locktime value used to generate the P2SH address
    #[arg(long, allow_hyphen_values = true)]
    timelock: i64,

    /// P2PKH address to send the funds to (destination)
    #[arg(long)]
    p2pkh: String,

    /// Node RPC endpoint; defaults to localhost on the network's standard port
    #[arg(long = "rpc_url")]
    rpc_url: Option<String>,

    /// RPC user of the running node
    #[arg(long = "rpc_user")]
    rpc_user: String,

    /// RPC password of the running node
    #[arg(long = "rpc_pass")]
    rpc_pass: String,

    /// Fee recommendation endpoint
    #[arg(long = "fee_api", default_value = fees::DEFAULT_FEE_API)]
    fee_api: String,

    /// Fixed sat/vB rate used when the fee service is unreachable
    #[arg(long = "fallback_fee_rate")]
    fallback_fee_rate: Option<u64>,

    /// Skip the chain rescan after importing the watch-only address
    #[arg(long = "no_rescan")]
    no_rescan: bool,
}

fn parse_address(s: &str, network: Network) -> Result<Address, Error> {
    s.parse::<Address<_>>()
        .map_err(|e| Error::InvalidAddress(format!("{s}: {e}")))?
        .require_network(network)
        .map_err(|e| Error::InvalidAddress(e.to_string()))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let network = parse_network(&args.network)?;
    let timelock = Timelock::new(args.timelock)?;
    timelock.announce();

    let secp = Secp256k1::new();
    let private_key = parse_private_key(&args.private_key, network)?;
    let public_key = private_key.public_key(&secp);

    let p2sh = parse_address(&args.p2sh, network)?;
    let destination = parse_address(&args.p2pkh, network)?;

    // The redeem script must come out byte-identical to the one hashed into
    // the P2SH address, or every signature below would fail validation.
    let redeem = redeem_script(public_key.pubkey_hash(), &timelock);
    let derived = p2sh_address(&redeem, network)?;
    if derived != p2sh {
        return Err(Error::RedeemScriptMismatch {
            expected: p2sh.to_string(),
            derived: derived.to_string(),
        }
        .into());
    }

    let rpc_url = args
        .rpc_url
        .unwrap_or_else(|| rpc::default_rpc_url(network));
    let client = rpc::node_client(&rpc_url, &args.rpc_user, &args.rpc_pass)?;
    rpc::watch_address(&client, &p2sh, !args.no_rescan)?;

    let utxos = rpc::spendable_utxos(&client, &p2sh)?;
    if utxos.is_empty() {
        return Err(Error::NoUtxos(p2sh.to_string()).into());
    }
    println!("Found {} UTXO(s) on {p2sh}", utxos.len());

    let fee_rate = match fees::recommended_fee_rate(&args.fee_api) {
        Ok(rate) => rate,
        Err(e) => match args.fallback_fee_rate {
            Some(rate) => {
                log::warn!("fee service failed ({e}); using fallback rate {rate} sat/vB");
                rate
            }
            None => return Err(e.into()),
        },
    };
    let size = fees::estimate_tx_size(utxos.len(), 1);
    let fee = Amount::from_sat(size as u64 * fee_rate);
    println!("Transaction size will be about {size} bytes at {fee_rate} sat/vB, fee {fee}");

    let mut tx = build_spend_transaction(&utxos, destination.script_pubkey(), &timelock, fee)?;
    println!("Amount to be sent is {} satoshis", tx.output[0].value.to_sat());
    println!("Raw unsigned transaction: {}", serialize_hex(&tx));

    sign_inputs(&mut tx, &secp, &private_key, &redeem)?;
    println!("Raw signed transaction: {}", serialize_hex(&tx));
    println!("Transaction id: {}", tx.compute_txid());

    let assessment = client.test_mempool_accept(&[&tx])?;
    let verdict = assessment
        .first()
        .ok_or_else(|| Error::MempoolRejected("empty testmempoolaccept response".to_string()))?;
    if !verdict.allowed {
        let reason = verdict
            .reject_reason
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        return Err(Error::MempoolRejected(reason).into());
    }
    println!("Transaction is valid!");

    let txid = client.send_raw_transaction(&tx)?;
    println!("Broadcast transaction {txid}");
    Ok(())
}
