//! Generate a P2SH address whose redeem script enforces an absolute
//! timelock (OP_CHECKLOCKTIMEVERIFY) before the usual pubkey-hash check.

use bitcoin::key::Secp256k1;
use clap::Parser;
use timelock_p2sh::keys::{parse_network, select_pubkey_hash};
use timelock_p2sh::script::{p2sh_address, redeem_script};
use timelock_p2sh::{EncodeHex, Timelock};

#[derive(Parser)]
#[command(about = "Generate a P2SH address with an absolute timelock")]
struct Args {
    /// Network to use (mainnet, testnet, signet or regtest)
    #[arg(long)]
    network: String,

    /// Public key (hex)
    #[arg(long = "public_key")]
    public_key: Option<String>,

    /// Private key (WIF)
    #[arg(long = "private_key")]
    private_key: Option<String>,

    /// Lock until this block height or Unix timestamp (absolute)
    #[arg(long, allow_hyphen_values = true)]
    timelock: i64,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let network = parse_network(&args.network)?;
    let timelock = Timelock::new(args.timelock)?;
    timelock.announce();

    let secp = Secp256k1::new();
    let pubkey_hash = select_pubkey_hash(
        &secp,
        args.public_key.as_deref(),
        args.private_key.as_deref(),
        network,
    )?;

    let redeem = redeem_script(pubkey_hash, &timelock);
    log::info!("redeem script: {}", redeem.as_bytes().hex());

    let address = p2sh_address(&redeem, network)?;
    println!("Created P2SH address: {address}");
    Ok(())
}
