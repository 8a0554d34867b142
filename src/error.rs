use thiserror::Error;

/// Everything that can abort a run. All of these are fatal; nothing is
/// retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid network: {0:?} (expected mainnet, testnet, signet or regtest)")]
    InvalidNetwork(String),

    #[error("invalid timelock: {0} (must be a positive block height or Unix timestamp)")]
    InvalidTimelock(i64),

    #[error("at least one of a public or private key must be provided")]
    NoKeyProvided,

    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("P2SH address {expected} does not match the one derived from the key and timelock ({derived})")]
    RedeemScriptMismatch { expected: String, derived: String },

    #[error("fee service endpoint not found (404)")]
    FeeServiceNotFound,

    #[error("fee service request failed: {0}")]
    FeeServiceRequest(String),

    #[error("address {0} has no UTXOs available to be spent")]
    NoUtxos(String),

    #[error("insufficient funds: {available} sat available, {required} sat required for fee and dust floor")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("transaction rejected by mempool: {0}")]
    MempoolRejected(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] bitcoincore_rpc::Error),

    #[error("sighash computation failed: {0}")]
    Sighash(String),

    #[error("script element too large to push: {0} bytes")]
    OversizedScriptPush(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
