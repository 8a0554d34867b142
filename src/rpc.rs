//! Node access: watch-only import and UTXO discovery over JSON-RPC.

use bitcoin::{Address, Network, OutPoint};
use bitcoincore_rpc::{Auth, Client, RpcApi};

use crate::error::Result;
use crate::spending::Utxo;

/// Standard RPC port of the network, on localhost.
pub fn default_rpc_url(network: Network) -> String {
    let port = match network {
        Network::Bitcoin => 8332,
        Network::Testnet => 18332,
        Network::Signet => 38332,
        Network::Regtest => 18443,
        _ => 8332,
    };
    format!("http://127.0.0.1:{port}")
}

/// Credentials are always explicit; there is no built-in default.
pub fn node_client(url: &str, user: &str, pass: &str) -> Result<Client> {
    Ok(Client::new(
        url,
        Auth::UserPass(user.to_string(), pass.to_string()),
    )?)
}

/// `importaddress`: register the address watch-only so `listunspent` can see
/// its outputs. Rescanning picks up funds received before the import.
pub fn watch_address(client: &Client, address: &Address, rescan: bool) -> Result<()> {
    client.import_address(address, None, Some(rescan))?;
    Ok(())
}

/// `listunspent`, narrowed to outputs paying exactly the target address's
/// script.
pub fn spendable_utxos(client: &Client, address: &Address) -> Result<Vec<Utxo>> {
    let script = address.script_pubkey();
    let unspent = client.list_unspent(None, None, None, None, None)?;
    Ok(unspent
        .into_iter()
        .filter(|entry| entry.script_pub_key == script)
        .map(|entry| Utxo {
            outpoint: OutPoint {
                txid: entry.txid,
                vout: entry.vout,
            },
            amount: entry.amount,
        })
        .collect())
}
