pub mod error;
pub mod fees;
pub mod keys;
pub mod rpc;
pub mod script;
pub mod spending;
pub mod timelock;

pub use error::{Error, Result};
pub use timelock::Timelock;

pub trait EncodeHex {
    fn hex(&self) -> String;
}

impl<A> EncodeHex for A
where
    A: AsRef<[u8]>,
{
    fn hex(&self) -> String {
        hex::encode(self)
    }
}
