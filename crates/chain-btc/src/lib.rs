//! Bitcoin chain support for the wallet engine.
//!
//! Address encoding for legacy, nested SegWit, native SegWit and taproot
//! accounts, fee sizing, transaction building and per-script signing, plus
//! the [`source::ChainSource`] seam used for UTXOs, fees, broadcast and
//! history.

pub mod address;
pub mod error;
pub mod esplora;
pub mod fee;
pub mod history;
pub mod keys;
pub mod network;
pub mod script_type;
pub mod source;
pub mod transaction;
pub mod utxo;

pub use error::{BtcError, SourceError};
pub use network::BtcNetwork;
pub use script_type::ScriptType;
