//! Transfer lifecycle tracking
//!
//! Every transfer of a crawl session moves through
//! `Queued -> InFlight -> {Succeeded, Failed}`; a queued transfer may also be
//! failed directly when the session is abandoned before it starts.

mod transfer_state;

pub use transfer_state::TransferState;
