//! # dda-core
//! Network parameters, address handling and amount conversion shared by the
//! DDACOIN wallet server, explorer and CLI.

pub mod address;
pub mod amount;
pub mod constants;
pub mod error;
pub mod network;

pub use address::{Address, AddressKind};
pub use error::{AddressError, AmountError, CoreError};
pub use network::{Network, NetworkParams};
