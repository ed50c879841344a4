// Application layer: the transfer core (transaction manager, balance updater,
// transfer executor) and the service that validates client requests in front of it.

pub mod balance;
pub mod error;
pub mod service;
pub mod transfer;
pub mod tx;

pub use balance::*;
pub use error::*;
pub use service::*;
pub use transfer::*;
pub use tx::*;
