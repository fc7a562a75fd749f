pub mod chain;
pub mod chain_store;
pub mod error;
pub mod notify;
pub mod receipt;

pub use chain::ChainLink;
pub use chain_store::{ChainStore, SharedChainStore};
pub use error::ChainError;
pub use notify::{Notifier, NullNotifier, TracingNotifier};
pub use receipt::ChainReceipt;
