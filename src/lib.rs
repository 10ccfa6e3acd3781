pub mod config;
pub mod csv_codec;
pub mod dispatch;
pub mod error;
pub mod operation_log;
pub mod recipients;
pub mod registry;
pub mod session;
pub mod signer;
pub mod types;
pub mod utils;

pub use config::{Config, Network};
pub use dispatch::{dispatch, plan, DispatchFailure, DispatchReport, DispatchResult};
pub use error::{Error, Result};
pub use recipients::RecipientLedger;
pub use registry::TokenRegistry;
pub use session::MultiSendSession;
pub use signer::{EthersSigner, TransferSigner};
pub use types::{Recipient, TokenAmount, TokenInfo};
