pub mod api;
pub mod client;
pub mod decode;
pub mod error;
pub mod types;

pub use api::MailApi;
pub use client::GmailClient;
pub use decode::decode_web_safe;
pub use error::{GmailError, GmailResult};
pub use types::*;
