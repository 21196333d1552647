//! Outbound platform integrations for the weft platform.
//!
//! Each integration performs exactly one side-effecting call against its
//! service, taking already-resolved parameters and typed credentials.
//! Credential material arrives as opaque JSON from the record store and is
//! parsed into typed structs here, at the integration boundary.

pub mod credential;
pub mod error;
pub mod resend;
pub mod slack;
pub mod telegram;

pub use credential::{
    GeminiCredentials, ResendCredentials, SlackCredentials, TelegramCredentials,
};
pub use error::{CredentialError, SendError};
pub use resend::ResendMailer;
pub use slack::SlackSender;
pub use telegram::TelegramSender;
