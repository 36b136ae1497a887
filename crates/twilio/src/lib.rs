// Outreach Twilio
//
// SMS delivery through Twilio's Messages API. Implements the core
// MessagingProvider trait so the notification dispatcher stays vendor-agnostic.

mod error;
mod messenger;

#[cfg(test)]
mod tests;

pub use error::TwilioError;
pub use messenger::{TwilioCredentials, TwilioMessenger, DEFAULT_API_BASE, DEFAULT_TIMEOUT};
