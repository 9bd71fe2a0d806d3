//! Shared utilities.
//!
//! - [`email`]: account emails over SMTP, plus a capturing mailer for tests

pub mod email;
