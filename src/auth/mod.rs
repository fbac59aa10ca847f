//! Credential handling for the LAADS archive
//!
//! # Examples
//!
//! ```rust,no_run
//! use laads_mirror::auth::BearerToken;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let token = BearerToken::from_env()?;
//! println!("{:?}", token); // never prints the secret
//! # Ok(())
//! # }
//! ```

pub mod credentials;

// Re-export main public API
pub use credentials::{get_auth_status, AuthStatus, BearerToken};
