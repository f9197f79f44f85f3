//! Application services for the admin panel.

pub mod auth;
pub mod uploads;

pub use auth::{AuthError, AuthService, hash_password, verify_password};
pub use uploads::{MediaStorage, UploadError};
