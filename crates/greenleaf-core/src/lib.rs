//! Green Leaf Core
//!
//! Core domain types for the Green Leaf leaf-analysis platform.
//! This crate defines the records shared by the credential store, the
//! authentication layer, the upload pipeline and the HTTP server.

pub mod error;
pub mod reset;
pub mod upload;
pub mod user;
pub mod validation;

pub use error::GreenLeafError;
pub use reset::{PasswordResetToken, ResetTokenId};
pub use upload::{ProviderStatus, UploadAttempt, UploadResult, UploadStats, UploadStatus};
pub use user::{GeoLocation, NewUser, ProfileUpdate, PublicUser, Role, User, UserId};
