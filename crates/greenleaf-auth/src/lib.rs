//! Green Leaf Auth
//!
//! Authentication for Green Leaf: password hashing, signed session tokens,
//! the two interchangeable session strategies (local credentials or a
//! federated identity provider), role gating, account management and the
//! password-reset flow.

pub mod accounts;
pub mod config;
pub mod error;
pub mod federated;
pub mod gate;
pub mod mailer;
pub mod password;
pub mod reset;
pub mod session;
pub mod strategy;

pub use accounts::{AccountService, LoginOutcome, Registration};
pub use config::{AuthConfig, AuthStrategyKind};
pub use error::AuthError;
pub use federated::{FederatedClaims, FirebaseVerifier, IdTokenVerifier};
pub use gate::AuthGate;
pub use mailer::{LogMailer, MailError, Mailer, ResetEmail, SmtpMailer};
pub use password::PasswordHasher;
pub use reset::PasswordResetService;
pub use session::{SessionClaims, SessionSigner};
pub use strategy::{AuthStrategy, FederatedStrategy, LocalStrategy};
