//! Green Leaf Upload
//!
//! Pushes leaf images to external image hosts. Providers are tried in
//! priority order and the first success wins; when every host fails the
//! file can still land in a local temporary store. The ledger keeps a
//! short, newest-first history of attempts for UI feedback.

pub mod config;
pub mod error;
pub mod imgbb;
pub mod imgur;
pub mod ledger;
pub mod provider;
pub mod temporary;
pub mod uploader;

pub use config::UploadConfig;
pub use error::{ProviderError, UploadError};
pub use imgbb::ImgbbProvider;
pub use imgur::ImgurProvider;
pub use ledger::UploadLedger;
pub use provider::{UploadFile, UploadProvider};
pub use temporary::TemporaryStore;
pub use uploader::{UploadLimits, Uploader};
