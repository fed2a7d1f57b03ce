//! # CLI Module
//!
//! User-facing commands of vkup. Each command loads what it needs from the
//! management and library layers, talks to VK through [`crate::vk`] and
//! reports progress with the console macros.
//!
//! ## Commands
//!
//! - [`upload`] - scan directories and upload each as a playlist
//! - [`scan`] - preview the albums directories would produce
//! - [`auth`] - obtain or validate the cached token
//!
//! ```text
//! CLI Layer (commands)
//!     ↓
//! Management / Library (credentials, token cache, scanning)
//!     ↓
//! VK Layer (method calls, uploads)
//!     ↓
//! Request Layer (retry, captcha waits)
//! ```

mod auth;
mod scan;
mod upload;

pub use auth::auth;
pub use auth::authorize;
pub use scan::scan;
pub use upload::{UploadRequest, upload};
