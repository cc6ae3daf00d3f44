//! Precedence resolution
//!
//! Merges property layers into one effective view:
//! 1. Command-line arguments (highest)
//! 2. Environment variables (`SERVER_PORT` → `server.port`)
//! 3. Active profile-specific files
//! 4. Base files
//! 5. Programmatic defaults (lowest)
//!
//! Within one rank the later-registered layer wins.

mod effective;
mod merge;

pub use effective::{EffectiveProperties, ResolvedValue, REDACTED};
pub use merge::{resolve, translate_env_key};

pub(crate) use effective::is_secret_key;
