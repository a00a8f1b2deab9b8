pub mod config;
pub mod error;
pub mod error_utils;
pub mod matcher;
pub mod source;
pub mod types;

pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use matcher::KeywordMatcher;
pub use source::PostSource;
pub use types::*;
