pub mod services;

pub use services::{photo_key, prepare_for_analysis, PreparedImage};
