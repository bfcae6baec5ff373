pub mod config;
pub mod error;
pub mod frontmatter;
pub mod images;
pub mod issue;
pub mod logger;
pub mod post;
pub mod post_processor;
mod test_data;
mod text_utils;
