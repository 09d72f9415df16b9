//! Utility modules for the site generator.

pub mod category;
pub mod hash;
pub mod html;
pub mod minify;
pub mod slug;
