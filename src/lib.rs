// Library exports for richtext

pub mod config;
pub mod richtext;
