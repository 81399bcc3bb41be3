mod cache;
mod file;

pub use cache::CachingTemplateResolver;
pub use file::FileTemplateResolver;
