pub mod app_metadata;
pub mod image_fetcher;
