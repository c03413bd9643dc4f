pub mod fetcher;
pub mod labels;

pub use fetcher::ContactFetcher;
pub use labels::LabelResolver;
