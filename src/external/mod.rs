pub mod extractor;
pub mod fetcher;
pub mod html;
pub mod multi_source;
pub mod price_source;
pub mod scraped_source;
pub mod spot;
