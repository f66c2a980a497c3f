pub mod geocoder;
pub mod google_scraper;
pub mod openai_client;
pub mod page_scraper;
pub mod report_store;
pub mod townhouse_finder;

pub use geocoder::*;
pub use google_scraper::*;
pub use openai_client::*;
pub use page_scraper::*;
pub use report_store::*;
pub use townhouse_finder::*;
