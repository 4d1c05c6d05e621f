pub mod covers;
pub mod pool;
pub mod scanner;
pub mod scraper;
