mod client;
mod repository;

pub use client::{ChangeCursor, ChangeFeed, StoreClient};
pub use repository::{ArticleRepository, PAGE_SIZE};
