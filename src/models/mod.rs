mod article;
mod connection;

pub use article::{
    Article, ArticleFilter, ArticleHeading, ArticlePatch, ArticleStats, ArticleSummary, Priority,
    TimeFilter,
};
pub use connection::{ConnectionState, ConnectionStatus};
