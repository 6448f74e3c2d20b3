pub mod authors;
pub mod images;

pub use authors::{bulk_update, fix_article_authors, reassign_article_authors, AuthorFixReport};
pub use images::{randomize_thumbnails, ImageReport, IMAGE_POOL};
