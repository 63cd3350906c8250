pub mod client;
pub mod dummy;

pub use client::NewsApiClient;
pub use dummy::{DummySource, Reply};

pub mod prelude {
    pub use super::{DummySource, NewsApiClient, Reply};
    pub use rd_core::{Article, Error, NewsSource, Page, Result};
}
