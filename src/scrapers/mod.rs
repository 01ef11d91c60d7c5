//! Source adapters, one per way a lottery publishes its results

pub mod direct_page;
pub mod fragment_api;
pub mod session;

pub use direct_page::DirectPageSource;
pub use fragment_api::{FragmentApiSource, FragmentForm};
pub use session::SessionCache;
