pub mod error;
pub mod navigation;
pub mod storage;
pub mod types;

pub use error::Error;
pub use navigation::{Navigator, Route};
pub use storage::{TokenStorage, ACCESS_TOKEN, REFRESH_TOKEN};
pub use types::{coerce_id, ContentType, SortKey, Summary, SummaryPreview, TokenPair, User};

pub type Result<T> = std::result::Result<T, Error>;
