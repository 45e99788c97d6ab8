use std::path::Path;
use std::sync::Arc;

use sr_core::{Error, Result, TokenStorage};

pub mod backends;

pub use backends::file::FileStorage;
pub use backends::memory::MemoryStorage;

/// Build a token storage backend from its name, as passed on the
/// command line.
pub async fn create_storage(kind: &str, path: Option<&Path>) -> Result<Arc<dyn TokenStorage>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        "file" => {
            let path = path
                .ok_or_else(|| Error::Storage("file storage needs a path".to_string()))?;
            Ok(Arc::new(FileStorage::open(path).await?))
        }
        other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::file::FileStorage;
    pub use super::backends::memory::MemoryStorage;
    pub use super::create_storage;
}
