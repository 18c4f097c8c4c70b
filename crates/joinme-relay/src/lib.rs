pub mod error;
pub mod relay;
pub mod storage;

pub use error::{BlobError, RelayError};
pub use relay::{AttachmentRelay, blob_key};
pub use storage::{BlobStore, ByteStream, FsBlobStore};
