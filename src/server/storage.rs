//! Temp-file storage interface for upload handling.
//!
//! The server core never calls these traits. Handlers that spool request
//! bodies to storage are given a [`TempFileManager`] by whoever builds them.

use std::io;

use tokio::io::AsyncWrite;

/// A writable scratch destination.
pub trait TempFile: Send {
    /// A name that identifies the file to its manager, such as a path.
    fn name(&self) -> &str;

    /// Where to write the file's contents.
    fn writer(&mut self) -> &mut (dyn AsyncWrite + Send + Unpin);

    /// Remove the file and release its storage.
    fn delete(self: Box<Self>) -> io::Result<()>;
}

/// Creates temp files and removes everything it created on `clear`.
pub trait TempFileManager: Send + Sync {
    fn create(&self) -> io::Result<Box<dyn TempFile>>;

    fn clear(&self) -> io::Result<()>;
}
