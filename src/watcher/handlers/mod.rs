//! Watch handlers.

mod archive;

pub use archive::ArchiveFileHandler;
