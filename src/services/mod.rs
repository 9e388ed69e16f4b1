pub mod archive_layout;
pub mod assembler;
pub mod failure_writer;
pub mod output_router;
pub mod source_cache;

pub use archive_layout::{output_prefix, ArchiveLayout};
pub use assembler::{AssemblyRequest, DocumentAssembler};
pub use failure_writer::FailureWriter;
pub use output_router::OutputRouter;
pub use source_cache::SourceCache;
