pub mod files;
pub mod sqlite;

pub use files::ExportStore;
pub use sqlite::Storage;
