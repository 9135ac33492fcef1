pub mod file_status;
pub mod file_system;
pub mod path;

pub use file_status::{FileStatus, FileType};
pub use file_system::{make_file_system, FileSystem, FileSystemRef};
