pub mod allocation;
pub mod audit;
pub mod autosave;
pub mod batch;
pub mod clipboard;
pub mod entry;
pub mod error;
pub mod record;
pub mod session;
pub mod store;
pub mod trash;
pub mod types;
pub mod users;
pub mod view;

pub use allocation::{Allocation, allocate, format_size};
pub use autosave::AutoSaver;
pub use batch::BatchReport;
pub use clipboard::{ClipOp, Clipboard};
pub use entry::{DirectoryEntry, EntryRef, FileEntry, Listing};
pub use error::{Result, VfsError};
pub use session::Session;
pub use store::{StateStore, StoreError};
pub use types::{AllocationMethod, EntryId, Permission, Role, User};
