pub mod inventory;

pub use inventory::{EntryKind, FileSystemEntry, Inventory};
