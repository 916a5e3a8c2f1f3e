//! Anti-forensic secure deletion of a directory tree.
//!
//! [`DeletionEngine`] renames, overwrites, and removes everything under a
//! target. [`flood`] then buries what the filesystem itself remembers of the
//! deletion by churning its change journal and snapshot storage, sized by
//! [`capacity`] from whatever the platform probe can measure.

pub mod cancel;
pub mod capacity;
pub mod config;
pub mod engine;
pub mod error;
pub mod flood;
pub mod naming;
pub mod obfuscate;
pub mod platform;
pub mod progress;
pub mod sanitize;
pub mod scanner;
pub mod teardown;

pub use cancel::CancelToken;
pub use capacity::{CapacityProbe, NoCapacityProbe};
pub use config::ScourConfig;
pub use engine::{DeletionEngine, WipeOptions, WipeReport};
pub use error::Error;
pub use flood::{FloodReport, JournalFlood, StorageFlood};
pub use progress::{ProgressReporter, SilentReporter};
