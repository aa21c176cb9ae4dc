mod entry;
mod store;

pub use entry::{Entry, EntryKind, TEXT_NAME_LEN, TEXT_SUMMARY_LEN};
pub use store::{RegistryError, RegistryStore, REGISTRY_KEY_PREFIX};
