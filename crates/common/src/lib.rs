/**
 * Packaging of shared directories into a single
 *  downloadable zip archive.
 */
pub mod archive;
/**
 * Uniform listing of shares, either straight from
 *  the registry or from the live filesystem below a
 *  shared directory.
 */
pub mod listing;
/**
 * The persisted name -> entry mapping of everything
 *  currently shared, with collision-safe naming.
 */
pub mod registry;
/**
 * Turns client supplied slash delimited paths into
 *  a registry entry plus the remaining sub-path.
 */
pub mod resolver;
/**
 * Key-value storage backed by one JSON document
 *  on disk.
 */
pub mod storage;

pub mod prelude {
    pub use crate::archive::{archive_dir, ArchiveError, ScopedArchive};
    pub use crate::listing::{human_size, list_path, list_top, ListItem, ListingError};
    pub use crate::registry::{Entry, EntryKind, RegistryError, RegistryStore};
    pub use crate::resolver::{resolve, ResolveError, ResolvedPath};
    pub use crate::storage::{JsonStore, StorageError};
}
