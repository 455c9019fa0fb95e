//! Learning-object store: `.xue` containers on disk.
//!
//! Reads are per object; the only write is the metadata replacement, done by
//! staging a full copy and renaming it over the original.

pub mod collection;
pub mod container;

pub use collection::{CONTAINER_EXTENSION, Collection};
pub use container::{
    METADATA_ENTRY, assets, create_container, entry_names, extract_asset, has_asset, load, save_metadata,
    toggle_flag,
};
