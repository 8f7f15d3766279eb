pub mod walk;

pub use walk::{directory_exists, expand_home, resolve_root, scan_directory, DirectoryScan};
