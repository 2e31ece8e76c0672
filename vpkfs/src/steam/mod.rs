//! Steam library metadata.
//!
//! ```text
//! <steam root>/steamapps/libraryfolders.vdf     appid → library root
//! <library>/steamapps/appmanifest_<appid>.acf   AppState/installdir
//! <library>/steamapps/common/<installdir>/      resolved content directory
//! ```
//!
//! [`InstallResolver`] turns an application id into that last path.
//! [`ResolverRegistry`] makes sure all filesystems over the same Steam root
//! share one resolver and its caches.

mod registry;
mod resolver;

pub use registry::ResolverRegistry;
pub use resolver::{parse_library_folders, InstallResolver, ResolveError};
