pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod remote;

pub use descriptor::{DependencyDescriptor, HOME_REGISTRY};
pub use error::ProtocolError;
pub use manifest::{Manifest, ManifestDependency, MANIFEST_FILENAME, MANIFEST_VERSION};
pub use remote::{public_path_of, ResolvedRemote};
