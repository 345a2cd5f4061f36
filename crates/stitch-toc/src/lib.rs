//! Addressing and mount-point registry for assembled documentation.
//!
//! - [`Moniker`]: `repo://path#anchor` content addresses
//! - [`DeclarationParser`]: reads `navigation.yml` into a [`DeclarationTree`]
//! - [`TocRegistry`]: frozen moniker to mount-point map with longest-prefix
//!   lookup and output path prefix validation

mod declaration;
mod moniker;
mod registry;

pub use declaration::{
    DeclarationError, DeclarationNode, DeclarationParser, DeclarationTree, PrefixOrigin,
};
pub use moniker::{Moniker, MonikerError};
pub use registry::{
    DuplicatePathPrefixError, PrefixValidationError, TocEntry, TocRegistry, TocRegistryBuilder,
};
