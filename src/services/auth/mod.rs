pub mod boundary;
pub mod capability;
pub mod credential;
pub mod directory;
pub mod error;
pub mod factory;
pub mod token;

pub use boundary::{AuthBoundary, VerifiedPrincipal};
pub use directory::{CapabilityDirectory, Directory, Principal, PrincipalDirectory};
pub use error::AuthError;
pub use factory::build_auth_boundary;
