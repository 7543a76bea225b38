pub mod provisioner;
pub mod schema;
pub mod store;

pub use provisioner::{PermissionProvisioner, ProvisionError, ProvisionReport};
pub use schema::{AssociationSchema, SchemaIntrospector};
pub use store::RbacStore;
