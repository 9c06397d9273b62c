pub mod access;
pub mod identity;
pub mod model;

pub use access::{
    AccessPolicy, Collection, Decision, ListScope, Operation, OwnershipResolver, ResolveError,
    Resource,
};
pub use identity::{Actor, IdentityError, Role};
