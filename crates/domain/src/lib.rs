//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod bitfield;
mod permission;
mod role;
mod route;

pub use bitfield::PermissionBitfield;
pub use permission::{PermissionCode, PermissionDefinition};
pub use role::{RoleDefinition, SUPER_ADMIN_ROLE_NAME, is_super_admin_role};
pub use route::RouteDeclaration;
