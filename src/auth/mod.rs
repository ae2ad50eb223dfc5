// Authorization and session-token core: token codec, permission table,
// authorization engine, role-switch coordinator.

pub mod cookie;
pub mod engine;
pub mod permissions;
pub mod switcher;
pub mod token;

pub use engine::{AuthContext, AuthzEngine, AuthzError, RequestMeta};
pub use permissions::PermissionTable;
pub use switcher::{RoleSwitch, RoleSwitchError, RoleSwitcher};
pub use token::{Claims, TokenCodec, TokenError};
