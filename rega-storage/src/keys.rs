//! Keys under which the local replica is stored.

/// Cached `persons` collection.
pub const PERSONS: &str = "persons";
/// Cached `users` collection.
pub const USERS: &str = "users";
/// Cached `departments` collection.
pub const DEPARTMENTS: &str = "departments";
/// Profile of the signed-in Registrador, kept for offline number stamping.
pub const REGISTRADOR: &str = "registrador";
/// Cached global range pool entries.
pub const CONFIG: &str = "config";
/// Id of the signed-in user.
pub const CURRENT_USER_ID: &str = "currentUserId";
/// Role of the signed-in user.
pub const CURRENT_ROLE: &str = "currentRole";
