//! Privilege levels.
//!
//! Numeric levels map to human-readable roles. Higher values imply a superset
//! of lower capabilities. Use [role_name] for display.
pub const LEVEL_USER: u8 = 1;
pub const LEVEL_BUILDER: u8 = 5;
pub const LEVEL_ADMIN: u8 = 10;

/// Return the role name for a numeric level.
///
/// Levels ≥10 are "Admin", ≥5 "Builder", otherwise "User".
pub fn role_name(level: u8) -> &'static str {
    match level {
        l if l >= LEVEL_ADMIN => "Admin",
        l if l >= LEVEL_BUILDER => "Builder",
        _ => "User",
    }
}

pub fn is_admin(level: u8) -> bool {
    level >= LEVEL_ADMIN
}
