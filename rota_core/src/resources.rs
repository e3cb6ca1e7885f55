//! Built-in shared resource pool.
//!
//! The bootstrap set every deployment starts from: two operating theatres,
//! two MRI scanners and an X-ray machine. Deployments override it through
//! the `resources.seed` configuration section or
//! [`Scheduler::with_resources`](crate::Scheduler::with_resources).

use crate::types::Resource;
use once_cell::sync::Lazy;

/// Cached default pool - built once and reused across all lookups
static DEFAULT_RESOURCES: Lazy<Vec<Resource>> = Lazy::new(build_default_resources);

/// Get a reference to the cached default resource pool
pub fn default_shared_resources() -> &'static [Resource] {
    &DEFAULT_RESOURCES
}

/// Builds the default resource pool
///
/// **Note**: For read access, prefer `default_shared_resources()` which
/// returns a cached reference. This function is retained for seeding
/// schedulers and for custom pool construction in tests.
pub fn build_default_resources() -> Vec<Resource> {
    vec![
        Resource::new("Operating Theatre 1", "Operating Theatre", "Main Hospital"),
        Resource::new("Operating Theatre 2", "Operating Theatre", "Main Hospital"),
        Resource::new("MRI Scanner 1", "MRI Scanner", "Radiology Department"),
        Resource::new("MRI Scanner 2", "MRI Scanner", "Radiology Department"),
        Resource::new("X-Ray Machine", "X-Ray", "Radiology Department"),
    ]
}
