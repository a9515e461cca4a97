/// Router Module Index
///
/// The portal's navigation targets, split by how the route guard treats them.
/// The guard itself runs as one middleware over the whole router (see
/// `navigation_guard` in the crate root), so the split here is about reading the
/// route table, not about where checks happen.

/// Always reachable: health check, landing redirect, unauthorized page.
pub mod public;

/// Login, registration and password recovery. Authenticated users are sent to
/// their dashboard instead.
pub mod guest;

/// Everything that needs a session. Anonymous users are sent to the login form.
pub mod protected;
