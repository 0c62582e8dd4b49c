/// Router Module Index
///
/// Organizes the routing surface into security-segregated modules so access
/// control is applied explicitly at the module level rather than per route.

/// Routes accessible to anyone: search, the public catalog, registration
/// and login.
pub mod public;

/// Routes protected by the session extractor middleware. Role gates are
/// applied inside the handlers, per operation.
pub mod authenticated;

/// Routes restricted to the admin principal, nested under `/admin`.
pub mod admin;
