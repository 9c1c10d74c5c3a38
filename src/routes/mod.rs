/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules. Access control is applied explicitly at the module level (via
/// Axum layers) and inside the handlers (via the permission evaluator), so a
/// protected endpoint cannot be exposed by accident.

/// Routes accessible to all clients: the auth gateway and every safe
/// (read-only) method.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware. Requires a
/// validated user session; object-level rules are decided per handler.
pub mod authenticated;

/// Routes whose handlers additionally require the 'admin' tier.
pub mod admin;
