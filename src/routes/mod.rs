/// Router Module Index
///
/// Splits routing by access level so the middleware stack is applied per module,
/// never per handler.

/// Routes reachable without a token.
pub mod public;

/// Routes behind the token validator and the authorization gate.
pub mod records;
