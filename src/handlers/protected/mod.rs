// handlers/protected/mod.rs - Protected handlers
//
// Every route here sits behind middleware::require_bearer, so handlers may rely
// on an AuthUser being present in request extensions.

pub mod products;
