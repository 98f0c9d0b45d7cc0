// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Categories and product photos are intentionally open; the security endpoints
// are where clients obtain their bearer token.

pub mod categories;
pub mod photos;
pub mod security;
