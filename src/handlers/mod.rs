// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) → Protected (bearer token checked by middleware::require_bearer)

pub mod protected; // /productos
pub mod public; // /categorias, /productos-fotos, /seguridad
pub mod service; // /, /health
pub mod utils;
