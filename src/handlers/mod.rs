// handlers/mod.rs - 3-tier handler layout
//
// Public (no token) -> Protected (token, approved user) -> Elevated (admin)
//
// Gates are applied as route layers in `server.rs`; handlers receive the
// resolved `AuthUser` through request extensions.
pub mod elevated;
pub mod protected;
pub mod public;
pub mod utils;
