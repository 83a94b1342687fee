//! SQL access per table.
//!
//! Every function is generic over `PgExecutor`, so the same query runs against
//! the pool or inside a transaction (`&mut *tx`). Business rules live in
//! `services`.

pub mod addresses;
pub mod carts;
pub mod categories;
pub mod lookups;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;
