//! Pool dispatch macro.
//!
//! Most pool operations are written once per backend with identical bodies;
//! `impl_db_dispatch!` keeps those match statements short while leaving
//! each arm visible.

/// Macro for generating `DbPool` dispatch match arms.
///
/// Every variant must be listed; the compiler still checks exhaustiveness.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(pool, {
///     Postgres(p) => p.is_closed(),
///     TokioPostgres(p) => p.is_closed(),
///     MySql(p) => p.is_closed(),
///     SQLite(p) => p.is_closed(),
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

pub use impl_db_dispatch;
