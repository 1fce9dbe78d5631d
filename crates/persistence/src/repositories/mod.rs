//! PostgreSQL implementations of the directory and preference stores.

pub mod group;
pub mod preference;
pub mod user;

pub use group::PgGroupDirectory;
pub use preference::PgPreferenceStore;
pub use user::PgUserDirectory;

use domain::services::StoreError;

/// Maps a driver error onto the store error the workflow understands.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}
