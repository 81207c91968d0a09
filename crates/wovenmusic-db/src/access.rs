use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use wovenmusic_core::AppError;

/// Capability checks for gated streaming.
///
/// The actual policy (playlist membership, band invitations) lives in the
/// database as a stored function; from here it is just a boolean predicate
/// over user and track.
#[derive(Clone)]
pub struct AccessRepository {
    pool: PgPool,
}

impl AccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Does this user have access to this track?
    #[tracing::instrument(skip(self), fields(db.table = "tracks", db.operation = "select", db.record_id = %track_id))]
    pub async fn user_has_track_access(
        &self,
        user_id: Uuid,
        track_id: Uuid,
    ) -> Result<bool, AppError> {
        let allowed =
            sqlx::query_scalar::<Postgres, bool>("SELECT user_has_track_access($1, $2)")
                .bind(user_id)
                .bind(track_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(allowed)
    }
}
