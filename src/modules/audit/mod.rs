//! Security event sink.
//!
//! Events land in the `security_events` table. Writes are best-effort: a
//! failed insert degrades to a warning and never blocks the security
//! decision that produced the event.

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

pub async fn security_event(
    db: &PgPool,
    user_id: Option<Uuid>,
    event: &str,
    detail: &str,
    ip: &str,
) {
    let result = sqlx::query(
        "INSERT INTO security_events (user_id, event, detail, ip) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(event)
    .bind(detail)
    .bind(ip)
    .execute(db)
    .await;

    if let Err(err) = result {
        warn!(event, error = %err, "failed to record security event");
    }
}
