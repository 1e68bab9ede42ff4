//! Database repository for CRUD operations.
//!
//! Uses prepared statements; every write touches a single row.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Alert, NewAlert, NewReport, Report, Severity, UpdateAlertRequest, User,
};

/// Maximum number of alerts returned by a listing.
pub const ALERT_LIST_LIMIT: i64 = 50;

/// Current time in the storage format.
///
/// Fixed precision and a `Z` suffix keep lexical and chronological order identical.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Normalize a client-supplied RFC 3339 timestamp to the storage format.
pub fn normalize_timestamp(raw: &str) -> Result<String, AppError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| format_timestamp(t.with_timezone(&Utc)))
        .map_err(|_| AppError::Validation(format!("Invalid timestamp: {}", raw)))
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// Insert a new user. A duplicate email is reported as a validation error.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        let result = sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                role: role.to_string(),
                created_at: now,
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::Validation("User already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find a user by login email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// List all users, oldest first.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, email, password_hash, role, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    #[cfg(test)]
    pub async fn count_users_with_email(&self, email: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    // ==================== TOKEN REVOCATION ====================

    /// Record a token id as revoked until `expires_at` (unix seconds).
    pub async fn revoke_token(&self, jti: &str, expires_at: i64) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?, ?)")
            .bind(jti)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn is_token_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 FROM revoked_tokens WHERE jti = ?")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Drop revocations whose tokens have expired anyway. Returns rows removed.
    pub async fn purge_expired_revocations(&self, now: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ==================== ALERT OPERATIONS ====================

    /// List the most recent alerts, newest first.
    pub async fn list_recent_alerts(&self, limit: i64) -> Result<Vec<Alert>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, severity, type, title, description, location, sent_at, recipients, status
               FROM alerts ORDER BY sent_at DESC, rowid DESC LIMIT ?"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(alert_from_row).collect())
    }

    /// Get an alert by ID.
    pub async fn get_alert(&self, id: &str) -> Result<Option<Alert>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, severity, type, title, description, location, sent_at, recipients, status
               FROM alerts WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(alert_from_row))
    }

    /// Create a new alert stamped with the current time.
    pub async fn create_alert(&self, alert: &NewAlert) -> Result<Alert, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();
        let recipients_json = serde_json::to_string(&alert.recipients).unwrap_or_default();

        sqlx::query(
            "INSERT INTO alerts (id, severity, type, title, description, location, sent_at, recipients, status) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(alert.severity.as_str())
        .bind(&alert.kind)
        .bind(&alert.title)
        .bind(&alert.description)
        .bind(&alert.location)
        .bind(&now)
        .bind(&recipients_json)
        .bind(&alert.status)
        .execute(&self.pool)
        .await?;

        Ok(Alert {
            id,
            severity: alert.severity,
            kind: alert.kind.clone(),
            title: alert.title.clone(),
            description: alert.description.clone(),
            location: alert.location.clone(),
            sent_at: now,
            recipients: alert.recipients.clone(),
            status: alert.status.clone(),
        })
    }

    /// Apply a partial update. The severity must already be validated by the caller.
    pub async fn update_alert(
        &self,
        id: &str,
        request: &UpdateAlertRequest,
        severity: Option<Severity>,
    ) -> Result<Alert, AppError> {
        let existing = self
            .get_alert(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Alert {} not found", id)))?;

        let updated = Alert {
            id: existing.id,
            severity: severity.unwrap_or(existing.severity),
            kind: request.kind.clone().or(existing.kind),
            title: request.title.clone().unwrap_or(existing.title),
            description: request.description.clone().unwrap_or(existing.description),
            location: request.location.clone().or(existing.location),
            sent_at: existing.sent_at,
            recipients: request.recipients.clone().unwrap_or(existing.recipients),
            status: request.status.clone().unwrap_or(existing.status),
        };
        let recipients_json = serde_json::to_string(&updated.recipients).unwrap_or_default();

        let result = sqlx::query(
            "UPDATE alerts SET severity = ?, type = ?, title = ?, description = ?, location = ?, recipients = ?, status = ? WHERE id = ?",
        )
        .bind(updated.severity.as_str())
        .bind(&updated.kind)
        .bind(&updated.title)
        .bind(&updated.description)
        .bind(&updated.location)
        .bind(&recipients_json)
        .bind(&updated.status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        // Deleted between read and write
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Alert {} not found", id)));
        }

        Ok(updated)
    }

    /// Delete an alert.
    pub async fn delete_alert(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM alerts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Alert {} not found", id)));
        }

        Ok(())
    }

    #[cfg(test)]
    pub async fn count_alerts(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM alerts")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    // ==================== REPORT OPERATIONS ====================

    /// Create a report. The timestamp defaults to now.
    pub async fn create_report(&self, report: &NewReport) -> Result<Report, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let timestamp = match &report.timestamp {
            Some(raw) => normalize_timestamp(raw)?,
            None => now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO reports (id, city, metric, value, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&report.city)
        .bind(&report.metric)
        .bind(report.value)
        .bind(&timestamp)
        .execute(&self.pool)
        .await?;

        Ok(Report {
            id,
            city: report.city.clone(),
            metric: report.metric.clone(),
            value: report.value,
            timestamp,
        })
    }

    /// List reports in insertion order, optionally restricted to one city.
    pub async fn list_reports(&self, city: Option<&str>) -> Result<Vec<Report>, AppError> {
        let rows = match city {
            Some(city) => {
                sqlx::query(
                    "SELECT id, city, metric, value, timestamp FROM reports WHERE city = ? ORDER BY rowid",
                )
                .bind(city)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT id, city, metric, value, timestamp FROM reports ORDER BY rowid")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.iter().map(report_from_row).collect())
    }
}

// ==================== ROW MAPPERS ====================

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        created_at: row.get("created_at"),
    }
}

fn alert_from_row(row: &sqlx::sqlite::SqliteRow) -> Alert {
    let severity_str: String = row.get("severity");
    let recipients_str: String = row.get("recipients");

    Alert {
        id: row.get("id"),
        // Only validated severities are ever written.
        severity: Severity::parse(&severity_str).unwrap_or(Severity::Low),
        kind: row.get("type"),
        title: row.get("title"),
        description: row.get("description"),
        location: row.get("location"),
        sent_at: row.get("sent_at"),
        recipients: parse_json_array(&recipients_str),
        status: row.get("status"),
    }
}

fn report_from_row(row: &sqlx::sqlite::SqliteRow) -> Report {
    Report {
        id: row.get("id"),
        city: row.get("city"),
        metric: row.get("metric"),
        value: row.get("value"),
        timestamp: row.get("timestamp"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("repo.sqlite"))
            .await
            .unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn new_alert(title: &str) -> NewAlert {
        NewAlert {
            severity: Severity::High,
            kind: Some("Weather".into()),
            title: title.into(),
            description: "Surge expected".into(),
            location: None,
            recipients: vec![],
            status: "sent".into(),
        }
    }

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(
            normalize_timestamp("2024-05-01T12:00:00+02:00").unwrap(),
            "2024-05-01T10:00:00.000000Z"
        );
        assert!(normalize_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (repo, _dir) = repo().await;
        repo.create_user("A", "a@example.com", "hash", "user")
            .await
            .unwrap();

        let err = repo
            .create_user("B", "a@example.com", "hash", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(repo.count_users_with_email("a@example.com").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_alert_listing_order_and_limit() {
        let (repo, _dir) = repo().await;
        for i in 0..3 {
            repo.create_alert(&new_alert(&format!("alert-{}", i)))
                .await
                .unwrap();
        }

        let alerts = repo.list_recent_alerts(2).await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].title, "alert-2");
        assert_eq!(alerts[1].title, "alert-1");
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let (repo, _dir) = repo().await;
        let alert = repo.create_alert(&new_alert("original")).await.unwrap();

        let request = UpdateAlertRequest {
            status: Some("resolved".into()),
            ..Default::default()
        };
        let updated = repo.update_alert(&alert.id, &request, None).await.unwrap();
        assert_eq!(updated.status, "resolved");
        assert_eq!(updated.title, "original");
        assert_eq!(updated.sent_at, alert.sent_at);

        let missing = repo.update_alert("nope", &request, None).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_revocation_purge() {
        let (repo, _dir) = repo().await;
        repo.revoke_token("old", 100).await.unwrap();
        repo.revoke_token("fresh", 10_000).await.unwrap();

        assert_eq!(repo.purge_expired_revocations(5_000).await.unwrap(), 1);
        assert!(!repo.is_token_revoked("old").await.unwrap());
        assert!(repo.is_token_revoked("fresh").await.unwrap());
    }
}
