use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

/// Registered account.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String, // argon2 PHC string, never exposed
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Server-issued login. `id` is the opaque token carried by the cookie.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    #[serde(skip_serializing)]
    pub id: String,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at < now
    }
}

/// `users` row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: Option<String>,
    pub name: Option<String>,
    pub created_at: OffsetDateTime,
}

/// `sessions JOIN users` row; columns are aliased so the two ids never collide.
#[derive(Debug, Clone, FromRow)]
pub struct SessionUserRow {
    pub session_id: String,
    pub session_created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub user_id: String,
    pub email: String,
    pub password: Option<String>,
    pub name: Option<String>,
    pub user_created_at: OffsetDateTime,
}

fn parse_id(column: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|e| AppError::Mapping(format!("{column}: invalid uuid {raw:?}: {e}")))
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = parse_id("users.id", &row.id)?;
        let password = row
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Mapping(format!("users.password missing for {id}")))?;
        Ok(User {
            id,
            email: row.email,
            password,
            name: row.name.unwrap_or_default(),
            created_at: row.created_at,
        })
    }
}

impl TryFrom<SessionUserRow> for (Session, User) {
    type Error = AppError;

    fn try_from(row: SessionUserRow) -> Result<Self, Self::Error> {
        let user = User::try_from(UserRow {
            id: row.user_id,
            email: row.email,
            password: row.password,
            name: row.name,
            created_at: row.user_created_at,
        })?;
        let session = Session {
            id: row.session_id,
            user_id: user.id,
            created_at: row.session_created_at,
            expires_at: row.expires_at,
        };
        Ok((session, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::datetime, Duration};

    fn user_row(id: &str, password: Option<&str>) -> UserRow {
        UserRow {
            id: id.into(),
            email: "a@example.com".into(),
            password: password.map(Into::into),
            name: None,
            created_at: datetime!(2025-01-01 0:00 UTC),
        }
    }

    #[test]
    fn maps_valid_user_row() {
        let id = Uuid::new_v4();
        let user = User::try_from(user_row(&id.to_string(), Some("$argon2id$..."))).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.name, "");
    }

    #[test]
    fn rejects_malformed_id() {
        let err = User::try_from(user_row("42", Some("hash"))).unwrap_err();
        assert!(matches!(err, AppError::Mapping(m) if m.contains("users.id")));
    }

    #[test]
    fn rejects_missing_password() {
        let err = User::try_from(user_row(&Uuid::new_v4().to_string(), None)).unwrap_err();
        assert!(matches!(err, AppError::Mapping(_)));
    }

    #[test]
    fn joined_row_keeps_session_and_user_apart() {
        let user_id = Uuid::new_v4();
        let created = datetime!(2025-01-01 0:00 UTC);
        let (session, user) = <(Session, User)>::try_from(SessionUserRow {
            session_id: "tok".into(),
            session_created_at: created,
            expires_at: created + Duration::hours(1),
            user_id: user_id.to_string(),
            email: "a@example.com".into(),
            password: Some("hash".into()),
            name: Some("Ana".into()),
            user_created_at: created - Duration::days(3),
        })
        .unwrap();
        assert_eq!(session.id, "tok");
        assert_eq!(session.user_id, user_id);
        assert_eq!(user.id, user_id);
        assert_eq!(user.created_at, created - Duration::days(3));
    }

    #[test]
    fn expiry_is_strictly_after_deadline() {
        let now = datetime!(2025-01-01 12:00 UTC);
        let session = Session {
            id: "t".into(),
            user_id: Uuid::new_v4(),
            created_at: now - Duration::hours(1),
            expires_at: now,
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::seconds(1)));
    }

    #[test]
    fn password_is_not_serialized() {
        let user = User::try_from(user_row(&Uuid::new_v4().to_string(), Some("secret-hash"))).unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("a@example.com"));
    }
}
