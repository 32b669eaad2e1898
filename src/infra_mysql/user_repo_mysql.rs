use super::util::{checked_table_name, is_dup_key};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::NaiveDateTime;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
    table: String,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool, table: &str) -> anyhow::Result<Self> {
        Ok(MySqlUserRepo {
            pool,
            table: checked_table_name(table)?,
        })
    }

    fn row_to_record(row: MySqlRow) -> Result<UserRecord, AuthError> {
        let id: u64 = row
            .try_get("ID")
            .map_err(|e| AuthError::BackendReadFailed(e.to_string()))?;
        let user_name: String = row
            .try_get("user_name")
            .map_err(|e| AuthError::BackendReadFailed(e.to_string()))?;
        let password_hash: String = row
            .try_get("user_pass")
            .map_err(|e| AuthError::BackendReadFailed(e.to_string()))?;
        let nickname: String = row
            .try_get("user_nicename")
            .map_err(|e| AuthError::BackendReadFailed(e.to_string()))?;
        let email: String = row
            .try_get("user_email")
            .map_err(|e| AuthError::BackendReadFailed(e.to_string()))?;
        let registered: NaiveDateTime = row
            .try_get("user_registered")
            .map_err(|e| AuthError::TimeParseFailed(e.to_string()))?;

        Ok(UserRecord {
            id,
            user_name,
            nickname,
            email,
            password_hash,
            registered_at: registered.and_utc(),
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn get_by_name(&self, user_name: &str) -> Result<Option<UserRecord>, AuthError> {
        let sql = format!(
            r#"
SELECT ID, user_name, user_pass, user_nicename, user_email, user_registered
FROM {}
WHERE user_name = ?
LIMIT 1
"#,
            self.table
        );
        let row_opt: Option<MySqlRow> = sqlx::query(&sql)
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::BackendReadFailed(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn create(&self, user: NewUserRecord) -> Result<(), AuthError> {
        let sql = format!(
            r#"
INSERT INTO {} (user_name, user_pass, user_nicename, user_email, user_registered)
VALUES (?, ?, ?, ?, UTC_TIMESTAMP())
"#,
            self.table
        );
        sqlx::query(&sql)
            .bind(&user.user_name)
            .bind(&user.password_hash)
            .bind(&user.nickname)
            .bind(&user.email)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_dup_key(&e) {
                    AuthError::UserExists
                } else {
                    AuthError::InternalError(format!("create user: {e}"))
                }
            })?;

        Ok(())
    }
}
