use super::util::{checked_table_name, is_dup_key};
use crate::domain_model::{TokenKind, TokenRecord};
use crate::domain_port::{TokenStore, TokenStoreError};
use chrono::NaiveDateTime;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// One row per user in the token table:
///
/// `user_name, refresh_token, rtoken_created, access_token, atoken_created,
/// pre_access_token`
///
/// Writes are a lookup followed by an insert or an update. Two first logins
/// racing for the same user can both take the insert path; with a unique key
/// on `user_name` the loser surfaces as a write error.
pub struct MySqlTokenStore {
    pool: MySqlPool,
    table: String,
}

impl MySqlTokenStore {
    pub fn new(pool: MySqlPool, table: &str) -> anyhow::Result<Self> {
        Ok(MySqlTokenStore {
            pool,
            table: checked_table_name(table)?,
        })
    }

    /// Token column and, where the kind has one, its creation-time column.
    fn columns(kind: TokenKind) -> Result<(&'static str, Option<&'static str>), TokenStoreError> {
        match kind {
            TokenKind::Refresh => Ok(("refresh_token", Some("rtoken_created"))),
            TokenKind::Access => Ok(("access_token", Some("atoken_created"))),
            TokenKind::PreAccess => Ok(("pre_access_token", None)),
            TokenKind::Session => Err(TokenStoreError::write(kind, "no session column")),
        }
    }

    async fn row_exists(&self, kind: TokenKind, user_name: &str) -> Result<bool, TokenStoreError> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE user_name = ?", self.table);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(user_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| TokenStoreError::write(kind, format!("lookup: {e}")))?;
        Ok(count > 0)
    }

    async fn upsert(&self, kind: TokenKind, user_name: &str, token: &str) -> Result<(), TokenStoreError> {
        let (column, stamp) = Self::columns(kind)?;

        let result = if self.row_exists(kind, user_name).await? {
            let sql = match stamp {
                Some(stamp) => format!(
                    "UPDATE {} SET {column} = ?, {stamp} = UTC_TIMESTAMP() WHERE user_name = ?",
                    self.table
                ),
                None => format!("UPDATE {} SET {column} = ? WHERE user_name = ?", self.table),
            };
            sqlx::query(&sql)
                .bind(token)
                .bind(user_name)
                .execute(&self.pool)
                .await
        } else {
            let sql = match stamp {
                Some(stamp) => format!(
                    "INSERT INTO {} (user_name, {column}, {stamp}) VALUES (?, ?, UTC_TIMESTAMP())",
                    self.table
                ),
                None => format!("INSERT INTO {} (user_name, {column}) VALUES (?, ?)", self.table),
            };
            sqlx::query(&sql)
                .bind(user_name)
                .bind(token)
                .execute(&self.pool)
                .await
        };

        result.map(|_| ()).map_err(|e| {
            if is_dup_key(&e) {
                TokenStoreError::write(kind, format!("concurrent insert for {user_name}"))
            } else {
                TokenStoreError::write(kind, e)
            }
        })
    }

    fn row_to_record(row: MySqlRow) -> Result<TokenRecord, TokenStoreError> {
        let text = |col: &str| -> Result<String, TokenStoreError> {
            row.try_get(col)
                .map_err(|e| TokenStoreError::Read(format!("{col}: {e}")))
        };
        let stamp = |col: &str| -> Result<NaiveDateTime, TokenStoreError> {
            row.try_get(col)
                .map_err(|e| TokenStoreError::TimeParse(format!("{col}: {e}")))
        };

        Ok(TokenRecord {
            user_name: text("user_name")?,
            refresh_token: text("refresh_token")?,
            refresh_created_at: Some(stamp("rtoken_created")?.and_utc()),
            access_token: text("access_token")?,
            access_created_at: Some(stamp("atoken_created")?.and_utc()),
            pre_access_token: text("pre_access_token")?,
        })
    }
}

#[async_trait::async_trait]
impl TokenStore for MySqlTokenStore {
    async fn set_refresh_token(
        &self,
        user_name: &str,
        token: &str,
    ) -> Result<(), TokenStoreError> {
        self.upsert(TokenKind::Refresh, user_name, token).await
    }

    async fn set_access_token(&self, user_name: &str, token: &str) -> Result<(), TokenStoreError> {
        self.upsert(TokenKind::Access, user_name, token).await
    }

    async fn set_pre_access_token(
        &self,
        user_name: &str,
        token: &str,
    ) -> Result<(), TokenStoreError> {
        self.upsert(TokenKind::PreAccess, user_name, token).await
    }

    async fn get_token_info(&self, user_name: &str) -> Result<TokenRecord, TokenStoreError> {
        let sql = format!(
            r#"
SELECT user_name, refresh_token, rtoken_created, access_token, atoken_created, pre_access_token
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
            .map_err(|e| TokenStoreError::Read(e.to_string()))?;

        row_opt
            .map(Self::row_to_record)
            .transpose()?
            .ok_or(TokenStoreError::NotFound)
    }
}
