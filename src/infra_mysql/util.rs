use anyhow::{Result, anyhow};
use sqlx::mysql::MySqlDatabaseError;

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

/// Table names are spliced into statements, so only plain identifiers pass.
pub fn checked_table_name(name: &str) -> Result<String> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if !valid {
        return Err(anyhow!("invalid table name: {:?}", name));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_are_accepted() {
        assert_eq!(checked_table_name("uc_user_token").unwrap(), "uc_user_token");
        assert!(checked_table_name("Users2").is_ok());
    }

    #[test]
    fn injection_attempts_are_rejected() {
        assert!(checked_table_name("").is_err());
        assert!(checked_table_name("users; drop table x").is_err());
        assert!(checked_table_name("`users`").is_err());
        assert!(checked_table_name("1users").is_err());
    }
}
