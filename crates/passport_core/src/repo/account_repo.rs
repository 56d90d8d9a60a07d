//! Account store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide transactional inserts for the account/credential pair.
//! - Provide point lookups by username and by account id.
//!
//! # Invariants
//! - Lookups exclude soft-deleted rows (`deleted_at IS NOT NULL`).
//! - Username uniqueness among active credentials is enforced by a unique
//!   index, surfaced as `RepoError::UsernameTaken`.
//! - A transaction scope that is neither committed nor rolled back is rolled
//!   back when dropped.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::account::{Account, AccountId, Credential};
use rusqlite::{
    ffi, params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ACCOUNT_SELECT_SQL: &str = "SELECT
    uid,
    name,
    first_name,
    national_id,
    age,
    created_at,
    updated_at,
    deleted_at
FROM accounts";

const CREDENTIAL_SELECT_SQL: &str = "SELECT
    account_uid,
    username,
    password_hash,
    created_at,
    updated_at,
    deleted_at
FROM credentials";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage error for account persistence and lookups.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// An active credential already uses this username.
    UsernameTaken(String),
    /// Primary key collision on insert.
    DuplicateId(AccountId),
    /// Target account does not exist or is already soft-deleted.
    NotFound(AccountId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UsernameTaken(username) => write!(f, "username already taken: {username}"),
            Self::DuplicateId(id) => write!(f, "account id already exists: {id}"),
            Self::NotFound(id) => write!(f, "account not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "account store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted account data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Write scope spanning several inserts.
///
/// Implementations must apply either every write or none of them.
pub trait StoreTransaction {
    fn insert_account(&self, account: &Account) -> RepoResult<()>;
    fn insert_credential(&self, credential: &Credential) -> RepoResult<()>;
    fn commit(self) -> RepoResult<()>;
    fn rollback(self) -> RepoResult<()>;
}

/// Storage contract consumed by account services.
pub trait AccountStore {
    type Tx<'tx>: StoreTransaction
    where
        Self: 'tx;

    /// Opens a write transaction scope.
    fn begin(&self) -> RepoResult<Self::Tx<'_>>;
    /// Finds an active credential by exact (case-sensitive) username.
    fn find_credential_by_username(&self, username: &str) -> RepoResult<Option<Credential>>;
    /// Finds an active account by id.
    fn find_account_by_id(&self, id: AccountId) -> RepoResult<Option<Account>>;
}

/// SQLite-backed account store.
#[derive(Clone, Copy)]
pub struct SqliteAccountStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_account_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Soft-deletes an account together with its credential.
    ///
    /// The username of a deleted credential becomes available again.
    pub fn soft_delete_account(&self, id: AccountId) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE accounts
             SET
                deleted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uid = ?1
               AND deleted_at IS NULL;",
            [id_text.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.execute(
            "UPDATE credentials
             SET
                deleted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE account_uid = ?1
               AND deleted_at IS NULL;",
            [id_text.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

impl AccountStore for SqliteAccountStore<'_> {
    type Tx<'tx> = SqliteStoreTransaction<'tx> where Self: 'tx;

    fn begin(&self) -> RepoResult<SqliteStoreTransaction<'_>> {
        // IMMEDIATE takes the write lock up front so concurrent registrations
        // queue on busy_timeout instead of failing at the first insert.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        Ok(SqliteStoreTransaction { tx })
    }

    fn find_credential_by_username(&self, username: &str) -> RepoResult<Option<Credential>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CREDENTIAL_SELECT_SQL}
             WHERE username = ?1
               AND deleted_at IS NULL
             LIMIT 1;"
        ))?;
        let row = stmt
            .query_row([username], |row| Ok(parse_credential_row(row)))
            .optional()?;
        row.transpose()
    }

    fn find_account_by_id(&self, id: AccountId) -> RepoResult<Option<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACCOUNT_SELECT_SQL}
             WHERE uid = ?1
               AND deleted_at IS NULL;"
        ))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_account_row(row)))
            .optional()?;
        row.transpose()
    }
}

/// SQLite write scope. Dropping it without `commit` rolls back.
pub struct SqliteStoreTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl StoreTransaction for SqliteStoreTransaction<'_> {
    fn insert_account(&self, account: &Account) -> RepoResult<()> {
        self.tx
            .execute(
                "INSERT INTO accounts (
                    uid,
                    name,
                    first_name,
                    national_id,
                    age
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    account.id.to_string(),
                    account.name.as_str(),
                    account.first_name.as_str(),
                    account.national_id.as_str(),
                    account.age,
                ],
            )
            .map_err(|err| classify_insert_error(err, account.id, None))?;
        Ok(())
    }

    fn insert_credential(&self, credential: &Credential) -> RepoResult<()> {
        self.tx
            .execute(
                "INSERT INTO credentials (
                    account_uid,
                    username,
                    password_hash
                ) VALUES (?1, ?2, ?3);",
                params![
                    credential.account_id.to_string(),
                    credential.username.as_str(),
                    credential.password_hash.as_str(),
                ],
            )
            .map_err(|err| {
                classify_insert_error(err, credential.account_id, Some(&credential.username))
            })?;
        Ok(())
    }

    fn commit(self) -> RepoResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    fn rollback(self) -> RepoResult<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

fn classify_insert_error(err: rusqlite::Error, id: AccountId, username: Option<&str>) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            let on_username = message
                .as_deref()
                .is_some_and(|text| text.contains("credentials.username"));
            match (failure.extended_code, username) {
                (ffi::SQLITE_CONSTRAINT_UNIQUE, Some(username)) if on_username => {
                    return RepoError::UsernameTaken(username.to_string());
                }
                (ffi::SQLITE_CONSTRAINT_PRIMARYKEY, _) => return RepoError::DuplicateId(id),
                _ => {}
            }
        }
    }
    err.into()
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let uid_text: String = row.get("uid")?;
    Ok(Account {
        id: parse_uuid(&uid_text, "accounts.uid")?,
        name: row.get("name")?,
        first_name: row.get("first_name")?,
        national_id: row.get("national_id")?,
        age: row.get("age")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn parse_credential_row(row: &Row<'_>) -> RepoResult<Credential> {
    let uid_text: String = row.get("account_uid")?;
    Ok(Credential {
        account_id: parse_uuid(&uid_text, "credentials.account_uid")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<AccountId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn ensure_account_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
