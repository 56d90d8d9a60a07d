//! Use-case API consumed by the HTTP layer.
//!
//! # Responsibility
//! - Decode JSON request bodies and headers into service calls.
//! - Map service outcomes to a status code plus JSON body.
//!
//! # Invariants
//! - Functions never panic and always return a complete response.
//! - Internal failures are logged in full and answered with an opaque
//!   message; no SQL text, hash or key material reaches a response body.
//! - Login answers unknown users and wrong passwords identically.

use chrono::DateTime;
use log::{error, info};
use passport_core::db::open_db;
use passport_core::{
    core_version, AccountProfile, AppConfig, AuthFailure, AuthServiceError,
    AuthenticationService, CredentialHasher, ErrorKind, RegistrationRequest, RegistrationService,
    RepoError, SessionResolver, SqliteAccountStore, TokenCodec,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

const PROFILE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Dependencies shared by every request: one connection, hasher and codec.
pub struct ApiContext {
    conn: Connection,
    hasher: CredentialHasher,
    codec: TokenCodec,
}

impl ApiContext {
    pub fn new(conn: Connection, hasher: CredentialHasher, codec: TokenCodec) -> Self {
        Self {
            conn,
            hasher,
            codec,
        }
    }

    /// Opens the configured database and derives hasher and codec.
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        let conn = open_db(&config.database.path).map_err(|err| {
            format!(
                "failed to open database `{}`: {err}",
                config.database.path.display()
            )
        })?;
        let hasher = CredentialHasher::new(config.hashing).map_err(|err| err.to_string())?;
        let codec = TokenCodec::new(&config.secret_key());
        Ok(Self::new(conn, hasher, codec))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn store(&self) -> Result<SqliteAccountStore<'_>, RepoError> {
        SqliteAccountStore::try_new(&self.conn)
    }
}

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self {
                status: STATUS_OK,
                body,
            },
            Err(err) => {
                error!("event=api_response module=api status=error error_code=serialize_failed error={err}");
                Self::error(STATUS_INTERNAL_SERVER_ERROR, "something went wrong")
            }
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Register,
    Login,
    Account,
    AccountById,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::Account => "account",
            Self::AccountById => "account_by_id",
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RegisterBody {
    name: String,
    first_name: String,
    cid: String,
    username: String,
    password: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct LoginBody {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: &'static str,
    account_uid: String,
}

#[derive(Serialize)]
struct LoginResponse {
    message: &'static str,
    token: String,
}

#[derive(Serialize)]
struct AccountResponse {
    message: &'static str,
    data: AccountData,
}

#[derive(Serialize)]
struct AccountData {
    uid: String,
    name: String,
    first_name: String,
    age: i64,
    created_at: String,
}

impl From<AccountProfile> for AccountData {
    fn from(profile: AccountProfile) -> Self {
        Self {
            uid: profile.id.to_string(),
            name: profile.name,
            first_name: profile.first_name,
            age: profile.age,
            created_at: format_epoch_ms(profile.created_at),
        }
    }
}

/// Service banner with the core version.
pub fn home() -> ApiResponse {
    ApiResponse::ok(json!({ "version": core_version() }))
}

/// Handles a registration body `{name, first_name, cid, username, password}`.
pub fn register(ctx: &ApiContext, body: &str) -> ApiResponse {
    let Ok(payload) = serde_json::from_str::<RegisterBody>(body) else {
        return ApiResponse::error(STATUS_BAD_REQUEST, "invalid json body");
    };
    let store = match ctx.store() {
        Ok(store) => store,
        Err(err) => return failure(Operation::Register, &AuthServiceError::from(err)),
    };

    let request = RegistrationRequest {
        name: payload.name,
        first_name: payload.first_name,
        national_id: payload.cid,
        username: payload.username,
        password: payload.password,
    };
    match RegistrationService::new(store, ctx.hasher.clone()).register(&request) {
        Ok(account_id) => ApiResponse::ok(RegisterResponse {
            message: "success",
            account_uid: account_id.to_string(),
        }),
        Err(err) => failure(Operation::Register, &err),
    }
}

/// Handles a login body `{username, password}`.
pub fn login(ctx: &ApiContext, body: &str) -> ApiResponse {
    let Ok(payload) = serde_json::from_str::<LoginBody>(body) else {
        return ApiResponse::error(STATUS_BAD_REQUEST, "invalid json body");
    };
    let store = match ctx.store() {
        Ok(store) => store,
        Err(err) => return failure(Operation::Login, &AuthServiceError::from(err)),
    };

    let service = AuthenticationService::new(store, ctx.hasher.clone(), ctx.codec.clone());
    match service.login(&payload.username, &payload.password) {
        Ok(token) => ApiResponse::ok(LoginResponse {
            message: "OK",
            token,
        }),
        Err(err) => failure(Operation::Login, &err),
    }
}

/// Handles a profile request carrying `Authorization: Bearer <token>`.
pub fn account(ctx: &ApiContext, authorization: Option<&str>) -> ApiResponse {
    let store = match ctx.store() {
        Ok(store) => store,
        Err(err) => return failure(Operation::Account, &AuthServiceError::from(err)),
    };

    let resolver = SessionResolver::new(store, ctx.codec.clone());
    match resolver.resolve(authorization.unwrap_or_default()) {
        Ok(profile) => ApiResponse::ok(AccountResponse {
            message: "OK",
            data: profile.into(),
        }),
        Err(err) => failure(Operation::Account, &err),
    }
}

/// Looks up the public profile of an account by its id.
pub fn account_by_id(ctx: &ApiContext, id: &str) -> ApiResponse {
    let Ok(account_id) = Uuid::parse_str(id.trim()) else {
        return ApiResponse::error(STATUS_NOT_FOUND, "account not found");
    };
    let store = match ctx.store() {
        Ok(store) => store,
        Err(err) => return failure(Operation::AccountById, &AuthServiceError::from(err)),
    };

    let resolver = SessionResolver::new(store, ctx.codec.clone());
    match resolver.profile(account_id) {
        Ok(profile) => ApiResponse::ok(AccountResponse {
            message: "OK",
            data: profile.into(),
        }),
        Err(err) => failure(Operation::AccountById, &err),
    }
}

fn failure(operation: Operation, err: &AuthServiceError) -> ApiResponse {
    match err.kind() {
        ErrorKind::BadRequest => ApiResponse::error(STATUS_BAD_REQUEST, &err.to_string()),
        ErrorKind::Conflict => ApiResponse::error(STATUS_CONFLICT, "username already taken"),
        ErrorKind::Unauthorized => unauthorized(operation, err),
        ErrorKind::Internal => {
            error!(
                "event=api_request module=api status=error operation={} error={}",
                operation.as_str(),
                err
            );
            let message = match operation {
                Operation::Register => "register new account failed",
                _ => "something went wrong",
            };
            ApiResponse::error(STATUS_INTERNAL_SERVER_ERROR, message)
        }
    }
}

fn unauthorized(operation: Operation, err: &AuthServiceError) -> ApiResponse {
    let AuthServiceError::Unauthorized(reason) = err else {
        return ApiResponse::error(STATUS_UNAUTHORIZED, "unauthorized");
    };
    info!(
        "event=api_request module=api status=unauthorized operation={} reason={}",
        operation.as_str(),
        reason.code()
    );
    match (operation, reason) {
        (Operation::Login, _) => {
            ApiResponse::error(STATUS_UNAUTHORIZED, "invalid username or password")
        }
        (Operation::AccountById, AuthFailure::UserNotFound) => {
            ApiResponse::error(STATUS_NOT_FOUND, "account not found")
        }
        (_, AuthFailure::UserNotFound) => {
            ApiResponse::error(STATUS_UNAUTHORIZED, "request user not found")
        }
        (_, reason) => ApiResponse::error(STATUS_UNAUTHORIZED, &reason.to_string()),
    }
}

fn format_epoch_ms(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|time| time.format(PROFILE_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{
        account, account_by_id, format_epoch_ms, home, login, register, ApiContext, ApiResponse,
        STATUS_BAD_REQUEST, STATUS_CONFLICT, STATUS_INTERNAL_SERVER_ERROR, STATUS_NOT_FOUND,
        STATUS_OK, STATUS_UNAUTHORIZED,
    };
    use passport_core::db::open_db_in_memory;
    use passport_core::{CredentialHasher, SecretKey, TokenCodec, WorkFactor};
    use std::io::Write;

    const ALICE: &str = r#"{
        "name": "Alice",
        "first_name": "Alice",
        "cid": "123456",
        "username": "alice123",
        "password": "p@ssw0rd1"
    }"#;

    fn context() -> ApiContext {
        let hasher = CredentialHasher::new(WorkFactor {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .expect("fast work factor");
        let codec = TokenCodec::new(&SecretKey::from_passphrase("api-test-secret"));
        ApiContext::new(open_db_in_memory().expect("open db"), hasher, codec)
    }

    fn error_message(response: &ApiResponse) -> &str {
        response.body["error"].as_str().expect("error body")
    }

    fn login_token(ctx: &ApiContext) -> String {
        let response = login(ctx, r#"{"username":"alice123","password":"p@ssw0rd1"}"#);
        assert_eq!(response.status, STATUS_OK, "{}", response.body);
        response.body["token"].as_str().expect("token").to_string()
    }

    #[test]
    fn home_reports_version() {
        let response = home();
        assert_eq!(response.status, STATUS_OK);
        assert!(!response.body["version"].as_str().unwrap().is_empty());
    }

    #[test]
    fn register_login_and_account_round_trip() {
        let ctx = context();

        let registered = register(&ctx, ALICE);
        assert_eq!(registered.status, STATUS_OK, "{}", registered.body);
        assert_eq!(registered.body["message"], "success");
        let account_uid = registered.body["account_uid"].as_str().unwrap().to_string();
        assert!(!account_uid.is_empty());

        let token = login_token(&ctx);
        let header = format!("Bearer {token}");
        let profile = account(&ctx, Some(header.as_str()));
        assert_eq!(profile.status, STATUS_OK, "{}", profile.body);
        let data = &profile.body["data"];
        assert_eq!(data["uid"], account_uid.as_str());
        assert_eq!(data["name"], "Alice");
        assert_eq!(data["first_name"], "Alice");
        assert_eq!(data["age"], 0);
        assert_eq!(data["created_at"].as_str().unwrap().len(), 19);
        assert!(data.get("cid").is_none());
        assert!(data.get("national_id").is_none());
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let ctx = context();
        let response = register(&ctx, "{not json");
        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert_eq!(error_message(&response), "invalid json body");

        let response = login(&ctx, "[]");
        assert_eq!(response.status, STATUS_BAD_REQUEST);
    }

    #[test]
    fn validation_failures_name_the_field() {
        let ctx = context();
        let response = register(
            &ctx,
            r#"{"name":"A","first_name":"A","cid":"1","username":"ab","password":"p@ssw0rd1"}"#,
        );
        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert_eq!(error_message(&response), "invalid username");

        let response = login(&ctx, r#"{"username":"alice123","password":"short1"}"#);
        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert_eq!(error_message(&response), "invalid password");
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let ctx = context();
        assert_eq!(register(&ctx, ALICE).status, STATUS_OK);

        let response = register(&ctx, ALICE);
        assert_eq!(response.status, STATUS_CONFLICT);
        assert_eq!(error_message(&response), "username already taken");
    }

    #[test]
    fn login_does_not_reveal_which_part_was_wrong() {
        let ctx = context();
        register(&ctx, ALICE);

        let wrong_password = login(&ctx, r#"{"username":"alice123","password":"wrong-pass"}"#);
        let unknown_user = login(&ctx, r#"{"username":"nobody99","password":"p@ssw0rd1"}"#);
        assert_eq!(wrong_password.status, STATUS_UNAUTHORIZED);
        assert_eq!(wrong_password, unknown_user);
    }

    #[test]
    fn account_requires_bearer_token() {
        let ctx = context();
        register(&ctx, ALICE);
        let token = login_token(&ctx);

        let missing = account(&ctx, None);
        assert_eq!(missing.status, STATUS_UNAUTHORIZED);
        assert_eq!(error_message(&missing), "invalid token type");

        let bare = account(&ctx, Some(token.as_str()));
        assert_eq!(bare.status, STATUS_UNAUTHORIZED);
        assert_eq!(error_message(&bare), "invalid token type");

        let garbage = account(&ctx, Some("Bearer garbage"));
        assert_eq!(garbage.status, STATUS_UNAUTHORIZED);
        assert_eq!(error_message(&garbage), "invalid token");
    }

    #[test]
    fn account_by_id_returns_public_profile_or_not_found() {
        let ctx = context();
        let registered = register(&ctx, ALICE);
        let account_uid = registered.body["account_uid"].as_str().unwrap().to_string();

        let found = account_by_id(&ctx, &account_uid);
        assert_eq!(found.status, STATUS_OK);
        assert_eq!(found.body["data"]["name"], "Alice");

        let unknown = account_by_id(&ctx, &uuid::Uuid::new_v4().to_string());
        assert_eq!(unknown.status, STATUS_NOT_FOUND);
        let malformed = account_by_id(&ctx, "not-a-uuid");
        assert_eq!(malformed.status, STATUS_NOT_FOUND);
    }

    #[test]
    fn internal_failures_are_opaque() {
        let ctx = context();
        register(&ctx, ALICE);
        ctx.connection()
            .execute_batch("DROP TABLE credentials;")
            .unwrap();

        let response = login(&ctx, r#"{"username":"alice123","password":"p@ssw0rd1"}"#);
        assert_eq!(response.status, STATUS_INTERNAL_SERVER_ERROR);
        assert_eq!(error_message(&response), "something went wrong");

        let response = register(
            &ctx,
            r#"{"name":"B","first_name":"B","cid":"2","username":"bob12345","password":"p@ssw0rd1"}"#,
        );
        assert_eq!(response.status, STATUS_INTERNAL_SERVER_ERROR);
        assert_eq!(error_message(&response), "register new account failed");
        assert!(!response.body.to_string().contains("credentials"));
    }

    #[test]
    fn context_from_config_opens_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("passport.sqlite3");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "secret:\n  key: file-secret\ndb:\n  path: {}\nhashing:\n  memory_kib: 8\n  iterations: 1\n  parallelism: 1\n",
            db_path.display()
        )
        .unwrap();

        let config = passport_core::load_config(file.path()).unwrap();
        let ctx = ApiContext::from_config(&config).unwrap();
        assert_eq!(register(&ctx, ALICE).status, STATUS_OK);
        assert!(db_path.exists());

        let reopened = ApiContext::from_config(&config).unwrap();
        let response = login(&reopened, r#"{"username":"alice123","password":"p@ssw0rd1"}"#);
        assert_eq!(response.status, STATUS_OK);
    }

    #[test]
    fn profile_timestamps_use_date_time_layout() {
        assert_eq!(format_epoch_ms(0), "1970-01-01 00:00:00");
        assert_eq!(format_epoch_ms(1_700_000_000_000), "2023-11-14 22:13:20");
    }
}
