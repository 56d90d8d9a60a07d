//! Request/response boundary for the passport HTTP layer.

pub mod api;

pub use api::{
    account, account_by_id, home, login, register, ApiContext, ApiResponse, STATUS_BAD_REQUEST,
    STATUS_CONFLICT, STATUS_INTERNAL_SERVER_ERROR, STATUS_NOT_FOUND, STATUS_OK,
    STATUS_UNAUTHORIZED,
};
