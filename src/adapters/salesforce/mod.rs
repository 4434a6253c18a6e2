pub mod auth;
pub mod client;

pub use auth::{login_url, SalesforceLogin, Session};
pub use client::{RequestOptions, SalesforceRestClient, USER_SOBJECT_PATH};
