//! Credential cryptography for Supportdesk.
//!
//! - `password`: Argon2id password hashing (PHC strings)
//! - `token`: HS256 bearer tokens via `jsonwebtoken`

pub mod password;
pub mod token;
