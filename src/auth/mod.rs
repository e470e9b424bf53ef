mod claims;
pub mod jwt;
pub mod password;

pub use jwt::{AuthUser, JwtKeys, TokenIssuer};
pub use password::{Argon2Hasher, PasswordHasher};
