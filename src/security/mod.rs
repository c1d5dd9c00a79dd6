pub mod cors;
pub mod jwt;
pub mod password;
pub mod validation;

pub use cors::create_cors_layer;
pub use jwt::{extract_bearer_token, JwtConfig, TokenError, TokenService};
pub use password::{Argon2Config, CredentialHasher};
pub use validation::{is_valid_email, normalize_email, FieldError, ValidationResult};
