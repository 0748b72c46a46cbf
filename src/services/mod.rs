//! Services layer - Business logic
//!
//! This module contains the business logic services for DevConnect.
//! Services are responsible for:
//! - Implementing business rules and validation
//! - Coordinating repositories
//! - Translating infrastructure failures into service errors

pub mod password;
pub mod post;
pub mod suggestion;
pub mod token;
pub mod user;

pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError};
pub use suggestion::{SuggestionService, GENERIC_FAILURE_MESSAGE, KEY_UNAVAILABLE_MESSAGE};
pub use token::{Claims, TokenError, TokenService};
pub use user::{normalize_email, UserService, UserServiceError};
