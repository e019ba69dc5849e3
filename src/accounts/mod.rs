//! User accounts: the user record, its credentials and media.

pub mod cipher;
pub mod credentials;
pub mod error;
pub mod manager;
pub mod media;
pub mod model;
pub mod password;
pub mod repo;

pub use cipher::PasswordCipher;
pub use credentials::Authenticatable;
pub use error::{AccountError, AccountResult};
pub use manager::{normalize_email, UserManager};
pub use model::{ExtraFields, ProfileType, ProfileUpdate, Pronoun, User};
pub use repo::{PgUserStore, UserStore};
