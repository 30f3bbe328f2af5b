//! Persistence model for the muckr API: SeaORM entities plus the credential
//! store that lives on the user record.

pub mod entities;

pub use entities::user::credentials::CredentialError;
