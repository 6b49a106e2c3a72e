use super::user_models::{NewUser, UserAccount, UserRole};
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates an account. Returns false (and writes nothing) when an
    /// account with that email already exists.
    /// Returns Err on a malformed email or a database error.
    fn register(&self, new_user: &NewUser) -> Result<bool>;

    /// True iff an account with that email exists and the password
    /// verifies against its stored hash.
    fn authenticate(&self, email: &str, password: &str) -> Result<bool>;

    /// Returns the account for the given email.
    /// Returns Ok(None) if the account does not exist.
    fn get_user(&self, email: &str) -> Result<Option<UserAccount>>;

    /// Returns all account emails.
    fn list_emails(&self) -> Result<Vec<String>>;

    fn register_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        phone: &str,
    ) -> Result<bool> {
        self.register(&NewUser {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            phone: phone.to_string(),
            role: UserRole::User,
        })
    }

    fn register_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        phone: &str,
    ) -> Result<bool> {
        self.register(&NewUser {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            phone: phone.to_string(),
            role: UserRole::Admin,
        })
    }
}
