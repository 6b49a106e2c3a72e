mod password;
mod sqlite_user_store;
mod user_models;
mod user_store;

pub use sqlite_user_store::SqliteUserStore;
pub use user_models::{NewUser, UserAccount, UserRole};
pub use user_store::UserStore;
