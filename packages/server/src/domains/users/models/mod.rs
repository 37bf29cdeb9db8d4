// User domain models - ALL user SQL lives here

mod user;

pub use user::{is_admin_email, normalize_email, normalize_phone, NewUser, PublicUser, User};
