// Auth domain models - ALL auth SQL lives here

mod verification_code;

pub use verification_code::{hash_target, CodeKind, VerificationCode};
