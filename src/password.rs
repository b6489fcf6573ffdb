//! Password hashing via bcrypt.

use std::sync::LazyLock;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Hash compared against when the user does not exist, so unknown users and
/// wrong passwords take the same time to reject.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| bcrypt::hash("tollgate-dummy-password", BCRYPT_COST).unwrap_or_default());

/// Hash a password with bcrypt.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Verify a password against a bcrypt hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::error!("Failed to verify password hash: {}", e);
            false
        }
    }
}

/// Compute the dummy hash now so the first unknown-user login does not pay
/// for hashing on top of verifying.
pub fn prepare_dummy_hash() {
    LazyLock::force(&DUMMY_HASH);
}

/// Burn the same work as a real verification and report a mismatch.
pub fn verify_dummy(password: &str) -> bool {
    let _ = bcrypt::verify(password, &DUMMY_HASH);
    false
}
