use rand::rngs::OsRng;
use rand::Rng;

use crate::constants::{SECURITY_KEY_ALPHABET, SECURITY_KEY_LEN};

/// Generate a fresh opaque security key.
///
/// The key is issued once at first login and acts as a long-lived bearer
/// credential, so it is drawn from the OS CSPRNG.
pub fn generate_security_key() -> String {
    let mut rng = OsRng;
    (0..SECURITY_KEY_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SECURITY_KEY_ALPHABET.len());
            SECURITY_KEY_ALPHABET[idx] as char
        })
        .collect()
}
