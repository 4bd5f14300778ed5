use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use password_hash::rand_core::{OsRng, RngCore};

/// Random bytes behind every session token.
pub const SESSION_TOKEN_BYTES: usize = 64;

/// Generate an opaque, URL-safe session token from the OS CSPRNG.
///
/// The token is the only bearer credential for a session; callers must not log it.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
