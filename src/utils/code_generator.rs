use rand::Rng;

/// No 0/O or 1/I, codes get read out loud at the door.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 6;
pub const CONFIRMATION_PREFIX: &str = "GVQ-";

/// Booking confirmation code, e.g. `GVQ-7KD2QX`.
pub fn generate_confirmation_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{CONFIRMATION_PREFIX}{suffix}")
}

/// Codes are typed by hand; accept lowercase and stray spaces.
pub fn normalize_confirmation_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
