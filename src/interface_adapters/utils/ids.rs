use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::use_cases::IdGenerator;

// Crockford Base32: no I, L, O or U.
const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

pub const SESSION_CODE_LEN: usize = 8;
pub const PLAYER_ID_LEN: usize = 20;

/// Identifier source backed by the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptoIdGenerator;

impl IdGenerator for CryptoIdGenerator {
    fn session_code(&self) -> String {
        random_crockford(SESSION_CODE_LEN)
    }

    fn player_id(&self) -> String {
        random_crockford(PLAYER_ID_LEN).to_ascii_lowercase()
    }
}

fn random_crockford(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| CROCKFORD[rng.random_range(0..CROCKFORD.len())] as char)
        .collect()
}

/// Process-unique connection id for log correlation.
pub fn next_connection_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}
