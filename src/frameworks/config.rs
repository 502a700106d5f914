use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants (not gameplay rules).

pub fn http_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080)
}

pub fn bind_host() -> IpAddr {
    env::var("BIND_HOST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

// Idle limit on inbound frames, including the handshake.
pub fn read_timeout() -> Duration {
    Duration::from_secs(env_secs("READ_TIMEOUT_SECS", 60))
}

pub fn write_timeout() -> Duration {
    Duration::from_secs(env_secs("WRITE_TIMEOUT_SECS", 10))
}

fn env_secs(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}

pub const OUTBOUND_CHANNEL_CAPACITY: usize = 64;
pub const SESSION_CODE_ATTEMPTS: usize = 10;
pub const MAX_INVALID_MESSAGES: u32 = 10;
