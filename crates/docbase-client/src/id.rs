//! Document id validation and generation.
//!
//! Ids are 24 lowercase hex characters encoding 12 raw bytes: a 4-byte
//! big-endian seconds timestamp, a 3-byte machine identifier, a 2-byte
//! process id and a 3-byte monotonic counter. Uniqueness is best-effort,
//! depending on host + pid + counter distinctness, not cryptography.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// True iff `id` is exactly 24 characters over `[0-9a-fA-F]`.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Generator state for document ids.
///
/// The counter is explicit and injectable so tests can control it; the
/// process-wide [`generate_id`] owns one instance behind a `OnceLock`.
#[derive(Debug)]
pub struct IdGenerator {
    machine: [u8; 3],
    pid: u16,
    counter: AtomicU32,
}

impl IdGenerator {
    /// Machine bytes from a hash of the hostname, pid from the OS, counter
    /// seeded from the sub-second nanos at construction.
    pub fn new() -> Self {
        let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
        let digest = blake3::hash(hostname.as_bytes());
        let mut machine = [0u8; 3];
        machine.copy_from_slice(&digest.as_bytes()[..3]);
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.subsec_nanos())
            .unwrap_or(0);
        Self::with_state(machine, std::process::id() as u16, seed)
    }

    /// Fully deterministic generator, used by tests.
    pub fn with_state(machine: [u8; 3], pid: u16, counter_seed: u32) -> Self {
        Self {
            machine,
            pid,
            counter: AtomicU32::new(counter_seed),
        }
    }

    /// Builds the 12 raw bytes and hex-encodes them lowercase. The counter
    /// wraps modulo 2^24 via truncation to its low 3 bytes.
    pub fn generate(&self) -> String {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0) as u32;
        let count = self.counter.fetch_add(1, Ordering::Relaxed);

        let mut raw = [0u8; 12];
        raw[..4].copy_from_slice(&seconds.to_be_bytes());
        raw[4..7].copy_from_slice(&self.machine);
        raw[7..9].copy_from_slice(&self.pid.to_be_bytes());
        raw[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        hex::encode(raw)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

static GENERATOR: OnceLock<IdGenerator> = OnceLock::new();

/// Generate a document id from the process-wide generator.
pub fn generate_id() -> String {
    GENERATOR.get_or_init(IdGenerator::new).generate()
}

/// Recover the generation instant from the leading timestamp bytes of an id.
/// Returns `None` when `id` is not a well-formed document id.
pub fn id_timestamp(id: &str) -> Option<DateTime<Utc>> {
    if !is_valid_id(id) {
        return None;
    }
    let seconds = u32::from_str_radix(&id[..8], 16).ok()?;
    DateTime::from_timestamp(i64::from(seconds), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_matches_the_24_hex_format() {
        for id in [
            "507f1f77bcf86cd799439011",
            "507f191e810c19729de860ea",
            "54b7ed2b49726734cab0570c",
            "58A2D90012F9AE00C647D0FC",
        ] {
            assert!(is_valid_id(id), "{id} should be valid");
        }
        for id in [
            "",
            "t",
            "123c",
            "58a2d90012f9ae00c647d0fc((',.,",
            "507f1f77bcf86cd79943901",
            "507f1f77bcf86cd7994390111",
            "507f1f77bcf86cd79943901g",
        ] {
            assert!(!is_valid_id(id), "{id:?} should be invalid");
        }
    }

    #[test]
    fn generated_ids_are_valid() {
        assert!(is_valid_id(&generate_id()));
        let generator = IdGenerator::new();
        assert!(is_valid_id(&generator.generate()));
    }

    #[test]
    fn generated_ids_are_distinct_and_non_decreasing() {
        let generator = IdGenerator::with_state([0xab, 0xcd, 0xef], 42, 0);
        let ids: Vec<String> = (0..256).map(|_| generator.generate()).collect();

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted, "ids must be lexicographically non-decreasing");

        sorted.dedup();
        assert_eq!(sorted.len(), ids.len(), "ids must be distinct");
    }

    #[test]
    fn counter_truncates_to_low_three_bytes() {
        let generator = IdGenerator::with_state([0, 0, 0], 0, 0x0102_0304);
        let id = generator.generate();
        assert_eq!(&id[18..], "020304");
    }

    #[test]
    fn machine_and_pid_bytes_are_embedded() {
        let generator = IdGenerator::with_state([0xab, 0xcd, 0xef], 0xbeef, 7);
        let id = generator.generate();
        assert_eq!(&id[8..14], "abcdef");
        assert_eq!(&id[14..18], "beef");
        assert_eq!(&id[18..], "000007");
    }

    #[test]
    fn timestamp_round_trips_through_the_id() {
        let before = Utc::now().timestamp();
        let id = IdGenerator::with_state([1, 2, 3], 4, 5).generate();
        let stamp = id_timestamp(&id).expect("generated id carries a timestamp");
        assert!((stamp.timestamp() - before).abs() <= 2);

        assert_eq!(id_timestamp("123c"), None);
    }
}
