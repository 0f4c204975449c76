//! One-time codes keyed by e-mail address, with expiry.

use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Valid,
    Invalid,
    Expired,
    Missing,
}

/// Wrong guesses allowed before a code is thrown away.
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
struct Entry {
    code: String,
    expires: Instant,
    failures: u32,
}

#[derive(Debug)]
pub struct OtpStore {
    ttl: Duration,
    codes: Mutex<HashMap<String, Entry>>,
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, codes: Mutex::new(HashMap::new()) }
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    /// Issues a fresh 6-digit code, replacing any previous one. Expired
    /// entries for other addresses are dropped on the way.
    pub fn issue(&self, email: &str) -> String {
        let code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
        let now = Instant::now();
        self.insert(email, code.clone(), now + self.ttl, now);
        code
    }

    fn insert(&self, email: &str, code: String, expires: Instant, now: Instant) {
        let mut codes = self.codes.lock().unwrap_or_else(|p| p.into_inner());
        codes.retain(|_, e| e.expires > now);
        codes.insert(key(email), Entry { code, expires, failures: 0 });
    }

    /// Evicts on success, on expiry and after `MAX_ATTEMPTS` wrong codes.
    pub fn verify(&self, email: &str, code: &str) -> OtpCheck {
        self.verify_at(email, code, Instant::now())
    }

    fn verify_at(&self, email: &str, code: &str, now: Instant) -> OtpCheck {
        let mut codes = self.codes.lock().unwrap_or_else(|p| p.into_inner());
        let key = key(email);
        let Some(entry) = codes.get_mut(&key) else { return OtpCheck::Missing };
        if now >= entry.expires {
            codes.remove(&key);
            return OtpCheck::Expired;
        }
        if entry.code != code.trim() {
            entry.failures += 1;
            if entry.failures >= MAX_ATTEMPTS {
                codes.remove(&key);
            }
            return OtpCheck::Invalid;
        }
        codes.remove(&key);
        OtpCheck::Valid
    }
}

fn key(email: &str) -> String { email.trim().to_lowercase() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_once() {
        let store = OtpStore::new(Duration::from_secs(300));
        let code = store.issue("Ana@Example.com");
        assert_eq!(code.len(), 6);
        assert_eq!(store.verify("ana@example.com", "000000x"), OtpCheck::Invalid);
        assert_eq!(store.verify("ana@example.com", &code), OtpCheck::Valid);
        assert_eq!(store.verify("ana@example.com", &code), OtpCheck::Missing);
    }

    #[test]
    fn test_expired_code_is_evicted() {
        let store = OtpStore::new(Duration::from_secs(300));
        let now = Instant::now();
        store.insert("ana@example.com", "123456".into(), now + Duration::from_secs(1), now);
        assert_eq!(store.verify_at("ana@example.com", "123456", now + Duration::from_secs(2)), OtpCheck::Expired);
        assert_eq!(store.verify_at("ana@example.com", "123456", now), OtpCheck::Missing);
    }

    #[test]
    fn test_reissue_replaces_code() {
        let store = OtpStore::new(Duration::from_secs(300));
        let now = Instant::now();
        store.insert("ana@example.com", "111111".into(), now + Duration::from_secs(60), now);
        store.insert("ana@example.com", "222222".into(), now + Duration::from_secs(60), now);
        assert_eq!(store.verify_at("ana@example.com", "111111", now), OtpCheck::Invalid);
        assert_eq!(store.verify_at("ana@example.com", "222222", now), OtpCheck::Valid);
    }

    #[test]
    fn test_issue_prunes_expired_entries() {
        let store = OtpStore::new(Duration::from_secs(300));
        let now = Instant::now();
        for i in 0..100 {
            store.insert(&format!("user{i}@example.com"), "123456".into(), now + Duration::from_millis(1), now);
        }
        store.insert("ana@example.com", "654321".into(), now + Duration::from_secs(60), now + Duration::from_secs(1));
        assert_eq!(store.codes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_code_is_dropped_after_too_many_misses() {
        let store = OtpStore::new(Duration::from_secs(300));
        let code = store.issue("ana@example.com");
        let wrong = if code == "100000" { "100001" } else { "100000" };
        for _ in 0..MAX_ATTEMPTS {
            assert_eq!(store.verify("ana@example.com", wrong), OtpCheck::Invalid);
        }
        assert!(store.codes.lock().unwrap().is_empty());
        assert_eq!(store.verify("ana@example.com", &code), OtpCheck::Missing);
    }
}
