use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime value meaning "never expires".
pub const PERMANENT: i64 = 0;

/// Longest accepted lifetime, 100 years in seconds.
pub const MAX_LIFETIME: i64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct FileData {
    pub content: Vec<u8>,
    pub original_name: String,
    pub mimetype: String,
}

impl FileData {
    pub fn new(content: Vec<u8>, original_name: String, mimetype: String) -> Self {
        Self {
            content,
            original_name,
            mimetype,
        }
    }

    pub fn validate_size(&self, max_size: u64) -> bool {
        self.size() <= max_size
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Metadata for one uploaded file.
///
/// The blob itself lives on the storage medium under `stored_name`; the record
/// and the blob are only linked through that name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub owner: Option<String>,
    pub original_name: String,
    pub stored_name: String,
    pub mimetype: String,
    pub size: u64,
    pub upload_time: DateTime<Utc>,
    /// Maximum age in seconds, `0` for permanent files.
    pub lifetime: i64,
}

impl FileRecord {
    pub fn is_permanent(&self) -> bool {
        self.lifetime <= PERMANENT
    }

    /// Age of the record relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.upload_time
    }

    /// A record is expired once its age is strictly greater than its lifetime.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.is_permanent() {
            return false;
        }
        self.age(now).num_milliseconds() > self.lifetime.saturating_mul(1000)
    }

    /// `None` for permanent files and for lifetimes past the representable range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.is_permanent() {
            return None;
        }
        chrono::Duration::try_seconds(self.lifetime)
            .and_then(|lifetime| self.upload_time.checked_add_signed(lifetime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(lifetime: i64, upload_time: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id: "abcdefgh".to_string(),
            owner: None,
            original_name: "test_file1.jpeg".to_string(),
            stored_name: "abcdefgh.jpeg".to_string(),
            mimetype: "image/jpeg".to_string(),
            size: 430061,
            upload_time,
            lifetime,
        }
    }

    #[test]
    fn age_equal_to_lifetime_is_not_expired() {
        let now = Utc::now();
        let file = record(3600, now - Duration::seconds(3600));
        assert!(!file.is_expired(now));
    }

    #[test]
    fn age_one_second_past_lifetime_is_expired() {
        let now = Utc::now();
        let file = record(3600, now - Duration::seconds(3601));
        assert!(file.is_expired(now));
    }

    #[test]
    fn zero_lifetime_never_expires() {
        let now = Utc::now();
        let file = record(0, now - Duration::days(365 * 20));
        assert!(file.is_permanent());
        assert!(!file.is_expired(now));
    }

    #[test]
    fn expiry_time_follows_lifetime() {
        let now = Utc::now();
        assert_eq!(record(60, now).expires_at(), Some(now + Duration::seconds(60)));
        assert_eq!(record(0, now).expires_at(), None);
    }

    #[test]
    fn out_of_range_lifetime_has_no_expiry_time() {
        let now = Utc::now();
        let file = record(i64::MAX, now);
        assert_eq!(file.expires_at(), None);
        assert!(!file.is_expired(now));
    }

    #[test]
    fn record_from_the_future_is_not_expired() {
        let now = Utc::now();
        let file = record(10, now + Duration::seconds(60));
        assert!(!file.is_expired(now));
    }
}
