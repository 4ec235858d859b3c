use derive_more::Display;
use uuid::Uuid;

/// Length of a generated [`ResultId`].
const RESULT_ID_LENGTH: usize = 12;

/// Primary cache key: BLAKE3 digest of the trimmed input link.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);
impl CacheKey {
    pub fn for_url(url: &str) -> Self {
        Self(blake3::hash(url.trim().as_bytes()).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier handed out with a cached success.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultId(String);
impl ResultId {
    pub fn generate() -> Self {
        // The version nibble sits at index 12, so the prefix is all random.
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(RESULT_ID_LENGTH);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<&str> for ResultId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}
impl From<String> for ResultId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}
impl AsRef<str> for ResultId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
