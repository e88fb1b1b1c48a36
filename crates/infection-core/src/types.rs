use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable handle of a user inside a graph. Never reused once allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// The rollout marker written onto a user when it is tagged.
///
/// `SiteVersion::UNTAGGED` (zero) is the value every user starts with.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SiteVersion(pub u32);

impl SiteVersion {
    pub const UNTAGGED: SiteVersion = SiteVersion(0);

    pub fn is_untagged(self) -> bool {
        self == Self::UNTAGGED
    }
}

impl fmt::Display for SiteVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u32> for SiteVersion {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl FromStr for SiteVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('v').unwrap_or(s);
        digits
            .parse::<u32>()
            .map(SiteVersion)
            .map_err(|e| format!("invalid site version '{}': {}", s, e))
    }
}

/// Hands out monotonically increasing user ids.
///
/// Owned by whatever builds users (normally a `UserGraph`). Two graphs built
/// from clones of the same allocator will hand out overlapping ids, so share
/// one by moving it rather than cloning when a common id space is needed.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start handing out ids at `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn allocate(&mut self) -> UserId {
        let id = UserId(self.next);
        self.next += 1;
        id
    }

    /// The id the next call to `allocate` will return.
    pub fn peek(&self) -> UserId {
        UserId(self.next)
    }
}
