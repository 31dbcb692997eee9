//! Fixed total order over trust levels.
//!
//! `UNKNOWN < BASIC < VERIFIED < TRUSTED < PRIVILEGED`. Ordering operators use this
//! rank when both operands are strings; names are matched case-insensitively.

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrustLevel {
    Unknown,
    Basic,
    Verified,
    Trusted,
    Privileged,
}

impl TrustLevel {
    pub const ALL: [TrustLevel; 5] = [
        TrustLevel::Unknown,
        TrustLevel::Basic,
        TrustLevel::Verified,
        TrustLevel::Trusted,
        TrustLevel::Privileged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrustLevel::Unknown => "UNKNOWN",
            TrustLevel::Basic => "BASIC",
            TrustLevel::Verified => "VERIFIED",
            TrustLevel::Trusted => "TRUSTED",
            TrustLevel::Privileged => "PRIVILEGED",
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TrustLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}
