//! Decode configuration

use serde::{Deserialize, Serialize};

/// How strictly the leading byte of an INTEGER is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntegerPolicy {
    /// X.690 minimal encoding: a leading 0x00 only before a byte with its
    /// high bit set, and no redundant leading 0xFF
    #[default]
    Strict,
    /// Any number of leading zero bytes is tolerated (the first is stripped)
    LeadingZeroAny,
}

/// Options controlling the decode engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Leading-byte rule for INTEGER content
    pub integer_policy: IntegerPolicy,
    /// Check OID sums against the known-OID table of their category
    pub verify_oids: bool,
}

impl DecodeOptions {
    /// Strict X.690 options with OID verification enabled
    pub fn strict() -> Self {
        Self::default()
    }

    /// Options accepting leading zero INTEGER padding and unknown OIDs
    pub fn lenient() -> Self {
        Self {
            integer_policy: IntegerPolicy::LeadingZeroAny,
            verify_oids: false,
        }
    }

    pub fn with_integer_policy(mut self, policy: IntegerPolicy) -> Self {
        self.integer_policy = policy;
        self
    }

    pub fn with_verify_oids(mut self, verify: bool) -> Self {
        self.verify_oids = verify;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            integer_policy: IntegerPolicy::Strict,
            verify_oids: true,
        }
    }
}
