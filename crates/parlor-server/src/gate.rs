use std::fmt;

/// Result of a keyword check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

/// Compares submitted keywords against the room's shared secret.
///
/// The server keeps no session: a granted check only tells the client it may
/// start polling.
pub struct AccessGate {
    secret: String,
}

impl AccessGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn check(&self, candidate: &str) -> Access {
        if constant_time_eq(candidate.as_bytes(), self.secret.as_bytes()) {
            Access::Granted
        } else {
            Access::Denied
        }
    }
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Byte comparison whose running time depends only on the lengths
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_keyword_is_granted() {
        let gate = AccessGate::new("Troitroi1020");
        assert_eq!(gate.check("Troitroi1020"), Access::Granted);
    }

    #[test]
    fn test_near_misses_are_denied() {
        let gate = AccessGate::new("Troitroi1020");
        for candidate in [
            "",
            "wrong",
            "troitroi1020",
            "TROITROI1020",
            "Troitroi",
            "Troitroi10200",
            " Troitroi1020",
            "Troitroi1020 ",
            "xTroitroi1020",
        ] {
            assert_eq!(gate.check(candidate), Access::Denied, "{:?}", candidate);
        }
    }

    #[test]
    fn test_debug_hides_secret() {
        let gate = AccessGate::new("hunter2");
        assert!(!format!("{:?}", gate).contains("hunter2"));
    }
}
