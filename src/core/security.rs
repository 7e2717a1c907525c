use std::fmt;

use subtle::ConstantTimeEq;

/// Shown inline under the password field after a failed attempt.
pub const WRONG_PASSWORD_MESSAGE: &str = "😕 Password er forkert, prøv igen.";

/// The single shared password that unlocks a chat session.
#[derive(Clone)]
pub struct SharedPassword {
    value: String,
}

impl SharedPassword {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Compares a submitted password in constant time.
    ///
    /// The submitted value is taken by value and dropped before returning, so
    /// no caller can keep it around after the check.
    pub fn verify(&self, submitted: String) -> bool {
        let matched: bool = submitted.as_bytes().ct_eq(self.value.as_bytes()).into();
        drop(submitted);
        matched
    }
}

impl fmt::Debug for SharedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPassword").field("value", &"****").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_exact_match() {
        let password = SharedPassword::new("Hemmelig123");

        assert!(password.verify("Hemmelig123".to_string()));
    }

    #[test]
    fn verify_is_case_sensitive() {
        let password = SharedPassword::new("Hemmelig123");

        assert!(!password.verify("hemmelig123".to_string()));
        assert!(!password.verify("HEMMELIG123".to_string()));
    }

    #[test]
    fn verify_rejects_prefix_and_empty_input() {
        let password = SharedPassword::new("Hemmelig123");

        assert!(!password.verify("Hemmelig".to_string()));
        assert!(!password.verify("Hemmelig1234".to_string()));
        assert!(!password.verify(String::new()));
    }

    #[test]
    fn debug_output_never_contains_the_secret() {
        let password = SharedPassword::new("Hemmelig123");

        let rendered = format!("{:?}", password);

        assert!(!rendered.contains("Hemmelig123"));
    }
}
