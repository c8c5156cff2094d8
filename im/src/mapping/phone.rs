//! Phone number normalization

use tracing::debug;

/// Shortest and longest subscriber numbers accepted in international form
const MIN_E164_DIGITS: usize = 8;
const MAX_E164_DIGITS: usize = 15;

/// Normalizes phone numbers to one canonical string.
///
/// Implementations must map every formatting of the same logical number to
/// the same output, and return `None` for input they cannot represent.
pub trait PhoneNormalizer: Send + Sync + std::fmt::Debug {
    fn normalize(&self, raw: &str) -> Option<String>;
}

/// E.164 normalizer with a default country for national numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct E164Normalizer {
    country_code: String,
    national_len: usize,
    /// Digits dialed before a national number inside the country (`0` in most of Europe)
    trunk_prefix: Option<String>,
}

impl E164Normalizer {
    /// Create a normalizer for a country code and its national number length
    pub fn new(country_code: impl Into<String>, national_len: usize) -> Self {
        let country_code: String = country_code.into().chars().filter(|c| c.is_ascii_digit()).collect();
        Self {
            country_code,
            national_len,
            trunk_prefix: None,
        }
    }

    /// Accept national numbers written with `prefix` in front
    pub fn with_trunk_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into().chars().filter(|c| c.is_ascii_digit()).collect();
        self.trunk_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// National significant number of `digits`, with any trunk prefix removed
    fn national_number<'a>(&self, digits: &'a str) -> Option<&'a str> {
        if digits.len() == self.national_len {
            return Some(digits);
        }
        let prefix = self.trunk_prefix.as_deref()?;
        digits
            .strip_prefix(prefix)
            .filter(|rest| rest.len() == self.national_len)
    }
}

impl Default for E164Normalizer {
    /// North American numbering plan
    fn default() -> Self {
        Self::new("1", 10)
    }
}

impl PhoneNormalizer for E164Normalizer {
    fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

        if trimmed.starts_with('+') {
            return (MIN_E164_DIGITS..=MAX_E164_DIGITS)
                .contains(&digits.len())
                .then(|| format!("+{}", digits));
        }

        if let Some(national) = self.national_number(&digits) {
            return Some(format!("+{}{}", self.country_code, national));
        }

        if !self.country_code.is_empty()
            && digits.starts_with(&self.country_code)
            && digits.len() == self.country_code.len() + self.national_len
        {
            return Some(format!("+{}", digits));
        }

        debug!(digit_count = digits.len(), "E164Normalizer::normalize: unrepresentable number");
        None
    }
}
