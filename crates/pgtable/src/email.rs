//! Email address validation shared by the CRUD shell and the CSV source.

use std::sync::OnceLock;

/// Column that carries the email address in ingested files and the `reviews` table.
pub const EMAIL_COLUMN: &str = "email_address";

/// Syntactic email check: `local@domain.tld` with a 2-7 letter top-level segment.
///
/// The whole string must match. No DNS or deliverability checks are made.
pub fn is_valid_email(s: &str) -> bool {
    static EMAIL_RE: OnceLock<regex::Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| {
            regex::Regex::new(r"^\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,7}$")
                .expect("invalid built-in email regex")
        })
        .is_match(s)
}
