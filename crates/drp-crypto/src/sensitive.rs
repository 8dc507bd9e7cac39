//! The fixed, case-insensitive sensitive-field set (§4.2). Any field not in
//! this set is stored in clear.

pub const SENSITIVE_FIELDS: &[&str] = &[
    "personal_data",
    "biometric_data",
    "location_data",
    "contact_info",
    "financial_data",
    "medical_data",
    "private_notes",
    "internal_metadata",
];

pub fn is_sensitive_field(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_FIELDS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively() {
        assert!(is_sensitive_field("PERSONAL_DATA"));
        assert!(is_sensitive_field("Personal_Data"));
        assert!(!is_sensitive_field("score"));
    }
}
