//! GSTIN format check and positional decoding.
//!
//! Validity is format-only: the trailing check character is decoded and
//! compared for information, but a mismatch does not make the number invalid.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// 2 digits + 5 letters + 4 digits + letter + alphanumeric + 'Z' + check character.
static GSTIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][0-9A-Z]Z[0-9A-Z]$").expect("valid GSTIN regex")
});

const CHECKSUM_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GstinDetails {
    pub gstin: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_number: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_matches: Option<bool>,
}

/// Trim and upper-case user input before matching.
pub fn normalize(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

pub fn is_valid_format(gstin: &str) -> bool {
    GSTIN_REGEX.is_match(gstin)
}

/// Expected check character for the first 14 characters, or `None` if any
/// of them falls outside `0-9A-Z`.
pub(crate) fn expected_check_char(gstin: &str) -> Option<char> {
    let mut sum = 0u32;
    for (i, c) in gstin.bytes().take(14).enumerate() {
        let value = CHECKSUM_ALPHABET.iter().position(|&a| a == c)? as u32;
        let factor = if i % 2 == 0 { 1 } else { 2 };
        let product = value * factor;
        sum += product / 36 + product % 36;
    }
    let check = (36 - sum % 36) % 36;
    Some(CHECKSUM_ALPHABET[check as usize] as char)
}

/// Name of the state or union territory for a two-digit GST state code.
pub fn state_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "01" => "Jammu and Kashmir",
        "02" => "Himachal Pradesh",
        "03" => "Punjab",
        "04" => "Chandigarh",
        "05" => "Uttarakhand",
        "06" => "Haryana",
        "07" => "Delhi",
        "08" => "Rajasthan",
        "09" => "Uttar Pradesh",
        "10" => "Bihar",
        "11" => "Sikkim",
        "12" => "Arunachal Pradesh",
        "13" => "Nagaland",
        "14" => "Manipur",
        "15" => "Mizoram",
        "16" => "Tripura",
        "17" => "Meghalaya",
        "18" => "Assam",
        "19" => "West Bengal",
        "20" => "Jharkhand",
        "21" => "Odisha",
        "22" => "Chhattisgarh",
        "23" => "Madhya Pradesh",
        "24" => "Gujarat",
        "26" => "Dadra and Nagar Haveli and Daman and Diu",
        "27" => "Maharashtra",
        "29" => "Karnataka",
        "30" => "Goa",
        "31" => "Lakshadweep",
        "32" => "Kerala",
        "33" => "Tamil Nadu",
        "34" => "Puducherry",
        "35" => "Andaman and Nicobar Islands",
        "36" => "Telangana",
        "37" => "Andhra Pradesh",
        "38" => "Ladakh",
        "97" => "Other Territory",
        "99" => "Centre Jurisdiction",
        _ => return None,
    };
    Some(name)
}

/// Validate and decode a GSTIN.
pub fn lookup(input: &str) -> GstinDetails {
    let gstin = normalize(input);
    if !is_valid_format(&gstin) {
        return GstinDetails {
            gstin,
            valid: false,
            state_code: None,
            state: None,
            pan: None,
            entity_number: None,
            checksum_matches: None,
        };
    }

    // The regex guarantees 15 ASCII characters from here on.
    let state_code = gstin[0..2].to_string();
    let state = state_name(&state_code);
    let pan = gstin[2..12].to_string();
    let entity_number = gstin[12..13].chars().next();
    let checksum_matches = expected_check_char(&gstin).map(|c| gstin.ends_with(c));

    GstinDetails {
        gstin,
        valid: true,
        state_code: Some(state_code),
        state,
        pan: Some(pan),
        entity_number,
        checksum_matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_well_formed_gstin() {
        assert!(is_valid_format("27AAPFU0939F1ZV"));
        assert!(is_valid_format("29ABCDE1234F1Z5"));
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(!is_valid_format("27AAPFU0939F1Z"));
        assert!(!is_valid_format("27AAPFU0939F1ZVX"));
        assert!(!is_valid_format(""));
    }

    #[test]
    fn test_rejects_wrong_character_classes() {
        // letter where state digits belong
        assert!(!is_valid_format("2AAAPFU0939F1ZV"));
        // digit inside the PAN letters
        assert!(!is_valid_format("27AAP1U0939F1ZV"));
        // 14th character must be a literal Z
        assert!(!is_valid_format("27AAPFU0939F1YV"));
        // lowercase is only accepted after normalisation
        assert!(!is_valid_format("27aapfu0939f1zv"));
    }

    #[test]
    fn test_lookup_normalises_case_and_whitespace() {
        let details = lookup("  27aapfu0939f1zv ");
        assert!(details.valid);
        assert_eq!(details.gstin, "27AAPFU0939F1ZV");
    }

    #[test]
    fn test_lookup_decodes_positions() {
        let details = lookup("27AAPFU0939F1ZV");
        assert_eq!(details.state_code.as_deref(), Some("27"));
        assert_eq!(details.state, Some("Maharashtra"));
        assert_eq!(details.pan.as_deref(), Some("AAPFU0939F"));
        assert_eq!(details.entity_number, Some('1'));
        assert_eq!(details.checksum_matches, Some(true));
    }

    #[test]
    fn test_checksum_mismatch_does_not_invalidate() {
        let details = lookup("29ABCDE1234F1Z5");
        assert!(details.valid);
        assert_eq!(details.checksum_matches, Some(false));
        assert_eq!(expected_check_char("29ABCDE1234F1Z5"), Some('W'));
    }

    #[test]
    fn test_invalid_lookup_has_no_details() {
        let details = lookup("not-a-gstin");
        assert!(!details.valid);
        assert!(details.pan.is_none());
        assert!(details.state.is_none());
    }

    #[test]
    fn test_unknown_state_code_still_valid_format() {
        let details = lookup("98AAPFU0939F1ZV");
        assert!(details.valid);
        assert!(details.state.is_none());
    }
}
