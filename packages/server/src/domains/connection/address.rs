use serde::Serialize;

/// How raw phone numbers become chat addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRules {
    /// Prefixed to bare 10-digit national numbers.
    pub default_country_code: String,
    /// Channel domain appended to the digits, e.g. `@c.us`.
    pub suffix: String,
}

impl Default for AddressRules {
    fn default() -> Self {
        Self {
            default_country_code: "91".to_string(),
            suffix: "@c.us".to_string(),
        }
    }
}

/// A normalized destination on the chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChatAddress {
    digits: String,
    address: String,
}

impl ChatAddress {
    /// Full transport address, digits plus channel suffix.
    pub fn as_str(&self) -> &str {
        &self.address
    }

    /// The phone-number part, digits only.
    pub fn phone_number(&self) -> &str {
        &self.digits
    }
}

impl std::fmt::Display for ChatAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.address)
    }
}

/// Normalize any input string into a chat address.
///
/// Total: malformed input yields an address the transport will reject at
/// delivery time. Idempotent as long as the suffix carries no digits.
pub fn normalize_address(raw: &str, rules: &AddressRules) -> ChatAddress {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        digits.insert_str(0, &rules.default_country_code);
    }
    let address = format!("{}{}", digits, rules.suffix);
    ChatAddress { digits, address }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> AddressRules {
        AddressRules::default()
    }

    #[test]
    fn test_ten_digit_number_gets_country_code() {
        let address = normalize_address("9876543210", &rules());
        assert_eq!(address.as_str(), "919876543210@c.us");
        assert_eq!(address.phone_number(), "919876543210");
    }

    #[test]
    fn test_formatting_characters_are_stripped() {
        let address = normalize_address("+1 (555) 123-4567", &rules());
        assert_eq!(address.as_str(), "15551234567@c.us");
    }

    #[test]
    fn test_formatted_ten_digit_number() {
        let address = normalize_address("(987) 654-3210", &rules());
        assert_eq!(address.as_str(), "919876543210@c.us");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_address("9876543210", &rules());
        let twice = normalize_address(once.as_str(), &rules());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_garbage_input_still_produces_an_address() {
        let address = normalize_address("not a number", &rules());
        assert_eq!(address.as_str(), "@c.us");
        assert_eq!(address.phone_number(), "");
    }

    #[test]
    fn test_custom_rules() {
        let rules = AddressRules {
            default_country_code: "1".to_string(),
            suffix: "@s.whatsapp.net".to_string(),
        };
        let address = normalize_address("555-123-4567", &rules);
        assert_eq!(address.as_str(), "15551234567@s.whatsapp.net");
    }
}
