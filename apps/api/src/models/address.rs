use std::collections::BTreeMap;

/// Reverse-geocoded address components, e.g. `city` → `Kyiv`.
pub type Address = BTreeMap<String, String>;

/// Keeps only whitelisted, non-blank components.
pub fn sanitize_address(address: Address, allowed_fields: &[String]) -> Address {
    address
        .into_iter()
        .filter(|(key, value)| allowed_fields.contains(key) && !value.trim().is_empty())
        .map(|(key, value)| (key, value.trim().to_string()))
        .collect()
}
