//! `login_hint` encoding for pushed authorization requests

use auth_api::{AuthError, PrefillInfo, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Serialize prefill data to JSON and encode it as standard padded base64.
pub fn encode_login_hint(prefill: &PrefillInfo) -> Result<String> {
    let json = serde_json::to_vec(prefill)
        .map_err(|e| AuthError::Client(format!("failed to encode prefill info: {e}")))?;
    Ok(STANDARD.encode(json))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(hint: &str) -> serde_json::Value {
        serde_json::from_slice(&STANDARD.decode(hint).unwrap()).unwrap()
    }

    #[test]
    fn encodes_all_fields_with_wire_keys() {
        let prefill = PrefillInfo {
            email: Some("jane@example.com".into()),
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            phone_number: Some("+15555550100".into()),
        };
        let hint = encode_login_hint(&prefill).unwrap();
        assert_eq!(
            decode(&hint),
            serde_json::json!({
                "email": "jane@example.com",
                "first_name": "Jane",
                "last_name": "Doe",
                "phone": "+15555550100",
            })
        );
    }

    #[test]
    fn missing_fields_are_omitted() {
        let prefill = PrefillInfo {
            email: Some("a@b.c".into()),
            ..Default::default()
        };
        let hint = encode_login_hint(&prefill).unwrap();
        assert_eq!(decode(&hint), serde_json::json!({ "email": "a@b.c" }));
    }

    #[test]
    fn empty_prefill_is_empty_object() {
        assert_eq!(encode_login_hint(&PrefillInfo::default()).unwrap(), "e30=");
    }
}
