use aes::Aes128;
use cipher::{BlockEncrypt, KeyInit};
use cmac::{Cmac, Mac};
use anyhow::{Result, anyhow};
use rand::Rng;
use std::fmt;

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A 16-byte AES key used to derive card tokens
#[derive(Clone, PartialEq, Eq)]
pub struct TokenKey([u8; 16]);

impl TokenKey {
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 16 {
            return Err(anyhow!("Token key must be 16 bytes"));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Key check value: first 3 bytes of AES(key, 0^128), hex encoded.
    /// Identifies a key in logs without disclosing it.
    pub fn check_value(&self) -> String {
        let cipher = Aes128::new(self.as_bytes().into());
        let mut block = [0u8; 16];
        cipher.encrypt_block((&mut block).into());
        hex::encode(&block[..3])
    }
}

// Never print key material.
impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenKey(kcv={})", self.check_value())
    }
}

/// Derives the opaque placeholder token stored in place of the raw card data.
///
/// The token is an AES-CMAC over the raw fields and the creation time, hex
/// encoded to 32 characters. It only has to look opaque and never equal the
/// raw input; it is not a payment-grade tokenization scheme.
pub fn derive_token(
    key: &TokenKey,
    number: &str,
    expiry: &str,
    cvv: &str,
    created_at_millis: i64,
) -> String {
    let mut mac = <Cmac<Aes128> as Mac>::new(key.as_bytes().into());
    mac.update(number.as_bytes());
    mac.update(expiry.as_bytes());
    mac.update(cvv.as_bytes());
    mac.update(&created_at_millis.to_be_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Generates a card id of the form `card_<unix millis>_<9 base36 chars>`.
///
/// Unique with high probability only; callers that need a hard guarantee
/// must check against the ids they have already issued.
pub fn generate_card_id(now_millis: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("card_{}_{}", now_millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const TEST_NUMBER: &str = "4111111111111111";
    const TEST_EXPIRY: &str = "12/29";
    const TEST_CVV: &str = "123";
    const TEST_MILLIS: i64 = 1_760_000_000_000;

    #[test]
    fn test_token_is_32_hex_chars_and_not_raw_input() {
        let key = TokenKey::from_hex(TEST_KEY).unwrap();
        let token = derive_token(&key, TEST_NUMBER, TEST_EXPIRY, TEST_CVV, TEST_MILLIS);

        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, TEST_NUMBER);
        assert!(!token.contains(TEST_NUMBER));
    }

    #[test]
    fn test_token_is_deterministic_per_key_and_time() {
        let key = TokenKey::from_hex(TEST_KEY).unwrap();
        let a = derive_token(&key, TEST_NUMBER, TEST_EXPIRY, TEST_CVV, TEST_MILLIS);
        let b = derive_token(&key, TEST_NUMBER, TEST_EXPIRY, TEST_CVV, TEST_MILLIS);
        assert_eq!(a, b);

        let later = derive_token(&key, TEST_NUMBER, TEST_EXPIRY, TEST_CVV, TEST_MILLIS + 1);
        assert_ne!(a, later);

        let other_key = TokenKey::generate();
        let c = derive_token(&other_key, TEST_NUMBER, TEST_EXPIRY, TEST_CVV, TEST_MILLIS);
        assert_ne!(a, c);
    }

    #[test]
    fn test_token_key_from_hex_rejects_bad_input() {
        assert!(TokenKey::from_hex("not hex").is_err());
        assert!(TokenKey::from_hex("00112233").is_err());
    }

    #[test]
    fn test_check_value_matches_aes_vector() {
        // RFC 4493 example key; AES(k, 0^128) = 7df76b0c1ab899b33e42f047b91b546f
        let key = TokenKey::from_hex(TEST_KEY).unwrap();
        assert_eq!(key.check_value(), "7df76b");
        assert_eq!(format!("{:?}", key), "TokenKey(kcv=7df76b)");
    }

    #[test]
    fn test_card_id_shape() {
        let id = generate_card_id(TEST_MILLIS);
        let suffix = id
            .strip_prefix(&format!("card_{}_", TEST_MILLIS))
            .expect("id keeps the millis prefix");
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }
}
