use std::fmt;

use crate::wallet::WalletError;

pub const CARD_NUMBER_LEN: usize = 16;
pub const EXPIRY_LEN: usize = 5;
pub const CVV_LEN: usize = 3;

/// Raw card input that passed the length and format checks.
///
/// Only lives for the duration of a `create` call.
#[derive(PartialEq)]
pub struct ValidatedCard {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
}

impl ValidatedCard {
    pub fn last4(&self) -> &str {
        &self.number[CARD_NUMBER_LEN - 4..]
    }
}

// Masked so raw card data never reaches logs.
impl fmt::Debug for ValidatedCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatedCard(**** {})", self.last4())
    }
}

/// Re-checks form input before the store accepts it.
///
/// # Arguments
/// * `raw_number` - Card number, spaces allowed (the form groups digits by 4)
/// * `raw_expiry` - Expiry as `MM/YY`
/// * `raw_cvv` - 3-digit CVV
pub fn validate_card_input(
    raw_number: &str,
    raw_expiry: &str,
    raw_cvv: &str,
) -> Result<ValidatedCard, WalletError> {
    let number: String = raw_number.chars().filter(|c| !c.is_whitespace()).collect();

    let len = number.chars().count();
    if len != CARD_NUMBER_LEN {
        return Err(WalletError::validation(
            "number",
            format!("must be {} digits, got {}", CARD_NUMBER_LEN, len),
        ));
    }
    // ASCII digits only, so byte offsets match char offsets from here on
    if !all_digits(&number) {
        return Err(WalletError::validation("number", "must contain only digits"));
    }

    validate_expiry(raw_expiry)?;

    if raw_cvv.len() != CVV_LEN || !all_digits(raw_cvv) {
        return Err(WalletError::validation(
            "cvv",
            format!("must be {} digits", CVV_LEN),
        ));
    }

    Ok(ValidatedCard {
        number,
        expiry: raw_expiry.to_string(),
        cvv: raw_cvv.to_string(),
    })
}

fn validate_expiry(expiry: &str) -> Result<(), WalletError> {
    let bytes = expiry.as_bytes();
    if bytes.len() != EXPIRY_LEN
        || bytes[2] != b'/'
        || !all_digits(&expiry[..2])
        || !all_digits(&expiry[3..])
    {
        return Err(WalletError::validation("expiry", "must be in MM/YY format"));
    }

    let month: u8 = expiry[..2]
        .parse()
        .map_err(|_| WalletError::validation("expiry", "invalid month"))?;
    if !(1..=12).contains(&month) {
        return Err(WalletError::validation("expiry", "month must be 01-12"));
    }

    Ok(())
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}
