use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("card not found: {0}")]
    NotFound(String),

    #[error("no card is selected")]
    NoCurrentCard,

    #[error("no action menu is open")]
    NoActionMenu,

    #[error("corrupt card data: {0}")]
    CorruptData(String),
}

impl WalletError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
