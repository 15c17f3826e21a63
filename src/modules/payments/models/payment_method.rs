// Payment-method vocabularies
//
// The dashboard speaks in wallet/brand names (PHONEPE, PAYTM, UPI, ...) while
// the ledger stores settlement channels (online, cash, ...). Both sides are
// closed enums and the mapping between them is an exhaustive match, so adding
// a variant on either side fails to compile until the table is updated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Settlement channel as stored on each installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Online,
    Card,
    BankTransfer,
    Cheque,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Online,
        PaymentMethod::Card,
        PaymentMethod::BankTransfer,
        PaymentMethod::Cheque,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Online => "online",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
        }
    }

    /// Parse a stored value; unknown values fall back to cash
    pub fn from_storage(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "cash" => Self::Cash,
            "online" => Self::Online,
            "card" => Self::Card,
            "bank_transfer" => Self::BankTransfer,
            "cheque" => Self::Cheque,
            _ => Self::Cash,
        }
    }

    /// Canonical dashboard label for this channel
    pub fn to_ui(self) -> UiPaymentMethod {
        UiPaymentMethod::from(self)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for PaymentMethod {
    fn from(value: String) -> Self {
        Self::from_storage(&value)
    }
}

/// Payment method as presented to (and submitted by) the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiPaymentMethod {
    Cash,
    Phonepe,
    Paytm,
    Upi,
    Card,
    BankTransfer,
    Cheque,
}

impl UiPaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Phonepe => "PHONEPE",
            Self::Paytm => "PAYTM",
            Self::Upi => "UPI",
            Self::Card => "CARD",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Cheque => "CHEQUE",
        }
    }

    /// Parse a dashboard value; unknown values fall back to CASH
    pub fn parse(value: &str) -> Self {
        Self::try_parse(value).unwrap_or(Self::Cash)
    }

    /// Parse a dashboard value, rejecting anything outside the vocabulary
    pub fn try_parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "CASH" => Some(Self::Cash),
            "PHONEPE" => Some(Self::Phonepe),
            "PAYTM" => Some(Self::Paytm),
            "UPI" => Some(Self::Upi),
            "CARD" => Some(Self::Card),
            "BANK_TRANSFER" => Some(Self::BankTransfer),
            "CHEQUE" => Some(Self::Cheque),
            _ => None,
        }
    }

    /// Storage channel this dashboard value settles through
    pub fn to_storage(self) -> PaymentMethod {
        PaymentMethod::from(self)
    }
}

impl fmt::Display for UiPaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<UiPaymentMethod> for PaymentMethod {
    fn from(value: UiPaymentMethod) -> Self {
        match value {
            UiPaymentMethod::Cash => PaymentMethod::Cash,
            UiPaymentMethod::Phonepe | UiPaymentMethod::Paytm | UiPaymentMethod::Upi => {
                PaymentMethod::Online
            }
            UiPaymentMethod::Card => PaymentMethod::Card,
            UiPaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
            UiPaymentMethod::Cheque => PaymentMethod::Cheque,
        }
    }
}

impl From<PaymentMethod> for UiPaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Cash => UiPaymentMethod::Cash,
            PaymentMethod::Online => UiPaymentMethod::Upi,
            PaymentMethod::Card => UiPaymentMethod::Card,
            PaymentMethod::BankTransfer => UiPaymentMethod::BankTransfer,
            PaymentMethod::Cheque => UiPaymentMethod::Cheque,
        }
    }
}
