//! Order sub-type selectors read from ordering parameters

use serde::{Deserialize, Serialize};

/// Purchase sub-type chosen by the buyer (`accountType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    #[serde(rename = "newAccount")]
    NewAccount,
    #[serde(rename = "transfer")]
    Transfer,
    #[serde(rename = "splitBilling")]
    SplitBilling,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::NewAccount => "newAccount",
            AccountType::Transfer => "transfer",
            AccountType::SplitBilling => "splitBilling",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "newAccount" => Some(AccountType::NewAccount),
            "transfer" => Some(AccountType::Transfer),
            "splitBilling" => Some(AccountType::SplitBilling),
            _ => None,
        }
    }
}

/// Transfer variant (`transferType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferType {
    #[serde(rename = "transferWithOrganization")]
    WithOrganization,
    #[serde(rename = "transferWithoutOrganization")]
    WithoutOrganization,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::WithOrganization => "transferWithOrganization",
            TransferType::WithoutOrganization => "transferWithoutOrganization",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "transferWithOrganization" => Some(TransferType::WithOrganization),
            "transferWithoutOrganization" => Some(TransferType::WithoutOrganization),
            _ => None,
        }
    }
}

/// How terminated accounts leave the seller (`terminationType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TerminationType {
    /// Close the account at the provider
    #[default]
    CloseAccount,
    /// Detach the account from the organization, leaving it standalone
    UnlinkAccount,
}

impl TerminationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationType::CloseAccount => "CloseAccount",
            TerminationType::UnlinkAccount => "UnlinkAccount",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CloseAccount" => Some(TerminationType::CloseAccount),
            "UnlinkAccount" => Some(TerminationType::UnlinkAccount),
            _ => None,
        }
    }
}
