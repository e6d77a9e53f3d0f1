//! Buyer-facing parameter error catalogue

use crate::ParameterError;

pub const ERR_EMAIL_ALREADY_EXISTS: &str = "AWS001";
pub const ERR_INVALID_EMAIL: &str = "AWS002";
pub const ERR_MISSING_PARAMETER: &str = "AWS003";
pub const ERR_TOO_MANY_ACCOUNTS: &str = "AWS004";
pub const ERR_INVALID_ACCOUNT_ID: &str = "AWS005";
pub const ERR_INVITATION_FAILED: &str = "AWS006";
pub const ERR_INVITATIONS_PENDING: &str = "AWS007";
pub const ERR_TERMINATION_PREREQUISITES: &str = "AWS008";
pub const ERR_ACCOUNTS_NOT_TRANSFERRED: &str = "AWS009";
pub const ERR_INVALID_MASTER_PAYER_ID: &str = "AWS010";

impl ParameterError {
    pub fn email_already_exists(email: &str) -> Self {
        Self::new(
            ERR_EMAIL_ALREADY_EXISTS,
            format!("The email {email} is already used by another cloud account."),
        )
    }

    pub fn invalid_email(email: &str) -> Self {
        Self::new(
            ERR_INVALID_EMAIL,
            format!("The email {email} was rejected by the cloud provider."),
        )
    }

    pub fn missing_parameter(title: &str) -> Self {
        Self::new(ERR_MISSING_PARAMETER, format!("{title} is required."))
    }

    pub fn too_many_accounts(count: usize, max: usize) -> Self {
        Self::new(
            ERR_TOO_MANY_ACCOUNTS,
            format!("{count} accounts were provided; at most {max} can be transferred per order."),
        )
    }

    pub fn invalid_account_ids(ids: &[String]) -> Self {
        Self::new(
            ERR_INVALID_ACCOUNT_ID,
            format!(
                "Account ids must be 12 digits. Invalid: {}.",
                ids.join(", ")
            ),
        )
    }

    pub fn invitation_failed(ids: &[String]) -> Self {
        Self::new(
            ERR_INVITATION_FAILED,
            format!("Invitations could not be sent to: {}.", ids.join(", ")),
        )
    }

    pub fn invitations_pending(ids: &[String]) -> Self {
        Self::new(
            ERR_INVITATIONS_PENDING,
            format!(
                "Waiting for the following accounts to accept the invitation: {}.",
                ids.join(", ")
            ),
        )
    }

    pub fn termination_prerequisites(account_id: &str) -> Self {
        Self::new(
            ERR_TERMINATION_PREREQUISITES,
            format!(
                "Account {account_id} cannot be terminated until its standalone prerequisites are completed."
            ),
        )
    }

    pub fn accounts_not_transferred(ids: &[String]) -> Self {
        Self::new(
            ERR_ACCOUNTS_NOT_TRANSFERRED,
            format!(
                "The following accounts are not active in the transferred organization: {}.",
                ids.join(", ")
            ),
        )
    }

    pub fn invalid_master_payer_id(value: &str) -> Self {
        Self::new(
            ERR_INVALID_MASTER_PAYER_ID,
            format!("Master payer id {value} must be 12 digits."),
        )
    }
}

/// Whether a value looks like a cloud account id (12 decimal digits)
pub fn is_valid_account_id(value: &str) -> bool {
    value.len() == 12 && value.bytes().all(|b| b.is_ascii_digit())
}
