//! Role-based access control operations.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::abi::RoleId;
use crate::address::{parse_address, Address};
use crate::contract::TxReceipt;
use crate::errors::{ClientError, Result};
use crate::session::SessionState;

/// The fixed set of roles the contract recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "AUDITOR_ROLE")]
    Auditor,
    #[serde(rename = "ADMIN_ROLE")]
    Admin,
    #[serde(rename = "CONTRACTOR_ROLE")]
    Contractor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Auditor, Role::Admin, Role::Contractor];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Auditor => "AUDITOR_ROLE",
            Self::Admin => "ADMIN_ROLE",
            Self::Contractor => "CONTRACTOR_ROLE",
        }
    }

    /// The name in `formatBytes32String` encoding.
    pub fn id(&self) -> RoleId {
        B256::right_padding_from(self.name().as_bytes())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| ClientError::Validation(format!("Unknown role: {s}")))
    }
}

fn parse_account(account: &str) -> Result<Address> {
    if account.trim().is_empty() {
        return Err(ClientError::Validation(
            "Please select a role and enter an account address.".to_string(),
        ));
    }
    parse_address(account)
}

pub async fn has_role(session: &SessionState, role: Role, account: &str) -> Result<bool> {
    let account = parse_account(account)?;
    let handle = session.current_handle()?;
    handle.contract().has_role(role.id(), account).await
}

/// Every role in [`Role::ALL`] that `account` currently holds.
pub async fn roles_of(session: &SessionState, account: &str) -> Result<Vec<Role>> {
    let account = parse_account(account)?;
    let handle = session.current_handle()?;
    let mut held = Vec::new();
    for role in Role::ALL {
        if handle.contract().has_role(role.id(), account).await? {
            held.push(role);
        }
    }
    Ok(held)
}

pub async fn list_holders_of_role(session: &SessionState, role: Role) -> Result<Vec<Address>> {
    let handle = session.current_handle()?;
    handle.contract().get_addresses_with_role(role.id()).await
}

pub async fn grant_role(session: &SessionState, role: Role, account: &str) -> Result<TxReceipt> {
    let account = parse_account(account)?;
    let handle = session.current_handle()?;
    let contract = handle.contract();

    let result = async {
        let tx = contract.grant_role(role.id(), account).await?;
        contract.wait_for_receipt(tx).await
    }
    .await;

    match &result {
        Ok(_) => info!("Role {role} assigned to {account}"),
        Err(e) => error!("Failed to assign role {role} to {account}: {e}"),
    }
    result
}

pub async fn revoke_role(session: &SessionState, role: Role, account: &str) -> Result<TxReceipt> {
    let account = parse_account(account)?;
    let handle = session.current_handle()?;
    let contract = handle.contract();

    let result = async {
        let tx = contract.revoke_role(role.id(), account).await?;
        contract.wait_for_receipt(tx).await
    }
    .await;

    match &result {
        Ok(_) => info!("Role {role} revoked from {account}"),
        Err(e) => error!("Failed to revoke role {role} from {account}: {e}"),
    }
    result
}
