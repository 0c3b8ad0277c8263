//! The expense-report contract interface.
//!
//! Call and return encoding comes from the [`IExpenseReport`] bindings. The
//! compiled-in `abi/ExpenseReport.json` is checked against those bindings
//! before a contract is bound, so a mismatched artifact fails early instead
//! of sending calls to the wrong selectors.

use alloy_json_abi::JsonAbi;
use alloy_primitives::B256;
use alloy_sol_types::{sol, SolCall};

use crate::errors::{ClientError, Result};

/// The expense-report contract ABI, compiled in.
pub const EXPENSE_REPORT_ABI: &str = include_str!("../abi/ExpenseReport.json");

sol! {
    interface IExpenseReport {
        function submitReport(string ipfsHash, uint256 projectId, bytes32 reportHash, string metadata) external;
        function reportCount() external view returns (uint256);
        function getReportDetails(uint256 reportId) external view returns (
            string ipfsHash,
            uint256 projectId,
            bytes32 reportHash,
            string metadata,
            address reporter,
            bool audited
        );
        function hasRole(bytes32 role, address account) external view returns (bool);
        function getAddressesWithRole(bytes32 role) external view returns (address[]);
        function grantRole(bytes32 role, address account) external;
        function revokeRole(bytes32 role, address account) external;
    }
}

/// A 32-byte role identifier.
pub type RoleId = B256;

/// Encode a short string the way `formatBytes32String` does: UTF-8 bytes,
/// zero-padded on the right, with room left for a terminating zero byte.
pub fn format_bytes32(text: &str) -> Result<B256> {
    if text.len() > 31 {
        return Err(ClientError::Validation(format!(
            "string too long for bytes32: {text}"
        )));
    }
    Ok(B256::right_padding_from(text.as_bytes()))
}

/// Every function the client calls, with the selector its binding uses.
pub const REQUIRED_FUNCTIONS: &[(&str, [u8; 4])] = &[
    ("reportCount", IExpenseReport::reportCountCall::SELECTOR),
    ("getReportDetails", IExpenseReport::getReportDetailsCall::SELECTOR),
    ("submitReport", IExpenseReport::submitReportCall::SELECTOR),
    ("hasRole", IExpenseReport::hasRoleCall::SELECTOR),
    ("getAddressesWithRole", IExpenseReport::getAddressesWithRoleCall::SELECTOR),
    ("grantRole", IExpenseReport::grantRoleCall::SELECTOR),
    ("revokeRole", IExpenseReport::revokeRoleCall::SELECTOR),
];

/// Parse the compiled-in interface description.
pub fn expense_report_interface() -> Result<JsonAbi> {
    Ok(serde_json::from_str(EXPENSE_REPORT_ABI)?)
}

/// Fail unless `abi` declares every function in `required` with the
/// expected selector.
pub fn require_functions(abi: &JsonAbi, required: &[(&str, [u8; 4])]) -> Result<()> {
    for (name, selector) in required {
        let declared = abi
            .function(name)
            .ok_or_else(|| ClientError::Config(format!("interface has no function `{name}`")))?;
        if !declared.iter().any(|f| *f.selector() == *selector) {
            return Err(ClientError::Config(format!(
                "interface declares `{name}` with an unexpected signature"
            )));
        }
    }
    Ok(())
}
