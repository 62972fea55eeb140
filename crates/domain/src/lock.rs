use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Account capability disabled by a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockedFeature {
    /// Creating e-vouchers.
    CreateEvoucher,
    /// Opening escrow.
    EscrowCreate,
    /// Off-chain transfers.
    OffchainSend,
    /// On-chain withdrawals.
    OnchainSend,
    /// Peer-to-peer trading.
    P2p,
    /// Ticket payments.
    PayTicket,
    /// Selling VNDC through a partner.
    SellVndcViaPartner,
    /// Selling VNDC through the system.
    SellVndcViaSystem,
    /// Transfers to Nami futures.
    NamiFuturesSend,
    /// Exchange trading.
    Exchange,
    /// Opening loans.
    LoanCreate,
    /// Repaying loans.
    LoanRepayment,
}

impl BlockedFeature {
    /// Returns the remote API value for this feature.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateEvoucher => "create_evoucher",
            Self::EscrowCreate => "escrow_create",
            Self::OffchainSend => "offchain_send",
            Self::OnchainSend => "onchain_send",
            Self::P2p => "p2p",
            Self::PayTicket => "pay_ticket",
            Self::SellVndcViaPartner => "sell_vndc_via_partner",
            Self::SellVndcViaSystem => "sell_vndc_via_system",
            Self::NamiFuturesSend => "nami_futures_send",
            Self::Exchange => "exchange",
            Self::LoanCreate => "loan_create",
            Self::LoanRepayment => "loan_repayment",
        }
    }

    /// Returns every feature a freeze blocks, in wire order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[BlockedFeature] = &[
            BlockedFeature::CreateEvoucher,
            BlockedFeature::EscrowCreate,
            BlockedFeature::OffchainSend,
            BlockedFeature::OnchainSend,
            BlockedFeature::P2p,
            BlockedFeature::PayTicket,
            BlockedFeature::SellVndcViaPartner,
            BlockedFeature::SellVndcViaSystem,
            BlockedFeature::NamiFuturesSend,
            BlockedFeature::Exchange,
            BlockedFeature::LoanCreate,
            BlockedFeature::LoanRepayment,
        ];

        ALL
    }

    /// Joins features into the pipe-delimited form the remote API stores.
    #[must_use]
    pub fn pipe_delimited(features: &[Self]) -> String {
        features
            .iter()
            .map(Self::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Optimistic-concurrency token returned by the lookup call.
///
/// Opaque: it is echoed back verbatim, whether the remote side sent a string
/// or a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(Value);

impl VersionToken {
    /// Wraps a JSON value; `null` is treated as no version.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }

        Some(Self(value))
    }

    /// Extracts `user.version` from a `data-for-edit` payload.
    #[must_use]
    pub fn from_edit_payload(payload: &Value) -> Option<Self> {
        payload
            .get("user")
            .and_then(|user| user.get("version"))
            .cloned()
            .and_then(Self::from_value)
    }

    /// Returns the raw JSON value.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl Display for VersionToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(value) => formatter.write_str(value),
            other => write!(formatter, "{other}"),
        }
    }
}

/// Custom values written by a lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockCustomValues {
    /// Pipe-delimited blocked capabilities.
    pub blocked_features: String,
    /// Operator comment explaining the lock.
    pub blocked_features_note: String,
    /// Frozen flag, string-encoded as the remote API stores it.
    pub frozen: String,
}

/// PUT body that freezes one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    /// Values written to the account.
    pub custom_values: LockCustomValues,
    /// Version the caller read; a stale value is rejected remotely.
    pub version: VersionToken,
}

impl LockRequest {
    /// Builds the freeze request blocking every known feature.
    #[must_use]
    pub fn freeze(comment: &str, version: VersionToken) -> Self {
        Self {
            custom_values: LockCustomValues {
                blocked_features: BlockedFeature::pipe_delimited(BlockedFeature::all()),
                blocked_features_note: comment.to_owned(),
                frozen: "true".to_owned(),
            },
            version,
        }
    }
}

/// Successful (2xx) response to a lock submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockReceipt {
    /// HTTP status code.
    pub status_code: u16,
    /// Raw response body.
    pub body: String,
}
