//! reqwest implementation of [`LedgerClient`].

use std::time::Duration;

use async_trait::async_trait;
use relay_crypto::parse_account;
use relay_ledger::{AccountState, PendingTransaction, SignedBlock};
use relay_types::{Account, BlockHash, Raw};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::client::{HistoryEntry, LedgerClient};
use crate::error::LedgerError;
use crate::messages::{
    AccountInfoReply, HistoryReply, ProcessReply, ReceivableReply, ACCOUNT_NOT_FOUND,
};

/// Connect and whole-request timeouts for node calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for NodeTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

/// HTTP client for a ledger node's JSON API.
///
/// Every call is a POST of a JSON object carrying an `action` field.
#[derive(Clone)]
pub struct HttpLedgerClient {
    http: reqwest::Client,
    node_url: String,
    default_representative: Account,
}

impl HttpLedgerClient {
    /// Create a client targeting the given node URL (e.g. `http://127.0.0.1:7076`).
    pub fn new(
        node_url: impl Into<String>,
        default_representative: Account,
        timeouts: NodeTimeouts,
    ) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            node_url: node_url.into(),
            default_representative,
        })
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// POST `params` with `action` added. A node-level `error` reply comes
    /// back as `Ok(Err(message))` for the caller to interpret.
    async fn call(
        &self,
        action: &str,
        params: Value,
    ) -> Result<Result<Value, String>, LedgerError> {
        let mut body = params;
        body.as_object_mut()
            .ok_or_else(|| LedgerError::MalformedResponse("params must be a JSON object".into()))?
            .insert("action".to_string(), json!(action));

        let response = self
            .http
            .post(&self.node_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("{action} request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(LedgerError::Transport(format!(
                "{action}: node returned HTTP {}",
                response.status()
            )));
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::MalformedResponse(format!("{action}: {e}")))?;

        match reply.get("error").and_then(Value::as_str) {
            Some(err) => Ok(Err(err.to_string())),
            None => Ok(Ok(reply)),
        }
    }

    /// Like [`Self::call`], with node errors folded into [`LedgerError::Node`].
    async fn query<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Value,
    ) -> Result<T, LedgerError> {
        let reply = self.call(action, params).await?.map_err(LedgerError::Node)?;
        decode(action, reply)
    }

    fn state_from_info(
        &self,
        account: &Account,
        info: AccountInfoReply,
    ) -> Result<AccountState, LedgerError> {
        let representative = match info.representative {
            Some(rep) => parse_account(rep.as_str())
                .map_err(|e| LedgerError::MalformedResponse(format!("account_info: {e}")))?,
            None => self.default_representative.clone(),
        };
        Ok(AccountState {
            account: account.clone(),
            frontier: info.frontier,
            balance: info.balance,
            representative,
        })
    }
}

fn decode<T: DeserializeOwned>(action: &str, reply: Value) -> Result<T, LedgerError> {
    serde_json::from_value(reply)
        .map_err(|e| LedgerError::MalformedResponse(format!("{action}: {e}")))
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn get_account_state(&self, account: &Account) -> Result<AccountState, LedgerError> {
        let reply = self
            .call(
                "account_info",
                json!({ "account": account, "representative": "true" }),
            )
            .await?;
        match reply {
            Ok(value) => self.state_from_info(account, decode("account_info", value)?),
            Err(err) if err == ACCOUNT_NOT_FOUND => {
                tracing::debug!(account = %account, "account not opened yet");
                Ok(AccountState::unopened(
                    account.clone(),
                    self.default_representative.clone(),
                ))
            }
            Err(err) => Err(LedgerError::Node(err)),
        }
    }

    async fn receivable(
        &self,
        account: &Account,
        min_amount: Raw,
        count: usize,
    ) -> Result<Vec<PendingTransaction>, LedgerError> {
        let reply: ReceivableReply = self
            .query(
                "receivable",
                json!({
                    "account": account,
                    "count": count.to_string(),
                    "threshold": min_amount,
                    "source": "true",
                }),
            )
            .await?;
        Ok(reply.into_pending())
    }

    async fn submit(&self, block: &SignedBlock) -> Result<BlockHash, LedgerError> {
        let reply = self
            .call(
                "process",
                json!({
                    "json_block": "true",
                    "subtype": block.subtype.as_str(),
                    "block": block.block,
                }),
            )
            .await?
            .map_err(|reason| {
                tracing::warn!(hash = %block.hash, %reason, "node rejected block");
                LedgerError::SubmissionRejected(reason)
            })?;
        let processed: ProcessReply = decode("process", reply)?;
        if processed.hash != block.hash {
            return Err(LedgerError::MalformedResponse(format!(
                "process: node reported hash {} for block {}",
                processed.hash, block.hash
            )));
        }
        Ok(processed.hash)
    }

    async fn get_history(
        &self,
        account: &Account,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        let reply: HistoryReply = self
            .query(
                "account_history",
                json!({ "account": account, "count": limit.to_string() }),
            )
            .await?;
        Ok(reply.into_entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_crypto::derive_address;
    use relay_ledger::default_representative;
    use relay_types::PublicKey;

    fn client() -> HttpLedgerClient {
        HttpLedgerClient::new(
            "http://127.0.0.1:9",
            default_representative(),
            NodeTimeouts {
                connect: Duration::from_millis(200),
                request: Duration::from_millis(200),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn unreachable_node_is_transport_error() {
        let account = derive_address(&PublicKey([1u8; 32]));
        let err = client().get_account_state(&account).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transport(_)));
    }

    #[test]
    fn missing_representative_falls_back() {
        let account = derive_address(&PublicKey([1u8; 32]));
        let info: AccountInfoReply = serde_json::from_value(json!({
            "frontier": "AB".repeat(32),
            "balance": "5",
        }))
        .unwrap();
        let state = client().state_from_info(&account, info).unwrap();
        assert_eq!(state.representative, default_representative());
        assert_eq!(state.balance, Raw::new(5));
        assert!(!state.is_unopened());
    }

    #[test]
    fn legacy_representative_is_normalised() {
        let account = derive_address(&PublicKey([1u8; 32]));
        let rep = derive_address(&PublicKey([2u8; 32]));
        let legacy = rep.as_str().replacen("nano_", "xrb_", 1);
        let info: AccountInfoReply = serde_json::from_value(json!({
            "frontier": "AB".repeat(32),
            "balance": "5",
            "representative": legacy,
        }))
        .unwrap();
        assert_eq!(client().state_from_info(&account, info).unwrap().representative, rep);
    }

    #[test]
    fn bad_representative_is_malformed() {
        let account = derive_address(&PublicKey([1u8; 32]));
        let info: AccountInfoReply = serde_json::from_value(json!({
            "frontier": "AB".repeat(32),
            "balance": "5",
            "representative": "nano_nope",
        }))
        .unwrap();
        assert!(matches!(
            client().state_from_info(&account, info),
            Err(LedgerError::MalformedResponse(_))
        ));
    }

    #[test]
    fn undecodable_reply_is_malformed() {
        let err = decode::<ProcessReply>("process", json!({ "hash": 12 })).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedResponse(_)));
    }
}
