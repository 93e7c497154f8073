use serde::{Deserialize, Serialize};

/// Sender used for transactions the node creates for itself (mining rewards).
pub const REWARD_SENDER: &str = "0";

/// A value transfer waiting in the pending queue or sealed into a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    /// Free-form note attached by the submitter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
        message: Option<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            message,
        }
    }

    /// Reward paid by the network to the node that sealed a block.
    pub fn reward(recipient: impl Into<String>, amount: u64) -> Self {
        Self::new(REWARD_SENDER, recipient, amount, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_omitted_when_absent() {
        let tx = Transaction::new("alice", "bob", 5, None);
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("message").is_none());

        let back: Transaction =
            serde_json::from_str(r#"{"sender":"a","recipient":"b","amount":1}"#).unwrap();
        assert_eq!(back.message, None);
    }

    #[test]
    fn reward_comes_from_the_network() {
        let tx = Transaction::reward("node-1", 1);
        assert_eq!(tx.sender, REWARD_SENDER);
        assert_eq!(tx.recipient, "node-1");
    }
}
