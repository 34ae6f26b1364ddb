//! Point-in-time view of the bridge for status readers

use serde::Serialize;

use crate::uid::CardUid;

/// Snapshot of the bridge state, as polled by the UI shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatus {
    /// Whether card events are delivered to waiters
    pub enabled: bool,
    /// Whether a reader is bound
    pub reader_ready: bool,
    /// Name of the bound reader
    pub reader: Option<String>,
    /// Last identifier seen on the bound reader
    #[serde(rename = "lastUID")]
    pub last_uid: Option<CardUid>,
    /// Whether a card is on the bound reader
    pub card_present: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        let status = BridgeStatus {
            enabled: true,
            reader_ready: true,
            reader: Some("ACS ACR122U".into()),
            last_uid: Some("04A1B2C3".parse().unwrap()),
            card_present: false,
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({
                "enabled": true,
                "readerReady": true,
                "reader": "ACS ACR122U",
                "lastUID": "04A1B2C3",
                "cardPresent": false,
            })
        );
    }
}
