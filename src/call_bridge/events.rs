//! Call Event Typen
//!
//! Diese Strukturen spiegeln die Event-Payloads wider, die der
//! JavaScript-Event-Handler der App erwartet, und ermöglichen
//! typsichere Zustellung.

use serde::{Deserialize, Serialize};

// ============================================================================
// EVENT NAMES
// ============================================================================

/// Event-Name unter dem das Runtime angenommene Anrufe empfängt
pub const CALL_ANSWERED: &str = "CallAnswered";

/// Event-Name unter dem das Runtime abgelehnte Anrufe empfängt
pub const CALL_DECLINED: &str = "CallDeclined";

// ============================================================================
// CALL EVENT
// ============================================================================

/// Events die von der nativen Call-Integration ausgelöst werden
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// Anruf wurde in der nativen UI angenommen
    Answered { server_url: String, channel_id: String },

    /// Anruf wurde in der nativen UI abgelehnt
    Declined {
        server_url: String,
        conference_id: String,
    },
}

impl CallEvent {
    /// Gibt den Event-Namen für das Runtime zurück
    pub fn name(&self) -> &'static str {
        match self {
            CallEvent::Answered { .. } => CALL_ANSWERED,
            CallEvent::Declined { .. } => CALL_DECLINED,
        }
    }

    /// Gibt die Server-URL zurück
    pub fn server_url(&self) -> &str {
        match self {
            CallEvent::Answered { server_url, .. } | CallEvent::Declined { server_url, .. } => {
                server_url
            }
        }
    }

    /// Prüft ob alle Pflicht-Identifier nicht-leer sind
    pub fn is_well_formed(&self) -> bool {
        match self {
            CallEvent::Answered {
                server_url,
                channel_id,
            } => !server_url.is_empty() && !channel_id.is_empty(),
            CallEvent::Declined {
                server_url,
                conference_id,
            } => !server_url.is_empty() && !conference_id.is_empty(),
        }
    }

    /// Gibt den JSON-Payload für das Runtime zurück
    pub fn payload(&self) -> serde_json::Value {
        match self {
            CallEvent::Answered {
                server_url,
                channel_id,
            } => serde_json::to_value(CallAnsweredPayload {
                server_url: server_url.clone(),
                channel_id: channel_id.clone(),
            })
            .unwrap_or_default(),
            CallEvent::Declined {
                server_url,
                conference_id,
            } => serde_json::to_value(CallDeclinedPayload {
                server_url: server_url.clone(),
                conference_id: conference_id.clone(),
            })
            .unwrap_or_default(),
        }
    }
}

// ============================================================================
// RUNTIME PAYLOADS
// ============================================================================

/// Payload für `CallAnswered`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAnsweredPayload {
    #[serde(rename = "serverUrl")]
    pub server_url: String,
    #[serde(rename = "channelId")]
    pub channel_id: String,
}

/// Payload für `CallDeclined`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallDeclinedPayload {
    #[serde(rename = "serverUrl")]
    pub server_url: String,
    #[serde(rename = "conferenceId")]
    pub conference_id: String,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let answered = CallEvent::Answered {
            server_url: "https://chat.example".to_string(),
            channel_id: "chan-42".to_string(),
        };
        let declined = CallEvent::Declined {
            server_url: "https://chat.example".to_string(),
            conference_id: "conf-7".to_string(),
        };

        assert_eq!(answered.name(), CALL_ANSWERED);
        assert_eq!(declined.name(), CALL_DECLINED);
    }

    #[test]
    fn test_well_formed() {
        let event = CallEvent::Answered {
            server_url: "https://chat.example".to_string(),
            channel_id: "chan-42".to_string(),
        };
        assert!(event.is_well_formed());

        let empty_channel = CallEvent::Answered {
            server_url: "https://chat.example".to_string(),
            channel_id: String::new(),
        };
        assert!(!empty_channel.is_well_formed());

        let empty_server = CallEvent::Declined {
            server_url: String::new(),
            conference_id: "conf-7".to_string(),
        };
        assert!(!empty_server.is_well_formed());
    }

    #[test]
    fn test_payload_keys_are_camel_case() {
        let event = CallEvent::Answered {
            server_url: "https://chat.example".to_string(),
            channel_id: "chan-42".to_string(),
        };
        let payload = event.payload();

        assert_eq!(payload["serverUrl"], "https://chat.example");
        assert_eq!(payload["channelId"], "chan-42");

        let event = CallEvent::Declined {
            server_url: "https://chat.example".to_string(),
            conference_id: "conf-7".to_string(),
        };
        let payload = event.payload();

        assert_eq!(payload["serverUrl"], "https://chat.example");
        assert_eq!(payload["conferenceId"], "conf-7");
    }
}
