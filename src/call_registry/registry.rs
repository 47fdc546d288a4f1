//! Active Call Registry
//!
//! Verwaltet die aktuell der nativen Call-UI gemeldeten Anrufe
//! (analog zur CallKit/ConnectionService-Buchführung) und löst die
//! passenden Bridge-Events aus wenn der Benutzer reagiert.

use super::payload::{CallUpdatePayload, IncomingCallPayload};
use crate::call_bridge::CallEventBridge;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug)]
pub enum CallRegistryError {
    #[error("No call with local id {0}")]
    UnknownCall(Uuid),
}

// ============================================================================
// ACTIVE CALL
// ============================================================================

/// Ein der nativen Call-UI gemeldeter Anruf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveCall {
    pub local_id: Uuid,
    pub server_url: String,
    pub channel_id: String,
    pub channel_name: String,
    pub conference_id: String,
    pub conference_jwt: String,
    pub conference_url: Option<String>,
    pub joined: bool,
    pub created_at: DateTime<Utc>,
}

impl ActiveCall {
    /// Handle unter dem die native UI den Anruf anzeigt
    pub fn remote_handle(&self) -> String {
        format!(
            "{}/channels/{}/conference",
            self.server_url, self.channel_id
        )
    }
}

// ============================================================================
// CALL REGISTRY
// ============================================================================

/// Registry der aktiven Anrufe (thread-safe durch Mutex)
pub struct CallRegistry {
    bridge: Arc<CallEventBridge>,
    calls: Mutex<HashMap<Uuid, ActiveCall>>,
}

impl CallRegistry {
    /// Erstellt eine neue Registry die Events über die Bridge meldet
    pub fn new(bridge: Arc<CallEventBridge>) -> Self {
        Self {
            bridge,
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Meldet einen eingehenden Anruf und gibt seine lokale ID zurück
    ///
    /// `server_url` ist die bereits aufgelöste URL zum `server_id`
    /// des Payloads.
    pub fn report_incoming(&self, server_url: String, payload: IncomingCallPayload) -> Uuid {
        let call = ActiveCall {
            local_id: Uuid::new_v4(),
            server_url,
            channel_id: payload.channel_id,
            channel_name: payload.channel_name,
            conference_id: payload.conference_id,
            conference_jwt: payload.conference_jwt,
            conference_url: payload.conference_url,
            joined: false,
            created_at: Utc::now(),
        };

        tracing::info!(
            "Reporting incoming call {} for conference {}",
            call.local_id,
            call.conference_id
        );

        let local_id = call.local_id;
        self.calls.lock().insert(local_id, call);
        local_id
    }

    /// Der Benutzer hat den Anruf in der nativen UI angenommen
    pub fn answer_call(&self, local_id: Uuid) -> Result<(), CallRegistryError> {
        let (server_url, channel_id) = {
            let mut calls = self.calls.lock();
            let call = calls
                .get_mut(&local_id)
                .ok_or(CallRegistryError::UnknownCall(local_id))?;
            call.joined = true;
            (call.server_url.clone(), call.channel_id.clone())
        };

        tracing::info!("Call {} answered", local_id);
        self.bridge.emit_answered(server_url, channel_id);
        Ok(())
    }

    /// Der Benutzer hat den Anruf in der nativen UI abgelehnt
    pub fn decline_call(&self, local_id: Uuid) -> Result<(), CallRegistryError> {
        let call = self
            .calls
            .lock()
            .remove(&local_id)
            .ok_or(CallRegistryError::UnknownCall(local_id))?;

        tracing::info!("Call {} declined", local_id);
        self.bridge.emit_declined(call.server_url, call.conference_id);
        Ok(())
    }

    /// Der Initiator hat aufgelegt bevor der Anruf angenommen wurde
    ///
    /// Kein Bridge-Event: das Runtime hat den Anruf nie gesehen.
    pub fn handle_call_cancelled(&self, update: &CallUpdatePayload) {
        let mut calls = self.calls.lock();
        match Self::find_id(&calls, &update.conference_id, false) {
            Some(local_id) => {
                calls.remove(&local_id);
                tracing::info!("Call cancelled for conference {}", update.conference_id);
            }
            None => {
                tracing::debug!("Cancel for unknown conference {}", update.conference_id);
            }
        }
    }

    /// Der Anruf wurde auf einem anderen Gerät angenommen
    ///
    /// Entfernt nur Anrufe die auf diesem Gerät nicht beigetreten sind.
    pub fn handle_joined_elsewhere(&self, update: &CallUpdatePayload) {
        let mut calls = self.calls.lock();
        if let Some(local_id) = Self::find_id(&calls, &update.conference_id, true) {
            calls.remove(&local_id);
            tracing::info!(
                "Call for conference {} answered elsewhere",
                update.conference_id
            );
        }
    }

    /// Die Konferenz wurde beendet, der Anruf verschwindet aus der UI
    pub fn call_ended(&self, conference_id: &str) {
        let mut calls = self.calls.lock();
        if let Some(local_id) = Self::find_id(&calls, conference_id, false) {
            calls.remove(&local_id);
            tracing::info!("Call ended for conference {}", conference_id);
        }
    }

    /// Gibt einen Anruf anhand seiner lokalen ID zurück
    pub fn get(&self, local_id: Uuid) -> Option<ActiveCall> {
        self.calls.lock().get(&local_id).cloned()
    }

    /// Gibt einen Anruf anhand seiner Konferenz-ID zurück
    pub fn find_by_conference(&self, conference_id: &str) -> Option<ActiveCall> {
        self.calls
            .lock()
            .values()
            .find(|c| c.conference_id == conference_id)
            .cloned()
    }

    /// Gibt alle aktiven Anrufe zurück (älteste zuerst)
    pub fn active_calls(&self) -> Vec<ActiveCall> {
        let mut calls: Vec<ActiveCall> = self.calls.lock().values().cloned().collect();
        calls.sort_by_key(|c| c.created_at);
        calls
    }

    /// Entfernt alle Anrufe (Prozess-Shutdown)
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    // ========================================================================
    // PRIVATE METHODS
    // ========================================================================

    /// Sucht die lokale ID zu einer Konferenz
    ///
    /// Mit `only_not_joined` werden beigetretene Anrufe übersprungen.
    fn find_id(
        calls: &HashMap<Uuid, ActiveCall>,
        conference_id: &str,
        only_not_joined: bool,
    ) -> Option<Uuid> {
        calls
            .values()
            .find(|c| c.conference_id == conference_id && (!only_not_joined || !c.joined))
            .map(|c| c.local_id)
    }
}

impl std::fmt::Debug for CallRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallRegistry")
            .field("active_calls", &self.calls.lock().len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_bridge::CallEvent;

    fn payload() -> IncomingCallPayload {
        IncomingCallPayload {
            server_id: "srv-1".to_string(),
            channel_id: "chan-42".to_string(),
            conference_id: "conf-7".to_string(),
            channel_name: "Town Square".to_string(),
            conference_jwt: "jwt-token".to_string(),
            conference_url: None,
        }
    }

    fn registry() -> (Arc<CallEventBridge>, CallRegistry) {
        let bridge = Arc::new(CallEventBridge::new());
        let registry = CallRegistry::new(Arc::clone(&bridge));
        (bridge, registry)
    }

    #[tokio::test]
    async fn test_answer_call_emits_answered() {
        let (bridge, registry) = registry();
        let (_sub, mut rx) = bridge.subscribe_channel();

        let local_id = registry.report_incoming("https://chat.example".to_string(), payload());
        registry.answer_call(local_id).unwrap();
        bridge.flush().await;

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            CallEvent::Answered {
                server_url: "https://chat.example".to_string(),
                channel_id: "chan-42".to_string(),
            }
        );
        assert!(registry.get(local_id).unwrap().joined);
    }

    #[tokio::test]
    async fn test_decline_call_emits_declined_and_removes() {
        let (bridge, registry) = registry();
        let (_sub, mut rx) = bridge.subscribe_channel();

        let local_id = registry.report_incoming("https://chat.example".to_string(), payload());
        registry.decline_call(local_id).unwrap();
        bridge.flush().await;

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            CallEvent::Declined {
                server_url: "https://chat.example".to_string(),
                conference_id: "conf-7".to_string(),
            }
        );
        assert!(registry.get(local_id).is_none());
    }

    #[tokio::test]
    async fn test_unknown_call_is_an_error() {
        let (_bridge, registry) = registry();

        let unknown = Uuid::new_v4();
        assert!(matches!(
            registry.answer_call(unknown),
            Err(CallRegistryError::UnknownCall(_))
        ));
        assert!(matches!(
            registry.decline_call(unknown),
            Err(CallRegistryError::UnknownCall(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_call_is_removed_without_event() {
        let (bridge, registry) = registry();
        let (_sub, mut rx) = bridge.subscribe_channel();

        registry.report_incoming("https://chat.example".to_string(), payload());
        registry.handle_call_cancelled(&CallUpdatePayload {
            conference_id: "conf-7".to_string(),
        });
        bridge.flush().await;

        assert!(registry.find_by_conference("conf-7").is_none());
        assert!(rx.try_recv().is_err());

        // Unbekannte Konferenz ist ein no-op
        registry.handle_call_cancelled(&CallUpdatePayload {
            conference_id: "conf-404".to_string(),
        });
    }

    #[tokio::test]
    async fn test_joined_elsewhere_skips_joined_calls() {
        let (_bridge, registry) = registry();

        let local_id = registry.report_incoming("https://chat.example".to_string(), payload());
        registry.answer_call(local_id).unwrap();

        // Auf diesem Gerät beigetreten: bleibt bestehen
        registry.handle_joined_elsewhere(&CallUpdatePayload {
            conference_id: "conf-7".to_string(),
        });
        assert!(registry.get(local_id).is_some());

        // Nicht beigetretene Anrufe verschwinden
        let mut second = payload();
        second.conference_id = "conf-8".to_string();
        registry.report_incoming("https://chat.example".to_string(), second);
        registry.handle_joined_elsewhere(&CallUpdatePayload {
            conference_id: "conf-8".to_string(),
        });
        assert!(registry.find_by_conference("conf-8").is_none());
    }

    #[tokio::test]
    async fn test_call_ended_removes_joined_call() {
        let (_bridge, registry) = registry();

        let local_id = registry.report_incoming("https://chat.example".to_string(), payload());
        registry.answer_call(local_id).unwrap();
        registry.call_ended("conf-7");

        assert!(registry.get(local_id).is_none());
    }

    #[tokio::test]
    async fn test_remote_handle_format() {
        let (_bridge, registry) = registry();

        let local_id = registry.report_incoming("https://chat.example".to_string(), payload());
        let call = registry.get(local_id).unwrap();

        assert_eq!(
            call.remote_handle(),
            "https://chat.example/channels/chan-42/conference"
        );
    }

    #[tokio::test]
    async fn test_active_calls_oldest_first() {
        let (_bridge, registry) = registry();

        registry.report_incoming("https://chat.example".to_string(), payload());
        let mut second = payload();
        second.conference_id = "conf-8".to_string();
        registry.report_incoming("https://chat.example".to_string(), second);

        let calls = registry.active_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].created_at <= calls[1].created_at);

        registry.clear();
        assert!(registry.active_calls().is_empty());
    }
}
