//! Payload-Typen für Call-Push-Benachrichtigungen
//!
//! Diese Strukturen spiegeln die Push-Payloads des Servers wider
//! (snake_case Keys wie auf der Leitung) und ermöglichen typsichere
//! Verarbeitung bevor ein Anruf der nativen UI gemeldet wird.

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Invalid call notification: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("Missing or empty field: {0}")]
    MissingField(&'static str),
}

// ============================================================================
// INCOMING CALL PAYLOAD
// ============================================================================

/// VoIP-Push Payload für einen eingehenden Anruf
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingCallPayload {
    pub server_id: String,
    pub channel_id: String,
    pub conference_id: String,
    pub channel_name: String,
    pub conference_jwt: String,
    #[serde(default)]
    pub conference_url: Option<String>,
}

impl IncomingCallPayload {
    /// Parst und validiert einen rohen Push-Payload
    pub fn parse(raw: &serde_json::Value) -> Result<Self, PayloadError> {
        let payload: Self = serde_json::from_value(raw.clone())?;
        payload.validate()?;
        Ok(payload)
    }

    /// Ohne diese Felder darf kein Anruf gemeldet werden
    fn validate(&self) -> Result<(), PayloadError> {
        if self.server_id.is_empty() {
            return Err(PayloadError::MissingField("server_id"));
        }
        if self.channel_id.is_empty() {
            return Err(PayloadError::MissingField("channel_id"));
        }
        if self.conference_id.is_empty() {
            return Err(PayloadError::MissingField("conference_id"));
        }
        if self.channel_name.is_empty() {
            return Err(PayloadError::MissingField("channel_name"));
        }
        if self.conference_jwt.is_empty() {
            return Err(PayloadError::MissingField("conference_jwt"));
        }
        Ok(())
    }
}

// ============================================================================
// CALL UPDATE PAYLOAD
// ============================================================================

/// Push-Payload für abgebrochene oder anderswo angenommene Anrufe
#[derive(Debug, Clone, Deserialize)]
pub struct CallUpdatePayload {
    pub conference_id: String,
}

impl CallUpdatePayload {
    /// Parst einen rohen Update-Payload
    pub fn parse(raw: &serde_json::Value) -> Result<Self, PayloadError> {
        let payload: Self = serde_json::from_value(raw.clone())?;
        if payload.conference_id.is_empty() {
            return Err(PayloadError::MissingField("conference_id"));
        }
        Ok(payload)
    }
}

// ============================================================================
// TESTS
// ============================================================================
