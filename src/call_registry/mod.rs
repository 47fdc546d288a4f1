//! Call Registry Module - Aktive Anrufe der nativen Call-UI
//!
//! Dieses Modul verwaltet die native Seite der Call-Integration:
//! - Parsen und Validieren eingehender VoIP-Push-Payloads
//! - Registry der aktuell gemeldeten Anrufe
//! - Annehmen/Ablehnen und die daraus folgenden Bridge-Events
//!

mod payload;
mod registry;

pub use payload::{CallUpdatePayload, IncomingCallPayload, PayloadError};
pub use registry::{ActiveCall, CallRegistry, CallRegistryError};
