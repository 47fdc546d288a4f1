//! Call Bridge Module - Event-Kanal zum Anwendungs-Runtime
//!
//! Dieses Modul verwaltet:
//! - Typisierte Call-Events und deren JSON-Payloads
//! - Subscriber-Registry mit Zustellung in Subscriptions-Reihenfolge
//! - Entkopplung der nativen Call-Callbacks vom Runtime-Event-Loop
//!

mod bridge;
mod events;

pub use bridge::{CallEventBridge, Subscription};
pub use events::{CallAnsweredPayload, CallDeclinedPayload, CallEvent, CALL_ANSWERED, CALL_DECLINED};
