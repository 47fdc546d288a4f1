//! Call Event Bridge
//!
//! Entkoppelt native Call-Callbacks vom eingebetteten Anwendungs-Runtime:
//! - `emit_*` reiht Events nur ein und kehrt sofort zurück
//! - Ein einzelner Dispatch-Task stellt Events an alle Subscriber zu
//! - Fehlerhafte Eingaben und fehlende Subscriber werden still verworfen
//!
//! Die native Seite darf hier niemals blockieren oder durch einen Fehler
//! aus der App-Schicht zum Absturz gebracht werden: ein laufendes Telefonat
//! hat Vorrang, Events werden im Zweifel verworfen.

use super::events::CallEvent;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

// ============================================================================
// SUBSCRIPTION
// ============================================================================

/// Handle für einen registrierten Subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Handler = Arc<dyn Fn(&CallEvent) + Send + Sync>;

struct Entry {
    id: u64,
    handler: Handler,
}

enum DispatchMessage {
    Event(CallEvent),
    Flush(oneshot::Sender<()>),
}

// ============================================================================
// CALL EVENT BRIDGE
// ============================================================================

/// Bridge zwischen nativer Call-Integration und Anwendungs-Runtime
pub struct CallEventBridge {
    subscribers: Arc<Mutex<Vec<Entry>>>,
    event_tx: mpsc::UnboundedSender<DispatchMessage>,
    next_id: AtomicU64,
}

impl CallEventBridge {
    /// Erstellt eine neue Bridge und startet den Dispatch-Task.
    ///
    /// Muss innerhalb eines Tokio-Runtimes aufgerufen werden; `emit_*`
    /// ist danach von beliebigen Threads aus erlaubt.
    pub fn new() -> Self {
        let subscribers: Arc<Mutex<Vec<Entry>>> = Arc::new(Mutex::new(Vec::new()));
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<DispatchMessage>();

        let registry = Arc::clone(&subscribers);
        tokio::spawn(async move {
            while let Some(msg) = event_rx.recv().await {
                match msg {
                    DispatchMessage::Event(event) => Self::dispatch(&registry, &event),
                    DispatchMessage::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            tracing::debug!("Call event dispatch task stopped");
        });

        Self {
            subscribers,
            event_tx,
            next_id: AtomicU64::new(1),
        }
    }

    /// Registriert einen Subscriber
    ///
    /// Der Handler läuft immer auf dem Dispatch-Task, nie auf dem Thread
    /// des nativen Aufrufers.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&CallEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push(Entry {
            id,
            handler: Arc::new(handler),
        });
        Subscription(id)
    }

    /// Registriert einen Subscriber als Channel (für das Event-Forwarding
    /// Richtung Runtime)
    pub fn subscribe_channel(&self) -> (Subscription, mpsc::UnboundedReceiver<CallEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (subscription, rx)
    }

    /// Entfernt einen Subscriber (idempotent, unbekannte Handles sind no-ops)
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers.lock().retain(|e| e.id != subscription.0);
    }

    /// Gibt die Anzahl registrierter Subscriber zurück
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Meldet einen in der nativen UI angenommenen Anruf
    pub fn emit_answered(&self, server_url: String, channel_id: String) {
        self.emit(CallEvent::Answered {
            server_url,
            channel_id,
        });
    }

    /// Meldet einen in der nativen UI abgelehnten Anruf
    pub fn emit_declined(&self, server_url: String, conference_id: String) {
        self.emit(CallEvent::Declined {
            server_url,
            conference_id,
        });
    }

    /// Wartet bis alle bereits eingereihten Events zugestellt wurden
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.event_tx.send(DispatchMessage::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Blockierende Variante von [`flush`](Self::flush) für synchrone
    /// Host-Callbacks (z.B. Prozess-Shutdown)
    ///
    /// Darf nicht auf einem Runtime-Thread aufgerufen werden.
    pub fn flush_blocking(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.event_tx.send(DispatchMessage::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.blocking_recv();
        }
    }

    // ========================================================================
    // PRIVATE METHODS
    // ========================================================================

    /// Reiht ein Event zur Zustellung ein
    fn emit(&self, event: CallEvent) {
        if !event.is_well_formed() {
            tracing::warn!("Dropping malformed call event {}", event.name());
            return;
        }

        if self.event_tx.send(DispatchMessage::Event(event)).is_err() {
            // Runtime bereits beendet, Event verwerfen statt Fehler melden
            tracing::warn!("Dispatch task gone, dropping call event");
        }
    }

    /// Stellt ein Event an alle Subscriber zu
    fn dispatch(subscribers: &Mutex<Vec<Entry>>, event: &CallEvent) {
        // Snapshot vor der Iteration: subscribe/unsubscribe während der
        // Zustellung darf die laufende Zustellung nicht beeinflussen
        let snapshot: Vec<Handler> = subscribers
            .lock()
            .iter()
            .map(|e| Arc::clone(&e.handler))
            .collect();

        tracing::debug!(
            "Dispatching {} to {} subscriber(s)",
            event.name(),
            snapshot.len()
        );

        for handler in snapshot {
            if std::panic::catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                tracing::error!("Call event listener panicked while handling {}", event.name());
            }
        }
    }
}

impl Default for CallEventBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallEventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallEventBridge")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
