//! kCall - Native Call Event Bridge
//!
//! Eine In-Process-Brücke zwischen nativer Call-Integration
//! (CallKit / ConnectionService) und dem eingebetteten
//! JavaScript-Anwendungs-Runtime einer Hybrid-Chat-App:
//! - Typisierte Call-Events (angenommen / abgelehnt)
//! - Subscriber-Registry mit Zustellung in Subscriptions-Reihenfolge
//! - Registry der aktiven Anrufe inkl. VoIP-Push-Payloads

pub mod call_bridge;
pub mod call_registry;

use call_bridge::{CallEvent, CallEventBridge};
use call_registry::CallRegistry;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Build-Konfiguration für den App-Root
///
/// Ersetzt die frühere Praxis, pro Build-Variante einen eigenen
/// App-Delegate zu pflegen: eine Komponente, Feature-Flags.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Native Call-Integration aktiv
    pub call_integration: bool,
    /// Orientierung sperrbar (Tablet-Builds deaktivieren das)
    pub orientation_lock: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            call_integration: true,
            orientation_lock: true,
        }
    }
}

impl AppConfig {
    /// Liest die Konfiguration aus Umgebungsvariablen
    pub fn from_env() -> Self {
        let flag = |name: &str, default: bool| {
            std::env::var(name)
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(default)
        };

        Self {
            call_integration: flag("KCALL_CALL_INTEGRATION", true),
            orientation_lock: flag("KCALL_ORIENTATION_LOCK", true),
        }
    }
}

// ============================================================================
// CAPABILITIES
// ============================================================================

/// Lifecycle-Hooks die der Host-Prozess aufruft
///
/// `on_terminate` stellt anstehende Events noch zu und blockiert dabei;
/// der Host ruft es von einem eigenen Thread auf, nie vom Runtime selbst.
pub trait LifecycleHooks {
    fn on_launch(&self);
    fn on_background(&self) {}
    fn on_terminate(&self);
}

/// Orientierungs-Sperre für Telefon-Builds
pub trait OrientationLockable {
    fn set_orientation_locked(&self, locked: bool);
    fn is_orientation_locked(&self) -> bool;
}

// ============================================================================
// APP ROOT
// ============================================================================

/// Wurzel-Objekt das Bridge und Registry besitzt
///
/// Wird dem nativen Integrations-Code und dem Runtime-Bootstrap als
/// `Arc` übergeben; `init`/`get` stellen zusätzlich die
/// Einmal-pro-Prozess-Semantik her.
pub struct AppRoot {
    config: AppConfig,
    bridge: Arc<CallEventBridge>,
    registry: Arc<CallRegistry>,
    orientation_locked: AtomicBool,
}

/// Singleton für den AppRoot
static APP_ROOT: OnceCell<Arc<AppRoot>> = OnceCell::new();

impl AppRoot {
    /// Baut einen neuen App-Root (ohne globale Registrierung)
    ///
    /// Muss innerhalb eines Tokio-Runtimes aufgerufen werden, da die
    /// Bridge ihren Dispatch-Task startet.
    pub fn new(config: AppConfig) -> Arc<Self> {
        let bridge = Arc::new(CallEventBridge::new());

        // Event-Tap: jedes Event fürs Debugging loggen
        if config.call_integration {
            bridge.subscribe(|event: &CallEvent| {
                tracing::debug!("Call event '{}': {}", event.name(), event.payload());
            });
        }

        let registry = Arc::new(CallRegistry::new(Arc::clone(&bridge)));

        Arc::new(Self {
            config,
            bridge,
            registry,
            orientation_locked: AtomicBool::new(false),
        })
    }

    /// Initialisiert den globalen App-Root (einmal pro Prozess)
    ///
    /// Ein zweiter Aufruf gibt `Err("AppRoot already initialized")` zurück.
    pub fn init(config: AppConfig) -> Result<Arc<Self>, String> {
        // Logging initialisieren; ein bereits installierter Subscriber
        // (z.B. vom Host) ist kein Fehler
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("kcall=debug".parse().unwrap()),
            )
            .try_init();

        tracing::info!("Initializing call bridge...");

        let root = Self::new(config);

        APP_ROOT
            .set(Arc::clone(&root))
            .map_err(|_| "AppRoot already initialized")?;

        Ok(root)
    }

    /// Gibt den globalen AppRoot zurück
    pub fn get() -> Option<Arc<Self>> {
        APP_ROOT.get().cloned()
    }

    /// Gibt die Event-Bridge zurück
    pub fn bridge(&self) -> &Arc<CallEventBridge> {
        &self.bridge
    }

    /// Gibt die Call-Registry zurück
    pub fn registry(&self) -> &Arc<CallRegistry> {
        &self.registry
    }

    /// Gibt die Konfiguration zurück
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl LifecycleHooks for AppRoot {
    fn on_launch(&self) {
        tracing::info!(
            "App launched (call integration: {})",
            self.config.call_integration
        );
    }

    fn on_terminate(&self) {
        // Bereits eingereihte Events noch zustellen bevor die Registry fällt
        self.bridge.flush_blocking();
        self.registry.clear();
    }
}

impl OrientationLockable for AppRoot {
    fn set_orientation_locked(&self, locked: bool) {
        if !self.config.orientation_lock {
            return;
        }
        self.orientation_locked.store(locked, Ordering::Relaxed);
    }

    fn is_orientation_locked(&self) -> bool {
        self.orientation_locked.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for AppRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRoot")
            .field("config", &self.config)
            .field("bridge", &self.bridge)
            .field("registry", &self.registry)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
