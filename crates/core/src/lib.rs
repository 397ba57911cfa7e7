pub mod config;
pub mod manifest;
pub mod metrics;
pub mod notify;
pub mod reconciler;
pub mod record;
pub mod registrar;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use manifest::{AssemblyManifest, ManifestBuilder, ManifestConfig, ManifestError};
pub use notify::{LogNotifier, Notifier, NotifyError, SlackNotifier};
pub use reconciler::{
    AssemblyMachine, EscalationMonitor, ReconcileError, ReconcileScheduler, RetryPolicy,
    SchedulerStatus, SubmissionMachine,
};
pub use record::{
    AssemblyRecord, EntryStatus, SequenceKey, SqliteSubmissionStore, StoreError,
    SubmissionStatus, SubmissionStore,
};
pub use registrar::{HttpRegistrar, Outcome, Registrar, RegistrarConfig};
