//! Log output setup.
//!
//! Verbosity comes from `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info crm                     # operations and audit trail
//! RUST_LOG=debug crm                    # plus payloads and SQL-level steps
//! RUST_LOG=warn,crm::audit=info crm     # audit trail only
//! ```

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
