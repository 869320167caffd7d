//! Process-wide cache of the dedicated signing keystore.
//!
//! The keystore is loaded once on first use and kept for the lifetime of the
//! process. Rotated keys are picked up only after a restart.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};
use tokio::sync::OnceCell;
use xavyo_keystore::{
    load_keystore_file, KeyStore, KeyStoreError, KeyStoreResult, SigningKeyStoreSettings,
};

static GLOBAL: LazyLock<Arc<SignKeyStoreCell>> = LazyLock::new(|| Arc::new(SignKeyStoreCell::new()));

/// Single-assignment holder for the signing keystore.
///
/// Concurrent first callers wait on one load; a failed load leaves the cell
/// empty so the next caller retries.
#[derive(Debug, Default)]
pub struct SignKeyStoreCell {
    keystore: OnceCell<Arc<KeyStore>>,
    loads: AtomicUsize,
}

impl SignKeyStoreCell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cell shared by every resolver in the process.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// The cached keystore, loading it from `settings` on first use.
    pub async fn get_or_load(&self, settings: &SigningKeyStoreSettings) -> KeyStoreResult<Arc<KeyStore>> {
        self.keystore
            .get_or_try_init(|| async {
                self.loads.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(
                    location = %settings.location.display(),
                    "Loading dedicated signing keystore"
                );
                let keystore = load_keystore_file(
                    &settings.location,
                    &settings.store_type,
                    &settings.store_password,
                )
                .await?;
                Ok::<_, KeyStoreError>(Arc::new(keystore))
            })
            .await
            .map(Arc::clone)
    }

    /// Install a keystore without reading a file. Returns `false` when the
    /// cell was already populated.
    pub fn preload(&self, keystore: KeyStore) -> bool {
        self.keystore.set(Arc::new(keystore)).is_ok()
    }

    /// The cached keystore, if loaded.
    #[must_use]
    pub fn get(&self) -> Option<Arc<KeyStore>> {
        self.keystore.get().cloned()
    }

    /// Number of file loads attempted.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}
