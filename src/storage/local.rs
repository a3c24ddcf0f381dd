use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex as TableMutex;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{DocumentStore, StoreError, StoredDocument};
use crate::generators::common::derive_file_name;
use crate::generators::{Generator, InvoiceGenerator};
use crate::invoice::models::InvoiceData;

/// Filesystem-backed store keeping one PDF per seller/buyer pair.
///
/// Generation for a given file name is serialized through a per-key lock, so
/// the existence check and the write never interleave for the same pair.
pub struct LocalDocumentStore {
    root: PathBuf,
    generator: Arc<dyn Generator<InvoiceData> + Send + Sync>,
    locks: KeyLocks,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_generator(root, Arc::new(InvoiceGenerator::new()))
    }

    pub fn with_generator(
        root: impl Into<PathBuf>,
        generator: Arc<dyn Generator<InvoiceData> + Send + Sync>,
    ) -> Self {
        Self {
            root: root.into(),
            generator,
            locks: KeyLocks::default(),
        }
    }

    async fn ensure_root(&self) -> Result<(), StoreError> {
        match fs::metadata(&self.root).await {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            _ => {
                info!("Creating directory: {}", self.root.display());
                fs::create_dir_all(&self.root)
                    .await
                    .map_err(|source| StoreError::CreateDir {
                        path: self.root.clone(),
                        source,
                    })
            }
        }
    }
}

/// Per-key async locks. An entry lives only while some task holds or waits
/// on it, so the table never hands out two mutexes for one key.
#[derive(Default)]
struct KeyLocks {
    table: TableMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &str) -> KeyGuard<'_> {
        let lock = {
            let mut table = self.table.lock();
            Arc::clone(
                table
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        KeyGuard {
            locks: self,
            key: key.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().len()
    }
}

struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Clones are only taken under the table lock, so a count of one here
        // means nobody else holds or waits on this key.
        let mut table = self.locks.table.lock();
        drop(self.guard.take());
        if table
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.key);
        }
    }
}

async fn absolute_path(path: &Path) -> Result<PathBuf, StoreError> {
    fs::canonicalize(path)
        .await
        .map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Write through a temp file in the target directory, then rename into place,
/// so readers never observe a partially written PDF.
fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let write_err = |source: io::Error| StoreError::Write {
        path: target.to_path_buf(),
        source,
    };

    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;
    file.persist(target).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn generate(&self, invoice: &InvoiceData) -> Result<PathBuf, StoreError> {
        self.ensure_root().await?;

        let path = self.resolve_path(&invoice.seller, &invoice.buyer);
        let key = derive_file_name(&invoice.seller, &invoice.buyer);
        let _guard = self.locks.acquire(&key).await;

        let exists = fs::try_exists(&path)
            .await
            .map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;
        if exists {
            let absolute = absolute_path(&path).await?;
            info!(
                "PDF already exists. Returning existing file: {}",
                absolute.display()
            );
            return Ok(absolute);
        }

        debug!("Rendering '{}' on the blocking pool", key);
        let generator = Arc::clone(&self.generator);
        let invoice = invoice.clone();
        let dir = self.root.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let document = generator.generate(&invoice)?;
            debug!("Writing {} ({} bytes)", document.filename, document.pdf.len());
            write_atomically(&dir, &target, &document.pdf)
        })
        .await??;

        let absolute = absolute_path(&path).await?;
        info!("PDF generated successfully at: {}", absolute.display());
        Ok(absolute)
    }

    fn resolve_path(&self, seller: &str, buyer: &str) -> PathBuf {
        self.root.join(derive_file_name(seller, buyer))
    }

    async fn fetch(&self, seller: &str, buyer: &str) -> Result<StoredDocument, StoreError> {
        let path = self.resolve_path(seller, buyer);
        match fs::read(&path).await {
            Ok(bytes) => Ok(StoredDocument {
                file_name: derive_file_name(seller, buyer),
                path,
                bytes,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(path)),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{GeneratedDocument, GeneratorError};
    use crate::invoice::models::LineItem;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn invoice(seller: &str, buyer: &str, items: Option<Vec<LineItem>>) -> InvoiceData {
        InvoiceData {
            seller: seller.to_string(),
            seller_gstin: "27AAAAA0000A1Z5".to_string(),
            seller_address: "Pune".to_string(),
            buyer: buyer.to_string(),
            buyer_gstin: "27BBBBB1111B1Z6".to_string(),
            buyer_address: "Mumbai".to_string(),
            items,
        }
    }

    fn item(name: &str, amount: f64) -> LineItem {
        LineItem {
            name: name.to_string(),
            quantity: "1".to_string(),
            rate: amount,
            amount,
        }
    }

    struct CountingGenerator {
        calls: Arc<AtomicUsize>,
    }

    impl Generator<InvoiceData> for CountingGenerator {
        fn generate(&self, request: &InvoiceData) -> Result<GeneratedDocument, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            InvoiceGenerator::new().generate(request)
        }
    }

    struct FailingGenerator;

    impl Generator<InvoiceData> for FailingGenerator {
        fn generate(&self, _request: &InvoiceData) -> Result<GeneratedDocument, GeneratorError> {
            Err(GeneratorError::Pdf("simulated failure".to_string()))
        }
    }

    #[tokio::test]
    async fn test_generate_creates_root_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested").join("pdf_storage");
        let store = LocalDocumentStore::new(&root);

        let path = store
            .generate(&invoice(
                "XYZ Pvt. Ltd.",
                "Vedant Computers",
                Some(vec![item("Widget", 50.0)]),
            ))
            .await
            .unwrap();

        assert!(root.is_dir());
        assert!(path.is_absolute());
        assert!(path.ends_with("XYZ_Pvt._Ltd._Vedant_Computers.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_generate_is_idempotent_per_pair() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(tmp.path());

        let first = store
            .generate(&invoice("Acme", "Globex", Some(vec![item("Bolt", 1.0)])))
            .await
            .unwrap();
        let first_bytes = std::fs::read(&first).unwrap();

        let second = store
            .generate(&invoice(
                "Acme",
                "Globex",
                Some(vec![item("Nut", 2.0), item("Washer", 3.0)]),
            ))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), first_bytes);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_path_is_pure() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("never_created");
        let store = LocalDocumentStore::new(&root);

        let a = store.resolve_path("A Co", "B Co");
        let b = store.resolve_path("A Co", "B Co");
        assert_eq!(a, b);
        assert_eq!(a, root.join("A_Co_B_Co.pdf"));
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(tmp.path());

        let result = store.fetch("Nobody", "Nowhere").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fetch_returns_generated_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(tmp.path());

        let path = store
            .generate(&invoice("Acme Corp", "Globex", Some(vec![item("Bolt", 1.0)])))
            .await
            .unwrap();

        let document = store.fetch("Acme Corp", "Globex").await.unwrap();
        assert_eq!(document.file_name, "Acme_Corp_Globex.pdf");
        assert_eq!(document.bytes, std::fs::read(path).unwrap());
    }

    #[tokio::test]
    async fn test_missing_items_fail_without_leaving_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(tmp.path());

        let result = store.generate(&invoice("Acme", "Globex", None)).await;
        assert!(matches!(
            result,
            Err(StoreError::Render(GeneratorError::MissingItems))
        ));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_existing_file_short_circuits_rendering() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::with_generator(tmp.path(), Arc::new(FailingGenerator));
        std::fs::write(tmp.path().join("Acme_Globex.pdf"), b"%PDF-stale").unwrap();

        let path = store
            .generate(&invoice("Acme", "Globex", None))
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-stale");
    }

    #[tokio::test]
    async fn test_render_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::with_generator(tmp.path(), Arc::new(FailingGenerator));

        let result = store
            .generate(&invoice("Acme", "Globex", Some(Vec::new())))
            .await;
        assert!(matches!(result, Err(StoreError::Render(GeneratorError::Pdf(_)))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_requests_render_once() {
        let tmp = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(LocalDocumentStore::with_generator(
            tmp.path(),
            Arc::new(CountingGenerator {
                calls: Arc::clone(&calls),
            }),
        ));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .generate(&invoice("Acme", "Globex", Some(vec![item("Bolt", i as f64)])))
                    .await
            }));
        }

        let mut paths = Vec::new();
        for handle in handles {
            paths.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(paths.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
        assert_eq!(store.locks.len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slow_render_keeps_key_exclusive() {
        let tmp = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(LocalDocumentStore::with_generator(
            tmp.path(),
            Arc::new(CountingGenerator {
                calls: Arc::clone(&calls),
            }),
        ));

        // Hold the key well past the render time so every caller queues on it.
        let held = store.locks.acquire("Acme_Globex.pdf").await;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .generate(&invoice("Acme", "Globex", Some(vec![item("Bolt", 1.0)])))
                    .await
            }));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.locks.len(), 1);
        drop(held);

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.locks.len(), 0);
    }

    #[tokio::test]
    async fn test_key_lock_entry_outlives_waiters() {
        let locks = Arc::new(KeyLocks::default());
        let first = locks.acquire("a.pdf").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _second = locks.acquire("a.pdf").await;
                locks.len()
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(first);
        assert_eq!(locks.len(), 1);

        assert_eq!(waiter.await.unwrap(), 1);
        assert_eq!(locks.len(), 0);
    }
}
