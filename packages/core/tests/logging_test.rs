//! Integration tests for reconciliation log output
//!
//! A capturing writer is installed as the thread-default subscriber, so each
//! test sees only the events of its own run.

use indexsync_core::{
    db::InMemoryIndexStore,
    models::{CollectionIndexes, ExistingIndex, IndexSpec, KeySequence},
    services::{IndexManager, ManagerSettings},
};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Shared in-memory log sink
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn keys(pairs: &[(&str, i32)]) -> KeySequence {
    pairs.iter().map(|(field, direction)| (*field, *direction)).collect()
}

async fn run_with_capture(store: InMemoryIndexStore, specs: Vec<IndexSpec>) -> String {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let manager = IndexManager::new(
        Arc::new(store),
        ManagerSettings::default(),
        vec![CollectionIndexes::new("products", specs)],
    );
    manager.ensure().await.unwrap();

    logs.contents()
}

#[tokio::test]
async fn test_rebuild_is_logged_as_warning() {
    let store = InMemoryIndexStore::new("mim").with_index(
        "products",
        ExistingIndex::new("item_1_category_1", keys(&[("category", 1), ("item", 1)])),
    );
    let spec = IndexSpec::new(keys(&[("item", 1), ("category", 1)])).with_name("item_1_category_1");

    let output = run_with_capture(store, vec![spec]).await;

    let warning = output
        .lines()
        .find(|line| line.contains("exists but for different fields"))
        .expect("rebuild warning missing");
    assert!(warning.contains("WARN"));
    assert!(warning.contains("coll=products"));
    assert!(output.contains("status=REBUILD"));
}

#[tokio::test]
async fn test_redundant_indexes_are_logged_as_errors() {
    let store = InMemoryIndexStore::new("mim")
        .with_index("products", ExistingIndex::new("by_item", keys(&[("sku", 1)])))
        .with_index("products", ExistingIndex::new("idx_custom", keys(&[("item", 1)])));
    let spec = IndexSpec::new(keys(&[("item", 1)])).with_name("by_item");

    let output = run_with_capture(store, vec![spec]).await;

    let line = output
        .lines()
        .find(|line| line.contains("configuration is redundant"))
        .expect("redundancy error missing");
    assert!(line.contains("ERROR"));
}

#[tokio::test]
async fn test_run_context_is_attached_to_events() {
    let store = InMemoryIndexStore::new("mim").with_collection("products");
    let spec = IndexSpec::new(keys(&[("item", 1)])).with_name("item_1");

    let output = run_with_capture(store, vec![spec]).await;

    assert!(output.contains("existing indexes"));
    assert!(output.contains("no index found with name or fields"));
    let created = output
        .lines()
        .find(|line| line.contains("index created"))
        .expect("create event missing");
    assert!(created.contains("indexsync_run"));
    assert!(created.contains("db=mim"));
    assert!(created.contains("coll=products"));
    assert!(output.contains("index reconciliation finished"));
}
