use menu_core::db::open_db_in_memory;
use menu_core::{
    Catalog, CatalogGateway, CatalogStore, CatalogStoreRegistry, Clock, EntityKind, ItemFields,
    Operation, PersistenceError, PersistenceResult, SqliteCatalogGateway, StoreError,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

struct HoldGate {
    key: String,
    entered: Sender<()>,
    release: Receiver<()>,
}

#[derive(Default)]
struct ScriptedGateway {
    documents: Mutex<HashMap<String, Catalog>>,
    fail_fetch: AtomicBool,
    fail_replace: AtomicBool,
    replace_delay_ms: AtomicU64,
    replace_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    hold: Mutex<Option<HoldGate>>,
}

impl ScriptedGateway {
    fn stored(&self, key: &str) -> Option<Catalog> {
        self.documents.lock().unwrap().get(key).cloned()
    }

    fn hold_next_replace(&self, key: &str) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.hold.lock().unwrap() = Some(HoldGate {
            key: key.to_string(),
            entered: entered_tx,
            release: release_rx,
        });
        (entered_rx, release_tx)
    }

    fn wait_if_held(&self, key: &str) {
        let gate = {
            let mut hold = self.hold.lock().unwrap();
            let matches_key = hold.as_ref().is_some_and(|gate| gate.key == key);
            if matches_key {
                hold.take()
            } else {
                None
            }
        };
        if let Some(gate) = gate {
            gate.entered.send(()).unwrap();
            gate.release.recv().unwrap();
        }
    }
}

impl CatalogGateway for ScriptedGateway {
    fn fetch_document(&self, key: &str) -> PersistenceResult<Option<Catalog>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("fetch refused".to_string()));
        }
        Ok(self.stored(key))
    }

    fn replace_document(&self, key: &str, catalog: &Catalog) -> PersistenceResult<()> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.wait_if_held(key);
        let delay = self.replace_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }

        let result = if self.fail_replace.load(Ordering::SeqCst) {
            Err(PersistenceError::Unavailable("replace refused".to_string()))
        } else {
            self.documents
                .lock()
                .unwrap()
                .insert(key.to_string(), catalog.clone());
            Ok(())
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

struct FrozenClock(i64);

impl Clock for FrozenClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0
    }
}

type SharedScriptedStore = Arc<CatalogStore<Arc<ScriptedGateway>>>;

fn store_with_catalog(gateway: &Arc<ScriptedGateway>) -> SharedScriptedStore {
    let store = Arc::new(CatalogStore::new("biz-1", Arc::clone(gateway)));
    store.ensure_catalog("Blue Cafe's Menu").unwrap();
    store
}

fn add_section<G: CatalogGateway>(store: &CatalogStore<G>, name: &str) -> String {
    store
        .apply_mutation(Operation::AddSection {
            name: name.to_string(),
        })
        .unwrap()
        .created_id
        .unwrap()
}

fn add_item<G: CatalogGateway>(store: &CatalogStore<G>, section_id: &str, name: &str) -> String {
    store
        .apply_mutation(Operation::AddItem {
            section_id: section_id.to_string(),
            fields: ItemFields::new(name, "1.00"),
        })
        .unwrap()
        .created_id
        .unwrap()
}

#[test]
fn drinks_and_cola_scenario() {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = store_with_catalog(&gateway);

    let drinks = add_section(&store, "Drinks");
    store
        .apply_mutation(Operation::AddItem {
            section_id: drinks.clone(),
            fields: ItemFields::new("Cola", "2.00"),
        })
        .unwrap();

    let catalog = store.current_state().unwrap();
    assert_eq!(catalog.sections.len(), 1);
    assert_eq!(catalog.sections[0].id, drinks);
    assert_eq!(catalog.sections[0].name, "Drinks");
    assert_eq!(catalog.sections[0].items.len(), 1);
    assert_eq!(catalog.sections[0].items[0].name, "Cola");
    assert_eq!(catalog.sections[0].items[0].price, "2.00");
    assert_eq!(gateway.stored("biz-1"), Some(catalog));
}

#[test]
fn add_then_remove_section_restores_sequence() {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = store_with_catalog(&gateway);
    let starters = add_section(&store, "Starters");
    add_item(&store, &starters, "Soup");
    let before = store.current_state().unwrap().sections;

    let temp = add_section(&store, "Temporary");
    store
        .apply_mutation(Operation::RemoveSection { section_id: temp })
        .unwrap();

    assert_eq!(store.current_state().unwrap().sections, before);
}

#[test]
fn items_keep_insertion_order_across_removals() {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = store_with_catalog(&gateway);
    let section = add_section(&store, "Mains");

    let mut expected = Vec::new();
    for round in 0..6 {
        let keep = add_item(&store, &section, &format!("keep-{round}"));
        let drop = add_item(&store, &section, &format!("drop-{round}"));
        store
            .apply_mutation(Operation::RemoveItem {
                section_id: section.clone(),
                item_id: drop,
            })
            .unwrap();
        expected.push(keep);
    }

    let catalog = store.current_state().unwrap();
    let observed: Vec<String> = catalog.sections[0]
        .items
        .iter()
        .map(|item| item.id.clone())
        .collect();
    assert_eq!(observed, expected);
}

#[test]
fn remove_section_cascades_to_items() {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = store_with_catalog(&gateway);
    let keep = add_section(&store, "Keep");
    add_item(&store, &keep, "Bread");
    let doomed = add_section(&store, "Doomed");
    let doomed_items: Vec<String> = (0..4)
        .map(|n| add_item(&store, &doomed, &format!("dish-{n}")))
        .collect();

    store
        .apply_mutation(Operation::RemoveSection {
            section_id: doomed.clone(),
        })
        .unwrap();

    let catalog = store.current_state().unwrap();
    assert!(catalog.section(&doomed).is_none());
    for item_id in &doomed_items {
        assert!(!catalog.contains_id(item_id));
    }
    assert_eq!(catalog.item_count(), 1);
}

#[test]
fn updated_at_strictly_increases_with_frozen_clock() {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = CatalogStore::with_clock(
        "biz-1",
        Arc::clone(&gateway),
        Arc::new(FrozenClock(1_700_000_000_000)),
    );
    let mut last = store.ensure_catalog("Menu").unwrap().updated_at;

    let section = add_section(&store, "Drinks");
    for n in 0..5 {
        let outcome = store
            .apply_mutation(Operation::AddItem {
                section_id: section.clone(),
                fields: ItemFields::new(format!("Tea {n}"), "3.00"),
            })
            .unwrap();
        assert!(outcome.catalog.updated_at > last);
        last = outcome.catalog.updated_at;
    }
}

#[test]
fn failed_add_item_leaves_state_value_equal() {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = store_with_catalog(&gateway);
    let drinks = add_section(&store, "Drinks");
    let before = store.current_state();

    gateway.fail_replace.store(true, Ordering::SeqCst);
    let err = store
        .apply_mutation(Operation::AddItem {
            section_id: drinks.clone(),
            fields: ItemFields::new("Cola", "2.00"),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert_eq!(store.current_state(), before);

    // The store stays usable once storage recovers.
    gateway.fail_replace.store(false, Ordering::SeqCst);
    add_item(&store, &drinks, "Cola");
    assert_eq!(store.current_state().unwrap().item_count(), 1);
}

#[test]
fn failed_create_catalog_leaves_store_empty() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.fail_replace.store(true, Ordering::SeqCst);
    let store = CatalogStore::new("biz-1", Arc::clone(&gateway));

    let err = store.ensure_catalog("Menu").unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert!(store.current_state().is_none());
    assert!(gateway.stored("biz-1").is_none());
}

#[test]
fn failed_load_keeps_previous_state() {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = store_with_catalog(&gateway);
    let before = store.current_state();

    gateway.fail_fetch.store(true, Ordering::SeqCst);
    let err = store.load().unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence(PersistenceError::Unavailable(_))
    ));
    assert_eq!(store.current_state(), before);
}

#[test]
fn mutation_without_catalog_is_not_found() {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = CatalogStore::new("biz-1", Arc::clone(&gateway));
    assert!(store.load().unwrap().is_none());

    let err = store
        .apply_mutation(Operation::AddSection {
            name: "Drinks".to_string(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            kind: EntityKind::Catalog,
            ..
        }
    ));
    assert_eq!(gateway.replace_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn concurrent_mutations_on_one_store_are_serialized() {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = store_with_catalog(&gateway);
    gateway.replace_delay_ms.store(5, Ordering::SeqCst);

    let workers: Vec<_> = (0..8)
        .map(|n| {
            let store = Arc::clone(&store);
            thread::spawn(move || add_section(&store, &format!("Section {n}")))
        })
        .collect();
    let ids: HashSet<String> = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .collect();

    assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 1);
    let catalog = store.current_state().unwrap();
    assert_eq!(catalog.sections.len(), 8);
    assert_eq!(ids.len(), 8);
    for section in &catalog.sections {
        assert!(ids.contains(&section.id));
    }
    assert_eq!(gateway.stored("biz-1"), Some(catalog));
}

#[test]
fn current_state_does_not_wait_for_pending_replace() {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = store_with_catalog(&gateway);
    let before = store.current_state();

    let (entered, release) = gateway.hold_next_replace("biz-1");
    let worker = {
        let store = Arc::clone(&store);
        thread::spawn(move || add_section(&store, "Late"))
    };

    entered.recv().unwrap();
    assert_eq!(store.current_state(), before);
    release.send(()).unwrap();

    let late = worker.join().unwrap();
    assert!(store.current_state().unwrap().section(&late).is_some());
}

#[test]
fn different_owner_keys_do_not_block_each_other() {
    let gateway = Arc::new(ScriptedGateway::default());
    let registry = CatalogStoreRegistry::new(Arc::clone(&gateway));
    let slow = registry.store_for("slow").unwrap();
    let fast = registry.store_for("fast").unwrap();
    slow.ensure_catalog("Slow Menu").unwrap();
    fast.ensure_catalog("Fast Menu").unwrap();

    let (entered, release) = gateway.hold_next_replace("slow");
    let worker = {
        let slow = Arc::clone(&slow);
        thread::spawn(move || add_section(&slow, "Pending"))
    };
    entered.recv().unwrap();

    let section = add_section(&fast, "Ready");
    assert!(fast.current_state().unwrap().section(&section).is_some());
    assert!(slow.current_state().unwrap().sections.is_empty());

    release.send(()).unwrap();
    worker.join().unwrap();
    assert_eq!(slow.current_state().unwrap().sections.len(), 1);
}

#[test]
fn sqlite_backed_store_persists_and_reloads() {
    let conn = open_db_in_memory().unwrap();
    let gateway = Arc::new(SqliteCatalogGateway::try_new(conn).unwrap());
    let writer = CatalogStore::new("biz-7", Arc::clone(&gateway));
    assert!(writer.load().unwrap().is_none());
    writer.ensure_catalog("Harbor Grill's Menu").unwrap();
    let section = add_section(&writer, "Seafood");
    writer
        .apply_mutation(Operation::AddItem {
            section_id: section,
            fields: ItemFields::new("Oysters", "$12")
                .with_description("Half dozen")
                .with_image_url("img/oysters.jpg"),
        })
        .unwrap();

    let reader = CatalogStore::new("biz-7", Arc::clone(&gateway));
    let loaded = reader.load().unwrap().unwrap();
    assert_eq!(Some(loaded), writer.current_state());
}

#[test]
fn reload_picks_up_last_writer() {
    let gateway = Arc::new(ScriptedGateway::default());
    let first = CatalogStore::new("biz-1", Arc::clone(&gateway));
    let second = CatalogStore::new("biz-1", Arc::clone(&gateway));
    first.ensure_catalog("Menu").unwrap();
    second.load().unwrap();

    add_section(&first, "From first");
    add_section(&second, "From second");

    // Whole-document replace: the later write wins.
    let reloaded = first.load().unwrap().unwrap();
    let names: Vec<&str> = reloaded
        .sections
        .iter()
        .map(|section| section.name.as_str())
        .collect();
    assert_eq!(names, vec!["From second"]);
}
