use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::*;

/// Test resource that records how often it gets destroyed
struct Probe {
    label: String,
    destroyed: Arc<AtomicU32>,
    fail_destroy: bool,
}

#[derive(Clone)]
struct ProbeDesc {
    label: String,
    destroyed: Arc<AtomicU32>,
    fail_construct: bool,
    fail_destroy: bool,
}

impl ProbeDesc {
    fn new(label: &str, destroyed: &Arc<AtomicU32>) -> Self {
        Self {
            label: label.to_string(),
            destroyed: destroyed.clone(),
            fail_construct: false,
            fail_destroy: false,
        }
    }
}

impl Resource for Probe {
    type Desc = ProbeDesc;

    fn construct(desc: ProbeDesc) -> Result<Self> {
        if desc.fail_construct {
            return Err(Error::InvalidResource(format!(
                "Probe '{}' refused to construct",
                desc.label
            )));
        }
        Ok(Self {
            label: desc.label,
            destroyed: desc.destroyed,
            fail_destroy: desc.fail_destroy,
        })
    }

    fn destroy(&mut self) -> Result<()> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        if self.fail_destroy {
            return Err(Error::InvalidResource(format!(
                "Probe '{}' refused to destroy",
                self.label
            )));
        }
        Ok(())
    }

    fn kind() -> &'static str {
        "Probe"
    }
}

fn registry(capacity: u32, destroyed: &Arc<AtomicU32>) -> ResourceRegistry<Probe> {
    ResourceRegistry::new(capacity, "default", ProbeDesc::new("default", destroyed)).unwrap()
}

#[test]
fn test_new_creates_default_record() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let reg = registry(4, &destroyed);

    assert!(reg.exists("default"));
    assert_eq!(reg.handle_of("default"), Some(reg.default_handle()));
    assert!(reg.is_live(reg.default_handle()));
    assert_eq!(reg.live_count(), 1);
    assert_eq!(reg.get(reg.default_handle()).unwrap().label, "default");
}

#[test]
fn test_acquire_by_name_constructs_once() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);

    let first = reg
        .acquire_by_name("grass", true, ProbeDesc::new("grass", &destroyed))
        .unwrap();
    let second = reg
        .acquire_by_name("grass", true, ProbeDesc::new("grass", &destroyed))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(reg.live_count(), 2);
    assert_eq!(reg.reference_count(first).unwrap(), 2);
}

#[test]
fn test_acquire_default_name_does_not_take_reference() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);

    let handle = reg
        .acquire_by_name("default", true, ProbeDesc::new("default", &destroyed))
        .unwrap();
    assert_eq!(handle, reg.default_handle());
    assert_eq!(reg.reference_count(handle).unwrap(), 1);
}

#[test]
fn test_acquire_by_handle() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);
    let handle = reg
        .acquire_by_name("rock", true, ProbeDesc::new("rock", &destroyed))
        .unwrap();

    reg.acquire_by_handle(handle).unwrap();
    assert_eq!(reg.reference_count(handle).unwrap(), 2);

    // Default handle acquisition is a no-op
    reg.acquire_by_handle(reg.default_handle()).unwrap();
    assert_eq!(reg.reference_count(reg.default_handle()).unwrap(), 1);

    reg.release(handle);
    reg.release(handle);
    assert_eq!(
        reg.acquire_by_handle(handle),
        Err(Error::StaleOrInvalidHandle)
    );
}

#[test]
fn test_release_destroys_at_zero_with_auto_release() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);

    let handle = reg
        .acquire_by_name("grass", true, ProbeDesc::new("grass", &destroyed))
        .unwrap();
    reg.acquire_by_handle(handle).unwrap();

    reg.release(handle);
    assert!(reg.is_live(handle));
    assert_eq!(destroyed.load(Ordering::SeqCst), 0);

    reg.release(handle);
    assert!(!reg.is_live(handle));
    assert!(!reg.exists("grass"));
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(reg.live_count(), 1);
}

#[test]
fn test_release_without_auto_release_keeps_record() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);

    let handle = reg
        .acquire_by_name("pinned", false, ProbeDesc::new("pinned", &destroyed))
        .unwrap();
    reg.release(handle);

    assert!(reg.is_live(handle));
    assert_eq!(reg.reference_count(handle).unwrap(), 0);
    assert_eq!(destroyed.load(Ordering::SeqCst), 0);

    // A fresh acquire by name revives the count on the same record
    let again = reg
        .acquire_by_name("pinned", false, ProbeDesc::new("pinned", &destroyed))
        .unwrap();
    assert_eq!(again, handle);
    assert_eq!(reg.reference_count(handle).unwrap(), 1);
}

#[test]
fn test_release_misuse_is_ignored() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);
    let handle = reg
        .acquire_by_name("grass", true, ProbeDesc::new("grass", &destroyed))
        .unwrap();

    // Nil, default, double and stale releases are all logged no-ops
    reg.release(Handle::NIL);
    reg.release(reg.default_handle());
    reg.release(handle);
    reg.release(handle);
    reg.release(handle);

    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(reg.live_count(), 1);
    assert!(reg.is_live(reg.default_handle()));
}

#[test]
fn test_construction_failure_leaves_nothing_registered() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);

    let mut desc = ProbeDesc::new("broken", &destroyed);
    desc.fail_construct = true;
    assert!(reg.acquire_by_name("broken", true, desc).is_err());

    assert!(!reg.exists("broken"));
    assert_eq!(reg.live_count(), 1);

    // The name is still available for a working descriptor
    let handle = reg
        .acquire_by_name("broken", true, ProbeDesc::new("broken", &destroyed))
        .unwrap();
    assert!(reg.is_live(handle));
}

#[test]
fn test_pool_exhaustion_reports_pool_full() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(2, &destroyed);
    reg.acquire_by_name("a", true, ProbeDesc::new("a", &destroyed))
        .unwrap();

    let err = reg
        .acquire_by_name("b", true, ProbeDesc::new("b", &destroyed))
        .unwrap_err();
    assert_eq!(err, Error::PoolFull);
    assert!(!reg.exists("b"));
}

#[test]
fn test_get_or_default_degrades_gracefully() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);
    let handle = reg
        .acquire_by_name("grass", true, ProbeDesc::new("grass", &destroyed))
        .unwrap();

    assert_eq!(reg.get_or_default(handle).label, "grass");
    assert_eq!(reg.get_or_default(Handle::NIL).label, "default");

    reg.release(handle);
    assert_eq!(reg.get_or_default(handle).label, "default");
}

#[test]
fn test_reload_preserves_handle_and_bumps_content_generation() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);
    let handle = reg
        .acquire_by_name("grass", true, ProbeDesc::new("grass-v1", &destroyed))
        .unwrap();
    reg.acquire_by_handle(handle).unwrap();
    assert_eq!(reg.content_generation(handle).unwrap(), 0);

    let reloaded = reg
        .reload("grass", ProbeDesc::new("grass-v2", &destroyed))
        .unwrap();

    assert_eq!(reloaded, handle);
    assert_eq!(reg.get(handle).unwrap().label, "grass-v2");
    assert_eq!(reg.content_generation(handle).unwrap(), 1);
    assert_eq!(reg.reference_count(handle).unwrap(), 2);
    // Old contents were destroyed exactly once
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_reload_failure_keeps_old_contents() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);
    let handle = reg
        .acquire_by_name("grass", true, ProbeDesc::new("grass-v1", &destroyed))
        .unwrap();

    let mut desc = ProbeDesc::new("grass-v2", &destroyed);
    desc.fail_construct = true;
    assert!(reg.reload("grass", desc).is_err());

    assert_eq!(reg.get(handle).unwrap().label, "grass-v1");
    assert_eq!(reg.content_generation(handle).unwrap(), 0);
    assert_eq!(destroyed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_reload_unknown_name_fails() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);
    assert!(reg
        .reload("missing", ProbeDesc::new("missing", &destroyed))
        .is_err());
}

#[test]
fn test_remove_all_spares_default() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(8, &destroyed);
    let a = reg
        .acquire_by_name("a", true, ProbeDesc::new("a", &destroyed))
        .unwrap();
    let b = reg
        .acquire_by_name("b", false, ProbeDesc::new("b", &destroyed))
        .unwrap();
    reg.acquire_by_handle(a).unwrap();

    reg.remove_all();

    assert_eq!(destroyed.load(Ordering::SeqCst), 2);
    assert!(!reg.is_live(a));
    assert!(!reg.is_live(b));
    assert!(reg.is_live(reg.default_handle()));
    assert_eq!(reg.live_count(), 1);

    // Releases after bulk teardown are ignored
    reg.release(a);
    assert_eq!(destroyed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_drop_destroys_everything_including_default() {
    let destroyed = Arc::new(AtomicU32::new(0));
    {
        let mut reg = registry(4, &destroyed);
        reg.acquire_by_name("a", true, ProbeDesc::new("a", &destroyed))
            .unwrap();
        reg.acquire_by_name("b", false, ProbeDesc::new("b", &destroyed))
            .unwrap();
    }
    // Two named records plus the default
    assert_eq!(destroyed.load(Ordering::SeqCst), 3);
}

#[test]
fn test_destroy_failure_still_frees_slot() {
    let destroyed = Arc::new(AtomicU32::new(0));
    let mut reg = registry(4, &destroyed);

    let mut desc = ProbeDesc::new("fragile", &destroyed);
    desc.fail_destroy = true;
    let handle = reg.acquire_by_name("fragile", true, desc).unwrap();

    reg.release(handle);

    // The record is gone even though its destructor reported an error
    assert!(!reg.is_live(handle));
    assert!(!reg.exists("fragile"));
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
}
