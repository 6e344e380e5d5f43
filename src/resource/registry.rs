//! Named resource lifecycle manager.
//!
//! A `ResourceRegistry<T>` layers name-based deduplication, reference
//! counting and auto-release destruction on top of a generational
//! [`HandlePool`]. Texture, material, geometry and shader systems are all
//! instantiations of this one type.
//!
//! # Record lifecycle
//!
//! `Uninitialized → Live(refcount ≥ 1) → Destroyed`. A record is never
//! observable live with refcount 0 unless its auto-release policy is off;
//! with auto-release on, destruction is synchronous with the count
//! reaching zero.
//!
//! # Default records
//!
//! Every registry is constructed with a default record. It is exempt from
//! reference counting and destruction (a registry-lifetime singleton) and
//! is what [`ResourceRegistry::get_or_default`] degrades to when a handle
//! is stale — missing resources render as the default instead of
//! propagating errors through the draw path.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::pool::{Handle, HandlePool};
use crate::{engine_debug, engine_err, engine_error, engine_info, engine_trace, engine_warn};

// ============================================================================
// RESOURCE TRAIT
// ============================================================================

/// A resource kind managed by a `ResourceRegistry`.
///
/// `Desc` carries everything construction needs, including the injected
/// backend collaborators (`Arc<Mutex<dyn GraphicsDevice>>`, shared buffer
/// arenas). `destroy` releases whatever the record owns: backend objects
/// and any sub-allocated byte ranges.
pub trait Resource: Sized {
    /// Construction descriptor
    type Desc;

    /// Build the resource, creating backend objects as needed.
    ///
    /// Must be all-or-nothing: on error, nothing may remain allocated.
    fn construct(desc: Self::Desc) -> Result<Self>;

    /// Release backend objects and sub-allocated ranges
    fn destroy(&mut self) -> Result<()>;

    /// Kind name used in log messages ("Texture", "Geometry", ...)
    fn kind() -> &'static str;
}

/// Pool payload: the resource plus registry bookkeeping
struct Entry<T> {
    /// Name the record is registered under
    name: String,
    /// Bumped on every `reload`, distinct from the pool's slot generation;
    /// dependents compare it to detect stale contents without a new handle
    content_generation: u32,
    resource: T,
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Named, reference-counted resource registry
pub struct ResourceRegistry<T: Resource> {
    pool: HandlePool<Entry<T>>,
    names: FxHashMap<String, Handle>,
    default_handle: Handle,
    /// Log source, e.g. "nova3d::TextureRegistry"
    source: String,
}

impl<T: Resource> ResourceRegistry<T> {
    /// Create a registry and construct its default record.
    ///
    /// The default record is registered under `default_name`, exempt from
    /// reference counting, and lives until the registry is dropped.
    pub fn new(capacity: u32, default_name: &str, default_desc: T::Desc) -> Result<Self> {
        let source = format!("nova3d::{}Registry", T::kind());
        let mut pool = HandlePool::new(capacity);

        let resource = T::construct(default_desc)?;
        let default_handle = pool.add(Entry {
            name: default_name.to_string(),
            content_generation: 0,
            resource,
        })?;
        pool.set_auto_release(default_handle, false)?;

        let mut names = FxHashMap::default();
        names.insert(default_name.to_string(), default_handle);

        engine_debug!(&source, "Registry created with default {} '{}'", T::kind(), default_name);
        Ok(Self { pool, names, default_handle, source })
    }

    // ===== ACQUIRE =====

    /// Acquire a resource by name, constructing it on first use.
    ///
    /// A hit on an existing name increments its reference count (`desc` is
    /// discarded); the default name is returned without a count change. A
    /// miss constructs the resource, inserts it with refcount 1 and the
    /// given auto-release policy, and registers the name. Construction
    /// failures leave nothing registered.
    pub fn acquire_by_name(
        &mut self,
        name: &str,
        auto_release: bool,
        desc: T::Desc,
    ) -> Result<Handle> {
        if let Some(&handle) = self.names.get(name) {
            if handle == self.default_handle {
                engine_debug!(&self.source,
                    "Acquire of default {} '{}' does not take a reference", T::kind(), name);
                return Ok(handle);
            }
            let count = self.pool.increment_ref(handle)?;
            engine_trace!(&self.source,
                "Acquired {} '{}' (references: {})", T::kind(), name, count);
            return Ok(handle);
        }

        // Construct only when a slot is guaranteed, so failure or pool
        // exhaustion leaves no partial record
        if self.pool.live_count() >= self.pool.capacity() {
            return Err(Error::PoolFull);
        }
        let resource = T::construct(desc)?;
        let handle = self.pool.add(Entry {
            name: name.to_string(),
            content_generation: 0,
            resource,
        })?;
        self.pool.set_auto_release(handle, auto_release)?;
        self.names.insert(name.to_string(), handle);

        engine_debug!(&self.source,
            "Created {} '{}' (live: {})", T::kind(), name, self.pool.live_count());
        Ok(handle)
    }

    /// Take another reference on an already-live record.
    ///
    /// The default handle is a logged no-op — default records are
    /// conceptually always-referenced.
    ///
    /// # Errors
    ///
    /// `StaleOrInvalidHandle` when the handle is not live.
    pub fn acquire_by_handle(&mut self, handle: Handle) -> Result<Handle> {
        if handle == self.default_handle {
            engine_debug!(&self.source,
                "Acquire of the default {} does not take a reference", T::kind());
            return Ok(handle);
        }
        self.pool.increment_ref(handle)?;
        Ok(handle)
    }

    // ===== RELEASE =====

    /// Drop one reference; destroy the record when the count reaches zero
    /// and its auto-release policy is set.
    ///
    /// Releasing a nil, stale, default, or already-unreferenced handle is
    /// logged and ignored — bulk teardown legitimately races with
    /// individual releases at the call sites.
    pub fn release(&mut self, handle: Handle) {
        if handle.is_nil() {
            engine_warn!(&self.source, "Release of nil {} handle ignored", T::kind());
            return;
        }
        if handle == self.default_handle {
            engine_warn!(&self.source, "Release of the default {} ignored", T::kind());
            return;
        }

        let count = match self.pool.decrement_ref(handle) {
            Ok(count) => count,
            Err(_) => {
                engine_warn!(&self.source,
                    "Release of stale or unreferenced {} handle ignored", T::kind());
                return;
            }
        };

        if count == 0 && self.pool.auto_release(handle).unwrap_or(false) {
            self.destroy_record(handle);
        }
    }

    /// Destroy every non-default record regardless of reference count.
    ///
    /// Used for bulk teardown (scene unload, shutdown). Records with
    /// outstanding references are destroyed with a warning; later
    /// `release` calls on them are ignored by design.
    pub fn remove_all(&mut self) {
        let live: Vec<Handle> = self.pool.live_handles().collect();
        for handle in live {
            if handle == self.default_handle {
                continue;
            }
            if let (Ok(count), Ok(entry)) = (self.pool.reference_count(handle), self.pool.get(handle)) {
                if count > 0 {
                    engine_warn!(&self.source,
                        "Destroying {} '{}' with {} outstanding reference(s)",
                        T::kind(), entry.name, count);
                }
            }
            self.destroy_record(handle);
        }
    }

    // ===== ACCESS =====

    /// Get the resource behind a live handle
    pub fn get(&self, handle: Handle) -> Result<&T> {
        Ok(&self.pool.get(handle)?.resource)
    }

    /// Get the resource behind a live handle, mutably
    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut T> {
        Ok(&mut self.pool.get_mut(handle)?.resource)
    }

    /// Get the resource behind `handle`, or the default record when the
    /// handle is nil, stale or destroyed. Never fails.
    pub fn get_or_default(&self, handle: Handle) -> &T {
        if let Ok(entry) = self.pool.get(handle) {
            return &entry.resource;
        }
        let default = self
            .pool
            .get(self.default_handle)
            .expect("default resource is always live");
        &default.resource
    }

    /// Whether a record is registered under `name`
    pub fn exists(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Handle registered under `name`, if any
    pub fn handle_of(&self, name: &str) -> Option<Handle> {
        self.names.get(name).copied()
    }

    /// Whether `handle` addresses a live record
    pub fn is_live(&self, handle: Handle) -> bool {
        self.pool.is_live(handle)
    }

    /// The registry-lifetime default handle
    pub fn default_handle(&self) -> Handle {
        self.default_handle
    }

    /// Reference count of a live record
    pub fn reference_count(&self, handle: Handle) -> Result<u64> {
        self.pool.reference_count(handle)
    }

    /// Content generation of a live record (bumped by `reload`)
    pub fn content_generation(&self, handle: Handle) -> Result<u32> {
        Ok(self.pool.get(handle)?.content_generation)
    }

    /// Number of live records, default included
    pub fn live_count(&self) -> u32 {
        self.pool.live_count()
    }

    // ===== RELOAD =====

    /// Rebuild a named record's payload in place.
    ///
    /// The handle and reference count are preserved; the record's content
    /// generation is bumped so dependents can detect the swap. On
    /// construction failure the old payload stays intact.
    pub fn reload(&mut self, name: &str, desc: T::Desc) -> Result<Handle> {
        let handle = match self.names.get(name) {
            Some(&handle) => handle,
            None => {
                return Err(engine_err!(&self.source,
                    "Cannot reload unknown {} '{}'", T::kind(), name));
            }
        };

        let resource = T::construct(desc)?;
        let entry = self.pool.get_mut(handle)?;
        let mut old = std::mem::replace(&mut entry.resource, resource);
        entry.content_generation = entry.content_generation.wrapping_add(1);

        if let Err(err) = old.destroy() {
            engine_error!(&self.source,
                "Failed to destroy old contents of {} '{}': {}", T::kind(), name, err);
        }
        engine_info!(&self.source, "Reloaded {} '{}'", T::kind(), name);
        Ok(handle)
    }

    // ===== INTERNAL =====

    /// Remove a record from the pool, unregister its name and destroy it
    fn destroy_record(&mut self, handle: Handle) {
        match self.pool.remove(handle) {
            Ok(mut entry) => {
                self.names.remove(&entry.name);
                if let Err(err) = entry.resource.destroy() {
                    engine_error!(&self.source,
                        "Failed to destroy {} '{}': {}", T::kind(), entry.name, err);
                } else {
                    engine_debug!(&self.source, "Destroyed {} '{}'", T::kind(), entry.name);
                }
            }
            Err(err) => {
                engine_error!(&self.source,
                    "Cannot destroy {} record: {}", T::kind(), err);
            }
        }
    }
}

impl<T: Resource> Drop for ResourceRegistry<T> {
    fn drop(&mut self) {
        // Non-default records first, then the default singleton
        self.remove_all();
        let default_handle = self.default_handle;
        self.destroy_record(default_handle);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
