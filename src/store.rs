use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Opaque 8-byte identifier addressing one persisted object.
///
/// Rendered as 16 hexadecimal digits. The upper 16 bits carry the storage
/// identifier of the type the object was created with; type resolution still
/// goes through the [`ModelRegistry`] so a stale storage identifier degrades
/// instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjId(pub u64);

impl ObjId {
    pub fn new(storage_id: u32, sequence: u64) -> Self {
        debug_assert!(storage_id <= 0xffff, "storage ID {} exceeds 16 bits", storage_id);
        Self(((storage_id as u64) << 48) | (sequence & 0xffff_ffff_ffff))
    }

    /// Storage identifier of the type this object was created with.
    pub fn storage_id(&self) -> u32 {
        (self.0 >> 48) as u32
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Handle to a resolved object within some transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjHandle {
    pub id: ObjId,
    pub storage_id: u32,
}

/// Registered object type: a name, a stable storage identifier, and an
/// optional supertype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDesc {
    pub name: String,
    pub storage_id: u32,
    pub parent: Option<u32>,
}

/// Type registry keyed by storage identifier.
///
/// Distinguishes two degrees of ignorance: a storage identifier recorded in
/// some earlier schema version but absent from the currently bound one, and a
/// storage identifier never seen at all. Object-reference type hints degrade
/// through those two tiers separately.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    types: HashMap<u32, TypeDesc>,
    by_name: HashMap<String, u32>,
    bound: HashSet<u32>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type in the currently bound schema version.
    pub fn register(&mut self, name: &str, storage_id: u32, parent: Option<u32>) {
        self.types.insert(
            storage_id,
            TypeDesc {
                name: name.to_string(),
                storage_id,
                parent,
            },
        );
        self.by_name.insert(name.to_string(), storage_id);
        self.bound.insert(storage_id);
    }

    /// Record a type that exists only in an earlier schema version. Objects of
    /// such a type resolve as "untyped" rather than failing.
    pub fn record_prior_version(&mut self, name: &str, storage_id: u32) {
        self.types.insert(
            storage_id,
            TypeDesc {
                name: name.to_string(),
                storage_id,
                parent: None,
            },
        );
    }

    /// Look up a type in the bound schema version.
    pub fn type_for_storage_id(&self, storage_id: u32) -> Option<&TypeDesc> {
        if self.bound.contains(&storage_id) {
            self.types.get(&storage_id)
        } else {
            None
        }
    }

    pub fn type_for_name(&self, name: &str) -> Option<&TypeDesc> {
        self.by_name
            .get(name)
            .and_then(|sid| self.type_for_storage_id(*sid))
    }

    /// Whether any schema version, bound or not, ever used this identifier.
    pub fn knows_storage_id(&self, storage_id: u32) -> bool {
        self.types.contains_key(&storage_id)
    }

    /// Sorted names of every type in the bound schema version.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .bound
            .iter()
            .filter_map(|sid| self.types.get(sid))
            .map(|t| t.name.as_str())
            .collect();
        names.sort();
        names
    }

    /// Storage identifiers of `storage_id` and all its declared subtypes in
    /// the bound schema version.
    pub fn subtypes(&self, storage_id: u32) -> HashSet<u32> {
        let mut result = HashSet::new();
        result.insert(storage_id);
        loop {
            let before = result.len();
            for sid in &self.bound {
                if let Some(ty) = self.types.get(sid) {
                    if ty.parent.is_some_and(|p| result.contains(&p)) {
                        result.insert(*sid);
                    }
                }
            }
            if result.len() == before {
                break;
            }
        }
        result
    }
}

/// In-memory object database. Transactions are immutable snapshots taken from
/// the current contents; the console core only ever borrows them.
#[derive(Debug, Default)]
pub struct Database {
    next_sequence: u64,
    objects: BTreeMap<ObjId, u32>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, storage_id: u32) -> ObjId {
        self.next_sequence += 1;
        let id = ObjId::new(storage_id, self.next_sequence);
        self.objects.insert(id, storage_id);
        id
    }

    pub fn delete(&mut self, id: ObjId) -> bool {
        self.objects.remove(&id).is_some()
    }

    pub fn snapshot(&self) -> Transaction {
        Transaction {
            objects: self.objects.clone(),
        }
    }
}

/// Read view of the database contents at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    objects: BTreeMap<ObjId, u32>,
}

impl Transaction {
    /// Resolve an object identifier to a typed handle, or `None` if no such
    /// object exists in this transaction.
    pub fn resolve_object(&self, id: ObjId) -> Option<ObjHandle> {
        self.objects
            .get(&id)
            .map(|storage_id| ObjHandle { id, storage_id: *storage_id })
    }

    /// Every object, regardless of type, in identifier order.
    pub fn get_all(&self) -> Vec<ObjHandle> {
        self.objects
            .iter()
            .map(|(id, storage_id)| ObjHandle {
                id: *id,
                storage_id: *storage_id,
            })
            .collect()
    }

    /// Objects whose storage identifier is in `storage_ids`, in identifier
    /// order.
    pub fn get_all_matching(&self, storage_ids: &HashSet<u32>) -> Vec<ObjHandle> {
        self.objects
            .iter()
            .filter(|(_, storage_id)| storage_ids.contains(storage_id))
            .map(|(id, storage_id)| ObjHandle {
                id: *id,
                storage_id: *storage_id,
            })
            .collect()
    }

    /// Objects of exactly one storage identifier, no subtype expansion.
    pub fn get_all_of(&self, storage_id: u32) -> Vec<ObjHandle> {
        self.objects
            .iter()
            .filter(|(_, sid)| **sid == storage_id)
            .map(|(id, sid)| ObjHandle {
                id: *id,
                storage_id: *sid,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obj_id_embeds_storage_id() {
        let id = ObjId::new(10, 7);
        assert_eq!(id.storage_id(), 10);
        assert_eq!(format!("{}", id), "000a000000000007");
    }

    #[test]
    #[should_panic(expected = "exceeds 16 bits")]
    fn obj_id_rejects_oversized_storage_id() {
        ObjId::new(0x1_0000, 1);
    }

    #[test]
    fn subtype_closure_follows_parent_links() {
        let mut model = ModelRegistry::new();
        model.register("Person", 10, None);
        model.register("Employee", 11, Some(10));
        model.register("Manager", 12, Some(11));
        model.register("Pet", 20, None);
        let subs = model.subtypes(10);
        assert_eq!(subs, HashSet::from([10, 11, 12]));
        assert_eq!(model.subtypes(20), HashSet::from([20]));
    }

    #[test]
    fn prior_version_types_are_known_but_not_bound() {
        let mut model = ModelRegistry::new();
        model.record_prior_version("LegacyAccount", 30);
        assert!(model.knows_storage_id(30));
        assert!(model.type_for_storage_id(30).is_none());
        assert!(model.type_for_name("LegacyAccount").is_none());
    }

    #[test]
    fn snapshots_are_independent() {
        let mut db = Database::new();
        let a = db.create(10);
        let before = db.snapshot();
        let b = db.create(10);
        let after = db.snapshot();
        assert_eq!(before.get_all().len(), 1);
        assert_eq!(after.get_all().len(), 2);
        assert!(before.resolve_object(b).is_none());
        assert!(after.resolve_object(a).is_some());
    }
}
