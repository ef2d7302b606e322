//! # Component Metadata and Component Sets
//!
//! This module defines how component types describe themselves to the engine
//! and how sets of components establish archetype identity.
//!
//! ## Purpose
//! The storage layer never sees Rust types; it sees layout metadata. A
//! [`ComponentMeta`] carries everything a column needs to store one component
//! type (id, size, alignment, stride) plus an optional trait descriptor for
//! grouping. A [`ComponentSet`] is the sorted, deduplicated sequence of metas
//! whose canonical hash names an archetype.
//!
//! ## Design
//! - Identity flows from names: [`Component::type_name`] hashes to a
//!   [`ComponentId`], and the ordered id sequence of a set hashes to an
//!   [`ArchetypeId`].
//! - Components are plain value types (`Copy`); rows move between archetypes
//!   as raw byte copies and no destructors ever run inside storage.
//! - Trait participation is type-level metadata carried in the meta, so
//!   grouping never needs to inspect the component payload.
//!
//! ## Invariants
//! - A set's metas are strictly ascending by id with no duplicates.
//! - Meta equality covers id and layout only; trait descriptors are
//!   irrelevant to identity.
//! - `union` and `difference` of equal inputs are deterministic, and equal
//!   sets always produce equal canonical ids.

use std::mem::{align_of, size_of};
use std::ptr;

use smallvec::SmallVec;

use crate::engine::types::{
    align_up, fnv1a_extend, ArchetypeId, ComponentId, GroupKey, FNV_OFFSET_BASIS,
};

/// How a component participates in a virtual trait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraitKind {
    /// Membership only; the trait carries no ordering information.
    Marker,

    /// Membership plus a signed key used to order grouped iteration.
    Grouped {
        /// Key this component contributes to grouped iteration.
        key: GroupKey,
    },
}

/// Type-level declaration that a component participates in a virtual trait.
///
/// ## Purpose
/// Several concrete component types may declare the same trait id; grouped
/// queries then treat them as one virtual component, partitioned by key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraitDesc {
    /// Identifier of the virtual trait component.
    pub id: ComponentId,

    /// Participation kind.
    pub kind: TraitKind,
}

impl TraitDesc {
    /// Declares marker participation in `id`.
    #[inline]
    pub const fn marker(id: ComponentId) -> Self {
        Self { id, kind: TraitKind::Marker }
    }

    /// Declares grouped participation in `id` under `key`.
    #[inline]
    pub const fn grouped(id: ComponentId, key: GroupKey) -> Self {
        Self { id, kind: TraitKind::Grouped { key } }
    }
}

/// A plain value type that can be stored as a component.
///
/// ## Contract
/// - `type_name` must be stable for the lifetime of the process; the
///   component's identity is the FNV-1a hash of this name.
/// - Implementors are `Copy`: storage moves rows between archetypes with
///   byte copies and never runs destructors.
///
/// ## Example
/// ```ignore
/// #[derive(Clone, Copy)]
/// struct Health { current: u32, max: u32 }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Copy + Send + Sync + 'static {
    /// Stable name this component's identity is derived from.
    fn type_name() -> &'static str;

    /// Optional virtual-trait participation, visible in the meta.
    const TRAIT_DESC: Option<TraitDesc> = None;

    /// Returns the stable identifier for this component type.
    #[inline]
    fn id() -> ComponentId {
        ComponentId::from_name(Self::type_name())
    }

    /// Returns the layout descriptor for this component type.
    #[inline]
    fn meta() -> ComponentMeta {
        ComponentMeta::of::<Self>()
    }
}

/// Identity and layout of one component type.
///
/// ## Fields
/// - `id`: stable hashed identifier.
/// - `size`: `size_of` the component in bytes.
/// - `align`: required alignment of the column base pointer.
/// - `stride`: byte distance between consecutive rows
///   (`align_up(size, align)` for sized components, `0` for zero-sized ones).
/// - `trait_desc`: optional virtual-trait participation.
///
/// ## Notes
/// Two metas are equal iff `id`, `size`, `align`, and `stride` all match;
/// trait participation does not affect identity.
#[derive(Clone, Copy, Debug)]
pub struct ComponentMeta {
    /// Stable identifier of the component type.
    pub id: ComponentId,

    /// Size of one component value in bytes.
    pub size: usize,

    /// Required alignment of the column base pointer.
    pub align: usize,

    /// Byte distance between consecutive rows; `0` for zero-sized types.
    pub stride: usize,

    /// Optional virtual-trait participation.
    pub trait_desc: Option<TraitDesc>,
}

impl ComponentMeta {
    /// Builds the meta for component type `T`.
    #[inline]
    pub fn of<T: Component>() -> Self {
        let size = size_of::<T>();
        let align = align_of::<T>();
        Self {
            id: T::id(),
            size,
            align,
            stride: if size > 0 { align_up(size, align) } else { 0 },
            trait_desc: T::TRAIT_DESC,
        }
    }

    /// Builds a meta from explicit layout values.
    #[inline]
    pub fn from_layout(id: ComponentId, size: usize, align: usize) -> Self {
        Self {
            id,
            size,
            align,
            stride: if size > 0 { align_up(size, align) } else { 0 },
            trait_desc: None,
        }
    }

    /// Returns `true` if the component occupies no storage.
    #[inline]
    pub fn is_zero_sized(&self) -> bool {
        self.size == 0
    }

    /// Returns the group key this meta contributes to `trait_id`, if any.
    #[inline]
    pub fn grouped_key(&self, trait_id: ComponentId) -> Option<GroupKey> {
        match self.trait_desc {
            Some(TraitDesc { id, kind: TraitKind::Grouped { key } }) if id == trait_id => Some(key),
            _ => None,
        }
    }
}

impl PartialEq for ComponentMeta {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.size == other.size
            && self.align == other.align
            && self.stride == other.stride
    }
}

impl Eq for ComponentMeta {}

/// An owned, type-erased component value: a meta plus the value's bytes.
///
/// ## Purpose
/// Structural-mutation entry points and queued transaction commands carry
/// component payloads without knowing their static types. The byte capture is
/// exact (`meta.size` bytes) and is copied into column storage on insertion.
#[derive(Clone, Debug)]
pub struct ComponentValue {
    meta: ComponentMeta,
    bytes: Box<[u8]>,
}

impl ComponentValue {
    /// Captures a typed component value into its byte representation.
    pub fn of<T: Component>(value: T) -> Self {
        let meta = ComponentMeta::of::<T>();
        let mut bytes = vec![0u8; meta.size].into_boxed_slice();
        if meta.size > 0 {
            // SAFETY: `value` is a live `T` of exactly `meta.size` bytes and
            // the destination buffer was allocated with that length.
            unsafe {
                ptr::copy_nonoverlapping(
                    (&value as *const T).cast::<u8>(),
                    bytes.as_mut_ptr(),
                    meta.size,
                );
            }
        }
        Self { meta, bytes }
    }

    /// Builds a value from a meta and a raw byte payload.
    ///
    /// ## Notes
    /// The payload length must equal `meta.size`; storage rejects mismatched
    /// writes, so a bad capture surfaces on insertion rather than silently.
    pub fn from_bytes(meta: ComponentMeta, bytes: Box<[u8]>) -> Self {
        Self { meta, bytes }
    }

    /// Returns the component's identifier.
    #[inline]
    pub fn id(&self) -> ComponentId {
        self.meta.id
    }

    /// Returns the component's layout descriptor.
    #[inline]
    pub fn meta(&self) -> &ComponentMeta {
        &self.meta
    }

    /// Returns the captured bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A sorted, deduplicated sequence of component metas.
///
/// ## Purpose
/// `ComponentSet` is the identity of an archetype: its canonical 64-bit hash
/// over the ordered id sequence names the archetype, and its order fixes the
/// column order of the table.
///
/// ## Invariants
/// - Metas are strictly ascending by id.
/// - No two metas share an id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentSet {
    metas: SmallVec<[ComponentMeta; 8]>,
}

impl ComponentSet {
    /// Creates an empty set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from a slice of metas; duplicates collapse.
    pub fn from_metas(metas: &[ComponentMeta]) -> Self {
        let mut set = Self::new();
        for meta in metas {
            set.insert_sorted(*meta);
        }
        set
    }

    /// Builds a set from the metas of a slice of captured values.
    pub fn from_values(values: &[ComponentValue]) -> Self {
        let mut set = Self::new();
        for value in values {
            set.insert_sorted(*value.meta());
        }
        set
    }

    /// Inserts a meta at its sorted position; already-present ids are kept.
    pub fn insert_sorted(&mut self, meta: ComponentMeta) {
        match self.metas.binary_search_by(|probe| probe.id.cmp(&meta.id)) {
            Ok(_) => {}
            Err(index) => self.metas.insert(index, meta),
        }
    }

    /// Returns the union of two sets as a linear merge.
    ///
    /// ## Behavior
    /// When both sides carry the same id, the left side's meta is kept.
    pub fn union(&self, other: &ComponentSet) -> ComponentSet {
        let mut merged: SmallVec<[ComponentMeta; 8]> = SmallVec::new();
        let (mut left, mut right) = (0, 0);
        while left < self.metas.len() && right < other.metas.len() {
            match self.metas[left].id.cmp(&other.metas[right].id) {
                std::cmp::Ordering::Less => {
                    merged.push(self.metas[left]);
                    left += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(other.metas[right]);
                    right += 1;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(self.metas[left]);
                    left += 1;
                    right += 1;
                }
            }
        }
        merged.extend_from_slice(&self.metas[left..]);
        merged.extend_from_slice(&other.metas[right..]);
        ComponentSet { metas: merged }
    }

    /// Returns the left-side metas whose ids are absent from `other`.
    pub fn difference(&self, other: &ComponentSet) -> ComponentSet {
        let mut remaining: SmallVec<[ComponentMeta; 8]> = SmallVec::new();
        let (mut left, mut right) = (0, 0);
        while left < self.metas.len() && right < other.metas.len() {
            match self.metas[left].id.cmp(&other.metas[right].id) {
                std::cmp::Ordering::Less => {
                    remaining.push(self.metas[left]);
                    left += 1;
                }
                std::cmp::Ordering::Greater => {
                    right += 1;
                }
                std::cmp::Ordering::Equal => {
                    left += 1;
                    right += 1;
                }
            }
        }
        remaining.extend_from_slice(&self.metas[left..]);
        ComponentSet { metas: remaining }
    }

    /// Computes the canonical archetype id of this set.
    ///
    /// ## Behavior
    /// Hashes the ordered id sequence only; layout is irrelevant to identity,
    /// so equal id sets always hash equally.
    pub fn canonical_id(&self) -> ArchetypeId {
        let mut hash = FNV_OFFSET_BASIS;
        for meta in &self.metas {
            hash = fnv1a_extend(hash, &meta.id.as_raw().to_le_bytes());
        }
        hash
    }

    /// Returns `true` if the set contains `id`.
    #[inline]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.metas.binary_search_by(|probe| probe.id.cmp(&id)).is_ok()
    }

    /// Returns the sorted position of `id`, if present.
    #[inline]
    pub fn position(&self, id: ComponentId) -> Option<usize> {
        self.metas.binary_search_by(|probe| probe.id.cmp(&id)).ok()
    }

    /// Returns the number of component types in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// Returns `true` if the set holds no component types.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    /// Iterates the metas in ascending id order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ComponentMeta> {
        self.metas.iter()
    }

    /// Returns the metas as an ordered slice.
    #[inline]
    pub fn as_slice(&self) -> &[ComponentMeta] {
        &self.metas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    struct Position {
        #[allow(dead_code)]
        x: f32,
        #[allow(dead_code)]
        y: f32,
    }

    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[derive(Clone, Copy)]
    struct Velocity {
        #[allow(dead_code)]
        dx: f32,
        #[allow(dead_code)]
        dy: f32,
    }

    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    #[derive(Clone, Copy)]
    struct Frozen;

    impl Component for Frozen {
        fn type_name() -> &'static str {
            "Frozen"
        }
    }

    #[test]
    fn meta_of_matches_layout() {
        let meta = ComponentMeta::of::<Position>();
        assert_eq!(meta.id, Position::id());
        assert_eq!(meta.size, std::mem::size_of::<Position>());
        assert_eq!(meta.align, std::mem::align_of::<Position>());
        assert_eq!(meta.stride, std::mem::size_of::<Position>());
    }

    #[test]
    fn zero_sized_meta_has_zero_stride() {
        let meta = ComponentMeta::of::<Frozen>();
        assert_eq!(meta.size, 0);
        assert_eq!(meta.stride, 0);
        assert!(meta.is_zero_sized());
    }

    #[test]
    fn meta_equality_ignores_trait_participation() {
        let mut with_trait = ComponentMeta::of::<Position>();
        with_trait.trait_desc =
            Some(TraitDesc::grouped(ComponentId::from_name("DrawLayer"), 3));
        assert_eq!(with_trait, ComponentMeta::of::<Position>());
    }

    #[test]
    fn set_is_sorted_and_deduplicated() {
        let set = ComponentSet::from_metas(&[
            ComponentMeta::of::<Velocity>(),
            ComponentMeta::of::<Position>(),
            ComponentMeta::of::<Velocity>(),
        ]);
        assert_eq!(set.len(), 2);
        let ids: Vec<_> = set.iter().map(|m| m.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn union_and_difference_laws() {
        let a = ComponentSet::from_metas(&[
            ComponentMeta::of::<Position>(),
            ComponentMeta::of::<Velocity>(),
        ]);
        assert_eq!(a.union(&a), a);
        assert!(a.difference(&a).is_empty());

        let b = ComponentSet::from_metas(&[ComponentMeta::of::<Velocity>()]);
        let a_minus_b = a.difference(&b);
        assert_eq!(a_minus_b.len(), 1);
        assert!(a_minus_b.contains(Position::id()));
        assert_eq!(a.union(&b), a);
    }

    #[test]
    fn canonical_id_is_order_independent() {
        let forward = ComponentSet::from_metas(&[
            ComponentMeta::of::<Position>(),
            ComponentMeta::of::<Velocity>(),
        ]);
        let backward = ComponentSet::from_metas(&[
            ComponentMeta::of::<Velocity>(),
            ComponentMeta::of::<Position>(),
        ]);
        assert_eq!(forward.canonical_id(), backward.canonical_id());
        assert_ne!(
            forward.canonical_id(),
            ComponentSet::from_metas(&[ComponentMeta::of::<Position>()]).canonical_id()
        );
    }

    #[test]
    fn value_captures_exact_bytes() {
        let value = ComponentValue::of(Position { x: 1.0, y: 2.0 });
        assert_eq!(value.bytes().len(), std::mem::size_of::<Position>());
        assert_eq!(value.id(), Position::id());

        let empty = ComponentValue::of(Frozen);
        assert!(empty.bytes().is_empty());
    }
}
