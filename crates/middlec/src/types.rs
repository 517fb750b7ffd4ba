//! Type registry for the middle end.
//!
//! An append-only pool of [`Type`] values addressed by [`TypeIndex`]. Indices
//! are never invalidated and types never mutate after insertion (see spec
//! §3.1, §4.1). Reserved slots 0..=21 are the well-known basic and SSA
//! pseudo-types; everything else (structs, enums, unions, pointers, and so
//! on) is interned on demand.

use std::collections::HashMap;

/// A stable handle into the [`TypeRegistry`]. Never invalidated once issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIndex(pub u32);

impl TypeIndex {
    pub const INVALID: TypeIndex = TypeIndex(0);
    pub const BOOL: TypeIndex = TypeIndex(1);
    pub const I8: TypeIndex = TypeIndex(2);
    pub const I16: TypeIndex = TypeIndex(3);
    pub const I32: TypeIndex = TypeIndex(4);
    pub const I64: TypeIndex = TypeIndex(5);
    pub const U8: TypeIndex = TypeIndex(6);
    pub const U16: TypeIndex = TypeIndex(7);
    pub const U32: TypeIndex = TypeIndex(8);
    pub const U64: TypeIndex = TypeIndex(9);
    pub const F32: TypeIndex = TypeIndex(10);
    pub const F64: TypeIndex = TypeIndex(11);
    pub const VOID: TypeIndex = TypeIndex(12);
    pub const UNTYPED_INT: TypeIndex = TypeIndex(13);
    pub const UNTYPED_FLOAT: TypeIndex = TypeIndex(14);
    pub const UNTYPED_BOOL: TypeIndex = TypeIndex(15);
    pub const UNTYPED_NULL: TypeIndex = TypeIndex(16);
    pub const STRING: TypeIndex = TypeIndex(17);
    pub const MEM: TypeIndex = TypeIndex(18);
    pub const FLAGS: TypeIndex = TypeIndex(19);
    pub const TUPLE: TypeIndex = TypeIndex(20);
    pub const RESULTS: TypeIndex = TypeIndex(21);

    /// One past the last reserved well-known slot.
    const FIRST_USER_INDEX: u32 = 22;

    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Basic (non-composite) type kinds, including the four untyped literal
/// kinds and the SSA pseudo-types that never appear in source-level
/// expressions but are needed so [`TypeIndex`] can address them uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Invalid,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Void,
    UntypedInt,
    UntypedFloat,
    UntypedBool,
    UntypedNull,
    /// SSA-only pseudo-type: the effect of a memory operation.
    Mem,
    /// SSA-only pseudo-type: condition-code results of a comparison.
    Flags,
    /// SSA-only pseudo-type: a multi-value tuple (wide return decomposition).
    Tuple,
    /// SSA-only pseudo-type: the results of a multi-return call.
    Results,
}

impl BasicKind {
    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedInt
                | BasicKind::UntypedFloat
                | BasicKind::UntypedBool
                | BasicKind::UntypedNull
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::I8
                | BasicKind::I16
                | BasicKind::I32
                | BasicKind::I64
                | BasicKind::U8
                | BasicKind::U16
                | BasicKind::U32
                | BasicKind::U64
                | BasicKind::UntypedInt
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            BasicKind::U8 | BasicKind::U16 | BasicKind::U32 | BasicKind::U64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicKind::F32 | BasicKind::F64 | BasicKind::UntypedFloat)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Byte width of this basic kind. Untyped kinds report the width of
    /// their materialized default (spec §3.1: untyped int/float default to
    /// the 8-byte `i64`/`f64`).
    pub fn size(self) -> u32 {
        match self {
            BasicKind::Invalid | BasicKind::Void => 0,
            BasicKind::Bool | BasicKind::I8 | BasicKind::U8 | BasicKind::UntypedBool => 1,
            BasicKind::I16 | BasicKind::U16 => 2,
            BasicKind::I32 | BasicKind::U32 => 4,
            BasicKind::I64
            | BasicKind::U64
            | BasicKind::F64
            | BasicKind::UntypedInt
            | BasicKind::UntypedFloat
            | BasicKind::UntypedNull => 8,
            BasicKind::F32 => 4,
            BasicKind::Mem | BasicKind::Flags | BasicKind::Tuple | BasicKind::Results => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub ty: TypeIndex,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumVariant {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionVariant {
    /// `None` for a unit variant (no payload).
    pub payload: Option<TypeIndex>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncParam {
    pub name: String,
    pub ty: TypeIndex,
}

/// A tagged-variant type. See spec §3.1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Basic(BasicKind),
    Pointer { elem: TypeIndex },
    Optional { elem: TypeIndex },
    Slice { elem: TypeIndex },
    Array { elem: TypeIndex, length: u64 },
    Map { key: TypeIndex, value: TypeIndex },
    List { elem: TypeIndex },
    Struct {
        name: String,
        fields: Vec<StructField>,
        size: u32,
        alignment: u32,
    },
    Enum {
        name: String,
        variants: Vec<EnumVariant>,
        backing_type: TypeIndex,
    },
    /// A tagged union (Rust-style sum type), not a C union.
    Union {
        name: String,
        variants: Vec<UnionVariant>,
        tag_type: TypeIndex,
    },
    Func {
        params: Vec<FuncParam>,
        return_type: TypeIndex,
    },
}

impl Type {
    /// The nominal name of a struct/enum/union, if it has one.
    pub fn nominal_name(&self) -> Option<&str> {
        match self {
            Type::Struct { name, .. } | Type::Enum { name, .. } | Type::Union { name, .. } => {
                Some(name)
            }
            _ => None,
        }
    }
}

/// Append-only pool of interned [`Type`]s plus the name→index table for
/// predefined aliases and user-declared named types.
///
/// Interning composite types is not required for correctness (spec §4.1
/// explicitly allows structural comparison everywhere instead), but this
/// registry interns them anyway to keep `TypeIndex` equality a cheap proxy
/// for structural equality in the common case; `equal`/`is_assignable`
/// still fall back to full structural/nominal comparison so a
/// reimplementation that skipped interning would observe identical answers.
pub struct TypeRegistry {
    types: Vec<Type>,
    by_name: HashMap<String, TypeIndex>,
    /// `(receiver_type_name, method_name) -> synthesized function type`.
    /// Populated by the checker during impl-block collection (spec §4.3
    /// phase 1b); read-only to everyone else.
    methods: HashMap<(String, String), TypeIndex>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut types = Vec::with_capacity(32);
        use BasicKind::*;
        let reserved = [
            Invalid, Bool, I8, I16, I32, I64, U8, U16, U32, U64, F32, F64, Void, UntypedInt,
            UntypedFloat, UntypedBool, UntypedNull,
        ];
        for kind in reserved {
            types.push(Type::Basic(kind));
        }
        // STRING = slice{u8}, index 17.
        types.push(Type::Slice {
            elem: TypeIndex::U8,
        });
        for kind in [Mem, Flags, Tuple, Results] {
            types.push(Type::Basic(kind));
        }
        debug_assert_eq!(types.len(), TypeIndex::FIRST_USER_INDEX as usize);

        let mut by_name = HashMap::new();
        by_name.insert("int".to_string(), TypeIndex::I64);
        by_name.insert("float".to_string(), TypeIndex::F64);
        by_name.insert("byte".to_string(), TypeIndex::U8);
        by_name.insert("string".to_string(), TypeIndex::STRING);
        by_name.insert("bool".to_string(), TypeIndex::BOOL);
        by_name.insert("void".to_string(), TypeIndex::VOID);
        for (alias, idx) in [
            ("i8", TypeIndex::I8),
            ("i16", TypeIndex::I16),
            ("i32", TypeIndex::I32),
            ("i64", TypeIndex::I64),
            ("u8", TypeIndex::U8),
            ("u16", TypeIndex::U16),
            ("u32", TypeIndex::U32),
            ("u64", TypeIndex::U64),
            ("f32", TypeIndex::F32),
            ("f64", TypeIndex::F64),
        ] {
            by_name.insert(alias.to_string(), idx);
        }

        TypeRegistry {
            types,
            by_name,
            methods: HashMap::new(),
        }
    }

    /// Property (spec §8.1): indices returned by `add` are strictly
    /// increasing and previously returned indices remain valid forever.
    pub fn add(&mut self, ty: Type) -> TypeIndex {
        // Intern composites structurally so repeated `add` calls for an
        // equal type return the same index. Nominal types (struct/enum/
        // union) are never deduped here: two distinct declarations can
        // have identical structure but different names/identity, and
        // `equal`/`is_assignable` already treat them nominally.
        if ty.nominal_name().is_none() {
            if let Some(existing) = self.types.iter().position(|t| t == &ty) {
                return TypeIndex(existing as u32);
            }
        }
        let idx = TypeIndex(self.types.len() as u32);
        self.types.push(ty);
        idx
    }

    pub fn get(&self, idx: TypeIndex) -> &Type {
        &self.types[idx.as_usize()]
    }

    /// Read-only counterpart to [`TypeRegistry::add`]'s structural dedup:
    /// find an already-interned type without registering a new one.
    /// Callers that only ever re-derive types the checker already built
    /// (the lowerer, the SSA builder) use this instead of `add` so they
    /// never need a mutable registry.
    pub fn find(&self, ty: &Type) -> Option<TypeIndex> {
        self.types.iter().position(|t| t == ty).map(|i| TypeIndex(i as u32))
    }

    pub fn make_pointer(&mut self, elem: TypeIndex) -> TypeIndex {
        self.add(Type::Pointer { elem })
    }

    pub fn make_optional(&mut self, elem: TypeIndex) -> TypeIndex {
        self.add(Type::Optional { elem })
    }

    pub fn make_slice(&mut self, elem: TypeIndex) -> TypeIndex {
        self.add(Type::Slice { elem })
    }

    pub fn make_array(&mut self, elem: TypeIndex, length: u64) -> TypeIndex {
        self.add(Type::Array { elem, length })
    }

    pub fn make_map(&mut self, key: TypeIndex, value: TypeIndex) -> TypeIndex {
        self.add(Type::Map { key, value })
    }

    pub fn make_list(&mut self, elem: TypeIndex) -> TypeIndex {
        self.add(Type::List { elem })
    }

    pub fn make_func(&mut self, params: Vec<FuncParam>, return_type: TypeIndex) -> TypeIndex {
        self.add(Type::Func {
            params,
            return_type,
        })
    }

    /// Register a user-declared struct, computing layout from field types
    /// in declaration order (spec §3.1: natural alignment, size rounded up
    /// to 8 bytes, struct alignment fixed at 8).
    pub fn register_struct(&mut self, name: String, field_types: Vec<(String, TypeIndex)>) -> TypeIndex {
        let mut fields = Vec::with_capacity(field_types.len());
        let mut offset: u32 = 0;
        for (fname, fty) in field_types {
            let align = self.alignment_of(fty).max(1);
            offset = offset.div_ceil(align) * align;
            fields.push(StructField {
                name: fname,
                ty: fty,
                offset,
            });
            offset += self.size_of(fty);
        }
        let size = offset.div_ceil(8) * 8;
        let idx = self.add(Type::Struct {
            name: name.clone(),
            fields,
            size,
            alignment: 8,
        });
        self.by_name.insert(name, idx);
        idx
    }

    /// Register a user-declared enum. Backing type defaults to `I32` (spec
    /// §3.1) if the caller passes `None`.
    pub fn register_enum(
        &mut self,
        name: String,
        variants: Vec<EnumVariant>,
        backing_type: Option<TypeIndex>,
    ) -> TypeIndex {
        let backing_type = backing_type.unwrap_or(TypeIndex::I32);
        let idx = self.add(Type::Enum {
            name: name.clone(),
            variants,
            backing_type,
        });
        self.by_name.insert(name, idx);
        idx
    }

    /// Register a user-declared tagged union. Tag type is `U8` for <= 256
    /// variants, else `U16` (spec §3.1).
    pub fn register_union(&mut self, name: String, variants: Vec<UnionVariant>) -> TypeIndex {
        let tag_type = if variants.len() <= 256 {
            TypeIndex::U8
        } else {
            TypeIndex::U16
        };
        let idx = self.add(Type::Union {
            name: name.clone(),
            variants,
            tag_type,
        });
        self.by_name.insert(name, idx);
        idx
    }

    /// Register a type alias: makes `name` resolve to `target`'s index
    /// without creating a new `Type` entry.
    pub fn register_alias(&mut self, name: String, target: TypeIndex) {
        self.by_name.insert(name, target);
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<TypeIndex> {
        self.by_name.get(name).copied()
    }

    pub fn register_method(&mut self, receiver_type_name: &str, method_name: &str, func_ty: TypeIndex) {
        self.methods
            .insert((receiver_type_name.to_string(), method_name.to_string()), func_ty);
    }

    pub fn lookup_method(&self, receiver_type_name: &str, method_name: &str) -> Option<TypeIndex> {
        self.methods
            .get(&(receiver_type_name.to_string(), method_name.to_string()))
            .copied()
    }

    /// The synthesized lowering name `TypeName_methodName` (spec §4.3
    /// phase 1b) used both as the function symbol name and as the method
    /// registry's informal key when code needs a single string.
    pub fn synthesize_method_name(receiver_type_name: &str, method_name: &str) -> String {
        format!("{receiver_type_name}_{method_name}")
    }

    pub fn size_of(&self, idx: TypeIndex) -> u32 {
        match self.get(idx) {
            Type::Basic(kind) => kind.size(),
            Type::Pointer { .. } | Type::Func { .. } => 8,
            Type::Optional { elem } => self.size_of(*elem),
            Type::Slice { .. } => 16, // { ptr: *u8, len: i64 }
            Type::Array { elem, length } => self.size_of(*elem) * (*length as u32),
            Type::Map { .. } | Type::List { .. } => 16,
            Type::Struct { size, .. } => *size,
            Type::Enum { backing_type, .. } => self.size_of(*backing_type),
            Type::Union { variants, tag_type, .. } => {
                let max_payload = variants
                    .iter()
                    .filter_map(|v| v.payload)
                    .map(|p| self.size_of(p))
                    .max()
                    .unwrap_or(0);
                let tag_size = self.size_of(*tag_type);
                (tag_size + max_payload).div_ceil(8) * 8
            }
        }
    }

    pub fn alignment_of(&self, idx: TypeIndex) -> u32 {
        match self.get(idx) {
            Type::Basic(kind) => kind.size().max(1),
            Type::Pointer { .. } | Type::Func { .. } => 8,
            Type::Optional { elem } => self.alignment_of(*elem),
            Type::Slice { .. } => 8,
            Type::Array { elem, .. } => self.alignment_of(*elem),
            Type::Map { .. } | Type::List { .. } => 8,
            Type::Struct { alignment, .. } => *alignment,
            Type::Enum { backing_type, .. } => self.alignment_of(*backing_type),
            Type::Union { .. } => 8,
        }
    }

    /// Structural equality for composites, nominal for struct/enum/union
    /// (compares names). `STRING` and a freshly constructed `slice{u8}`
    /// are always interchangeable (spec §4.1).
    pub fn equal(&self, a: TypeIndex, b: TypeIndex) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Type::Struct { name: n1, .. }, Type::Struct { name: n2, .. }) => n1 == n2,
            (Type::Enum { name: n1, .. }, Type::Enum { name: n2, .. }) => n1 == n2,
            (Type::Union { name: n1, .. }, Type::Union { name: n2, .. }) => n1 == n2,
            (Type::Pointer { elem: e1 }, Type::Pointer { elem: e2 }) => self.equal(*e1, *e2),
            (Type::Optional { elem: e1 }, Type::Optional { elem: e2 }) => self.equal(*e1, *e2),
            (Type::Slice { elem: e1 }, Type::Slice { elem: e2 }) => self.equal(*e1, *e2),
            (Type::Array { elem: e1, length: l1 }, Type::Array { elem: e2, length: l2 }) => {
                l1 == l2 && self.equal(*e1, *e2)
            }
            (Type::Map { key: k1, value: v1 }, Type::Map { key: k2, value: v2 }) => {
                self.equal(*k1, *k2) && self.equal(*v1, *v2)
            }
            (Type::List { elem: e1 }, Type::List { elem: e2 }) => self.equal(*e1, *e2),
            (
                Type::Func {
                    params: p1,
                    return_type: r1,
                },
                Type::Func {
                    params: p2,
                    return_type: r2,
                },
            ) => {
                p1.len() == p2.len()
                    && p1
                        .iter()
                        .zip(p2.iter())
                        .all(|(x, y)| self.equal(x.ty, y.ty))
                    && self.equal(*r1, *r2)
            }
            _ => false,
        }
    }

    fn is_basic(&self, idx: TypeIndex, pred: impl Fn(BasicKind) -> bool) -> bool {
        matches!(self.get(idx), Type::Basic(k) if pred(*k))
    }

    pub fn is_invalid(&self, idx: TypeIndex) -> bool {
        self.is_basic(idx, |k| matches!(k, BasicKind::Invalid))
    }

    pub fn is_untyped(&self, idx: TypeIndex) -> bool {
        self.is_basic(idx, BasicKind::is_untyped)
    }

    pub fn is_integer(&self, idx: TypeIndex) -> bool {
        self.is_basic(idx, BasicKind::is_integer)
    }

    pub fn is_float(&self, idx: TypeIndex) -> bool {
        self.is_basic(idx, BasicKind::is_float)
    }

    pub fn is_numeric(&self, idx: TypeIndex) -> bool {
        self.is_basic(idx, BasicKind::is_numeric)
    }

    pub fn is_bool(&self, idx: TypeIndex) -> bool {
        idx == TypeIndex::BOOL || self.is_basic(idx, |k| matches!(k, BasicKind::UntypedBool))
    }

    pub fn is_pointer(&self, idx: TypeIndex) -> bool {
        matches!(self.get(idx), Type::Pointer { .. })
    }

    pub fn pointer_elem(&self, idx: TypeIndex) -> Option<TypeIndex> {
        match self.get(idx) {
            Type::Pointer { elem } => Some(*elem),
            _ => None,
        }
    }

    pub fn is_array(&self, idx: TypeIndex) -> bool {
        matches!(self.get(idx), Type::Array { .. })
    }

    pub fn array_len(&self, idx: TypeIndex) -> Option<u64> {
        match self.get(idx) {
            Type::Array { length, .. } => Some(*length),
            _ => None,
        }
    }

    pub fn is_slice(&self, idx: TypeIndex) -> bool {
        idx == TypeIndex::STRING || matches!(self.get(idx), Type::Slice { .. })
    }

    pub fn is_optional(&self, idx: TypeIndex) -> bool {
        matches!(self.get(idx), Type::Optional { .. })
    }

    /// The element type of an array, slice, or `STRING` (as `u8`), if any.
    pub fn elem_type(&self, idx: TypeIndex) -> Option<TypeIndex> {
        if idx == TypeIndex::STRING {
            return Some(TypeIndex::U8);
        }
        match self.get(idx) {
            Type::Array { elem, .. } | Type::Slice { elem } | Type::List { elem } => Some(*elem),
            _ => None,
        }
    }

    /// `isAssignable(from,to)`: equality, extended with untyped→typed
    /// coercions, `T -> ?T`, array->slice of the same element, and full
    /// function-signature equivalence. Either side `invalid` is always
    /// assignable, so an earlier error never cascades (spec §4.1, §7).
    pub fn is_assignable(&self, from: TypeIndex, to: TypeIndex) -> bool {
        if self.is_invalid(from) || self.is_invalid(to) {
            return true;
        }
        if self.equal(from, to) {
            return true;
        }
        if let Type::Basic(from_kind) = self.get(from) {
            match from_kind {
                BasicKind::UntypedInt => {
                    if self.is_integer(to) || self.is_float(to) {
                        return true;
                    }
                }
                BasicKind::UntypedFloat => {
                    if self.is_float(to) {
                        return true;
                    }
                }
                BasicKind::UntypedBool => {
                    if to == TypeIndex::BOOL {
                        return true;
                    }
                }
                BasicKind::UntypedNull => {
                    if self.is_optional(to) || self.is_pointer(to) {
                        return true;
                    }
                }
                _ => {}
            }
        }
        if let Type::Optional { elem } = self.get(to) {
            let elem = *elem;
            if self.is_assignable(from, elem) {
                return true;
            }
        }
        if let (Type::Array { elem: ae, length: _ }, Type::Slice { elem: se }) =
            (self.get(from), self.get(to))
        {
            return self.equal(*ae, *se);
        }
        if let (
            Type::Func {
                params: p1,
                return_type: r1,
            },
            Type::Func {
                params: p2,
                return_type: r2,
            },
        ) = (self.get(from), self.get(to))
        {
            return p1.len() == p2.len()
                && p1.iter().zip(p2.iter()).all(|(x, y)| self.equal(x.ty, y.ty))
                && self.equal(*r1, *r2);
        }
        false
    }

    /// Materialize an untyped type to its concrete default (spec §4.3,
    /// GLOSSARY): `untyped_int -> i64`, `untyped_float -> f64`,
    /// `untyped_bool -> bool`, `untyped_null` stays itself (it only ever
    /// appears as a literal type, never as a variable's declared type).
    /// Recurses through array/slice element types.
    pub fn materialize(&mut self, idx: TypeIndex) -> TypeIndex {
        match self.get(idx).clone() {
            Type::Basic(BasicKind::UntypedInt) => TypeIndex::I64,
            Type::Basic(BasicKind::UntypedFloat) => TypeIndex::F64,
            Type::Basic(BasicKind::UntypedBool) => TypeIndex::BOOL,
            Type::Array { elem, length } => {
                let melem = self.materialize(elem);
                if melem == elem {
                    idx
                } else {
                    self.make_array(melem, length)
                }
            }
            Type::Slice { elem } => {
                let melem = self.materialize(elem);
                if melem == elem {
                    idx
                } else {
                    self.make_slice(melem)
                }
            }
            _ => idx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_indices_match_spec() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.get(TypeIndex::INVALID), &Type::Basic(BasicKind::Invalid));
        assert_eq!(reg.get(TypeIndex::I64), &Type::Basic(BasicKind::I64));
        assert_eq!(reg.get(TypeIndex::STRING), &Type::Slice { elem: TypeIndex::U8 });
        assert_eq!(reg.size_of(TypeIndex::STRING), 16);
        assert_eq!(reg.alignment_of(TypeIndex::STRING), 8);
    }

    #[test]
    fn add_indices_monotonic_and_stable() {
        // Spec §8 property 1: `add` returns strictly increasing indices and
        // previously returned indices remain valid forever.
        let mut reg = TypeRegistry::new();
        let a = reg.add(Type::Struct {
            name: "A".to_string(),
            fields: vec![],
            size: 0,
            alignment: 8,
        });
        let b = reg.add(Type::Struct {
            name: "B".to_string(),
            fields: vec![],
            size: 0,
            alignment: 8,
        });
        assert!(b.0 > a.0);
        assert_eq!(reg.get(a).nominal_name(), Some("A"));
        assert_eq!(reg.get(b).nominal_name(), Some("B"));
    }

    #[test]
    fn non_nominal_types_are_interned() {
        let mut reg = TypeRegistry::new();
        let p1 = reg.make_pointer(TypeIndex::I64);
        let p2 = reg.make_pointer(TypeIndex::I64);
        assert_eq!(p1, p2);
    }

    #[test]
    fn assignability_reflexive_for_every_basic() {
        // Spec §8 property 3.
        let reg = TypeRegistry::new();
        for idx in [
            TypeIndex::BOOL,
            TypeIndex::I8,
            TypeIndex::I64,
            TypeIndex::U64,
            TypeIndex::F32,
            TypeIndex::F64,
            TypeIndex::STRING,
        ] {
            assert!(reg.is_assignable(idx, idx));
        }
    }

    #[test]
    fn invalid_is_assignable_both_ways() {
        let reg = TypeRegistry::new();
        assert!(reg.is_assignable(TypeIndex::INVALID, TypeIndex::I64));
        assert!(reg.is_assignable(TypeIndex::I64, TypeIndex::INVALID));
    }

    #[test]
    fn untyped_int_assignable_to_any_numeric() {
        let reg = TypeRegistry::new();
        assert!(reg.is_assignable(TypeIndex::UNTYPED_INT, TypeIndex::I32));
        assert!(reg.is_assignable(TypeIndex::UNTYPED_INT, TypeIndex::F64));
        assert!(!reg.is_assignable(TypeIndex::UNTYPED_INT, TypeIndex::BOOL));
    }

    #[test]
    fn array_assignable_to_slice_of_same_element() {
        let mut reg = TypeRegistry::new();
        let arr = reg.make_array(TypeIndex::U8, 4);
        let slice = reg.make_slice(TypeIndex::U8);
        assert!(reg.is_assignable(arr, slice));
    }

    #[test]
    fn optional_wraps_underlying_type() {
        let mut reg = TypeRegistry::new();
        let opt = reg.make_optional(TypeIndex::I64);
        assert!(reg.is_assignable(TypeIndex::I64, opt));
        assert!(reg.is_assignable(TypeIndex::UNTYPED_NULL, opt));
    }

    #[test]
    fn struct_layout_natural_alignment_rounded_to_eight() {
        let mut reg = TypeRegistry::new();
        // { a: u8, b: i64 } -> a at 0, b at 8 (natural alignment), size 16.
        let s = reg.register_struct(
            "Pair".to_string(),
            vec![("a".to_string(), TypeIndex::U8), ("b".to_string(), TypeIndex::I64)],
        );
        match reg.get(s) {
            Type::Struct { fields, size, alignment, .. } => {
                assert_eq!(fields[0].offset, 0);
                assert_eq!(fields[1].offset, 8);
                assert_eq!(*size, 16);
                assert_eq!(*alignment, 8);
            }
            _ => panic!("expected struct"),
        }
    }

    #[test]
    fn enum_backing_defaults_to_i32() {
        let mut reg = TypeRegistry::new();
        let e = reg.register_enum("Color".to_string(), vec![], None);
        match reg.get(e) {
            Type::Enum { backing_type, .. } => assert_eq!(*backing_type, TypeIndex::I32),
            _ => panic!("expected enum"),
        }
    }

    #[test]
    fn union_tag_type_depends_on_variant_count() {
        let mut reg = TypeRegistry::new();
        let few = reg.register_union(
            "Small".to_string(),
            vec![UnionVariant { name: "A".to_string(), payload: None }],
        );
        match reg.get(few) {
            Type::Union { tag_type, .. } => assert_eq!(*tag_type, TypeIndex::U8),
            _ => panic!("expected union"),
        }
    }

    #[test]
    fn materialize_is_idempotent() {
        // Round-trip law from spec §8.
        let mut reg = TypeRegistry::new();
        let m1 = reg.materialize(TypeIndex::UNTYPED_INT);
        let m2 = reg.materialize(m1);
        assert_eq!(m1, m2);
        assert_eq!(m1, TypeIndex::I64);
    }

    #[test]
    fn materialize_recurses_through_arrays() {
        let mut reg = TypeRegistry::new();
        let arr = reg.make_array(TypeIndex::UNTYPED_INT, 3);
        let materialized = reg.materialize(arr);
        assert_eq!(reg.elem_type(materialized), Some(TypeIndex::I64));
    }

    #[test]
    fn nominal_equality_compares_names_not_structure() {
        let mut reg = TypeRegistry::new();
        let a = reg.register_struct("A".to_string(), vec![("x".to_string(), TypeIndex::I64)]);
        let b = reg.register_struct("B".to_string(), vec![("x".to_string(), TypeIndex::I64)]);
        assert!(!reg.equal(a, b));
    }
}
