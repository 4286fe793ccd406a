//! Type metadata used by the registry, the instance factory and the validator.
//!
//! Every type that takes part in a mapping implements [`Shape`], usually through
//! `#[derive(Shape)]`. The trait exposes the public fields of the type (with their
//! read/write capabilities) and the parameterless constructor, if the type has one.

use std::any::TypeId;
use std::fmt;

/// A public field of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Field name as written in the struct
    pub name: &'static str,
    /// Whether the field can be read by a mapping function
    pub readable: bool,
    /// Whether the field can be assigned by a mapping function
    pub writable: bool,
}

impl FieldInfo {
    /// A readable and writable field
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            readable: true,
            writable: true,
        }
    }

    /// A field that can be read but is never expected to be assigned
    #[must_use]
    pub const fn read_only(name: &'static str) -> Self {
        Self {
            name,
            readable: true,
            writable: false,
        }
    }
}

/// Type metadata for mapping participants
pub trait Shape: 'static {
    /// Display name; `#[shape(name = "..")]` overrides it
    const NAME: &'static str;

    /// Identifier of the type as written in code, used to match struct literals
    /// and locals in compiled mapper bodies
    const IDENT: &'static str = Self::NAME;

    /// Public fields in declaration order
    const FIELDS: &'static [FieldInfo];

    /// The parameterless constructor, `None` when the type requires arguments
    fn constructor() -> Option<fn() -> Self>
    where
        Self: Sized;

    /// Runtime descriptor for this type
    fn type_info() -> TypeInfo
    where
        Self: Sized,
    {
        TypeInfo::of::<Self>()
    }
}

/// Runtime descriptor of a [`Shape`] type
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    ident: &'static str,
    path: &'static str,
    fields: &'static [FieldInfo],
    constructible: bool,
}

impl TypeInfo {
    /// Describe `T`
    #[must_use]
    pub fn of<T: Shape>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::NAME,
            ident: T::IDENT,
            path: std::any::type_name::<T>(),
            fields: T::FIELDS,
            constructible: T::constructor().is_some(),
        }
    }

    /// Type identity
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Identifier as written in code
    #[must_use]
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// Fully qualified name
    #[must_use]
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// All public fields
    #[must_use]
    pub fn fields(&self) -> &'static [FieldInfo] {
        self.fields
    }

    /// Names of fields a mapping function is expected to assign
    pub fn writable_fields(&self) -> impl Iterator<Item = &'static str> + use<> {
        self.fields.iter().filter(|f| f.writable).map(|f| f.name)
    }

    /// Names of fields a mapping function can read
    pub fn readable_fields(&self) -> impl Iterator<Item = &'static str> + use<> {
        self.fields.iter().filter(|f| f.readable).map(|f| f.name)
    }

    /// Whether a field with the given name exists and is readable
    #[must_use]
    pub fn has_readable(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.readable && f.name == name)
    }

    /// Whether a field with the given name exists and is writable
    #[must_use]
    pub fn has_writable(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.writable && f.name == name)
    }

    /// Whether the type has a parameterless constructor
    #[must_use]
    pub fn is_constructible(&self) -> bool {
        self.constructible
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("path", &self.path)
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

/// Implement `Shape` for field-less types constructed through `Default`
macro_rules! impl_leaf_shape {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Shape for $ty {
                const NAME: &'static str = $name;
                const FIELDS: &'static [FieldInfo] = &[];

                fn constructor() -> Option<fn() -> Self> {
                    Some(<$ty as Default>::default)
                }
            }
        )*
    };
}

impl_leaf_shape! {
    String => "String",
    bool => "bool",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
}
