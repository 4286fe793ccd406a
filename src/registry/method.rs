//! Method metadata recorded for every mapping function.
//!
//! `#[mappings]` and `mapper!` emit a [`MethodInfo`] next to each function they
//! compile: the declaring owner, the parameter signature, the compiled body and the
//! declarative markers (`#[map_ignore]`, `#[map_validate_source]`,
//! `#[map_ignore_method]`). Plain closures registered without the macros get an
//! opaque `MethodInfo` with no body.

use std::fmt;

use smallvec::SmallVec;

use crate::shape::{Shape, TypeInfo};

/// How a parameter is passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// `&T`
    Ref,
    /// `&mut T`
    RefMut,
    /// `T`
    Value,
}

/// One parameter of a mapping function
#[derive(Debug, Clone, Copy)]
pub struct ParamInfo {
    /// Parameter name, `_` for non-identifier patterns
    pub name: &'static str,
    /// Parameter type
    pub ty: TypeInfo,
    /// How the parameter is passed
    pub mode: PassMode,
}

/// What a mapping function returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    /// Nothing, the function mutates its last parameter
    Unit,
    /// A new value of the given type
    Value(TypeInfo),
    /// A `Projection<S, T>` expression
    Projection {
        /// Projection source type
        from: TypeInfo,
        /// Projection destination type
        to: TypeInfo,
    },
}

/// Compiled body of a mapping function: an opcode stream and its string pool
#[derive(Debug, Clone, Copy)]
pub struct MethodBody {
    code: &'static [u8],
    strings: &'static [&'static str],
}

impl MethodBody {
    /// Wrap a compiled body
    #[must_use]
    pub const fn new(code: &'static [u8], strings: &'static [&'static str]) -> Self {
        Self { code, strings }
    }

    /// Raw opcode stream
    #[must_use]
    pub fn code(&self) -> &'static [u8] {
        self.code
    }

    /// String pool referenced by the opcode operands
    #[must_use]
    pub fn strings(&self) -> &'static [&'static str] {
        self.strings
    }
}

/// Declarative markers attached to a mapping function
#[derive(Debug, Clone, Default)]
pub struct MethodAttrs {
    /// Field names excluded from the unmapped report
    pub ignored: Vec<String>,
    /// Check that every readable source field is read instead of every
    /// writable destination field being written
    pub validate_source: bool,
    /// Skip this function during validation
    pub ignore_method: bool,
}

/// Metadata for one mapping function
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Declaring type name, or module path for closures
    pub owner: &'static str,
    /// Function name, `{closure}` for closures
    pub name: &'static str,
    /// Whether the function is visible for registration
    pub public: bool,
    /// Parameters, without the `self` receiver
    pub params: SmallVec<[ParamInfo; 3]>,
    /// Return kind
    pub returns: Returns,
    /// Compiled body, `None` for opaque closures
    pub body: Option<MethodBody>,
    /// Declarative markers
    pub attrs: MethodAttrs,
}

impl MethodInfo {
    /// Start describing a function
    #[must_use]
    pub fn new(owner: &'static str, name: &'static str) -> Self {
        Self {
            owner,
            name,
            public: true,
            params: SmallVec::new(),
            returns: Returns::Unit,
            body: None,
            attrs: MethodAttrs::default(),
        }
    }

    /// Describe a closure registered without `mapper!`
    #[must_use]
    pub fn opaque() -> Self {
        Self::new("<opaque>", "{closure}")
    }

    /// Append a parameter
    #[must_use]
    pub fn with_param<T: Shape>(mut self, name: &'static str, mode: PassMode) -> Self {
        self.params.push(ParamInfo {
            name,
            ty: TypeInfo::of::<T>(),
            mode,
        });
        self
    }

    /// Set the return type
    #[must_use]
    pub fn with_return<T: Shape>(mut self) -> Self {
        self.returns = Returns::Value(TypeInfo::of::<T>());
        self
    }

    /// Mark the function as returning a projection expression
    #[must_use]
    pub fn with_projection<S: Shape, T: Shape>(mut self) -> Self {
        self.returns = Returns::Projection {
            from: TypeInfo::of::<S>(),
            to: TypeInfo::of::<T>(),
        };
        self
    }

    /// Attach the compiled body
    #[must_use]
    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Set visibility
    #[must_use]
    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// Add field names to the ignore set
    #[must_use]
    pub fn ignore<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.attrs.ignored.extend(names.into_iter().map(Into::into));
        self
    }

    /// Validate the source side instead of the destination side
    #[must_use]
    pub fn validate_source(mut self) -> Self {
        self.attrs.validate_source = true;
        self
    }

    /// Exclude the function from validation
    #[must_use]
    pub fn ignore_method(mut self) -> Self {
        self.attrs.ignore_method = true;
        self
    }

    /// `Owner::name`, used to resolve calls between mapping functions
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.owner, self.name)
    }

    /// The parameter list rendered as `name: &path::Type, ...`
    #[must_use]
    pub fn signature(&self) -> String {
        let params = self.params.iter().map(|p| {
            let prefix = match p.mode {
                PassMode::Ref => "&",
                PassMode::RefMut => "&mut ",
                PassMode::Value => "",
            };
            format!("{}: {prefix}{}", p.name, p.ty.path())
        });
        itertools::join(params, ", ")
    }
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}({})", self.owner, self.name, self.signature())
    }
}
