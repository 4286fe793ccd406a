//! Disassembler for compiled method bodies.
//!
//! `fieldmap-macros` compiles every mapping function body into a compact opcode
//! stream. Layout:
//!
//! ```text
//! header    'F' 'M' version(u8)
//! STFLD     0x01 recv name:u16              field assignment
//! LDFLD     0x02 recv name:u16              field read
//! CALLVIRT  0x03 recv name:u16 argc:u8      method call on a receiver
//! CALL      0x04 path:u16 argc:u8           path call, `Owner::f(..)` or `f(..)`
//! NEWOBJ    0x05 type:u16 n:u8 name:u16*n   struct literal
//!
//! recv      0x00 index:u8                   parameter
//!           0x01 type:u16                   local of an inferred type
//!           0x02                            `self`
//!           0x03                            anything else
//! ```
//!
//! All `u16` operands are little-endian indices into the body's string pool. The
//! encoder lives in `macros/src/body.rs`; both sides must agree on this table.
//!
//! Only this module knows the encoding. The validator consumes [`CallSite`]s.

use crate::registry::method::MethodBody;

const MAGIC: [u8; 2] = *b"FM";
const VERSION: u8 = 1;

const OP_STFLD: u8 = 0x01;
const OP_LDFLD: u8 = 0x02;
const OP_CALLVIRT: u8 = 0x03;
const OP_CALL: u8 = 0x04;
const OP_NEWOBJ: u8 = 0x05;

const RECV_ARG: u8 = 0x00;
const RECV_LOCAL: u8 = 0x01;
const RECV_SELF: u8 = 0x02;
const RECV_UNKNOWN: u8 = 0x03;

/// Receiver of a field access or method call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// A function parameter, indexed without the `self` receiver
    Arg(u8),
    /// A local whose type name was inferred at compile time
    Local(&'static str),
    /// `self`
    SelfValue,
    /// Any other expression
    Unknown,
}

/// One decoded instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `recv.field = ..` or a compound assignment
    StoreField {
        /// Receiver
        recv: Receiver,
        /// Field name
        field: &'static str,
    },
    /// `recv.field` read
    LoadField {
        /// Receiver
        recv: Receiver,
        /// Field name
        field: &'static str,
    },
    /// `recv.method(..)`
    CallMethod {
        /// Receiver
        recv: Receiver,
        /// Method name
        name: &'static str,
        /// Argument count, receiver excluded
        argc: u8,
    },
    /// `path(..)`
    Call {
        /// `::`-separated path
        path: &'static str,
        /// Argument count
        argc: u8,
    },
    /// `Type { a, b, .. }`
    NewObject {
        /// Last path segment of the type
        type_name: &'static str,
        /// Explicitly initialised fields
        fields: Vec<&'static str>,
    },
}

/// Whose field a call site touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    /// The declared type of a parameter
    Param(usize),
    /// A type known by name only
    Named(&'static str),
}

/// Target of a call into another function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    /// `Owner::f(..)`, `Self::f(..)` or `f(..)`
    Path(&'static str),
    /// `self.f(..)`
    SelfMethod(&'static str),
}

/// A reference recovered from a method body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSite {
    /// A field of `owner` is written
    Setter {
        /// Whose field
        owner: TypeRef,
        /// Field name
        field: &'static str,
    },
    /// A field of `owner` is read
    Getter {
        /// Whose field
        owner: TypeRef,
        /// Field name
        field: &'static str,
    },
    /// Another function is called
    Invoke(CallTarget),
}

/// Decoding failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisasmError {
    /// Header does not start with the expected magic
    #[error("missing body header")]
    BadHeader,
    /// Encoded with a different format version
    #[error("unsupported body version {0}")]
    Version(u8),
    /// Unknown opcode
    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    Opcode {
        /// The byte found
        opcode: u8,
        /// Its offset
        offset: usize,
    },
    /// Unknown receiver tag
    #[error("unknown receiver tag {tag:#04x} at offset {offset}")]
    Receiver {
        /// The byte found
        tag: u8,
        /// Its offset
        offset: usize,
    },
    /// Operand runs past the end of the stream
    #[error("truncated operand at offset {0}")]
    Truncated(usize),
    /// String index outside the pool
    #[error("string index {0} out of range")]
    String(u16),
}

struct Reader<'a> {
    code: &'a [u8],
    strings: &'static [&'static str],
    position: usize,
}

impl Reader<'_> {
    fn is_done(&self) -> bool {
        self.position >= self.code.len()
    }

    fn u8(&mut self) -> Result<u8, DisasmError> {
        let byte = *self
            .code
            .get(self.position)
            .ok_or(DisasmError::Truncated(self.position))?;
        self.position += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> Result<u16, DisasmError> {
        let bytes = self
            .code
            .get(self.position..self.position + 2)
            .ok_or(DisasmError::Truncated(self.position))?;
        self.position += 2;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn string(&mut self) -> Result<&'static str, DisasmError> {
        let index = self.u16()?;
        self.strings
            .get(usize::from(index))
            .copied()
            .ok_or(DisasmError::String(index))
    }

    fn receiver(&mut self) -> Result<Receiver, DisasmError> {
        let offset = self.position;
        match self.u8()? {
            RECV_ARG => Ok(Receiver::Arg(self.u8()?)),
            RECV_LOCAL => Ok(Receiver::Local(self.string()?)),
            RECV_SELF => Ok(Receiver::SelfValue),
            RECV_UNKNOWN => Ok(Receiver::Unknown),
            tag => Err(DisasmError::Receiver { tag, offset }),
        }
    }

    fn instruction(&mut self) -> Result<Instruction, DisasmError> {
        let offset = self.position;
        let instruction = match self.u8()? {
            OP_STFLD => Instruction::StoreField {
                recv: self.receiver()?,
                field: self.string()?,
            },
            OP_LDFLD => Instruction::LoadField {
                recv: self.receiver()?,
                field: self.string()?,
            },
            OP_CALLVIRT => Instruction::CallMethod {
                recv: self.receiver()?,
                name: self.string()?,
                argc: self.u8()?,
            },
            OP_CALL => Instruction::Call {
                path: self.string()?,
                argc: self.u8()?,
            },
            OP_NEWOBJ => {
                let type_name = self.string()?;
                let count = self.u8()?;
                let fields = (0..count)
                    .map(|_| self.string())
                    .collect::<Result<Vec<_>, _>>()?;
                Instruction::NewObject { type_name, fields }
            }
            opcode => return Err(DisasmError::Opcode { opcode, offset }),
        };
        Ok(instruction)
    }
}

/// Decode a compiled body into instructions
pub fn disassemble(body: &MethodBody) -> Result<Vec<Instruction>, DisasmError> {
    let code = body.code();
    if code.len() < 3 || code[..2] != MAGIC {
        return Err(DisasmError::BadHeader);
    }
    if code[2] != VERSION {
        return Err(DisasmError::Version(code[2]));
    }

    let mut reader = Reader {
        code,
        strings: body.strings(),
        position: 3,
    };
    let mut instructions = Vec::new();
    while !reader.is_done() {
        instructions.push(reader.instruction()?);
    }
    Ok(instructions)
}

fn type_ref(recv: Receiver) -> Option<TypeRef> {
    match recv {
        Receiver::Arg(index) => Some(TypeRef::Param(usize::from(index))),
        Receiver::Local(name) => Some(TypeRef::Named(name)),
        Receiver::SelfValue | Receiver::Unknown => None,
    }
}

/// Decode a body into the call sites the validator works with
///
/// Setter-like method calls (`set_x(v)`) count as writes of `x`; zero-argument
/// calls (`x()`, `get_x()`) count as reads of `x`. Calls on `self` and path calls
/// become invocations.
pub fn call_sites(body: &MethodBody) -> Result<Vec<CallSite>, DisasmError> {
    let mut sites = Vec::new();

    for instruction in disassemble(body)? {
        match instruction {
            Instruction::StoreField { recv, field } => {
                if let Some(owner) = type_ref(recv) {
                    sites.push(CallSite::Setter { owner, field });
                }
            }
            Instruction::LoadField { recv, field } => {
                if let Some(owner) = type_ref(recv) {
                    sites.push(CallSite::Getter { owner, field });
                }
            }
            Instruction::CallMethod { recv, name, argc } => {
                if recv == Receiver::SelfValue {
                    sites.push(CallSite::Invoke(CallTarget::SelfMethod(name)));
                    continue;
                }
                let Some(owner) = type_ref(recv) else {
                    continue;
                };
                match (name.strip_prefix("set_"), argc) {
                    (Some(field), 1) => sites.push(CallSite::Setter { owner, field }),
                    (_, 0) => sites.push(CallSite::Getter {
                        owner,
                        field: name.strip_prefix("get_").unwrap_or(name),
                    }),
                    _ => {}
                }
            }
            Instruction::Call { path, .. } => sites.push(CallSite::Invoke(CallTarget::Path(path))),
            Instruction::NewObject { type_name, fields } => {
                sites.extend(fields.into_iter().map(|field| CallSite::Setter {
                    owner: TypeRef::Named(type_name),
                    field,
                }));
            }
        }
    }

    Ok(sites)
}
