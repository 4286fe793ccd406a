//! Compiler from function bodies to the bytecode read by `fieldmap::validate::disasm`
//!
//! The body is walked with `syn::visit`; every field write, field read, method
//! call, path call and struct literal becomes one instruction. Receivers are
//! resolved to parameters, `self`, or locals whose type could be inferred from
//! the `let` statement that introduced them.

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::visit::{self, Visit};
use syn::{BinOp, Expr, Member, Token};

use crate::utils::{is_type_name, last_segment, peel, single_ident, turbofish_type};

const HEADER: [u8; 3] = [b'F', b'M', 1];

const OP_STFLD: u8 = 0x01;
const OP_LDFLD: u8 = 0x02;
const OP_CALLVIRT: u8 = 0x03;
const OP_CALL: u8 = 0x04;
const OP_NEWOBJ: u8 = 0x05;

const RECV_ARG: u8 = 0x00;
const RECV_LOCAL: u8 = 0x01;
const RECV_SELF: u8 = 0x02;
const RECV_UNKNOWN: u8 = 0x03;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Local {
    Typed(String),
    Alias(u8),
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Receiver {
    Arg(u8),
    Local(String),
    SelfValue,
    Unknown,
}

/// Compiled body: opcode stream and string pool
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CompiledBody {
    pub code: Vec<u8>,
    pub strings: Vec<String>,
}

impl CompiledBody {
    /// `::fieldmap::registry::MethodBody::new(&[..], &[..])`
    pub fn to_tokens(&self) -> TokenStream {
        let code = &self.code;
        let strings = &self.strings;
        quote! {
            ::fieldmap::registry::MethodBody::new(&[#(#code),*], &[#(#strings),*])
        }
    }
}

/// Walks a body and records its references
pub struct BodyCompiler {
    params: Vec<String>,
    locals: HashMap<String, Local>,
    body: CompiledBody,
}

impl BodyCompiler {
    /// Compiler for a function with the given parameter names, `self` excluded
    pub fn new(params: Vec<String>) -> Self {
        let mut body = CompiledBody::default();
        body.code.extend(HEADER);
        Self {
            params,
            locals: HashMap::new(),
            body,
        }
    }

    /// Compile a block
    pub fn compile_block(mut self, block: &syn::Block) -> CompiledBody {
        self.visit_block(block);
        self.body
    }

    /// Compile a single expression, such as a closure body
    pub fn compile_expr(mut self, expr: &Expr) -> CompiledBody {
        self.visit_expr(expr);
        self.body
    }

    fn intern(&mut self, value: &str) -> [u8; 2] {
        let index = match self.body.strings.iter().position(|s| s == value) {
            Some(index) => index,
            None => {
                self.body.strings.push(value.to_string());
                self.body.strings.len() - 1
            }
        };
        u16::try_from(index).unwrap_or(u16::MAX).to_le_bytes()
    }

    fn receiver(&self, expr: &Expr) -> Receiver {
        let Some(name) = single_ident(expr) else {
            return Receiver::Unknown;
        };
        if name == "self" {
            return Receiver::SelfValue;
        }
        match self.locals.get(&name) {
            Some(Local::Typed(ty)) => Receiver::Local(ty.clone()),
            Some(Local::Alias(index)) => Receiver::Arg(*index),
            Some(Local::Opaque) => Receiver::Unknown,
            None => self
                .param_index(&name)
                .map_or(Receiver::Unknown, Receiver::Arg),
        }
    }

    fn param_index(&self, name: &str) -> Option<u8> {
        let index = self.params.iter().position(|p| p == name)?;
        u8::try_from(index).ok()
    }

    fn emit_receiver(&mut self, recv: Receiver) {
        match recv {
            Receiver::Arg(index) => self.body.code.extend([RECV_ARG, index]),
            Receiver::Local(ty) => {
                let name = self.intern(&ty);
                self.body.code.push(RECV_LOCAL);
                self.body.code.extend(name);
            }
            Receiver::SelfValue => self.body.code.push(RECV_SELF),
            Receiver::Unknown => self.body.code.push(RECV_UNKNOWN),
        }
    }

    fn emit_field(&mut self, opcode: u8, base: &Expr, member: &Member) {
        let recv = self.receiver(base);
        let field = self.intern(&member_name(member));
        self.body.code.push(opcode);
        self.emit_receiver(recv);
        self.body.code.extend(field);
    }

    /// Type of the value bound by `let`
    fn infer_local(&self, init: &Expr) -> Local {
        match peel(init) {
            Expr::Struct(literal) => literal
                .path
                .segments
                .last()
                .map_or(Local::Opaque, |s| Local::Typed(s.ident.to_string())),
            Expr::Call(call) => match peel(&call.func) {
                Expr::Path(path) => {
                    let segments: Vec<String> =
                        path.path.segments.iter().map(|s| s.ident.to_string()).collect();
                    match segments.as_slice() {
                        [.., owner, _] if is_type_name(owner) && owner != "Self" => {
                            Local::Typed(owner.clone())
                        }
                        _ => Local::Opaque,
                    }
                }
                _ => Local::Opaque,
            },
            Expr::MethodCall(call) if call.method == "create" || call.method == "to" => {
                turbofish_type(call.turbofish.as_ref()).map_or(Local::Opaque, Local::Typed)
            }
            Expr::Try(inner) => self.infer_local(&inner.expr),
            Expr::Path(_) => match self.receiver(init) {
                Receiver::Arg(index) => Local::Alias(index),
                Receiver::Local(ty) => Local::Typed(ty),
                Receiver::SelfValue | Receiver::Unknown => Local::Opaque,
            },
            _ => Local::Opaque,
        }
    }
}

fn member_name(member: &Member) -> String {
    match member {
        Member::Named(ident) => ident.to_string(),
        Member::Unnamed(index) => index.index.to_string(),
    }
}

fn is_compound_assign(op: &BinOp) -> bool {
    matches!(
        op,
        BinOp::AddAssign(_)
            | BinOp::SubAssign(_)
            | BinOp::MulAssign(_)
            | BinOp::DivAssign(_)
            | BinOp::RemAssign(_)
            | BinOp::BitXorAssign(_)
            | BinOp::BitAndAssign(_)
            | BinOp::BitOrAssign(_)
            | BinOp::ShlAssign(_)
            | BinOp::ShrAssign(_)
    )
}

impl<'ast> Visit<'ast> for BodyCompiler {
    fn visit_local(&mut self, local: &'ast syn::Local) {
        if let Some(init) = &local.init {
            self.visit_expr(&init.expr);
            if let Some((_, diverge)) = &init.diverge {
                self.visit_expr(diverge);
            }
        }

        let (name, annotated) = match &local.pat {
            syn::Pat::Ident(ident) => (ident.ident.to_string(), None),
            syn::Pat::Type(typed) => match typed.pat.as_ref() {
                syn::Pat::Ident(ident) => (ident.ident.to_string(), last_segment(&typed.ty)),
                _ => return,
            },
            _ => return,
        };

        let kind = match (annotated, &local.init) {
            (Some(ty), _) => Local::Typed(ty),
            (None, Some(init)) => self.infer_local(&init.expr),
            (None, None) => Local::Opaque,
        };
        self.locals.insert(name, kind);
    }

    fn visit_expr_assign(&mut self, assign: &'ast syn::ExprAssign) {
        match peel(&assign.left) {
            Expr::Field(field) => {
                self.emit_field(OP_STFLD, &field.base, &field.member);
                self.visit_expr(&field.base);
            }
            other => self.visit_expr(other),
        }
        self.visit_expr(&assign.right);
    }

    fn visit_expr_binary(&mut self, binary: &'ast syn::ExprBinary) {
        if !is_compound_assign(&binary.op) {
            visit::visit_expr_binary(self, binary);
            return;
        }
        match peel(&binary.left) {
            Expr::Field(field) => {
                self.emit_field(OP_STFLD, &field.base, &field.member);
                self.emit_field(OP_LDFLD, &field.base, &field.member);
                self.visit_expr(&field.base);
            }
            other => self.visit_expr(other),
        }
        self.visit_expr(&binary.right);
    }

    fn visit_expr_field(&mut self, field: &'ast syn::ExprField) {
        self.emit_field(OP_LDFLD, &field.base, &field.member);
        visit::visit_expr_field(self, field);
    }

    fn visit_expr_method_call(&mut self, call: &'ast syn::ExprMethodCall) {
        let recv = self.receiver(&call.receiver);
        let name = self.intern(&call.method.to_string());
        self.body.code.push(OP_CALLVIRT);
        self.emit_receiver(recv);
        self.body.code.extend(name);
        self.body.code.push(u8::try_from(call.args.len()).unwrap_or(u8::MAX));
        visit::visit_expr_method_call(self, call);
    }

    fn visit_expr_call(&mut self, call: &'ast syn::ExprCall) {
        let Expr::Path(path) = peel(&call.func) else {
            visit::visit_expr_call(self, call);
            return;
        };
        let joined = path
            .path
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect::<Vec<_>>()
            .join("::");
        let path = self.intern(&joined);
        self.body.code.push(OP_CALL);
        self.body.code.extend(path);
        self.body.code.push(u8::try_from(call.args.len()).unwrap_or(u8::MAX));
        for arg in &call.args {
            self.visit_expr(arg);
        }
    }

    fn visit_expr_struct(&mut self, literal: &'ast syn::ExprStruct) {
        if let Some(segment) = literal.path.segments.last() {
            let type_name = self.intern(&segment.ident.to_string());
            let names: Vec<[u8; 2]> = literal
                .fields
                .iter()
                .map(|field| self.intern(&member_name(&field.member)))
                .collect();
            self.body.code.push(OP_NEWOBJ);
            self.body.code.extend(type_name);
            self.body.code.push(u8::try_from(names.len()).unwrap_or(u8::MAX));
            self.body.code.extend(names.into_iter().flatten());
        }
        for field in &literal.fields {
            self.visit_expr(&field.expr);
        }
        if let Some(rest) = &literal.rest {
            self.visit_expr(rest);
        }
    }

    fn visit_macro(&mut self, mac: &'ast syn::Macro) {
        // format!, vec!, assert! and friends take comma separated expressions
        if let Ok(exprs) = mac.parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated) {
            for expr in &exprs {
                self.visit_expr(expr);
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn compile(params: &[&str], block: &syn::Block) -> CompiledBody {
    BodyCompiler::new(params.iter().map(ToString::to_string).collect()).compile_block(block)
}
