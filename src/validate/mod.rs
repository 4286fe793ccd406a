//! Completeness validation
//!
//! Checks, without running anything, that every registered mapper covers every
//! writable field of its destination (or, with `validate_source`, reads every
//! readable field of its source). Coverage comes from the compiled method bodies:
//! field writes and reads on receivers of the checked type, plus everything
//! covered by other mappers of the same type pair that the body calls into.

pub mod disasm;
pub mod report;

use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::error::{MapError, Result};
use crate::registry::{CatalogEntry, Classified, MapRegistry, MethodId, MethodInfo, MethodShape};
use crate::shape::TypeInfo;

use disasm::{CallSite, CallTarget, TypeRef};

pub use report::{DiagnosticBlock, DiagnosticReport, ValidationMode};

impl MapRegistry {
    /// Validate every registered in-place and factory mapper
    ///
    /// Fails with `IncompleteMapping` carrying one block per incomplete mapper.
    pub fn validate(&self) -> Result<()> {
        let report = self.validation_report()?;
        if report.is_empty() {
            info!("All mapping functions are complete");
            Ok(())
        } else {
            warn!("{} mapping functions are incomplete", report.blocks().len());
            Err(MapError::IncompleteMapping(report))
        }
    }

    /// Run validation and return the findings without turning them into an error
    pub fn validation_report(&self) -> Result<DiagnosticReport> {
        let log = self.validation_log();
        info!("Validating {} mapping functions", log.len());

        let blocks: Vec<Option<DiagnosticBlock>> = if self.config().parallel_validation {
            log.par_iter().map(|&id| self.check(id)).collect::<Result<_>>()?
        } else {
            log.iter().map(|&id| self.check(id)).collect::<Result<_>>()?
        };

        Ok(DiagnosticReport::new(blocks.into_iter().flatten().collect()))
    }

    fn check(&self, id: MethodId) -> Result<Option<DiagnosticBlock>> {
        let Some(CatalogEntry { method, classified }) = self.method(id) else {
            return Ok(None);
        };
        if method.attrs.ignore_method {
            debug!("Skipping {method}: marked ignore_method");
            return Ok(None);
        }

        let mode = if method.attrs.validate_source {
            ValidationMode::Source
        } else {
            ValidationMode::Destination
        };
        let target = match mode {
            ValidationMode::Destination => classified.to,
            ValidationMode::Source => classified.from,
        };

        let mut walk = Walk {
            registry: self,
            pair: *classified,
            mode,
            target,
            covered: FxHashSet::default(),
            ignored: FxHashSet::default(),
            visited: FxHashSet::default(),
        };
        walk.visit(id)?;

        let expected: Vec<&'static str> = match mode {
            ValidationMode::Destination => target.writable_fields().collect(),
            ValidationMode::Source => target.readable_fields().collect(),
        };
        let unmapped: Vec<&'static str> = expected
            .into_iter()
            .filter(|field| !walk.covered.contains(field) && !walk.ignored.contains(*field))
            .collect();

        if unmapped.is_empty() {
            debug!("{method} is complete");
            return Ok(None);
        }

        Ok(Some(DiagnosticBlock {
            method: method.to_string(),
            mode,
            suggestions: suggestions(method, classified, mode, &unmapped),
            unmapped: unmapped.into_iter().map(str::to_string).collect(),
        }))
    }
}

/// Coverage collected for one top-level mapper
struct Walk<'r> {
    registry: &'r MapRegistry,
    pair: Classified,
    mode: ValidationMode,
    target: TypeInfo,
    covered: FxHashSet<&'static str>,
    ignored: FxHashSet<String>,
    visited: FxHashSet<MethodId>,
}

impl<'r> Walk<'r> {
    fn visit(&mut self, id: MethodId) -> Result<()> {
        if !self.visited.insert(id) {
            return Ok(());
        }
        let Some(entry) = self.registry.method(id) else {
            return Ok(());
        };
        let method = &entry.method;
        self.ignored.extend(method.attrs.ignored.iter().cloned());

        let Some(body) = method.body else {
            warn!("{method} has no compiled body; no fields count as mapped");
            return Ok(());
        };
        let sites = disasm::call_sites(&body).map_err(|err| MapError::InvalidMethodBody {
            method: method.to_string(),
            reason: err.to_string(),
        })?;

        for site in sites {
            match (site, self.mode) {
                (CallSite::Setter { owner, field }, ValidationMode::Destination)
                | (CallSite::Getter { owner, field }, ValidationMode::Source) => {
                    if self.refers_to_target(method, owner) {
                        self.covered.insert(field);
                    }
                }
                (CallSite::Invoke(target), _) => {
                    if let Some(callee) = self.resolve(method, target) {
                        self.visit(callee)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn refers_to_target(&self, method: &MethodInfo, owner: TypeRef) -> bool {
        match owner {
            TypeRef::Param(index) => method
                .params
                .get(index)
                .is_some_and(|param| param.ty == self.target),
            TypeRef::Named(name) => name == self.target.ident(),
        }
    }

    /// Catalog id of a callee mapping the same type pair
    fn resolve(&self, caller: &MethodInfo, target: CallTarget) -> Option<MethodId> {
        let (owner, name) = match target {
            CallTarget::SelfMethod(name) => (caller.owner, name),
            CallTarget::Path(path) => match path.rsplit_once("::") {
                None => (caller.owner, path),
                Some(("Self", name)) => (caller.owner, name),
                Some((prefix, name)) => {
                    let owner = prefix.rsplit("::").next().unwrap_or(prefix);
                    if owner == "Self" {
                        (caller.owner, name)
                    } else {
                        (owner, name)
                    }
                }
            },
        };

        let id = self.registry.find_method(owner, name)?;
        let callee = self.registry.method(id)?;
        let same_pair =
            callee.classified.from == self.pair.from && callee.classified.to == self.pair.to;
        same_pair.then_some(id)
    }
}

fn suggestions(
    method: &MethodInfo,
    classified: &Classified,
    mode: ValidationMode,
    unmapped: &[&'static str],
) -> Vec<String> {
    let param_name = |index: Option<usize>, fallback: &'static str| {
        index
            .and_then(|i| method.params.get(i))
            .map_or(fallback, |param| param.name)
    };
    let from = param_name(classified.shape.source_param(), "from");
    let to = param_name(classified.shape.destination_param(), "to");
    let is_factory = matches!(
        classified.shape,
        MethodShape::SimpleFactory | MethodShape::Factory
    );

    let on_other_side = |field: &str| match mode {
        ValidationMode::Destination => classified.from.has_readable(field),
        ValidationMode::Source => classified.to.has_writable(field),
    };
    let (assignable, rest): (Vec<&str>, Vec<&str>) =
        unmapped.iter().copied().partition(|field| on_other_side(field));

    assignable
        .into_iter()
        .map(|field| {
            if is_factory {
                format!("{field}: {from}.{field}.clone(),")
            } else {
                format!("{to}.{field} = {from}.{field}.clone();")
            }
        })
        .chain(rest.into_iter().map(|field| format!("#[map_ignore({field})]")))
        .collect()
}
