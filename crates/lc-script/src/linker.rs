//! Resolves `#appendto`/`#include` relationships across a set of scripts,
//! compiles each to bytecode, and threads same-name function rings.
//! Mirrors the engine's fixed five-step pipeline: `ResolveAppends` must run
//! to completion before `ResolveIncludes` starts.

use std::collections::HashMap;

use crate::ast::FuncDecl;
use crate::bytecode::compile;
use crate::funcmap::{Access, AddHint, AulFunc, FuncBody, FuncMap};
use crate::lexer::lex;
use crate::parser::parse;

pub type ScriptId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveState {
    Unresolved,
    Resolving,
    Resolved,
}

pub struct Script {
    pub id: ScriptId,
    pub source: String,
    /// Other scripts this one appends its functions onto (`#appendto`).
    pub appends: Vec<ScriptId>,
    /// Other scripts this one pulls functions from (`#include`).
    pub includes: Vec<ScriptId>,
    parsed: Vec<FuncDecl>,
    resolve_state: ResolveState,
}

impl Script {
    pub fn new(id: ScriptId, source: impl Into<String>) -> Self {
        Script {
            id,
            source: source.into(),
            appends: Vec::new(),
            includes: Vec::new(),
            parsed: Vec::new(),
            resolve_state: ResolveState::Unresolved,
        }
    }
}

/// Diagnostics collected over one `Linker::link` run. The linker never
/// fails outright: missing includes and circular chains degrade the
/// affected script rather than aborting the whole link.
#[derive(Debug, Default)]
pub struct LinkReport {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

pub struct Linker {
    scripts: HashMap<ScriptId, Script>,
    pub funcs: FuncMap,
    /// Functions registered per script, so `AppendTo` knows what to copy.
    script_funcs: HashMap<ScriptId, Vec<usize>>,
}

impl Linker {
    pub fn new() -> Self {
        Linker { scripts: HashMap::new(), funcs: FuncMap::new(), script_funcs: HashMap::new() }
    }

    pub fn add_script(&mut self, script: Script) {
        self.scripts.insert(script.id, script);
    }

    pub fn link(&mut self, order: &[ScriptId]) -> LinkReport {
        let mut report = LinkReport::default();
        for &id in order {
            self.resolve_appends(id, &mut report);
        }
        for &id in order {
            self.resolve_includes(id, &mut report);
        }
        for &id in order {
            self.parse_script(id, &mut report);
        }
        self.funcs.build_same_name_rings();
        report
    }

    fn resolve_appends(&mut self, id: ScriptId, report: &mut LinkReport) {
        let appends = match self.scripts.get(&id) {
            Some(s) => s.appends.clone(),
            None => return,
        };
        for target in appends {
            if self.scripts.contains_key(&target) {
                self.append_to(id, target, true, report);
            } else {
                report.warnings.push(format!("script to #appendto not found: {target}"));
            }
        }
    }

    fn resolve_includes(&mut self, id: ScriptId, report: &mut LinkReport) {
        self.resolve_includes_inner(id, report);
    }

    fn resolve_includes_inner(&mut self, id: ScriptId, report: &mut LinkReport) -> bool {
        match self.scripts.get(&id).map(|s| s.resolve_state) {
            Some(ResolveState::Resolved) => return true,
            Some(ResolveState::Resolving) => {
                report.warnings.push("circular include chain detected - ignoring all includes".into());
                if let Some(s) = self.scripts.get_mut(&id) {
                    s.resolve_state = ResolveState::Resolved;
                }
                return false;
            }
            Some(ResolveState::Unresolved) => {}
            None => return false,
        }
        if let Some(s) = self.scripts.get_mut(&id) {
            s.resolve_state = ResolveState::Resolving;
        }
        let includes = self.scripts.get(&id).map(|s| s.includes.clone()).unwrap_or_default();
        for target in includes {
            if !self.scripts.contains_key(&target) {
                report.warnings.push(format!("script to #include not found: {target}"));
                continue;
            }
            if !self.resolve_includes_inner(target, report) {
                continue;
            }
            self.append_to(target, id, false, report);
        }
        if let Some(s) = self.scripts.get_mut(&id) {
            s.resolve_state = ResolveState::Resolved;
        }
        true
    }

    /// Copies `source`'s non-global functions into `dest`'s bucket. High
    /// priority (`#appendto`) inserts at the end of the bucket so the
    /// appending script overloads what's already there; low priority
    /// (`#include`) inserts at the start so the includer's own definitions
    /// win ties.
    fn append_to(&mut self, source: ScriptId, dest: ScriptId, high_prio: bool, _report: &mut LinkReport) {
        let source_funcs = self.script_funcs.get(&source).cloned().unwrap_or_default();
        let hint = if high_prio { AddHint::End } else { AddHint::Start };
        for func_id in source_funcs {
            let f = self.funcs.get(func_id);
            if f.access == Access::Global {
                continue;
            }
            let copy = AulFunc {
                name: f.name.clone(),
                params: f.params.clone(),
                access: f.access,
                owner: Some(dest),
                body: match &f.body {
                    FuncBody::Script(chunk) => FuncBody::Script(chunk.clone()),
                    FuncBody::Native(n) => FuncBody::Native(*n),
                },
                next_same_name: None,
            };
            let new_id = self.funcs.register(copy, hint);
            self.script_funcs.entry(dest).or_default().push(new_id);
        }
    }

    fn parse_script(&mut self, id: ScriptId, report: &mut LinkReport) {
        let source = match self.scripts.get(&id) {
            Some(s) => s.source.clone(),
            None => return,
        };
        let tokens = match lex(&source) {
            Ok(t) => t,
            Err(e) => {
                report.errors.push(format!("lex error in script {id} at {}: {}", e.pos, e.message));
                return;
            }
        };
        let decls = match parse(tokens) {
            Ok(d) => d,
            Err(e) => {
                report.errors.push(format!("parse error in script {id}: {}", e.message));
                return;
            }
        };
        for decl in &decls {
            let chunk = match compile(decl) {
                Ok(c) => c,
                Err(e) => {
                    report.errors.push(format!("compile error in {}::{}: {}", id, decl.name, e.message));
                    continue;
                }
            };
            let func = AulFunc {
                name: decl.name.clone(),
                params: decl.params.clone(),
                access: decl.access,
                owner: Some(id),
                body: FuncBody::Script(chunk),
                next_same_name: None,
            };
            let func_id = self.funcs.register(func, AddHint::End);
            self.script_funcs.entry(id).or_default().push(func_id);
        }
        if let Some(s) = self.scripts.get_mut(&id) {
            s.parsed = decls;
        }
    }
}

impl Default for Linker {
    fn default() -> Self {
        Linker::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standalone_script() {
        let mut linker = Linker::new();
        linker.add_script(Script::new(1, "func Go() { return 1; }"));
        let report = linker.link(&[1]);
        assert!(report.errors.is_empty());
        assert!(linker.funcs.first_func("Go").is_some());
    }

    #[test]
    fn missing_include_warns_but_still_links() {
        let mut linker = Linker::new();
        let mut s = Script::new(1, "func F() { return 1; }");
        s.includes.push(99);
        linker.add_script(s);
        let report = linker.link(&[1]);
        assert_eq!(report.warnings.len(), 1);
        assert!(linker.funcs.first_func("F").is_some());
    }

    #[test]
    fn circular_include_warns_exactly_once() {
        let mut linker = Linker::new();
        let mut a = Script::new(1, "func A() { return 1; }");
        a.includes.push(2);
        let mut b = Script::new(2, "func B() { return 2; }");
        b.includes.push(3);
        let mut c = Script::new(3, "func C() { return 3; }");
        c.includes.push(1);
        linker.add_script(a);
        linker.add_script(b);
        linker.add_script(c);
        let report = linker.link(&[1, 2, 3]);
        assert_eq!(report.warnings.iter().filter(|w| w.contains("circular")).count(), 1);
        assert!(linker.funcs.first_func("A").is_some());
        assert!(linker.funcs.first_func("B").is_some());
        assert!(linker.funcs.first_func("C").is_some());
    }

    #[test]
    fn include_brings_function_into_includer() {
        let mut linker = Linker::new();
        let base = Script::new(1, "public func Shared() { return 7; }");
        let mut includer = Script::new(2, "func Local() { return 0; }");
        includer.includes.push(1);
        linker.add_script(base);
        linker.add_script(includer);
        linker.link(&[1, 2]);
        let id = linker.funcs.get_func("Shared", Some(2), None);
        assert!(id.is_some());
    }

    #[test]
    fn after_link_closes_same_name_ring() {
        let mut linker = Linker::new();
        linker.add_script(Script::new(1, "public func Think() { return 1; }"));
        linker.add_script(Script::new(2, "public func Think() { return 2; }"));
        linker.link(&[1, 2]);
        let a = linker.funcs.first_func("Think").unwrap();
        let next = linker.funcs.next_same_name_func(a);
        assert!(next.is_some());
    }
}
