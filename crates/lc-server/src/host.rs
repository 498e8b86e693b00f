//! The `Host` the bytecode VM calls back into: named function dispatch
//! and `target->name(...)` object calls. Grounded on spec §4.M's phase
//! function dispatch (`PSF_Initialize`, `PSF_Execute`, ...) and on the
//! teacher's `sv_game.rs` `game_import`/`game_export` split, where engine
//! calls and script-visible calls cross one narrow boundary rather than
//! the VM reaching into server state directly.
use lc_script::{AulError, FuncBody, FuncMap, Host, Value, Vm};

/// Minimal host: named calls resolve through `funcs::resolve` (global
/// scope only — see below), then either recurse into a fresh [`Vm`] for a
/// script-backed function, or answer directly for a native one. Object
/// calls dispatch the same way, ignoring the target's own definition.
///
/// Per-object script scoping (so `Object::PSF_Execute` only resolves to
/// the function belonging to *that* object's definition) is not modeled
/// yet: `lc_sim::Object` carries no definition/owner-script id field, so
/// `call_object` falls back to the same global lookup `call_function`
/// uses. Tracked as an open item rather than silently narrowed.
pub struct EngineHost;

impl EngineHost {
    /// Engine-native function table. Empty for now — nothing in this
    /// crate registers a `FuncBody::Native` entry outside tests — so every
    /// native call answers nil rather than erroring, the same "recognized
    /// but not yet wired up" treatment a real native dispatch table would
    /// give an implemented-but-no-op builtin.
    fn call_native(&mut self, _native_id: usize, _args: &[Value]) -> Result<Value, AulError> {
        Ok(Value::Nil)
    }
}

impl Host for EngineHost {
    fn call_function(&mut self, funcs: &FuncMap, name: &str, args: &[Value]) -> Result<Value, AulError> {
        let func_id = funcs.resolve(name, None)?;
        match &funcs.get(func_id).body {
            FuncBody::Script(chunk) => {
                let mut vm = Vm::new(funcs, self);
                vm.run(chunk, args)
            }
            FuncBody::Native(native_id) => {
                let native_id = *native_id;
                self.call_native(native_id, args)
            }
        }
    }

    fn call_object(&mut self, funcs: &FuncMap, _target: &Value, name: &str, args: &[Value]) -> Result<Value, AulError> {
        self.call_function(funcs, name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_script::{compile, lex, parse, AddHint, Access};

    #[test]
    fn unknown_function_errors() {
        let funcs = FuncMap::new();
        let mut host = EngineHost;
        let result = host.call_function(&funcs, "DoesNotExist", &[]);
        assert!(matches!(result, Err(AulError::UnknownFunction(_))));
    }

    #[test]
    fn registered_function_resolves() {
        let mut funcs = FuncMap::new();
        funcs.register_native("PSF_Execute", Access::Global, None, 0, AddHint::End);
        let mut host = EngineHost;
        assert!(host.call_function(&funcs, "PSF_Execute", &[]).is_ok());
    }

    #[test]
    fn private_function_from_the_wrong_scope_is_an_access_violation() {
        let mut funcs = FuncMap::new();
        funcs.register_native("Secret", Access::Private, Some(1), 0, AddHint::End);
        let mut host = EngineHost;
        let result = host.call_function(&funcs, "Secret", &[]);
        assert!(matches!(result, Err(AulError::AccessViolation(_, Access::Private))));
    }

    #[test]
    fn script_backed_function_actually_runs_through_the_vm() {
        let mut funcs = FuncMap::new();
        let decl = &parse(lex("public func Answer() { return 42; }").unwrap()).unwrap()[0];
        let chunk = compile(decl).unwrap();
        funcs.register_script("Answer", Vec::new(), Access::Global, None, chunk, AddHint::End);
        let mut host = EngineHost;
        let result = host.call_function(&funcs, "Answer", &[]).unwrap();
        assert!(matches!(result, Value::Int(42)));
    }
}
