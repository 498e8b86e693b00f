//! Stack-based bytecode interpreter. One [`Vm::run`] call executes a
//! single function's [`Chunk`]; calls to other functions recurse through
//! `Host`, which resolves names against a [`FuncMap`] and answers native
//! (engine) calls and `->` object dispatch.

use crate::ast::{BinOp, UnOp};
use crate::bytecode::{Chunk, Op};
use crate::error::AulError;
use crate::funcmap::FuncMap;
use crate::value::{CompareMode, Value};

/// Strict mode toggles whether container index errors and access
/// violations are hard failures (`Err`) or soft nils per spec §7's
/// "non-strict" execution fallback.
pub struct Vm<'a> {
    pub funcs: &'a FuncMap,
    pub host: &'a mut dyn Host,
    pub strict: bool,
}

/// Everything the VM cannot resolve on its own: calling named functions
/// (local or native) and dispatching `target->name(...)` calls.
pub trait Host {
    fn call_function(&mut self, funcs: &FuncMap, name: &str, args: &[Value]) -> Result<Value, AulError>;
    fn call_object(&mut self, funcs: &FuncMap, target: &Value, name: &str, args: &[Value]) -> Result<Value, AulError>;
}

impl<'a> Vm<'a> {
    pub fn new(funcs: &'a FuncMap, host: &'a mut dyn Host) -> Self {
        Vm { funcs, host, strict: false }
    }

    pub fn run(&mut self, chunk: &Chunk, args: &[Value]) -> Result<Value, AulError> {
        let mut locals = vec![Value::Nil; chunk.local_names.len()];
        for (slot, arg) in locals.iter_mut().zip(args.iter()) {
            *slot = arg.clone();
        }
        let mut stack: Vec<Value> = Vec::new();
        let mut pc = 0usize;

        loop {
            let Some(op) = chunk.code.get(pc) else {
                return Ok(Value::Nil);
            };
            pc += 1;
            match op {
                Op::PushConst(idx) => stack.push(chunk.consts[*idx].clone()),
                Op::LoadLocal(slot) => stack.push(locals[*slot].clone()),
                Op::StoreLocal(slot) => {
                    let v = pop(&mut stack)?;
                    locals[*slot] = v;
                }
                Op::NewArray(count) => {
                    let mut items = Vec::with_capacity(*count);
                    for _ in 0..*count {
                        items.push(pop(&mut stack)?);
                    }
                    items.reverse();
                    stack.push(Value::new_array(items));
                }
                Op::MakeRef => {
                    let index = pop(&mut stack)?;
                    let container = pop(&mut stack)?;
                    let r = container.get_container_element(&index);
                    if matches!(r, Value::Nil) && self.strict {
                        return Err(AulError::IndexError);
                    }
                    stack.push(r);
                }
                Op::Deref => {
                    let v = pop(&mut stack)?;
                    stack.push(v.deref());
                }
                Op::StoreThroughRef => {
                    let value = pop(&mut stack)?;
                    let reference = pop(&mut stack)?;
                    if !Value::set_through_ref(&reference, value) && self.strict {
                        return Err(AulError::IndexError);
                    }
                }
                Op::BinOp(op) => {
                    let rhs = pop(&mut stack)?;
                    let lhs = pop(&mut stack)?;
                    stack.push(self.eval_binop(*op, lhs, rhs)?);
                }
                Op::UnOp(op) => {
                    let v = pop(&mut stack)?;
                    stack.push(eval_unop(*op, v));
                }
                Op::Call { name_const, argc } => {
                    let name = const_str(chunk, *name_const);
                    let call_args = pop_n(&mut stack, *argc)?;
                    let result = self.host.call_function(self.funcs, &name, &call_args)?;
                    stack.push(result);
                }
                Op::ObjectCall { name_const, argc } => {
                    let name = const_str(chunk, *name_const);
                    let call_args = pop_n(&mut stack, *argc)?;
                    let target = pop(&mut stack)?;
                    let result = self.host.call_object(self.funcs, &target, &name, &call_args)?;
                    stack.push(result);
                }
                Op::Jump(target) => pc = *target,
                Op::JumpIfFalse(target) => {
                    let cond = pop(&mut stack)?;
                    if !cond.is_truthy() {
                        pc = *target;
                    }
                }
                Op::Pop => {
                    pop(&mut stack)?;
                }
                Op::Return => return pop(&mut stack),
                Op::ReturnNil => return Ok(Value::Nil),
            }
        }
    }

    fn eval_binop(&self, op: BinOp, lhs: Value, rhs: Value) -> Result<Value, AulError> {
        use BinOp::*;
        match op {
            Add => Ok(int_op(lhs, rhs, i32::wrapping_add)),
            Sub => Ok(int_op(lhs, rhs, i32::wrapping_sub)),
            Mul => Ok(int_op(lhs, rhs, i32::wrapping_mul)),
            Div => checked_int_op(lhs, rhs, |a, b| a.checked_div(b)),
            Mod => checked_int_op(lhs, rhs, |a, b| a.checked_rem(b)),
            Eq => Ok(Value::Bool(lhs.compare(&rhs, CompareMode::DuckCompatible))),
            NotEq => Ok(Value::Bool(!lhs.compare(&rhs, CompareMode::DuckCompatible))),
            Lt => Ok(Value::Bool(as_int(&lhs) < as_int(&rhs))),
            Le => Ok(Value::Bool(as_int(&lhs) <= as_int(&rhs))),
            Gt => Ok(Value::Bool(as_int(&lhs) > as_int(&rhs))),
            Ge => Ok(Value::Bool(as_int(&lhs) >= as_int(&rhs))),
            And => Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy())),
            Or => Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy())),
        }
    }
}

fn eval_unop(op: UnOp, v: Value) -> Value {
    match op {
        UnOp::Neg => Value::Int(-as_int(&v)),
        UnOp::Not => Value::Bool(!v.is_truthy()),
    }
}

fn as_int(v: &Value) -> i32 {
    match v {
        Value::Int(i) => *i,
        Value::Bool(b) => *b as i32,
        Value::Id(id) => *id as i32,
        _ => 0,
    }
}

fn int_op(lhs: Value, rhs: Value, f: impl Fn(i32, i32) -> i32) -> Value {
    Value::Int(f(as_int(&lhs), as_int(&rhs)))
}

fn checked_int_op(lhs: Value, rhs: Value, f: impl Fn(i32, i32) -> Option<i32>) -> Result<Value, AulError> {
    f(as_int(&lhs), as_int(&rhs)).map(Value::Int).ok_or(AulError::DivisionByZero)
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, AulError> {
    stack.pop().ok_or(AulError::StackUnderflow)
}

fn pop_n(stack: &mut Vec<Value>, n: usize) -> Result<Vec<Value>, AulError> {
    if stack.len() < n {
        return Err(AulError::StackUnderflow);
    }
    Ok(stack.split_off(stack.len() - n))
}

fn const_str(chunk: &Chunk, idx: usize) -> String {
    match &chunk.consts[idx] {
        Value::String(s) => s.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compile;
    use crate::lexer::lex;
    use crate::parser::parse;

    struct NoopHost;
    impl Host for NoopHost {
        fn call_function(&mut self, _funcs: &FuncMap, name: &str, _args: &[Value]) -> Result<Value, AulError> {
            Err(AulError::UnknownFunction(name.to_string()))
        }
        fn call_object(&mut self, _funcs: &FuncMap, _target: &Value, name: &str, _args: &[Value]) -> Result<Value, AulError> {
            Err(AulError::UnknownFunction(name.to_string()))
        }
    }

    fn run_src(src: &str, args: &[Value]) -> Value {
        let funcs_ast = parse(lex(src).unwrap()).unwrap();
        let chunk = compile(&funcs_ast[0]).unwrap();
        let funcs = FuncMap::new();
        let mut host = NoopHost;
        let mut vm = Vm::new(&funcs, &mut host);
        vm.run(&chunk, args).unwrap()
    }

    #[test]
    fn adds_two_locals() {
        let result = run_src("func Add(int a, int b) { return a + b; }", &[Value::Int(2), Value::Int(3)]);
        assert_eq!(result, Value::Int(5));
    }

    #[test]
    fn if_else_picks_branch() {
        let result = run_src(
            "func F(int a) { if (a) { return 1; } else { return 2; } }",
            &[Value::Int(0)],
        );
        assert_eq!(result, Value::Int(2));
    }

    #[test]
    fn while_loop_counts_down() {
        let result = run_src(
            "func F(int a) { var total = 0; while (a) { total = total + a; a = a - 1; } return total; }",
            &[Value::Int(3)],
        );
        assert_eq!(result, Value::Int(6));
    }

    #[test]
    fn array_index_and_store() {
        let result = run_src(
            "func F() { var arr = [1, 2, 3]; arr[1] = 99; return arr[1]; }",
            &[],
        );
        assert_eq!(result, Value::Int(99));
    }

    #[test]
    fn division_by_zero_errors() {
        let funcs_ast = parse(lex("func F(int a) { return 1 / a; }").unwrap()).unwrap();
        let chunk = compile(&funcs_ast[0]).unwrap();
        let funcmap = FuncMap::new();
        let mut host = NoopHost;
        let mut vm = Vm::new(&funcmap, &mut host);
        let result = vm.run(&chunk, &[Value::Int(0)]);
        assert!(matches!(result, Err(AulError::DivisionByZero)));
    }
}
