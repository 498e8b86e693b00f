//! Runtime and link-time error types. Runtime script errors never abort
//! the interpreter — they turn into `Value::Nil` plus a logged
//! [`AulError`] at the nearest script boundary, per the engine's
//! exec-error-funnels-to-a-log policy.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AulError {
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("wrong argument type calling `{0}`")]
    WrongArgType(String),
    #[error("container index out of range")]
    IndexError,
    #[error("stack underflow executing bytecode")]
    StackUnderflow,
    #[error("access violation calling `{0}` ({1:?} required)")]
    AccessViolation(String, crate::funcmap::Access),
    #[error("division by zero")]
    DivisionByZero,
}
