//! The core built-in table: operators, constructors, a handful of methods on
//! the built-in kinds, and the built-in free functions.

use bytescript_common::{BuiltinFunction, Kind, Operator};

use crate::error::{CallError, InvokeError, OperatorError};
use crate::tables::Builtins;
use crate::value::{Array, Dictionary, Value, Vector2};

/// Default [`Builtins`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreBuiltins;

impl CoreBuiltins {
    pub fn new() -> Self {
        Self
    }
}

const STRING_METHODS: &[&str] = &["length", "to_upper", "to_lower", "begins_with", "find"];
const ARRAY_METHODS: &[&str] = &["size", "empty", "push_back", "append", "pop_back", "clear", "has"];
const DICTIONARY_METHODS: &[&str] = &["size", "empty", "has", "keys", "values", "erase", "get"];
const VECTOR2_METHODS: &[&str] = &["length", "dot"];

fn division_by_zero() -> OperatorError {
    OperatorError::Message("Division By Zero".to_string())
}

fn arity(args: &[Value], min: usize, max: usize) -> Result<(), CallError> {
    if args.len() > max {
        Err(CallError::TooManyArguments { expected: max })
    } else if args.len() < min {
        Err(CallError::TooFewArguments { expected: min })
    } else {
        Ok(())
    }
}

fn expect_str(args: &[Value], argument: usize) -> Result<&str, CallError> {
    args[argument].as_str().ok_or(CallError::InvalidArgument {
        argument,
        expected: Kind::String,
    })
}

fn expect_number(args: &[Value], argument: usize) -> Result<f64, CallError> {
    args[argument].as_float().ok_or(CallError::InvalidArgument {
        argument,
        expected: Kind::Float,
    })
}

fn expect_int(args: &[Value], argument: usize) -> Result<i64, CallError> {
    match &args[argument] {
        Value::Int(i) => Ok(*i),
        Value::Float(f) => Ok(*f as i64),
        _ => Err(CallError::InvalidArgument {
            argument,
            expected: Kind::Int,
        }),
    }
}

fn concat(args: &[Value]) -> String {
    args.iter().map(Value::to_string).collect()
}

impl CoreBuiltins {
    fn compare(op: Operator, a: &Value, b: &Value) -> Result<Value, OperatorError> {
        use std::cmp::Ordering;

        let ordering = match (a, b) {
            (Value::Int(x), Value::Int(y)) => x.cmp(y),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).ok_or(OperatorError::InvalidOperands)?,
                _ => return Err(OperatorError::InvalidOperands),
            },
        };
        let result = match op {
            Operator::Less => ordering == Ordering::Less,
            Operator::LessEqual => ordering != Ordering::Greater,
            Operator::Greater => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        Ok(Value::Bool(result))
    }

    fn equality(op: Operator, a: &Value, b: &Value) -> Result<Value, OperatorError> {
        let comparable = a.kind() == b.kind()
            || (a.kind().is_numeric() && b.kind().is_numeric())
            || a.is_nil()
            || b.is_nil();
        if !comparable {
            return Err(OperatorError::InvalidOperands);
        }
        let equal = a == b;
        Ok(Value::Bool(if op == Operator::Equal { equal } else { !equal }))
    }

    fn arithmetic(op: Operator, a: &Value, b: &Value) -> Result<Value, OperatorError> {
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => {
                let r = match op {
                    Operator::Add => x.wrapping_add(*y),
                    Operator::Subtract => x.wrapping_sub(*y),
                    Operator::Multiply => x.wrapping_mul(*y),
                    Operator::Divide if *y == 0 => return Err(division_by_zero()),
                    Operator::Divide => x.wrapping_div(*y),
                    Operator::Modulo if *y == 0 => return Err(division_by_zero()),
                    Operator::Modulo => x.wrapping_rem(*y),
                    _ => return Err(OperatorError::InvalidOperands),
                };
                Ok(Value::Int(r))
            }
            (Value::String(x), Value::String(y)) if op == Operator::Add => {
                Ok(Value::from(format!("{x}{y}")))
            }
            (Value::Array(x), Value::Array(y)) if op == Operator::Add => {
                let mut items = x.to_vec();
                items.extend(y.to_vec());
                Ok(Value::from(items))
            }
            (Value::Vector2(v), Value::Vector2(w)) => {
                let r = match op {
                    Operator::Add => Vector2::new(v.x + w.x, v.y + w.y),
                    Operator::Subtract => Vector2::new(v.x - w.x, v.y - w.y),
                    Operator::Multiply => Vector2::new(v.x * w.x, v.y * w.y),
                    Operator::Divide => Vector2::new(v.x / w.x, v.y / w.y),
                    _ => return Err(OperatorError::InvalidOperands),
                };
                Ok(Value::Vector2(r))
            }
            (Value::Vector2(v), s) if matches!(op, Operator::Multiply | Operator::Divide) => {
                let s = s.as_float().ok_or(OperatorError::InvalidOperands)?;
                Ok(Value::Vector2(if op == Operator::Multiply {
                    Vector2::new(v.x * s, v.y * s)
                } else {
                    Vector2::new(v.x / s, v.y / s)
                }))
            }
            _ => {
                let (x, y) = match (a.as_float(), b.as_float()) {
                    (Some(x), Some(y)) => (x, y),
                    _ => return Err(OperatorError::InvalidOperands),
                };
                let r = match op {
                    Operator::Add => x + y,
                    Operator::Subtract => x - y,
                    Operator::Multiply => x * y,
                    Operator::Divide => x / y,
                    _ => return Err(OperatorError::InvalidOperands),
                };
                Ok(Value::Float(r))
            }
        }
    }

    fn bitwise(op: Operator, a: &Value, b: &Value) -> Result<Value, OperatorError> {
        let x = a.as_int().ok_or(OperatorError::InvalidOperands)?;
        if op == Operator::BitNegate {
            return Ok(Value::Int(!x));
        }
        let y = b.as_int().ok_or(OperatorError::InvalidOperands)?;
        let r = match op {
            Operator::ShiftLeft => x.wrapping_shl(y as u32),
            Operator::ShiftRight => x.wrapping_shr(y as u32),
            Operator::BitAnd => x & y,
            Operator::BitOr => x | y,
            _ => x ^ y,
        };
        Ok(Value::Int(r))
    }

    fn logic(op: Operator, a: &Value, b: &Value) -> Result<Value, OperatorError> {
        let x = a.booleanize().ok_or(OperatorError::InvalidOperands)?;
        if op == Operator::Not {
            return Ok(Value::Bool(!x));
        }
        let y = b.booleanize().ok_or(OperatorError::InvalidOperands)?;
        let r = match op {
            Operator::And => x && y,
            Operator::Or => x || y,
            _ => x != y,
        };
        Ok(Value::Bool(r))
    }

    fn contains(a: &Value, b: &Value) -> Result<Value, OperatorError> {
        let found = match (a, b) {
            (Value::String(needle), Value::String(hay)) => hay.contains(&**needle),
            (item, Value::Array(array)) => array.contains(item),
            (key, Value::Dictionary(dict)) => dict.contains_key(key),
            _ => return Err(OperatorError::InvalidOperands),
        };
        Ok(Value::Bool(found))
    }

    fn string_method(s: &str, method: &str, args: &[Value]) -> Result<Value, InvokeError> {
        match method {
            "length" => {
                arity(args, 0, 0)?;
                Ok(Value::Int(s.chars().count() as i64))
            }
            "to_upper" => {
                arity(args, 0, 0)?;
                Ok(Value::from(s.to_uppercase()))
            }
            "to_lower" => {
                arity(args, 0, 0)?;
                Ok(Value::from(s.to_lowercase()))
            }
            "begins_with" => {
                arity(args, 1, 1)?;
                Ok(Value::Bool(s.starts_with(expect_str(args, 0)?)))
            }
            "find" => {
                arity(args, 1, 1)?;
                let needle = expect_str(args, 0)?;
                let pos = s
                    .find(needle)
                    .map_or(-1, |byte| s[..byte].chars().count() as i64);
                Ok(Value::Int(pos))
            }
            _ => Err(CallError::InvalidMethod.into()),
        }
    }

    fn array_method(array: &Array, method: &str, args: &[Value]) -> Result<Value, InvokeError> {
        match method {
            "size" => {
                arity(args, 0, 0)?;
                Ok(Value::Int(array.len() as i64))
            }
            "empty" => {
                arity(args, 0, 0)?;
                Ok(Value::Bool(array.is_empty()))
            }
            "push_back" | "append" => {
                arity(args, 1, 1)?;
                array.push(args[0].clone());
                Ok(Value::Nil)
            }
            "pop_back" => {
                arity(args, 0, 0)?;
                Ok(array.pop().unwrap_or_default())
            }
            "clear" => {
                arity(args, 0, 0)?;
                array.clear();
                Ok(Value::Nil)
            }
            "has" => {
                arity(args, 1, 1)?;
                Ok(Value::Bool(array.contains(&args[0])))
            }
            _ => Err(CallError::InvalidMethod.into()),
        }
    }

    fn dictionary_method(
        dict: &Dictionary,
        method: &str,
        args: &[Value],
    ) -> Result<Value, InvokeError> {
        match method {
            "size" => {
                arity(args, 0, 0)?;
                Ok(Value::Int(dict.len() as i64))
            }
            "empty" => {
                arity(args, 0, 0)?;
                Ok(Value::Bool(dict.is_empty()))
            }
            "has" => {
                arity(args, 1, 1)?;
                Ok(Value::Bool(dict.contains_key(&args[0])))
            }
            "keys" => {
                arity(args, 0, 0)?;
                Ok(Value::from(dict.keys()))
            }
            "values" => {
                arity(args, 0, 0)?;
                Ok(Value::from(dict.values()))
            }
            "erase" => {
                arity(args, 1, 1)?;
                Ok(Value::Bool(dict.remove(&args[0]).is_some()))
            }
            "get" => {
                arity(args, 1, 2)?;
                let fallback = args.get(1).cloned().unwrap_or_default();
                Ok(dict.get(&args[0]).unwrap_or(fallback))
            }
            _ => Err(CallError::InvalidMethod.into()),
        }
    }

    fn vector_method(v: &Vector2, method: &str, args: &[Value]) -> Result<Value, InvokeError> {
        match method {
            "length" => {
                arity(args, 0, 0)?;
                Ok(Value::Float(v.length()))
            }
            "dot" => {
                arity(args, 1, 1)?;
                match &args[0] {
                    Value::Vector2(w) => Ok(Value::Float(v.dot(*w))),
                    _ => Err(CallError::InvalidArgument {
                        argument: 0,
                        expected: Kind::Vector2,
                    }
                    .into()),
                }
            }
            _ => Err(CallError::InvalidMethod.into()),
        }
    }

    fn range(args: &[Value]) -> Result<Value, InvokeError> {
        arity(args, 1, 3)?;
        let (from, to, step) = match args.len() {
            1 => (0, expect_int(args, 0)?, 1),
            2 => (expect_int(args, 0)?, expect_int(args, 1)?, 1),
            _ => (expect_int(args, 0)?, expect_int(args, 1)?, expect_int(args, 2)?),
        };
        if step == 0 {
            return Err(InvokeError::Failed("step argument is zero!".to_string()));
        }
        let mut items = Vec::new();
        let mut i = from;
        while (step > 0 && i < to) || (step < 0 && i > to) {
            items.push(Value::Int(i));
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
        Ok(Value::from(items))
    }
}

impl Builtins for CoreBuiltins {
    fn evaluate(&self, op: Operator, a: &Value, b: &Value) -> Result<Value, OperatorError> {
        match op {
            Operator::Equal | Operator::NotEqual => Self::equality(op, a, b),
            Operator::Less | Operator::LessEqual | Operator::Greater | Operator::GreaterEqual => {
                Self::compare(op, a, b)
            }
            Operator::Add
            | Operator::Subtract
            | Operator::Multiply
            | Operator::Divide
            | Operator::Modulo => Self::arithmetic(op, a, b),
            Operator::Negate => match a {
                Value::Int(x) => Ok(Value::Int(x.wrapping_neg())),
                Value::Float(x) => Ok(Value::Float(-x)),
                Value::Vector2(v) => Ok(Value::Vector2(Vector2::new(-v.x, -v.y))),
                _ => Err(OperatorError::InvalidOperands),
            },
            Operator::Positive => match a {
                Value::Int(_) | Value::Float(_) | Value::Vector2(_) => Ok(a.clone()),
                _ => Err(OperatorError::InvalidOperands),
            },
            Operator::ShiftLeft
            | Operator::ShiftRight
            | Operator::BitAnd
            | Operator::BitOr
            | Operator::BitXor
            | Operator::BitNegate => Self::bitwise(op, a, b),
            Operator::And | Operator::Or | Operator::Xor | Operator::Not => Self::logic(op, a, b),
            Operator::In => Self::contains(a, b),
        }
    }

    fn construct(&self, kind: Kind, overload: u32, args: &[Value]) -> Result<Value, InvokeError> {
        // The core table has a single constructor per kind.
        if overload != 0 {
            return Err(CallError::InvalidMethod.into());
        }
        let value = match kind {
            Kind::Nil => {
                arity(args, 0, 0)?;
                Value::Nil
            }
            Kind::Bool => {
                arity(args, 0, 1)?;
                match args.first() {
                    None => Value::Bool(false),
                    Some(v) => Value::Bool(v.booleanize().ok_or(CallError::InvalidArgument {
                        argument: 0,
                        expected: Kind::Bool,
                    })?),
                }
            }
            Kind::Int => {
                arity(args, 0, 1)?;
                match args.first() {
                    None => Value::Int(0),
                    Some(Value::Bool(b)) => Value::Int(*b as i64),
                    Some(Value::String(s)) => Value::Int(s.trim().parse().unwrap_or(0)),
                    Some(_) => Value::Int(expect_int(args, 0)?),
                }
            }
            Kind::Float => {
                arity(args, 0, 1)?;
                match args.first() {
                    None => Value::Float(0.0),
                    Some(Value::Bool(b)) => Value::Float(*b as i64 as f64),
                    Some(Value::String(s)) => Value::Float(s.trim().parse().unwrap_or(0.0)),
                    Some(_) => Value::Float(expect_number(args, 0)?),
                }
            }
            Kind::String => {
                arity(args, 0, 1)?;
                Value::from(args.first().map(Value::to_string).unwrap_or_default())
            }
            Kind::Vector2 => match args.len() {
                0 => Value::Vector2(Vector2::default()),
                1 => return Err(CallError::TooFewArguments { expected: 2 }.into()),
                _ => {
                    arity(args, 2, 2)?;
                    Value::Vector2(Vector2::new(expect_number(args, 0)?, expect_number(args, 1)?))
                }
            },
            Kind::Array => {
                arity(args, 0, 1)?;
                match args.first() {
                    None => Value::from(Vec::new()),
                    Some(Value::Array(a)) => Value::from(a.to_vec()),
                    Some(_) => {
                        return Err(CallError::InvalidArgument {
                            argument: 0,
                            expected: Kind::Array,
                        }
                        .into())
                    }
                }
            }
            Kind::Dictionary => {
                arity(args, 0, 0)?;
                Value::Dictionary(Dictionary::new())
            }
            Kind::Object => {
                arity(args, 0, 0)?;
                Value::Object(None)
            }
            Kind::Class | Kind::Continuation => return Err(CallError::InvalidMethod.into()),
        };
        Ok(value)
    }

    fn call_method(&self, base: &Value, method: &str, args: &[Value]) -> Result<Value, InvokeError> {
        match base {
            Value::String(s) => Self::string_method(s, method, args),
            Value::Array(a) => Self::array_method(a, method, args),
            Value::Dictionary(d) => Self::dictionary_method(d, method, args),
            Value::Vector2(v) => Self::vector_method(v, method, args),
            _ => Err(CallError::InvalidMethod.into()),
        }
    }

    fn has_method(&self, kind: Kind, method: &str) -> bool {
        let table = match kind {
            Kind::String => STRING_METHODS,
            Kind::Array => ARRAY_METHODS,
            Kind::Dictionary => DICTIONARY_METHODS,
            Kind::Vector2 => VECTOR2_METHODS,
            _ => return false,
        };
        table.contains(&method)
    }

    fn call_function(&self, func: BuiltinFunction, args: &[Value]) -> Result<Value, InvokeError> {
        match func {
            BuiltinFunction::Abs => {
                arity(args, 1, 1)?;
                match &args[0] {
                    Value::Int(i) => Ok(Value::Int(i.wrapping_abs())),
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    _ => Err(CallError::InvalidArgument {
                        argument: 0,
                        expected: Kind::Float,
                    }
                    .into()),
                }
            }
            BuiltinFunction::Min | BuiltinFunction::Max => {
                arity(args, 2, 2)?;
                let pick_min = func == BuiltinFunction::Min;
                if let (Value::Int(a), Value::Int(b)) = (&args[0], &args[1]) {
                    return Ok(Value::Int(if pick_min { *a.min(b) } else { *a.max(b) }));
                }
                let (a, b) = (expect_number(args, 0)?, expect_number(args, 1)?);
                Ok(Value::Float(if pick_min { a.min(b) } else { a.max(b) }))
            }
            BuiltinFunction::Len => {
                arity(args, 1, 1)?;
                let len = match &args[0] {
                    Value::String(s) => s.chars().count(),
                    Value::Array(a) => a.len(),
                    Value::Dictionary(d) => d.len(),
                    _ => return Err(InvokeError::Failed("Object can't provide a length.".into())),
                };
                Ok(Value::Int(len as i64))
            }
            BuiltinFunction::Str => Ok(Value::from(concat(args))),
            BuiltinFunction::Range => Self::range(args),
            BuiltinFunction::TypeOf => {
                arity(args, 1, 1)?;
                Ok(Value::Int(args[0].kind() as i64))
            }
            BuiltinFunction::Print => {
                tracing::info!(target: "bytescript::vm::builtin", "{}", concat(args));
                Ok(Value::Nil)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(op: Operator, a: Value, b: Value) -> Result<Value, OperatorError> {
        CoreBuiltins.evaluate(op, &a, &b)
    }

    #[test]
    fn int_arithmetic() {
        assert_eq!(eval(Operator::Add, Value::Int(2), Value::Int(3)), Ok(Value::Int(5)));
        assert_eq!(eval(Operator::Divide, Value::Int(7), Value::Int(2)), Ok(Value::Int(3)));
        assert_eq!(eval(Operator::Modulo, Value::Int(7), Value::Int(4)), Ok(Value::Int(3)));
    }

    #[test]
    fn mixed_numeric_promotes_to_float() {
        assert_eq!(
            eval(Operator::Multiply, Value::Int(2), Value::Float(1.5)),
            Ok(Value::Float(3.0))
        );
    }

    #[test]
    fn integer_division_by_zero_has_message() {
        assert_eq!(
            eval(Operator::Divide, Value::Int(1), Value::Int(0)),
            Err(OperatorError::Message("Division By Zero".into()))
        );
    }

    #[test]
    fn string_plus_int_is_invalid() {
        assert_eq!(
            eval(Operator::Add, Value::from("a"), Value::Int(1)),
            Err(OperatorError::InvalidOperands)
        );
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(eval(Operator::Less, Value::Int(1), Value::Float(1.5)), Ok(Value::Bool(true)));
        assert_eq!(
            eval(Operator::GreaterEqual, Value::from("b"), Value::from("a")),
            Ok(Value::Bool(true))
        );
        assert_eq!(eval(Operator::Not, Value::Int(0), Value::Nil), Ok(Value::Bool(true)));
        assert_eq!(eval(Operator::Xor, Value::Bool(true), Value::Int(1)), Ok(Value::Bool(false)));
        assert_eq!(eval(Operator::Equal, Value::Nil, Value::Int(0)), Ok(Value::Bool(false)));
        assert_eq!(
            eval(Operator::Equal, Value::from("1"), Value::Int(1)),
            Err(OperatorError::InvalidOperands)
        );
    }

    #[test]
    fn containment() {
        let arr = Value::from(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(eval(Operator::In, Value::Int(2), arr), Ok(Value::Bool(true)));
        assert_eq!(
            eval(Operator::In, Value::from("ell"), Value::from("hello")),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn constructors() {
        let b = CoreBuiltins;
        assert_eq!(b.construct(Kind::Int, 0, &[Value::from("42")]), Ok(Value::Int(42)));
        assert_eq!(
            b.construct(Kind::Vector2, 0, &[Value::Int(1), Value::Float(2.0)]),
            Ok(Value::Vector2(Vector2::new(1.0, 2.0)))
        );
        assert_eq!(
            b.construct(Kind::Vector2, 0, &[Value::Int(1), Value::from("y")]),
            Err(InvokeError::Call(CallError::InvalidArgument {
                argument: 1,
                expected: Kind::Float
            }))
        );
        assert_eq!(
            b.construct(Kind::Int, 0, &[Value::Int(1), Value::Int(2)]),
            Err(InvokeError::Call(CallError::TooManyArguments { expected: 1 }))
        );
        assert_eq!(
            b.construct(Kind::Int, 3, &[]),
            Err(InvokeError::Call(CallError::InvalidMethod))
        );
    }

    #[test]
    fn methods() {
        let b = CoreBuiltins;
        let arr = Value::from(vec![]);
        b.call_method(&arr, "push_back", &[Value::Int(9)]).unwrap();
        assert_eq!(b.call_method(&arr, "size", &[]), Ok(Value::Int(1)));
        assert_eq!(
            b.call_method(&Value::from("hello"), "find", &[Value::from("ll")]),
            Ok(Value::Int(2))
        );
        assert_eq!(
            b.call_method(&Value::Int(1), "size", &[]),
            Err(InvokeError::Call(CallError::InvalidMethod))
        );
        assert!(b.has_method(Kind::Array, "size"));
        assert!(!b.has_method(Kind::Int, "size"));
    }

    #[test]
    fn range_stops_at_the_integer_limits() {
        let b = CoreBuiltins;
        assert_eq!(
            b.call_function(
                BuiltinFunction::Range,
                &[Value::Int(i64::MAX - 1), Value::Int(i64::MAX), Value::Int(5)]
            ),
            Ok(Value::from(vec![Value::Int(i64::MAX - 1)]))
        );
        assert_eq!(
            b.call_function(
                BuiltinFunction::Range,
                &[Value::Int(i64::MIN + 1), Value::Int(i64::MIN), Value::Int(-3)]
            ),
            Ok(Value::from(vec![Value::Int(i64::MIN + 1)]))
        );
    }

    #[test]
    fn free_functions() {
        let b = CoreBuiltins;
        assert_eq!(
            b.call_function(BuiltinFunction::Range, &[Value::Int(3)]),
            Ok(Value::from(vec![Value::Int(0), Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(
            b.call_function(BuiltinFunction::Range, &[Value::Int(0), Value::Int(3), Value::Int(0)]),
            Err(InvokeError::Failed("step argument is zero!".into()))
        );
        assert_eq!(
            b.call_function(BuiltinFunction::Len, &[Value::Int(3)]),
            Err(InvokeError::Failed("Object can't provide a length.".into()))
        );
        assert_eq!(
            b.call_function(BuiltinFunction::Max, &[Value::Int(3), Value::Int(8)]),
            Ok(Value::Int(8))
        );
        assert_eq!(
            b.call_function(BuiltinFunction::Str, &[Value::from("a"), Value::Int(1)]),
            Ok(Value::from("a1"))
        );
        assert_eq!(
            b.call_function(BuiltinFunction::TypeOf, &[Value::Float(1.0)]),
            Ok(Value::Int(Kind::Float as i64))
        );
    }
}
