// ABOUTME: Runtime values and their operator semantics

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Num(_) => "num",
            Value::Str(_) => "str",
            Value::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
        }
    }

    pub fn as_num(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Num(n) => *n,
            Value::Str(s) => s.trim().parse().unwrap_or(0.0),
            Value::List(_) => 0.0,
        }
    }

    pub fn as_list(&self) -> Vec<Value> {
        match self {
            Value::List(items) => items.clone(),
            Value::Null => Vec::new(),
            other => vec![other.clone()],
        }
    }

    /// Parse a runtime string into the value it denotes: trimmed, then
    /// `null`/`true`/`false`, then a float, falling back to the trimmed
    /// string itself. This is `__litr`'s worker — distinct from the
    /// lexer's own number grammar, since a runtime string can hold
    /// anything the source text could never contain literally.
    pub fn from_str(s: &str) -> Value {
        let trimmed = s.trim();
        match trimmed {
            "null" => Value::Null,
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => match trimmed.parse::<f64>() {
                Ok(n) => Value::Num(n),
                Err(_) => Value::Str(trimmed.to_string()),
            },
        }
    }

    /// `==` per §4.1: same-kind, same-payload equal; `List` is always
    /// unequal, even to itself — matches the reference implementation and
    /// is the deliberate choice for the list-equality open question.
    pub fn eq_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(_), Value::List(_)) => false,
            _ => false,
        }
    }

    /// `>` per §4.1: `Bool`/`Num` compare numerically, `Str` compares
    /// lexicographically. The reference implementation casts every
    /// branch through a numeric comparison, which for strings is a bug
    /// (undefined behavior on a non-numeric payload) rather than a
    /// deliberate design — this implements the fixed, lexicographic
    /// behavior the specification calls for instead of reproducing it.
    pub fn gt(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a > b,
            (a, b) => a.as_num() > b.as_num(),
        }
    }

    pub fn add(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => Value::Num(a + b),
            (Value::Str(a), Value::Str(b)) => Value::Str(format!("{a}{b}")),
            _ => Value::Null,
        }
    }

    pub fn sub(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => Value::Num(a - b),
            _ => Value::Null,
        }
    }

    pub fn mul(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => Value::Num(a * b),
            _ => Value::Null,
        }
    }

    pub fn div(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => Value::Num(a / b),
            _ => Value::Null,
        }
    }

    /// Integer-truncating remainder. Division by zero yields `Null`
    /// rather than panicking — the reference implementation's
    /// `long % long` is undefined behavior on a zero divisor; `Null` is
    /// the deliberate, documented replacement (see DESIGN.md).
    pub fn rem(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => {
                let bi = *b as i64;
                if bi == 0 {
                    Value::Null
                } else {
                    Value::Num((*a as i64 % bi) as f64)
                }
            }
            _ => Value::Null,
        }
    }

    pub fn neg(&self) -> Value {
        match self {
            Value::Num(n) => Value::Num(-n),
            _ => Value::Null,
        }
    }

    pub fn not(&self) -> Value {
        Value::Bool(!self.as_bool())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_trims_whole_numbers() {
        assert_eq!(Value::Num(3.0).to_string(), "3");
        assert_eq!(Value::Num(3.5).to_string(), "3.5");
    }

    #[test]
    fn list_display_uses_bracket_and_comma_format() {
        let list = Value::List(vec![Value::Num(2.0), Value::Num(3.0)]);
        assert_eq!(list.to_string(), "[2, 3]");
    }

    #[test]
    fn list_equality_is_always_false() {
        let a = Value::List(vec![Value::Num(1.0)]);
        let b = Value::List(vec![Value::Num(1.0)]);
        assert!(!a.eq_value(&b));
        assert!(!a.eq_value(&a.clone()));
    }

    #[test]
    fn scalar_equality_compares_payload() {
        assert!(Value::Num(1.0).eq_value(&Value::Num(1.0)));
        assert!(!Value::Num(1.0).eq_value(&Value::Num(2.0)));
        assert!(!Value::Num(1.0).eq_value(&Value::Str("1".to_string())));
    }

    #[test]
    fn string_comparison_is_lexicographic() {
        assert!(Value::Str("b".to_string()).gt(&Value::Str("a".to_string())));
        assert!(!Value::Str("a".to_string()).gt(&Value::Str("b".to_string())));
    }

    #[test]
    fn rem_by_zero_is_null() {
        assert_eq!(Value::Num(5.0).rem(&Value::Num(0.0)), Value::Null);
    }

    #[test]
    fn rem_truncates_like_integer_modulo() {
        assert_eq!(Value::Num(7.0).rem(&Value::Num(3.0)), Value::Num(1.0));
    }

    #[test]
    fn from_str_parses_literals_flexibly() {
        assert_eq!(Value::from_str("  null "), Value::Null);
        assert_eq!(Value::from_str("true"), Value::Bool(true));
        assert_eq!(Value::from_str("3.25"), Value::Num(3.25));
        assert_eq!(Value::from_str("hello"), Value::Str("hello".to_string()));
    }

    #[test]
    fn litr_of_str_round_trips_numeric_values() {
        for n in [0.0, 1.0, -1.0, 42.0, 1000.0, -7.0] {
            let v = Value::Num(n);
            assert_eq!(Value::from_str(&v.to_string()), v);
        }
    }

    #[test]
    fn add_concatenates_strings_and_sums_numbers() {
        assert_eq!(Value::Num(1.0).add(&Value::Num(2.0)), Value::Num(3.0));
        assert_eq!(
            Value::Str("a".to_string()).add(&Value::Str("b".to_string())),
            Value::Str("ab".to_string())
        );
        assert_eq!(Value::Num(1.0).add(&Value::Str("b".to_string())), Value::Null);
    }
}
