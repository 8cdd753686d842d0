use std::str::FromStr;

use num::bigint::BigInt;
use num::rational::BigRational;
use num::{One, Signed, ToPrimitive, Zero};

use super::operand::Literal;
use crate::ast::Category;
use crate::error::EvalError;

/// Largest exponent or shift accepted on unbounded number literals.
const MAX_LITERAL_EXPONENT: usize = 4096;

// ── Binary operators ────────────────────────────────────────────────────

/// Apply `op` to two literals. The result category is the operands' common
/// category, except for comparisons which always yield `bool`.
pub fn evaluate(left: &Literal, op: &str, right: &Literal) -> Result<Literal, EvalError> {
    match (left.category, right.category) {
        (Category::RationalNumber, Category::RationalNumber) => {
            let a = rational(left)?;
            let b = rational(right)?;
            rational_op(op, a, b)
        }
        (l, r) if l.is_numeric() && r.is_numeric() => {
            let (signed, bits) = common_integer(op, l, r)?;
            let a = to_integer(left, signed, bits)?;
            let b = to_integer(right, signed, bits)?;
            integer_op(signed, bits, op, a, b)
        }
        (Category::Bool, Category::Bool) => {
            let a = strict_bool(left)?;
            let b = strict_bool(right)?;
            match op {
                "&&" => Ok(Literal::boolean(a && b)),
                "||" => Ok(Literal::boolean(a || b)),
                "==" => Ok(Literal::boolean(a == b)),
                "!=" => Ok(Literal::boolean(a != b)),
                _ => Err(unsupported(op, Category::Bool)),
            }
        }
        (l, r) if l.is_string() && r.is_string() => match op {
            "==" => Ok(Literal::boolean(left.value == right.value)),
            "!=" => Ok(Literal::boolean(left.value != right.value)),
            "+" => {
                let category = if l == Category::StringLiteral && r == Category::StringLiteral {
                    Category::StringLiteral
                } else {
                    Category::String
                };
                Ok(Literal::new(category, format!("{}{}", left.value, right.value)))
            }
            _ => Err(unsupported(op, l)),
        },
        (Category::Address, Category::Address) => ordered_hex_op(op, left, right),
        (Category::FixedBytes(a), Category::FixedBytes(b)) if a == b => {
            ordered_hex_op(op, left, right)
        }
        (l, r) => Err(EvalError::TypeMismatch {
            op: op.to_string(),
            left: l,
            right: r,
        }),
    }
}

fn rational_op(op: &str, a: BigRational, b: BigRational) -> Result<Literal, EvalError> {
    if let Some(result) = compare(op, &a, &b) {
        return Ok(Literal::boolean(result));
    }
    let value = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => {
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        "%" => {
            let (x, y) = integral_pair(op, &a, &b)?;
            if y.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            BigRational::from_integer(x % y)
        }
        "**" => rational_pow(&a, &b)?,
        "&" | "|" | "^" => {
            let (x, y) = integral_pair(op, &a, &b)?;
            BigRational::from_integer(match op {
                "&" => x & y,
                "|" => x | y,
                _ => x ^ y,
            })
        }
        "<<" | ">>" => {
            let (x, y) = integral_pair(op, &a, &b)?;
            let shift = shift_amount(op, &y, Category::RationalNumber)?;
            if shift > MAX_LITERAL_EXPONENT {
                return Err(overflow(op, Category::RationalNumber));
            }
            BigRational::from_integer(if op == "<<" { x << shift } else { x >> shift })
        }
        _ => return Err(unsupported(op, Category::RationalNumber)),
    };
    Ok(Literal::new(Category::RationalNumber, format_rational(&value)))
}

fn rational_pow(base: &BigRational, exponent: &BigRational) -> Result<BigRational, EvalError> {
    if !exponent.is_integer() {
        return Err(EvalError::UnsupportedExpression(
            "fractional exponent".to_string(),
        ));
    }
    let e = exponent
        .to_integer()
        .abs()
        .to_usize()
        .filter(|e| *e <= MAX_LITERAL_EXPONENT)
        .ok_or_else(|| overflow("**", Category::RationalNumber))?;
    if exponent.is_negative() {
        if base.is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        return Ok(num::pow(base.clone(), e).recip());
    }
    Ok(num::pow(base.clone(), e))
}

fn integer_op(
    signed: bool,
    bits: u16,
    op: &str,
    a: BigInt,
    b: BigInt,
) -> Result<Literal, EvalError> {
    let category = Category::Integer { signed, bits };
    if let Some(result) = compare(op, &a, &b) {
        return Ok(Literal::boolean(result));
    }
    let value = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => {
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        "%" => {
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a % b
        }
        "**" => integer_pow(&a, &b, category)?,
        "&" => a & b,
        "|" => a | b,
        "^" => a ^ b,
        "<<" => {
            let shift = shift_amount(op, &b, category)?.min(bits as usize);
            return Ok(Literal::new(category, wrap(a << shift, signed, bits).to_string()));
        }
        ">>" => {
            let shift = shift_amount(op, &b, category)?.min(bits as usize);
            a >> shift
        }
        _ => return Err(unsupported(op, category)),
    };
    if !in_range(&value, signed, bits) {
        return Err(overflow(op, category));
    }
    Ok(Literal::new(category, value.to_string()))
}

fn integer_pow(base: &BigInt, exponent: &BigInt, category: Category) -> Result<BigInt, EvalError> {
    if exponent.is_negative() {
        return Err(EvalError::UnsupportedExpression(
            "negative exponent".to_string(),
        ));
    }
    // |base| >= 2 overflows any width once the exponent exceeds 256.
    if base.abs() <= BigInt::one() {
        let odd = (exponent % 2u32) == BigInt::one();
        return Ok(if base.is_negative() && !odd {
            BigInt::one()
        } else if exponent.is_zero() {
            BigInt::one()
        } else {
            base.clone()
        });
    }
    let e = exponent
        .to_usize()
        .filter(|e| *e <= 256)
        .ok_or_else(|| overflow("**", category))?;
    Ok(num::pow(base.clone(), e))
}

fn ordered_hex_op(op: &str, left: &Literal, right: &Literal) -> Result<Literal, EvalError> {
    let a = hex_value(left)?;
    let b = hex_value(right)?;
    compare(op, &a, &b)
        .map(Literal::boolean)
        .ok_or_else(|| unsupported(op, left.category))
}

fn common_integer(op: &str, left: Category, right: Category) -> Result<(bool, u16), EvalError> {
    match (left, right) {
        (
            Category::Integer { signed: ls, bits: lb },
            Category::Integer { signed: rs, bits: rb },
        ) => {
            if ls != rs {
                return Err(EvalError::TypeMismatch {
                    op: op.to_string(),
                    left,
                    right,
                });
            }
            Ok((ls, lb.max(rb)))
        }
        (Category::Integer { signed, bits }, _) | (_, Category::Integer { signed, bits }) => {
            Ok((signed, bits))
        }
        _ => Err(EvalError::TypeMismatch {
            op: op.to_string(),
            left,
            right,
        }),
    }
}

// ── Unary operators ─────────────────────────────────────────────────────

/// Apply a unary operator. `++` and `--` return the updated value.
pub fn evaluate_unary(op: &str, operand: &Literal) -> Result<Literal, EvalError> {
    match (op, operand.category) {
        ("!", Category::Bool) => Ok(Literal::boolean(!strict_bool(operand)?)),
        ("-", Category::RationalNumber) => {
            let value = -rational(operand)?;
            Ok(Literal::new(Category::RationalNumber, format_rational(&value)))
        }
        ("~", Category::RationalNumber) => {
            let value = rational(operand)?;
            if !value.is_integer() {
                return Err(unsupported(op, Category::RationalNumber));
            }
            let result = -value.to_integer() - BigInt::one();
            Ok(Literal::new(Category::RationalNumber, result.to_string()))
        }
        ("-", Category::Integer { signed: true, bits }) => {
            let value = -to_integer(operand, true, bits)?;
            checked(op, operand.category, value)
        }
        ("~", Category::Integer { signed, bits }) => {
            let value = to_integer(operand, signed, bits)?;
            let result = if signed {
                -value - BigInt::one()
            } else {
                max_value(false, bits) - value
            };
            checked(op, operand.category, result)
        }
        ("++", c) if c.is_numeric() => step(operand, "+"),
        ("--", c) if c.is_numeric() => step(operand, "-"),
        (_, category) => Err(unsupported(op, category)),
    }
}

fn step(operand: &Literal, op: &str) -> Result<Literal, EvalError> {
    let one = Literal::new(Category::RationalNumber, "1");
    evaluate(operand, op, &one)
}

fn checked(op: &str, category: Category, value: BigInt) -> Result<Literal, EvalError> {
    match category {
        Category::Integer { signed, bits } if !in_range(&value, signed, bits) => {
            Err(overflow(op, category))
        }
        _ => Ok(Literal::new(category, value.to_string())),
    }
}

// ── Conversions ─────────────────────────────────────────────────────────

pub fn coerce(literal: &Literal, target: Category) -> Result<Literal, EvalError> {
    let invalid = || EvalError::InvalidConversion {
        value: literal.value.clone(),
        from: literal.category,
        to: target,
    };
    match target {
        Category::Integer { signed, bits } if literal.category.is_numeric() => {
            let value = to_integer(literal, signed, bits).map_err(|_| invalid())?;
            Ok(Literal::new(target, value.to_string()))
        }
        Category::RationalNumber if literal.category.is_numeric() => {
            Ok(Literal::new(target, format_rational(&rational(literal)?)))
        }
        Category::String | Category::StringLiteral if literal.category.is_string() => {
            Ok(Literal::new(target, literal.value.clone()))
        }
        Category::FixedBytes(width) => coerce_bytes(literal, width).ok_or_else(invalid),
        Category::Other => Ok(Literal::new(target, literal.value.clone())),
        _ if literal.category == target => Ok(literal.clone()),
        _ => Err(invalid()),
    }
}

fn coerce_bytes(literal: &Literal, width: u8) -> Option<Literal> {
    let target = Category::FixedBytes(width);
    let digits = match literal.category {
        Category::FixedBytes(w) if w <= width => literal.value.strip_prefix("0x")?.to_string(),
        Category::StringLiteral if literal.value.len() <= width as usize => literal
            .value
            .bytes()
            .map(|b| format!("{:02x}", b))
            .collect(),
        Category::RationalNumber => {
            let hex = literal.value.strip_prefix("0x");
            match hex {
                Some(h) if h.len() == width as usize * 2 => h.to_lowercase(),
                None if parse_number(&literal.value).is_some_and(|v| v.is_zero()) => String::new(),
                _ => return None,
            }
        }
        _ => return None,
    };
    Some(Literal::new(
        target,
        format!("0x{:0<width$}", digits, width = width as usize * 2),
    ))
}

/// Multiply a number literal by its subdenomination (`1 ether`, `2 days`).
pub fn denominate(text: &str, unit: &str) -> Result<String, EvalError> {
    let factor: u64 = match unit {
        "wei" | "seconds" => 1,
        "gwei" => 1_000_000_000,
        "ether" => 1_000_000_000_000_000_000,
        "minutes" => 60,
        "hours" => 3_600,
        "days" => 86_400,
        "weeks" => 604_800,
        _ => {
            return Err(EvalError::UnsupportedExpression(format!(
                "unknown subdenomination '{}'",
                unit
            )))
        }
    };
    let value = parse_number(text).ok_or_else(|| EvalError::InvalidLiteral {
        value: text.to_string(),
        category: Category::RationalNumber,
    })?;
    Ok(format_rational(&(value * BigRational::from_integer(BigInt::from(factor)))))
}

/// Best-effort boolean reading: exact `true`/`false` first, then
/// case-insensitive words and `1`/`0`.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => return Some(true),
        "false" => return Some(false),
        _ => {}
    }
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

// ── Number parsing ──────────────────────────────────────────────────────

/// Parse number literal text: decimal, `0x` hex, `_` separators,
/// scientific notation, decimal fractions and `n/d` rationals.
pub fn parse_number(text: &str) -> Option<BigRational> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };

    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        BigRational::from_integer(BigInt::parse_bytes(hex.as_bytes(), 16)?)
    } else if let Some((n, d)) = body.split_once('/') {
        let n = parse_digits(n.trim())?;
        let d = parse_digits(d.trim())?;
        if d.is_zero() {
            return None;
        }
        BigRational::new(n, d)
    } else {
        let (mantissa, exponent) = match body.find(['e', 'E']) {
            Some(i) => (&body[..i], body[i + 1..].parse::<i64>().ok()?),
            None => (body, 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let digits = parse_digits(&format!("{}{}", int_part, frac_part))?;
        let scale = exponent.checked_sub(i64::try_from(frac_part.len()).ok()?)?;
        if scale.unsigned_abs() as usize > MAX_LITERAL_EXPONENT {
            return None;
        }
        let ten = BigInt::from(10u32);
        if scale >= 0 {
            BigRational::from_integer(digits * num::pow(ten, scale as usize))
        } else {
            BigRational::new(digits, num::pow(ten, (-scale) as usize))
        }
    };
    Some(if negative { -value } else { value })
}

fn parse_digits(text: &str) -> Option<BigInt> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    BigInt::from_str(text).ok()
}

pub fn format_rational(value: &BigRational) -> String {
    if value.is_integer() {
        value.numer().to_string()
    } else {
        format!("{}/{}", value.numer(), value.denom())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn rational(literal: &Literal) -> Result<BigRational, EvalError> {
    parse_number(&literal.value).ok_or_else(|| EvalError::InvalidLiteral {
        value: literal.value.clone(),
        category: literal.category,
    })
}

fn to_integer(literal: &Literal, signed: bool, bits: u16) -> Result<BigInt, EvalError> {
    let target = Category::Integer { signed, bits };
    let value = rational(literal)?;
    if !value.is_integer() {
        return Err(EvalError::InvalidConversion {
            value: literal.value.clone(),
            from: literal.category,
            to: target,
        });
    }
    let value = value.to_integer();
    if !in_range(&value, signed, bits) {
        return Err(EvalError::InvalidConversion {
            value: literal.value.clone(),
            from: literal.category,
            to: target,
        });
    }
    Ok(value)
}

fn strict_bool(literal: &Literal) -> Result<bool, EvalError> {
    parse_bool(&literal.value).ok_or_else(|| EvalError::InvalidLiteral {
        value: literal.value.clone(),
        category: literal.category,
    })
}

fn hex_value(literal: &Literal) -> Result<BigInt, EvalError> {
    literal
        .value
        .strip_prefix("0x")
        .or_else(|| literal.value.strip_prefix("0X"))
        .and_then(|hex| {
            if hex.is_empty() {
                Some(BigInt::zero())
            } else {
                BigInt::parse_bytes(hex.as_bytes(), 16)
            }
        })
        .ok_or_else(|| EvalError::InvalidLiteral {
            value: literal.value.clone(),
            category: literal.category,
        })
}

fn integral_pair(
    op: &str,
    a: &BigRational,
    b: &BigRational,
) -> Result<(BigInt, BigInt), EvalError> {
    if !a.is_integer() || !b.is_integer() {
        return Err(unsupported(op, Category::RationalNumber));
    }
    Ok((a.to_integer(), b.to_integer()))
}

fn shift_amount(op: &str, amount: &BigInt, category: Category) -> Result<usize, EvalError> {
    if amount.is_negative() {
        return Err(EvalError::UnsupportedExpression(
            "negative shift amount".to_string(),
        ));
    }
    amount.to_usize().ok_or_else(|| overflow(op, category))
}

fn compare<T: PartialOrd>(op: &str, a: &T, b: &T) -> Option<bool> {
    Some(match op {
        "==" => a == b,
        "!=" => a != b,
        "<" => a < b,
        "<=" => a <= b,
        ">" => a > b,
        ">=" => a >= b,
        _ => return None,
    })
}

fn min_value(signed: bool, bits: u16) -> BigInt {
    if signed {
        -(BigInt::one() << (bits as usize - 1))
    } else {
        BigInt::zero()
    }
}

fn max_value(signed: bool, bits: u16) -> BigInt {
    let width = if signed { bits as usize - 1 } else { bits as usize };
    (BigInt::one() << width) - BigInt::one()
}

fn in_range(value: &BigInt, signed: bool, bits: u16) -> bool {
    *value >= min_value(signed, bits) && *value <= max_value(signed, bits)
}

fn wrap(value: BigInt, signed: bool, bits: u16) -> BigInt {
    let modulus = BigInt::one() << bits as usize;
    let mut reduced = ((value % &modulus) + &modulus) % &modulus;
    if signed && reduced > max_value(true, bits) {
        reduced -= modulus;
    }
    reduced
}

fn unsupported(op: &str, category: Category) -> EvalError {
    EvalError::UnsupportedOperator {
        op: op.to_string(),
        category,
    }
}

fn overflow(op: &str, category: Category) -> EvalError {
    EvalError::Overflow {
        op: op.to_string(),
        category,
    }
}
