//! Infix boolean expressions over indexed inputs.
//!
//! Grammar: digits `0`-`9` index into the input vector, `!` negates, `*` is AND,
//! `^` is XOR, `+` is OR and parentheses group. `!` binds tightest, then `*` and
//! `^`, then `+`. Operators of equal precedence associate to the left.

use thiserror::Error;

/// Errors raised while evaluating an expression
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("input index {index} out of range for {len} inputs")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid character '{0}' in expression")]
    InvalidCharacter(char),

    #[error("malformed expression: {0}")]
    Malformed(String),
}

fn precedence(op: u8) -> u8 {
    match op {
        b'!' => 3,
        b'*' | b'^' => 2,
        b'+' => 1,
        _ => 0,
    }
}

fn apply_top(operands: &mut Vec<bool>, operators: &mut Vec<u8>) -> Result<(), ExpressionError> {
    let op = match operators.pop() {
        Some(op) => op,
        None => return Err(ExpressionError::Malformed("missing operator".to_string())),
    };

    if op == b'(' {
        return Err(ExpressionError::Malformed("unbalanced '('".to_string()));
    }

    let missing = || ExpressionError::Malformed(format!("missing operand for '{}'", op as char));

    if op == b'!' {
        let a = operands.pop().ok_or_else(missing)?;
        operands.push(!a);
        return Ok(());
    }

    let b = operands.pop().ok_or_else(missing)?;
    let a = operands.pop().ok_or_else(missing)?;
    let value = match op {
        b'+' => a || b,
        b'*' => a && b,
        b'^' => a ^ b,
        other => return Err(ExpressionError::InvalidCharacter(other as char)),
    };
    operands.push(value);
    Ok(())
}

/// Evaluate `expr` against `inputs`.
///
/// Pure: identical arguments always produce the identical result.
pub fn evaluate(expr: &str, inputs: &[bool]) -> Result<bool, ExpressionError> {
    let mut operands: Vec<bool> = Vec::with_capacity(8);
    let mut operators: Vec<u8> = Vec::with_capacity(8);

    for ch in expr.chars() {
        match ch {
            c if c.is_whitespace() => continue,
            '0'..='9' => {
                let index = (ch as u8 - b'0') as usize;
                let value = inputs.get(index).copied().ok_or(ExpressionError::IndexOutOfRange {
                    index,
                    len: inputs.len(),
                })?;
                operands.push(value);
            }
            '(' => operators.push(b'('),
            ')' => {
                loop {
                    match operators.last() {
                        Some(b'(') => {
                            operators.pop();
                            break;
                        }
                        Some(_) => apply_top(&mut operands, &mut operators)?,
                        None => {
                            return Err(ExpressionError::Malformed("unbalanced ')'".to_string()))
                        }
                    }
                }
            }
            '+' | '*' | '^' => {
                let op = ch as u8;
                while let Some(&top) = operators.last() {
                    if precedence(top) < precedence(op) {
                        break;
                    }
                    apply_top(&mut operands, &mut operators)?;
                }
                operators.push(op);
            }
            // Prefix operator, nothing on its left can be reduced yet
            '!' => operators.push(b'!'),
            other => return Err(ExpressionError::InvalidCharacter(other)),
        }
    }

    while !operators.is_empty() {
        apply_top(&mut operands, &mut operators)?;
    }

    match operands.as_slice() {
        [value] => Ok(*value),
        [] => Err(ExpressionError::Malformed("empty expression".to_string())),
        _ => Err(ExpressionError::Malformed("dangling operand".to_string())),
    }
}
