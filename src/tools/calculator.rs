use super::traits::{Tool, ToolArgs, ToolFuture, number_value};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculatorError {
    #[error("no expression provided")]
    MissingExpression,

    #[error("expression must be a string")]
    NotAString,

    #[error("expression cannot be empty")]
    EmptyExpression,

    #[error("invalid character: '{0}'")]
    InvalidCharacter(char),

    #[error("invalid number: '{0}'")]
    InvalidNumber(String),

    #[error("mismatched closing bracket '{0}'")]
    MismatchedBracket(char),

    #[error("unclosed opening bracket '{0}'")]
    UnclosedBracket(char),

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("insufficient operands for operation")]
    InsufficientOperands,

    #[error("invalid expression: multiple results")]
    MultipleResults,

    #[error("result is not a finite number")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Neg,
}

impl Operator {
    fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            '+' => Self::Add,
            '-' => Self::Sub,
            '*' => Self::Mul,
            '/' => Self::Div,
            '%' => Self::Rem,
            '^' => Self::Pow,
            _ => return None,
        })
    }

    fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div | Self::Rem => 2,
            Self::Neg => 3,
            Self::Pow => 4,
        }
    }

    fn is_right_associative(self) -> bool {
        self == Self::Pow
    }

    fn apply(self, stack: &mut Vec<f64>) -> Result<(), CalculatorError> {
        let result = match self {
            Self::Neg => -stack.pop().ok_or(CalculatorError::InsufficientOperands)?,
            Self::Add => binary(stack, |a, b| Ok(a + b))?,
            Self::Sub => binary(stack, |a, b| Ok(a - b))?,
            Self::Mul => binary(stack, |a, b| Ok(a * b))?,
            Self::Div => binary(stack, |a, b| {
                if b == 0.0 {
                    Err(CalculatorError::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            })?,
            Self::Rem => binary(stack, |a, b| {
                if b == 0.0 {
                    Err(CalculatorError::ModuloByZero)
                } else {
                    Ok(a % b)
                }
            })?,
            Self::Pow => binary(stack, |a, b| Ok(a.powf(b)))?,
        };
        stack.push(result);
        Ok(())
    }
}

fn binary(
    stack: &mut Vec<f64>,
    op: impl FnOnce(f64, f64) -> Result<f64, CalculatorError>,
) -> Result<f64, CalculatorError> {
    let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
        return Err(CalculatorError::InsufficientOperands);
    };
    op(a, b)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(Operator),
    Open(char),
    Close(char),
}

fn matching_open(close: char) -> char {
    match close {
        ')' => '(',
        ']' => '[',
        _ => '{',
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, CalculatorError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_digit() || ch == '.' {
            let mut literal = String::new();
            while let Some(&digit) = chars.peek() {
                if !(digit.is_ascii_digit() || digit == '.') {
                    break;
                }
                literal.push(digit);
                chars.next();
            }
            let number = literal
                .parse::<f64>()
                .map_err(|_| CalculatorError::InvalidNumber(literal.clone()))?;
            tokens.push(Token::Number(number));
            continue;
        }

        chars.next();
        if ch.is_whitespace() {
            continue;
        }

        let token = match ch {
            '(' | '[' | '{' => Token::Open(ch),
            ')' | ']' | '}' => Token::Close(ch),
            _ => {
                let operator =
                    Operator::from_char(ch).ok_or(CalculatorError::InvalidCharacter(ch))?;
                // A minus with no left operand negates what follows.
                let unary = matches!(
                    tokens.last(),
                    None | Some(Token::Op(_) | Token::Open(_))
                );
                match operator {
                    Operator::Sub if unary => Token::Op(Operator::Neg),
                    Operator::Add if unary => continue,
                    _ => Token::Op(operator),
                }
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Shunting-yard conversion evaluated on the fly.
fn evaluate_tokens(tokens: &[Token]) -> Result<f64, CalculatorError> {
    let mut output: Vec<f64> = Vec::new();
    let mut operators: Vec<Token> = Vec::new();

    for token in tokens {
        match *token {
            Token::Number(value) => output.push(value),
            // Prefix operators have no left operand to reduce.
            Token::Op(Operator::Neg) => operators.push(Token::Op(Operator::Neg)),
            Token::Op(operator) => {
                while let Some(Token::Op(top)) = operators.last().copied() {
                    let yields = top.precedence() > operator.precedence()
                        || (top.precedence() == operator.precedence()
                            && !operator.is_right_associative());
                    if !yields {
                        break;
                    }
                    operators.pop();
                    top.apply(&mut output)?;
                }
                operators.push(Token::Op(operator));
            }
            Token::Open(bracket) => operators.push(Token::Open(bracket)),
            Token::Close(bracket) => loop {
                match operators.pop() {
                    Some(Token::Op(operator)) => operator.apply(&mut output)?,
                    Some(Token::Open(open)) if open == matching_open(bracket) => break,
                    _ => return Err(CalculatorError::MismatchedBracket(bracket)),
                }
            },
        }
    }

    while let Some(token) = operators.pop() {
        match token {
            Token::Op(operator) => operator.apply(&mut output)?,
            Token::Open(bracket) => return Err(CalculatorError::UnclosedBracket(bracket)),
            Token::Number(_) | Token::Close(_) => {}
        }
    }

    match output.as_slice() {
        [result] if result.is_finite() => Ok(*result),
        [_] => Err(CalculatorError::NonFinite),
        [] => Err(CalculatorError::InsufficientOperands),
        _ => Err(CalculatorError::MultipleResults),
    }
}

/// Evaluates an arithmetic expression with `+ - * / % ^`, unary minus and
/// `() [] {}` brackets.
pub fn evaluate(expr: &str) -> Result<f64, CalculatorError> {
    if expr.trim().is_empty() {
        return Err(CalculatorError::EmptyExpression);
    }
    evaluate_tokens(&tokenize(expr)?)
}

/// Deterministic arithmetic tool.
pub struct CalculatorTool;

impl CalculatorTool {
    pub const fn new() -> Self {
        Self
    }

    fn run(args: &ToolArgs) -> Result<Value, CalculatorError> {
        let expr = match args.get("expr") {
            None | Some(Value::Null) => return Err(CalculatorError::MissingExpression),
            Some(Value::String(expr)) => expr.as_str(),
            // A whole-value placeholder may hand over a bare number.
            Some(Value::Number(number)) => return Ok(Value::Number(number.clone())),
            Some(_) => return Err(CalculatorError::NotAString),
        };
        let result = evaluate(expr)?;
        number_value(result).ok_or(CalculatorError::NonFinite)
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression with + - * / % ^ and brackets"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expr": {
                    "type": "string",
                    "description": "Arithmetic expression, e.g. \"(12.5 + 3) * 2\""
                }
            },
            "required": ["expr"]
        })
    }

    fn execute<'a>(&'a self, args: ToolArgs) -> ToolFuture<'a> {
        Box::pin(async move { Ok(Self::run(&args)?) })
    }
}
