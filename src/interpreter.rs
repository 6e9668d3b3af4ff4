pub mod environment;

use std::{
    cell::RefCell,
    fmt::{Debug, Display},
    io::Write,
    rc::Rc,
};

use log::{debug, error, info};

use crate::{
    ast::{Command, Expression, InfixOperator, Statement},
    parser, tokenizer,
    vector::Vector,
};

use self::environment::{Environment, EnvironmentError};

const HELP: &str = "\
tritone: a vector calculator
- store a vector: a = 1, 2, 3
- scalar operations: 1+2, 6-9, 5*3, 9/1
- vector operations: a + b, a - b, a * 2, a . b, a X b, a + (1, 2, 3 * c)
\t-supports addition, subtraction, scalar multiplication, scalar division, cross product, dot product.
 help: print this message
 clear: clear the screen
 free: free all variables
 list: list all variables
 quit: exit
";

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Scalar(f32),
    Vector(Vector),
    /// Nothing to print. Never a number.
    Empty,
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Vector(_) => "vector",
            Value::Empty => "empty",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Scalar(n) => write!(f, "{:.2}", n),
            Value::Vector(v) => write!(f, "{}", v),
            Value::Empty => Ok(()),
        }
    }
}

/// What the read loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    Continue(Value),
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Invalid addition operation: {} + {}", .0.kind(), .1.kind())]
    InvalidAdd(Value, Value),
    #[error("Invalid subtraction operation: {} - {}", .0.kind(), .1.kind())]
    InvalidSub(Value, Value),
    #[error("Invalid multiplication operation: {} * {}", .0.kind(), .1.kind())]
    InvalidMult(Value, Value),
    #[error("Invalid division operation: {} / {}", .0.kind(), .1.kind())]
    InvalidDiv(Value, Value),
    #[error("Invalid dot product: {} . {}", .0.kind(), .1.kind())]
    InvalidDot(Value, Value),
    #[error("Invalid cross product: {} X {}", .0.kind(), .1.kind())]
    InvalidCross(Value, Value),
    #[error("No vector found named {0}")]
    UndeclaredVariable(String),
    #[error("Nothing to assign to {0}")]
    EmptyAssignment(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}

#[derive(Clone)]
pub struct Interpreter {
    environment: Environment,
    stdout: Rc<RefCell<dyn Write>>,
    quit: bool,
}

impl Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("environment", &self.environment)
            .field("quit", &self.quit)
            .finish()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Rc::new(RefCell::new(std::io::stdout())))
    }
}

impl Interpreter {
    pub fn new(stdout: Rc<RefCell<dyn Write>>) -> Self {
        Self::with_environment(Environment::new(), stdout)
    }

    pub fn with_environment(
        environment: Environment,
        stdout: Rc<RefCell<dyn Write>>,
    ) -> Self {
        Self {
            environment,
            stdout,
            quit: false,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    /// Tokenizes, parses and evaluates one line.
    ///
    /// Problems are reported on the output and leave an `Empty` result; only
    /// `quit` ends the session.
    pub fn interpret(&mut self, source: &str) -> Flow {
        if source.trim().is_empty() {
            return Flow::Continue(Value::Empty);
        }

        let tokenized = tokenizer::tokens(source);
        for error in &tokenized.errors {
            self.diagnostic("Warning", error);
        }

        let parsed = match parser::statement(&tokenized.tokens) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.diagnostic("Error", e);
                return Flow::Continue(Value::Empty);
            }
        };
        for warning in &parsed.warnings {
            self.diagnostic("Warning", warning);
        }

        debug!("Parsed: {}", parsed.statement);
        #[cfg(feature = "trace")]
        self.trace(&parsed.statement);

        self.evaluate(&parsed.statement)
    }

    /// Evaluates a parsed statement, reporting failures and turning them into
    /// `Empty`. A `quit` anywhere in the statement yields `Flow::Quit`.
    pub fn evaluate(&mut self, statement: &Statement) -> Flow {
        let value = match self.try_evaluate(statement) {
            Ok(value) => value,
            Err(e) => {
                self.diagnostic("Error", e);
                Value::Empty
            }
        };

        if std::mem::take(&mut self.quit) {
            Flow::Quit
        } else {
            Flow::Continue(value)
        }
    }

    fn try_evaluate(&mut self, statement: &Statement) -> Result<Value, ExecutionError> {
        match statement {
            Statement::Expression(expr) => self.evaluate_expression(expr),
            Statement::Assignment { name, expr } => self.assign(name, expr),
        }
    }

    fn assign(&mut self, name: &str, expr: &Expression) -> Result<Value, ExecutionError> {
        let vector = match self.evaluate_expression(expr)? {
            Value::Vector(vector) => vector,
            Value::Scalar(scalar) => {
                self.diagnostic(
                    "Warning",
                    format_args!("Cannot assign scalar to variable, assigning {scalar:.2} as field i"),
                );
                Vector::new(scalar, 0.0, 0.0)
            }
            Value::Empty => return Err(ExecutionError::EmptyAssignment(name.to_string())),
        };

        self.environment.insert(name, vector)?;
        Ok(Value::Vector(vector))
    }

    fn evaluate_expression(&mut self, expr: &Expression) -> Result<Value, ExecutionError> {
        match expr {
            Expression::Constant(text) => Ok(Value::Scalar(number(text)?)),
            Expression::Vector([i, j, k]) => Ok(Value::Vector(Vector::new(
                number(i)?,
                number(j)?,
                number(k)?,
            ))),
            Expression::Identifier(name) => self
                .environment
                .get(name)
                .map(Value::Vector)
                .ok_or_else(|| ExecutionError::UndeclaredVariable(name.clone())),
            Expression::Command(command) => self.run_command(*command),
            Expression::Binary(left, op, right) => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                binary(*op, left, right)
            }
        }
    }

    fn run_command(&mut self, command: Command) -> Result<Value, ExecutionError> {
        info!("Running command {}", command);
        let mut out = self.stdout.borrow_mut();
        match command {
            Command::Quit => self.quit = true,
            Command::Free => {
                let freed = self.environment.clear();
                writeln!(out, "Freed {} vectors", freed)?;
            }
            Command::List => {
                writeln!(out, "Stored Vectors:")?;
                for entry in self.environment.iter() {
                    writeln!(out, "\t{}: {}", entry.name, entry.vector)?;
                }
            }
            Command::Help => write!(out, "{}", HELP)?,
            Command::Clear => {
                write!(out, "{}", CLEAR_SCREEN)?;
                out.flush()?;
            }
        }
        Ok(Value::Empty)
    }

    fn diagnostic(&self, level: &str, message: impl Display) {
        if let Err(e) = writeln!(self.stdout.borrow_mut(), "{}: {}", level, message) {
            error!("Failed to write diagnostic: {}", e);
        }
    }

    #[cfg(feature = "trace")]
    fn trace(&self, statement: &Statement) {
        if let Err(e) = write!(
            self.stdout.borrow_mut(),
            "Abstract Syntax Tree:\n{}",
            statement.tree()
        ) {
            error!("Failed to write syntax tree: {}", e);
        }
    }
}

fn number(text: &str) -> Result<f32, ExecutionError> {
    text.parse()
        .map_err(|_| ExecutionError::InvalidNumber(text.to_string()))
}

fn binary(op: InfixOperator, left: Value, right: Value) -> Result<Value, ExecutionError> {
    match op {
        InfixOperator::Plus => match (left, right) {
            (Value::Vector(a), Value::Vector(b)) => Ok(Value::Vector(a + b)),
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(a + b)),
            (left, right) => Err(ExecutionError::InvalidAdd(left, right)),
        },
        InfixOperator::Minus => match (left, right) {
            (Value::Vector(a), Value::Vector(b)) => Ok(Value::Vector(a - b)),
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(a - b)),
            (left, right) => Err(ExecutionError::InvalidSub(left, right)),
        },
        InfixOperator::Multiply => match (left, right) {
            (Value::Vector(a), Value::Vector(b)) => Ok(Value::Vector(a * b)),
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(a * b)),
            (Value::Vector(v), Value::Scalar(s)) | (Value::Scalar(s), Value::Vector(v)) => {
                Ok(Value::Vector(v * s))
            }
            (left, right) => Err(ExecutionError::InvalidMult(left, right)),
        },
        InfixOperator::Divide => match (left, right) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(a / b)),
            (left, right) => Err(ExecutionError::InvalidDiv(left, right)),
        },
        InfixOperator::Dot => match (left, right) {
            (Value::Vector(a), Value::Vector(b)) => Ok(Value::Scalar(a.dot(b))),
            (left, right) => Err(ExecutionError::InvalidDot(left, right)),
        },
        InfixOperator::Cross => match (left, right) {
            (Value::Vector(a), Value::Vector(b)) => Ok(Value::Vector(a.cross(b))),
            (left, right) => Err(ExecutionError::InvalidCross(left, right)),
        },
    }
}
