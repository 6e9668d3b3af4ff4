use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assignment { name: String, expr: Expression },
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(String),
    Command(Command),
    /// Numeric literal text, converted during evaluation.
    Constant(String),
    /// Component literals `i, j, k`.
    Vector([String; 3]),
    Binary(Box<Expression>, InfixOperator, Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Dot,
    Cross,
}

/// Reserved identifiers, resolved while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Free,
    List,
    Help,
    Clear,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Command> {
        match name {
            "quit" => Some(Command::Quit),
            "free" => Some(Command::Free),
            "list" => Some(Command::List),
            "help" => Some(Command::Help),
            "clear" => Some(Command::Clear),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Quit => "quit",
            Command::Free => "free",
            Command::List => "list",
            Command::Help => "help",
            Command::Clear => "clear",
        }
    }
}

impl Statement {
    /// Indented one-node-per-line rendering, used when tracing.
    pub fn tree(&self) -> String {
        let mut out = String::new();
        match self {
            Statement::Assignment { name, expr } => {
                out.push_str("Assignment =\n");
                out.push_str(&format!("  Identifier {}\n", name));
                expr.write_tree(&mut out, 1);
            }
            Statement::Expression(expr) => expr.write_tree(&mut out, 0),
        }
        out
    }
}

impl Expression {
    fn write_tree(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            Expression::Identifier(name) => out.push_str(&format!("{indent}Identifier {name}\n")),
            Expression::Command(command) => out.push_str(&format!("{indent}Command {command}\n")),
            Expression::Constant(text) => out.push_str(&format!("{indent}Constant {text}\n")),
            Expression::Vector([i, j, k]) => {
                out.push_str(&format!("{indent}Vector\n"));
                for component in [i, j, k] {
                    out.push_str(&format!("{indent}  Constant {component}\n"));
                }
            }
            Expression::Binary(left, op, right) => {
                out.push_str(&format!("{indent}Operation {op}\n"));
                left.write_tree(out, depth + 1);
                right.write_tree(out, depth + 1);
            }
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Assignment { name, expr } => write!(f, "{} = {}", name, expr),
            Statement::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Command(command) => write!(f, "{}", command),
            Expression::Constant(text) => write!(f, "{}", text),
            Expression::Vector([i, j, k]) => write!(f, "[{}, {}, {}]", i, j, k),
            Expression::Binary(left, op, right) => write!(f, "({} {} {})", op, left, right),
        }
    }
}

impl Display for InfixOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfixOperator::Plus => write!(f, "+"),
            InfixOperator::Minus => write!(f, "-"),
            InfixOperator::Multiply => write!(f, "*"),
            InfixOperator::Divide => write!(f, "/"),
            InfixOperator::Dot => write!(f, "."),
            InfixOperator::Cross => write!(f, "X"),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
