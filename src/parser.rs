use std::cell::{Cell, RefCell};

use crate::{
    ast::{Command, Expression, InfixOperator, Statement},
    span::Span,
    tokenizer::{Token, TokenType},
};

/// Deepest parenthesis nesting accepted before parsing gives up.
pub const MAX_NESTING: usize = 128;

#[derive(Debug)]
pub struct ParseErrorWithContext {
    pub error: ParseError,
    context: String,
    pub token: Option<Token>,
    pub previous: Option<Token>,
}

impl ParseErrorWithContext {
    /// One-based column of the offending token.
    pub fn column(&self) -> Option<usize> {
        self.token.as_ref().map(|token| token.span.start + 1)
    }
}

impl std::error::Error for ParseErrorWithContext {}

impl std::fmt::Display for ParseErrorWithContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "While parsing {}", self.context)?;
        write!(f, "{}", self.error)?;
        if let Some(token) = &self.token {
            write!(f, " at {} but found \"{}\"", token.span, token.lexeme())?;
        }
        if let Some(previous) = &self.previous {
            write!(f, " after \"{}\"", previous.lexeme())?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Expected \"{0}\"")]
    Expected(TokenType),
    #[error("Unexpected \"{0}\"")]
    Unexpected(TokenType),
    #[error("Expected identifier")]
    ExpectedIdentifier,
    #[error("Expected numeric constant")]
    ExpectedConstant,
    #[error("Cannot assign to reserved name \"{0}\"")]
    ReservedName(String),
    #[error("Parentheses nested deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    ExtraComponents { ignored: usize, span: Span },
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::ExtraComponents { ignored, span } => write!(
                f,
                "Vectors have three components, ignoring {} extra at {}",
                ignored, span
            ),
        }
    }
}

#[derive(Debug)]
pub struct ParsedStatement {
    pub statement: Statement,
    pub warnings: Vec<ParseWarning>,
}

struct ParseContext<'a> {
    stack: RefCell<Vec<&'static str>>,
    warnings: RefCell<Vec<ParseWarning>>,
    depth: Cell<usize>,
    tokens: &'a [Token],
}

impl<'a> ParseContext<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
            warnings: RefCell::new(Vec::new()),
            depth: Cell::new(0),
            tokens,
        }
    }

    fn push(&self, name: &'static str) -> ParseContextGuard<'_, 'a> {
        self.stack.borrow_mut().push(name);
        ParseContextGuard::new(self)
    }

    fn pop(&self) {
        self.stack.borrow_mut().pop();
    }

    fn nest(&self, tokens: &[Token]) -> Result<NestingGuard<'_, 'a>, ParseErrorWithContext> {
        if self.depth.get() >= MAX_NESTING {
            return Err(self.error(ParseError::TooDeep(MAX_NESTING), tokens));
        }
        self.depth.set(self.depth.get() + 1);
        Ok(NestingGuard { context: self })
    }

    fn warn(&self, warning: ParseWarning) {
        self.warnings.borrow_mut().push(warning);
    }

    fn take_warnings(&self) -> Vec<ParseWarning> {
        self.warnings.take()
    }

    /// The token consumed just before `rest` begins.
    fn previous(&self, rest: &[Token]) -> Option<Token> {
        let index = self.tokens.len().checked_sub(rest.len())?;
        index
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .cloned()
    }

    fn error(&self, error: ParseError, rest: &[Token]) -> ParseErrorWithContext {
        ParseErrorWithContext {
            error,
            context: self.stack.borrow().join(" > "),
            token: rest.first().cloned(),
            previous: self.previous(rest),
        }
    }
}

struct ParseContextGuard<'c, 'a> {
    context: &'c ParseContext<'a>,
}

impl<'c, 'a> ParseContextGuard<'c, 'a> {
    fn new(context: &'c ParseContext<'a>) -> Self {
        Self { context }
    }
}

impl<'c, 'a> Drop for ParseContextGuard<'c, 'a> {
    fn drop(&mut self) {
        self.context.pop();
    }
}

struct NestingGuard<'c, 'a> {
    context: &'c ParseContext<'a>,
}

impl<'c, 'a> Drop for NestingGuard<'c, 'a> {
    fn drop(&mut self) {
        let depth = &self.context.depth;
        depth.set(depth.get().saturating_sub(1));
    }
}

type ParseResult<'a, T> = Result<(T, &'a [Token]), ParseErrorWithContext>;

/// Parses one statement. The whole token sequence up to `End` must be consumed.
pub fn statement(tokens: &[Token]) -> Result<ParsedStatement, ParseErrorWithContext> {
    let context = ParseContext::new(tokens);
    let _guard = context.push("statement");

    let (statement, rest) = match (
        tokens.first().map(Token::token_type),
        tokens.get(1).map(Token::token_type),
    ) {
        (Some(TokenType::Identifier(_)), Some(TokenType::Equal)) => assignment(&context, tokens)?,
        _ => {
            let (expr, rest) = expression(&context, tokens)?;
            (Statement::Expression(expr), rest)
        }
    };
    consume(&context, rest, TokenType::End)?;

    Ok(ParsedStatement {
        statement,
        warnings: context.take_warnings(),
    })
}

fn assignment<'a>(context: &ParseContext<'a>, tokens: &'a [Token]) -> ParseResult<'a, Statement> {
    let _guard = context.push("assignment");
    let (name, rest) = match_identifier(context, tokens)?;
    if Command::from_name(&name).is_some() {
        return Err(context.error(ParseError::ReservedName(name), tokens));
    }
    let rest = consume(context, rest, TokenType::Equal)?;
    let (expr, rest) = expression(context, rest)?;
    Ok((Statement::Assignment { name, expr }, rest))
}

fn binary<'a>(
    context: &ParseContext<'a>,
    precedence: impl Fn(&ParseContext<'a>, &'a [Token]) -> ParseResult<'a, Expression>,
    operator: impl Fn(&Token) -> Option<InfixOperator>,
    tokens: &'a [Token],
) -> ParseResult<'a, Expression> {
    let (mut expr, mut tokens) = precedence(context, tokens)?;

    while let Some(token) = tokens.first() {
        let op = match operator(token) {
            Some(op) => op,
            None => break,
        };
        tokens = &tokens[1..];
        let (right, rest) = precedence(context, tokens)?;
        expr = Expression::Binary(Box::new(expr), op, Box::new(right));
        tokens = rest;
    }

    Ok((expr, tokens))
}

fn expression<'a>(context: &ParseContext<'a>, tokens: &'a [Token]) -> ParseResult<'a, Expression> {
    let _guard = context.push("expression");
    binary(
        context,
        term,
        |token| match token.token_type() {
            TokenType::Plus => Some(InfixOperator::Plus),
            TokenType::Minus => Some(InfixOperator::Minus),
            _ => None,
        },
        tokens,
    )
}

fn term<'a>(context: &ParseContext<'a>, tokens: &'a [Token]) -> ParseResult<'a, Expression> {
    let _guard = context.push("term");
    binary(
        context,
        factor,
        |token| match token.token_type() {
            TokenType::Star => Some(InfixOperator::Multiply),
            TokenType::Slash => Some(InfixOperator::Divide),
            TokenType::Dot => Some(InfixOperator::Dot),
            TokenType::Cross => Some(InfixOperator::Cross),
            _ => None,
        },
        tokens,
    )
}

fn factor<'a>(context: &ParseContext<'a>, tokens: &'a [Token]) -> ParseResult<'a, Expression> {
    let _guard = context.push("factor");
    let Some(token) = tokens.first() else {
        return Err(context.error(ParseError::Unexpected(TokenType::End), tokens));
    };

    match token.token_type() {
        TokenType::Identifier(name) => {
            let expr = match Command::from_name(name) {
                Some(command) => Expression::Command(command),
                None => Expression::Identifier(name.clone()),
            };
            Ok((expr, &tokens[1..]))
        }
        TokenType::Constant(_) => value(context, tokens),
        TokenType::LeftParen => {
            let _nested = context.nest(tokens)?;
            let (expr, rest) = expression(context, &tokens[1..])?;
            let rest = consume(context, rest, TokenType::RightParen)?;
            Ok((expr, rest))
        }
        token_type => Err(context.error(ParseError::Unexpected(token_type.clone()), tokens)),
    }
}

fn value<'a>(context: &ParseContext<'a>, tokens: &'a [Token]) -> ParseResult<'a, Expression> {
    let _guard = context.push("value");
    let (i, mut tokens) = constant(context, tokens)?;

    let mut tail = Vec::with_capacity(2);
    while tail.len() < 2 && followed_by_constant(tokens) {
        let (component, rest) = constant(context, &tokens[1..])?;
        tail.push(component);
        tokens = rest;
    }

    if tail.len() == 2 && followed_by_constant(tokens) {
        let start = tokens[0].span;
        let mut end = start;
        let mut ignored = 0;
        while followed_by_constant(tokens) {
            end = tokens[1].span;
            ignored += 1;
            tokens = &tokens[2..];
        }
        context.warn(ParseWarning::ExtraComponents {
            ignored,
            span: start + end,
        });
    }

    let mut tail = tail.into_iter();
    let expr = match tail.next() {
        None => Expression::Constant(i),
        Some(j) => Expression::Vector([i, j, tail.next().unwrap_or_else(|| "0".to_string())]),
    };
    Ok((expr, tokens))
}

fn followed_by_constant(tokens: &[Token]) -> bool {
    matches!(
        (
            tokens.first().map(Token::token_type),
            tokens.get(1).map(Token::token_type),
        ),
        (Some(TokenType::Comma), Some(TokenType::Constant(_)))
    )
}

fn constant<'a>(context: &ParseContext<'a>, tokens: &'a [Token]) -> ParseResult<'a, String> {
    match tokens.first().map(Token::token_type) {
        Some(TokenType::Constant(text)) => Ok((text.clone(), &tokens[1..])),
        _ => Err(context.error(ParseError::ExpectedConstant, tokens)),
    }
}

fn consume<'a>(
    context: &ParseContext<'a>,
    tokens: &'a [Token],
    token_type: TokenType,
) -> Result<&'a [Token], ParseErrorWithContext> {
    match tokens.first().map(Token::token_type) {
        Some(t) if t == &token_type => Ok(&tokens[1..]),
        _ => Err(context.error(ParseError::Expected(token_type), tokens)),
    }
}

fn match_identifier<'a>(context: &ParseContext<'a>, tokens: &'a [Token]) -> ParseResult<'a, String> {
    match tokens.first().map(Token::token_type) {
        Some(TokenType::Identifier(name)) => Ok((name.clone(), &tokens[1..])),
        _ => Err(context.error(ParseError::ExpectedIdentifier, tokens)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::tokens;

    fn parse(source: &str) -> Result<ParsedStatement, ParseErrorWithContext> {
        statement(&tokens(source).tokens)
    }

    fn parse_ok(source: &str) -> Statement {
        parse(source)
            .expect("Parse should work on valid statement")
            .statement
    }

    fn boxed_constant(text: &str) -> Box<Expression> {
        Box::new(Expression::Constant(text.to_string()))
    }

    #[test]
    fn test_assignment() {
        assert_eq!(
            parse_ok("a = 1, 2, 3"),
            Statement::Assignment {
                name: "a".to_string(),
                expr: Expression::Vector(["1".to_string(), "2".to_string(), "3".to_string()]),
            }
        );
    }

    #[test]
    fn test_two_components_default_k() {
        assert_eq!(
            parse_ok("1, 2"),
            Statement::Expression(Expression::Vector([
                "1".to_string(),
                "2".to_string(),
                "0".to_string()
            ]))
        );
    }

    #[test]
    fn test_single_constant_is_scalar() {
        assert_eq!(
            parse_ok("5"),
            Statement::Expression(Expression::Constant("5".to_string()))
        );
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(parse_ok("1 + 2 * 3").to_string(), "(+ 1 (* 2 3))");
        assert_eq!(parse_ok("1 - 2 - 3").to_string(), "(- (- 1 2) 3)");
        assert_eq!(parse_ok("a X b . c").to_string(), "(. (X a b) c)");
        assert_eq!(parse_ok("(1 + 2) / 3").to_string(), "(/ (+ 1 2) 3)");
    }

    #[test]
    fn test_vector_inside_expression() {
        assert_eq!(
            parse_ok("a + (1, 2, 3 * c)").to_string(),
            "(+ a (* [1, 2, 3] c))"
        );
    }

    #[test]
    fn test_binary_shape() {
        assert_eq!(
            parse_ok("5*3"),
            Statement::Expression(Expression::Binary(
                boxed_constant("5"),
                InfixOperator::Multiply,
                boxed_constant("3")
            ))
        );
    }

    #[test]
    fn test_commands_resolved() {
        assert_eq!(
            parse_ok("list"),
            Statement::Expression(Expression::Command(Command::List))
        );
        assert_eq!(
            parse_ok("quitter"),
            Statement::Expression(Expression::Identifier("quitter".to_string()))
        );
    }

    #[test]
    fn test_assign_to_reserved_name() {
        let err = parse("help = 1").unwrap_err();
        assert_eq!(err.error, ParseError::ReservedName("help".to_string()));
    }

    #[test]
    fn test_extra_components_warn() {
        let parsed = parse("1, 2, 3, 4, 5").unwrap();
        assert_eq!(
            parsed.statement,
            Statement::Expression(Expression::Vector([
                "1".to_string(),
                "2".to_string(),
                "3".to_string()
            ]))
        );
        assert_eq!(
            parsed.warnings,
            vec![ParseWarning::ExtraComponents {
                ignored: 2,
                span: Span::new(7, 13)
            }]
        );
    }

    #[test]
    fn test_extra_components_then_operator() {
        let parsed = parse("1, 2, 3, 4 + a").unwrap();
        assert_eq!(parsed.statement.to_string(), "(+ [1, 2, 3] a)");
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_missing_operand() {
        let err = parse("a + ").unwrap_err();
        assert_eq!(err.error, ParseError::Unexpected(TokenType::End));
        assert_eq!(
            err.previous.as_ref().map(|token| token.token_type.clone()),
            Some(TokenType::Plus)
        );
        assert_eq!(err.column(), Some(5));
        assert!(err.to_string().contains("statement > expression > term > factor"));
    }

    #[test]
    fn test_unmatched_paren() {
        let err = parse("(1 + 2").unwrap_err();
        assert_eq!(err.error, ParseError::Expected(TokenType::RightParen));
    }

    #[test]
    fn test_leading_operator() {
        let err = parse("* 2").unwrap_err();
        assert_eq!(err.error, ParseError::Unexpected(TokenType::Star));
        assert!(err.previous.is_none());
    }

    #[test]
    fn test_trailing_tokens() {
        let err = parse("a b").unwrap_err();
        assert_eq!(err.error, ParseError::Expected(TokenType::End));
        assert_eq!(
            err.token.map(|token| token.token_type),
            Some(TokenType::Identifier("b".to_string()))
        );
    }

    #[test]
    fn test_end_marker_message() {
        let err = parse("(1 +").unwrap_err();
        assert_eq!(err.error, ParseError::Unexpected(TokenType::End));
        assert!(err
            .to_string()
            .ends_with("Unexpected \"end of input\" at column 5 but found \"end of input\" after \"+\""));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

        assert_eq!(parse_ok(&nested(MAX_NESTING)).to_string(), "1");

        let err = parse(&nested(MAX_NESTING + 1)).unwrap_err();
        assert_eq!(err.error, ParseError::TooDeep(MAX_NESTING));
        assert_eq!(err.column(), Some(MAX_NESTING + 1));
    }

    #[test]
    fn test_nesting_depth_is_released() {
        let siblings = vec!["(1)"; MAX_NESTING + 1].join(" + ");
        assert!(parse(&siblings).is_ok());
    }

    #[test]
    fn test_dangling_comma() {
        let err = parse("1, ").unwrap_err();
        assert_eq!(err.error, ParseError::Expected(TokenType::End));
    }
}
