use lazy_static::lazy_static;
use patterns::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::process::ExitCode;
use std::rc::Rc;

// =============================================================================
// Context
// =============================================================================

/// Variable bindings shared by every expression evaluated against it.
#[derive(Debug, Default)]
struct Context {
    variables: BTreeMap<String, i64>,
}

impl Context {
    fn set(&mut self, name: &str, value: i64, out: &Narrator) {
        self.variables.insert(name.to_string(), value);
        narrate!(out, "📝 Set variable {name} = {value}");
    }

    fn get(&self, name: &str) -> Result<i64> {
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| PatternError::not_found(format!("variable '{name}'")))
    }

    fn display(&self, out: &Narrator) {
        out.say("Variables:");
        for (name, value) in &self.variables {
            narrate!(out, "  {name} = {value}");
        }
    }

    fn clear(&mut self, out: &Narrator) {
        self.variables.clear();
        out.say("🗑️ Variables cleared");
    }

    fn len(&self) -> usize {
        self.variables.len()
    }
}

// =============================================================================
// Tokens
// =============================================================================

lazy_static! {
    static ref TOKEN: Regex =
        Regex::new(r"(\d+)|([A-Za-z_][A-Za-z0-9_]*)|(\S)").expect("token pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(i64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Assign,
}

#[derive(Debug, Clone)]
struct Spanned {
    at: usize,
    text: String,
    token: Token,
}

fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    TOKEN
        .captures_iter(input)
        .map(|caps| -> Result<Spanned> {
            let (group, m) = (1..=3)
                .find_map(|i| caps.get(i).map(|m| (i, m)))
                .ok_or_else(|| PatternError::fatal("token pattern matched no group"))?;
            let text = m.as_str();
            let token = match (group, text) {
                (1, digits) => Token::Number(digits.parse::<i64>().map_err(|_| {
                    let reason = format!("Number too large at position {}", m.start());
                    PatternError::invalid_argument(reason)
                })?),
                (2, word) => Token::Ident(word.to_string()),
                (_, "+") => Token::Plus,
                (_, "-") => Token::Minus,
                (_, "*") => Token::Star,
                (_, "/") => Token::Slash,
                (_, "(") => Token::LParen,
                (_, ")") => Token::RParen,
                (_, "=") => Token::Assign,
                (_, other) => {
                    return Err(PatternError::invalid_argument(format!(
                        "Unexpected character '{other}' at position {}",
                        m.start()
                    )))
                }
            };
            Ok(Spanned { at: m.start(), text: text.to_string(), token })
        })
        .collect()
}

// =============================================================================
// Arithmetic expressions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            BinOp::Add => "➕",
            BinOp::Sub => "➖",
            BinOp::Mul => "✖️",
            BinOp::Div => "➗",
        }
    }

    fn apply(self, left: i64, right: i64) -> Result<i64> {
        if self == BinOp::Div && right == 0 {
            return Err(PatternError::invalid_argument("Division by zero"));
        }
        let result = match self {
            BinOp::Add => left.checked_add(right),
            BinOp::Sub => left.checked_sub(right),
            BinOp::Mul => left.checked_mul(right),
            BinOp::Div => left.checked_div(right),
        };
        result.ok_or_else(|| {
            PatternError::invalid_argument(format!("Overflow in {left} {} {right}", self.symbol()))
        })
    }
}

/// Abstract syntax tree: numbers and variables are terminals, the rest
/// are non-terminals owning their operands.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Number(i64),
    Variable(String),
    Negate(Box<Expr>),
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
}

impl Expr {
    fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    /// Evaluates operands left to right and narrates every operation after
    /// its operands are known.
    fn interpret(&self, context: &Context, out: &Narrator) -> Result<i64> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Variable(name) => context.get(name),
            Expr::Negate(inner) => {
                let value = inner.interpret(context, out)?;
                value
                    .checked_neg()
                    .ok_or_else(|| PatternError::invalid_argument(format!("Overflow in -{value}")))
            }
            Expr::Binary { op, left, right } => {
                let l = left.interpret(context, out)?;
                let r = right.interpret(context, out)?;
                let result = op.apply(l, r)?;
                narrate!(out, "{} {l} {} {r} = {result}", op.icon(), op.symbol());
                Ok(result)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{value}"),
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Negate(inner) => write!(f, "(-{inner})"),
            Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
        }
    }
}

// =============================================================================
// Boolean expressions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum BoolExpr {
    Literal(bool),
    /// A variable counts as true when it is non-zero.
    Truthy(String),
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
    Not(Box<BoolExpr>),
}

impl BoolExpr {
    fn evaluate(&self, context: &Context, out: &Narrator) -> Result<bool> {
        match self {
            BoolExpr::Literal(value) => Ok(*value),
            BoolExpr::Truthy(name) => Ok(context.get(name)? != 0),
            BoolExpr::And(left, right) => {
                let (l, r) = (left.evaluate(context, out)?, right.evaluate(context, out)?);
                narrate!(out, "🔗 {l} AND {r} = {}", l && r);
                Ok(l && r)
            }
            BoolExpr::Or(left, right) => {
                let (l, r) = (left.evaluate(context, out)?, right.evaluate(context, out)?);
                narrate!(out, "🔀 {l} OR {r} = {}", l || r);
                Ok(l || r)
            }
            BoolExpr::Not(inner) => {
                let value = inner.evaluate(context, out)?;
                narrate!(out, "🚫 NOT {value} = {}", !value);
                Ok(!value)
            }
        }
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolExpr::Literal(value) => write!(f, "{value}"),
            BoolExpr::Truthy(name) => write!(f, "{name}"),
            BoolExpr::And(l, r) => write!(f, "({l} AND {r})"),
            BoolExpr::Or(l, r) => write!(f, "({l} OR {r})"),
            BoolExpr::Not(inner) => write!(f, "NOT {inner}"),
        }
    }
}

// =============================================================================
// Parser
// =============================================================================

/// Recursive descent over a token list. Grammar, lowest precedence first:
///
/// ```text
/// expression := term (("+" | "-") term)*
/// term       := factor (("*" | "/") factor)*
/// factor     := NUMBER | IDENT | "-" factor | "(" expression ")"
///
/// boolean    := conj ("OR" conj)*
/// conj       := unary ("AND" unary)*
/// unary      := "NOT" unary | "true" | "false" | IDENT | "(" boolean ")"
/// ```
struct Parser {
    tokens: Vec<Spanned>,
    index: usize,
    end: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self> {
        Ok(Self { tokens: tokenize(input)?, index: 0, end: input.len() })
    }

    fn arithmetic(input: &str) -> Result<Expr> {
        let mut parser = Self::new(input)?;
        let expr = parser.expression()?;
        parser.finish()?;
        Ok(expr)
    }

    fn boolean(input: &str) -> Result<BoolExpr> {
        let mut parser = Self::new(input)?;
        let expr = parser.disjunction()?;
        parser.finish()?;
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|s| &s.token)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(word)) if word == keyword)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.index).map_or(self.end, |s| s.at)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).map(|s| s.token.clone());
        self.index += 1;
        token
    }

    fn expect_close(&mut self) -> Result<()> {
        let at = self.position();
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            _ => Err(PatternError::invalid_argument(format!("Expected ')' at position {at}"))),
        }
    }

    fn finish(&self) -> Result<()> {
        match self.tokens.get(self.index) {
            None => Ok(()),
            Some(extra) => Err(PatternError::invalid_argument(format!(
                "Unexpected '{}' at position {}",
                extra.text, extra.at
            ))),
        }
    }

    fn expression(&mut self) -> Result<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.index += 1;
            let right = self.term()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(left),
            };
            self.index += 1;
            let right = self.factor()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn factor(&mut self) -> Result<Expr> {
        let at = self.position();
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Ident(name)) => Ok(Expr::Variable(name)),
            Some(Token::Minus) => Ok(Expr::Negate(Box::new(self.factor()?))),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect_close()?;
                Ok(inner)
            }
            _ => Err(PatternError::invalid_argument(format!(
                "Expected number, variable or '(' at position {at}"
            ))),
        }
    }

    fn disjunction(&mut self) -> Result<BoolExpr> {
        let mut left = self.conjunction()?;
        while self.peek_keyword("OR") {
            self.index += 1;
            left = BoolExpr::Or(Box::new(left), Box::new(self.conjunction()?));
        }
        Ok(left)
    }

    fn conjunction(&mut self) -> Result<BoolExpr> {
        let mut left = self.unary()?;
        while self.peek_keyword("AND") {
            self.index += 1;
            left = BoolExpr::And(Box::new(left), Box::new(self.unary()?));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<BoolExpr> {
        let at = self.position();
        match self.advance() {
            Some(Token::Ident(word)) => match word.as_str() {
                "NOT" => Ok(BoolExpr::Not(Box::new(self.unary()?))),
                "true" => Ok(BoolExpr::Literal(true)),
                "false" => Ok(BoolExpr::Literal(false)),
                "AND" | "OR" => Err(PatternError::invalid_argument(format!(
                    "Operator {word} needs a left operand at position {at}"
                ))),
                _ => Ok(BoolExpr::Truthy(word)),
            },
            Some(Token::LParen) => {
                let inner = self.disjunction()?;
                self.expect_close()?;
                Ok(inner)
            }
            _ => Err(PatternError::invalid_argument(format!(
                "Expected true, false, variable or '(' at position {at}"
            ))),
        }
    }

    fn statement(&mut self) -> Result<Statement> {
        if self.peek_keyword("print") {
            self.index += 1;
            return Ok(Statement::Print(self.expression()?));
        }
        let is_assignment = matches!(
            (self.tokens.first().map(|s| &s.token), self.tokens.get(1).map(|s| &s.token)),
            (Some(Token::Ident(_)), Some(Token::Assign))
        );
        match self.advance() {
            Some(Token::Ident(name)) if is_assignment => {
                self.index += 1;
                Ok(Statement::Assign { name, value: self.expression()? })
            }
            _ => Err(PatternError::invalid_argument(
                "Expected 'name = expression' or 'print expression'",
            )),
        }
    }
}

// =============================================================================
// A tiny program: assignments and prints
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Statement {
    Assign { name: String, value: Expr },
    Print(Expr),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Assign { name, value } => write!(f, "{name} = {value}"),
            Statement::Print(expr) => write!(f, "print {expr}"),
        }
    }
}

#[derive(Debug, Default)]
struct Program {
    statements: Vec<Statement>,
}

impl Program {
    /// One statement per line; blank lines and `#` comments are skipped.
    fn parse(source: &str) -> Result<Self> {
        let statements = source
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .map(|(number, line)| {
                let parsed = Parser::new(line).and_then(|mut parser| {
                    let statement = parser.statement()?;
                    parser.finish()?;
                    Ok(statement)
                });
                parsed.map_err(|err| match err {
                    PatternError::InvalidArgument(message) => {
                        PatternError::invalid_argument(format!("line {number}: {message}"))
                    }
                    other => other,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { statements })
    }

    fn display(&self, out: &Narrator) {
        out.say("📋 Program:");
        for (i, statement) in self.statements.iter().enumerate() {
            narrate!(out, "  {}: {statement}", i + 1);
        }
    }

    /// Runs until the first failing statement; assignments made before it
    /// stay in the context. Returns the printed values.
    fn execute(&self, context: &mut Context, out: &Narrator) -> Result<Vec<i64>> {
        out.say("🚀 Executing program...");
        let mut printed = Vec::new();
        for statement in &self.statements {
            narrate!(out, "  Executing: {statement}");
            match statement {
                Statement::Assign { name, value } => {
                    let result = value.interpret(context, out)?;
                    context.set(name, result, out);
                    narrate!(out, "✅ Assigned {name} = {result}");
                }
                Statement::Print(expr) => {
                    let result = expr.interpret(context, out)?;
                    narrate!(out, "📄 Print: {expr} = {result}");
                    printed.push(result);
                }
            }
        }
        out.say("✅ Program execution completed");
        Ok(printed)
    }
}

// =============================================================================
// Closure-built expressions
// =============================================================================

/// The same grammar expressed as composed closures instead of a tree.
#[derive(Clone)]
struct Formula {
    description: String,
    eval: Rc<dyn Fn(&Context) -> Result<i64>>,
}

impl Formula {
    fn number(value: i64) -> Self {
        Self { description: value.to_string(), eval: Rc::new(move |_| Ok(value)) }
    }

    fn variable(name: &str) -> Self {
        let owned = name.to_string();
        Self {
            description: name.to_string(),
            eval: Rc::new(move |context| context.get(&owned)),
        }
    }

    fn combine(op: BinOp, left: &Formula, right: &Formula) -> Self {
        let (l, r) = (left.clone(), right.clone());
        Self {
            description: format!("({} {} {})", left.description, op.symbol(), right.description),
            eval: Rc::new(move |context| op.apply(l.evaluate(context)?, r.evaluate(context)?)),
        }
    }

    fn add(left: &Formula, right: &Formula) -> Self {
        Self::combine(BinOp::Add, left, right)
    }

    fn multiply(left: &Formula, right: &Formula) -> Self {
        Self::combine(BinOp::Mul, left, right)
    }

    fn evaluate(&self, context: &Context) -> Result<i64> {
        (self.eval)(context)
    }
}

// =============================================================================
// Demo (cargo run --bin interpreter)
// =============================================================================

const ARITHMETIC: [&str; 9] = [
    "x + y",
    "x * y - z",
    "(x + y) * z",
    "x / y + z * 2",
    "100 - x * 5",
    "-(x - 25) / z",
    "x / (y - 5)",
    "x + w",
    "3 + * 4",
];

const PROGRAM: &str = "
# compute a few values
a = 5
b = a * 3
c = a + b
print c
print (c - a) / 2
";

fn arithmetic_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Mathematical Expression Interpreter");
    let mut context = Context::default();
    context.set("x", 10, out);
    context.set("y", 5, out);
    context.set("z", 3, out);

    for source in ARITHMETIC {
        out.blank();
        narrate!(out, "Evaluating: {source}");
        let outcome = Parser::arithmetic(source)
            .and_then(|expr| {
                narrate!(out, "Parsed as: {expr}");
                expr.interpret(&context, out)
            })
            .or_narrate(out)?;
        if let Some(result) = outcome {
            narrate!(out, "🎯 Final result: {result}");
        }
    }
    Ok(())
}

fn boolean_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Boolean Expression Interpreter");
    let mut context = Context::default();
    context.set("logged_in", 1, out);
    context.set("is_admin", 0, out);

    for source in [
        "true AND (false OR true)",
        "NOT (true AND false)",
        "logged_in AND NOT is_admin",
        "true OR",
    ] {
        out.blank();
        narrate!(out, "Expression: {source}");
        let outcome = Parser::boolean(source)
            .and_then(|expr| {
                narrate!(out, "Parsed as: {expr}");
                out.say("Evaluation:");
                expr.evaluate(&context, out)
            })
            .or_narrate(out)?;
        if let Some(result) = outcome {
            narrate!(out, "🎯 Result: {result}");
        }
    }
    Ok(())
}

fn program_demo(out: &Narrator) -> Result<()> {
    out.section(3, "Simple Command Language");
    let Some(program) = Program::parse(PROGRAM).or_narrate(out)? else {
        return Ok(());
    };
    program.display(out);

    let mut context = Context::default();
    out.blank();
    out.say("Execution:");
    if let Some(printed) = program.execute(&mut context, out).or_narrate(out)? {
        narrate!(out, "Printed {} values", printed.len());
    }
    out.blank();
    out.say("Final context:");
    context.display(out);
    context.clear(out);

    out.blank();
    out.say("Parsing a broken program:");
    Program::parse("a = 1\nb = = 2").or_narrate(out)?;
    Ok(())
}

fn formula_demo(out: &Narrator) -> Result<()> {
    out.section(4, "Closure-Built Expressions");
    let mut context = Context::default();
    context.set("num1", 7, out);
    context.set("num2", 3, out);

    let ten = Formula::number(10);
    let sum = Formula::add(&Formula::variable("num1"), &Formula::variable("num2"));
    let complex = Formula::multiply(&ten, &sum);
    let formulas = [
        ("Expression 1", &ten),
        ("Expression 2", &sum),
        ("Complex Expression", &complex),
    ];
    for (label, formula) in formulas {
        if let Some(value) = formula.evaluate(&context).or_narrate(out)? {
            narrate!(out, "{label}: {} = {value}", formula.description);
        }
    }

    out.section(5, "Practical Formula Interpreter");
    let mut pricing = Context::default();
    pricing.set("price", 100, out);
    pricing.set("tax_rate", 8, out);
    pricing.set("discount", 15, out);
    let formula = "price + price * tax_rate / 100 - discount";
    narrate!(out, "Formula: {formula}");
    pricing.display(out);
    out.blank();
    out.say("Calculation:");
    let total = Parser::arithmetic(formula).and_then(|expr| expr.interpret(&pricing, out));
    if let Some(total) = total.or_narrate(out)? {
        narrate!(out, "🎯 Total: {total}");
    }
    narrate!(out, "Bindings used: {}", pricing.len());
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Interpreter", |out, _config| {
        arithmetic_demo(out)?;
        boolean_demo(out)?;
        program_demo(out)?;
        formula_demo(out)?;

        out.section(6, "Interpreter Pattern Benefits");
        out.checklist(&[
            "Easy to implement simple grammars",
            "Grammar rules are explicit in code structure",
            "Easy to add new ways to interpret expressions",
            "Supports tree-walking algorithms",
            "Can be combined with Visitor pattern",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin interpreter)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn context(bindings: &[(&str, i64)]) -> Context {
        let out = Narrator::capture();
        let mut context = Context::default();
        for (name, value) in bindings {
            context.set(name, *value, &out);
        }
        context
    }

    fn eval(source: &str, bindings: &[(&str, i64)]) -> Result<i64> {
        Parser::arithmetic(source)?.interpret(&context(bindings), &Narrator::capture())
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(Parser::arithmetic("x * y - z").unwrap().to_string(), "((x * y) - z)");
        assert_eq!(Parser::arithmetic("8 - 3 - 2").unwrap().to_string(), "((8 - 3) - 2)");
        assert_eq!(eval("8 - 3 - 2", &[]).unwrap(), 3);
        assert_eq!(eval("2 + 3 * 4", &[]).unwrap(), 14);
        assert_eq!(eval("(2 + 3) * 4", &[]).unwrap(), 20);
        assert_eq!(eval("-(2 - 9) * 2", &[]).unwrap(), 14);
    }

    #[test]
    fn test_variables_and_underscores() {
        let bindings = [("price", 100), ("tax_rate", 8), ("discount", 15)];
        assert_eq!(eval("price + price * tax_rate / 100 - discount", &bindings).unwrap(), 93);
    }

    #[test]
    fn test_evaluation_errors() {
        assert_eq!(
            eval("1 / (2 - 2)", &[]).unwrap_err().to_string(),
            "Invalid argument: Division by zero"
        );
        assert_eq!(eval("x + 1", &[]).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(eval("9223372036854775807 + 1", &[]).is_err());
    }

    #[test]
    fn test_parse_errors_report_position() {
        let cases = [
            ("3 + * 4", "Expected number, variable or '(' at position 4"),
            ("(1 + 2", "Expected ')' at position 6"),
            ("1 2", "Unexpected '2' at position 2"),
            ("2 $ 3", "Unexpected character '$' at position 2"),
            ("", "Expected number, variable or '(' at position 0"),
        ];
        for (source, message) in cases {
            let err = Parser::arithmetic(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            assert!(err.to_string().ends_with(message), "{source}: {err}");
        }
    }

    #[test]
    fn test_narration_follows_evaluation_order() {
        let out = Narrator::capture();
        let expr = Parser::arithmetic("(1 + 2) * (5 - 1)").unwrap();
        assert_eq!(expr.interpret(&Context::default(), &out).unwrap(), 12);
        assert_eq!(out.lines(), vec!["➕ 1 + 2 = 3", "➖ 5 - 1 = 4", "✖️ 3 * 4 = 12"]);
    }

    #[test]
    fn test_boolean_expressions() {
        let out = Narrator::capture();
        let ctx = context(&[("on", 1), ("off", 0)]);
        let expr = Parser::boolean("true AND (false OR true)").unwrap();
        assert_eq!(expr.to_string(), "(true AND (false OR true))");
        assert!(expr.evaluate(&ctx, &out).unwrap());
        let negated = Parser::boolean("NOT (true AND false) AND off").unwrap();
        assert!(!negated.evaluate(&ctx, &out).unwrap());
        assert!(Parser::boolean("off OR on AND NOT off").unwrap().evaluate(&ctx, &out).unwrap());
        assert!(Parser::boolean("AND true").is_err());
        assert_eq!(
            Parser::boolean("missing").unwrap().evaluate(&ctx, &out).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_program_runs_statements_in_order() {
        let out = Narrator::capture();
        let program = Program::parse(PROGRAM).unwrap();
        assert_eq!(program.statements.len(), 5);
        let mut ctx = Context::default();
        assert_eq!(program.execute(&mut ctx, &out).unwrap(), vec![20, 7]);
        assert_eq!(ctx.get("b").unwrap(), 15);
        assert!(out.contains("📄 Print: c = 20"));
    }

    #[test]
    fn test_program_stops_at_failing_statement() {
        let out = Narrator::capture();
        let program = Program::parse("a = 4\nb = a / 0\nc = 1").unwrap();
        let mut ctx = Context::default();
        assert!(program.execute(&mut ctx, &out).is_err());
        assert_eq!(ctx.get("a").unwrap(), 4);
        assert_eq!(ctx.len(), 1);
        assert!(!out.contains("Program execution completed"));
    }

    #[test]
    fn test_program_parse_errors_name_the_line() {
        let err = Program::parse("a = 1\n\nb = = 2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: line 3: Expected number, variable or '(' at position 4"
        );
        assert!(Program::parse("5 + 5").is_err());
    }

    #[test]
    fn test_formulas_share_context() {
        let ctx = context(&[("num1", 7), ("num2", 3)]);
        let sum = Formula::add(&Formula::variable("num1"), &Formula::variable("num2"));
        let complex = Formula::multiply(&Formula::number(10), &sum);
        assert_eq!(complex.description, "(10 * (num1 + num2))");
        assert_eq!(complex.evaluate(&ctx).unwrap(), 100);
        assert!(Formula::variable("nope").evaluate(&ctx).is_err());
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        arithmetic_demo(&out).unwrap();
        boolean_demo(&out).unwrap();
        program_demo(&out).unwrap();
        formula_demo(&out).unwrap();
        assert!(out.contains("🎯 Final result: 47"));
        assert!(out.contains("🎯 Final result: 5"));
        assert!(out.contains("❌ Invalid argument: Division by zero"));
        assert!(out.contains("❌ Not found: variable 'w'"));
        assert_eq!(out.count("🎯 Result: true"), 3);
        assert!(out.contains("Printed 2 values"));
        assert!(out.contains("Complex Expression: (10 * (num1 + num2)) = 100"));
        assert!(out.contains("🎯 Total: 93"));
    }

    proptest! {
        #[test]
        fn test_display_reparses_to_same_tree(a in 0i64..1000, b in 0i64..1000, c in 1i64..1000) {
            let source = format!("{a} - {b} * (x + {c}) / {c}");
            let expr = Parser::arithmetic(&source).unwrap();
            prop_assert_eq!(Parser::arithmetic(&expr.to_string()).unwrap(), expr);
        }

        #[test]
        fn test_matches_native_arithmetic(a in 0i64..10_000, b in 0i64..10_000, c in 1i64..100) {
            let value = eval("a + b * c - a / c", &[("a", a), ("b", b), ("c", c)]).unwrap();
            prop_assert_eq!(value, a + b * c - a / c);
        }
    }
}
