//! PEST-based parser and tree visitor for benchmark scripts
//!
//! Walks the parse tree once, producing a shallow semantic node graph
//! suitable for structural queries. Syntactic forms the model does not cover
//! degrade to `GenericExpression` or an empty wrapper; the visitor itself
//! never raises errors.

use pest::Parser;
use pest_derive::Parser;

pub mod analysis;
pub mod ast;

#[cfg(test)]
mod tests;

use ast::{Location, LiteralKind, LiteralValue, MemberKind, MethodCall, Node};

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/script.pest"]
struct ScriptParser;

/* ===================== Error Types ===================== */

/// Raised when source text does not match the script grammar at all.
#[derive(Debug)]
pub struct ParseError {
    message: String,
    location: Option<Location>,
}

impl ParseError {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let location = match err.line_col {
            pest::error::LineColLocation::Pos((line, column))
            | pest::error::LineColLocation::Span((line, column), _) => Some(Location {
                line,
                column,
                start: 0,
                stop: 0,
            }),
        };
        ParseError {
            message: err.to_string(),
            location,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Location Helpers ===================== */

/// Convert a PEST pair's span to our Location type
fn pair_to_location(pair: &pest::iterators::Pair<Rule>) -> Location {
    let span = pair.as_span();
    let (line, column) = span.start_pos().line_col();
    Location {
        line,
        column,
        start: span.start(),
        stop: span.end(),
    }
}

/* ===================== Public API ===================== */

/// Parse a script source string into its semantic node graph.
///
/// The result is always a `Block` wrapper; an empty or fully-unmodeled
/// script yields a wrapper with no children.
pub fn parse_script(source: &str) -> ParseResult<Node> {
    let mut pairs = ScriptParser::parse(Rule::script, source)?;
    let script = pairs.next().unwrap();

    let mut children = Vec::new();
    for pair in script.into_inner() {
        if pair.as_rule() == Rule::statement {
            visit_statement(pair, source, &mut children);
        }
    }
    Ok(Node::Block { children })
}

/* ===================== Tree Visitor ===================== */

/// Visit one statement, pushing its modeled nodes into the parent's child
/// list. Payload-free composites (blocks) splice their children directly
/// into `out` instead of nesting a wrapper.
fn visit_statement(pair: pest::iterators::Pair<Rule>, source: &str, out: &mut Vec<Node>) {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::member_decl => out.push(visit_member_decl(inner)),
        Rule::method_decl => out.push(visit_method_decl(inner)),
        Rule::block => {
            for stmt in inner.into_inner() {
                visit_statement(stmt, source, out);
            }
        }
        Rule::declare_stmt => out.push(visit_declare_stmt(inner, source)),
        Rule::assign_stmt => out.push(visit_assign_stmt(inner, source)),
        Rule::expr_stmt => {
            let expr = inner.into_inner().next().unwrap();
            out.push(visit_expression(expr, source));
        }
        Rule::empty_stmt => out.push(Node::Statement),
        _ => {}
    }
}

/// Class/interface/enum declarations are abstracted to a bare member node;
/// their bodies are never descended into.
fn visit_member_decl(pair: pest::iterators::Pair<Rule>) -> Node {
    let mut inner = pair.into_inner();
    let kind_pair = inner.next().unwrap().into_inner().next().unwrap();
    let kind = match kind_pair.as_rule() {
        Rule::kw_class => MemberKind::Class,
        Rule::kw_interface => MemberKind::Interface,
        Rule::kw_enum => MemberKind::Enum,
        _ => unreachable!("Unexpected member kind rule: {:?}", kind_pair.as_rule()),
    };
    let name = inner.next().unwrap().as_str().to_string();
    Node::Member { kind, name }
}

fn visit_method_decl(pair: pest::iterators::Pair<Rule>) -> Node {
    let mut inner = pair.into_inner();
    let _return_type = inner.next().unwrap();
    let name = inner.next().unwrap().as_str().to_string();
    Node::Member {
        kind: MemberKind::Method,
        name,
    }
}

/// A declaration whose initializer is a method call lifts the call to the
/// top, attaching the field as the call's assignment target.
fn visit_declare_stmt(pair: pest::iterators::Pair<Rule>, source: &str) -> Node {
    let mut inner = pair.into_inner();
    let type_pair = inner.next().unwrap();
    let type_name = type_pair.as_str().to_string();
    let name_pair = inner.next().unwrap();

    let mut children = vec![Node::Id {
        location: pair_to_location(&name_pair),
        text: name_pair.as_str().to_string(),
    }];

    match inner.next().map(|expr| visit_expression(expr, source)) {
        Some(Node::MethodCall(mut call)) => {
            call.assignment = Some(Box::new(Node::Field {
                type_name,
                children,
            }));
            Node::MethodCall(call)
        }
        Some(init) => {
            children.push(init);
            Node::Field {
                type_name,
                children,
            }
        }
        None => Node::Field {
            type_name,
            children,
        },
    }
}

fn visit_assign_stmt(pair: pest::iterators::Pair<Rule>, source: &str) -> Node {
    let mut inner = pair.into_inner();
    let name_pair = inner.next().unwrap();
    let value_pair = inner.next().unwrap();

    let mut children = vec![Node::Id {
        location: pair_to_location(&name_pair),
        text: name_pair.as_str().to_string(),
    }];

    match visit_expression(value_pair, source) {
        Node::MethodCall(mut call) => {
            call.assignment = Some(Box::new(Node::Assignment { children }));
            Node::MethodCall(call)
        }
        value => {
            children.push(value);
            Node::Assignment { children }
        }
    }
}

fn visit_expression(pair: pest::iterators::Pair<Rule>, source: &str) -> Node {
    let location = pair_to_location(&pair);
    let text = pair.as_str().trim().to_string();

    match pair.as_rule() {
        Rule::expression | Rule::primary => {
            let inner = pair.into_inner().next().unwrap();
            visit_expression(inner, source)
        }
        Rule::binary_expr => {
            let mut inner = pair.into_inner();
            let first = inner.next().unwrap();
            if inner.next().is_none() {
                visit_expression(first, source)
            } else {
                Node::GenericExpression { location, text }
            }
        }
        Rule::unary_expr => {
            let mut inner = pair.into_inner();
            let first = inner.next().unwrap();
            match first.as_rule() {
                Rule::prefix_op => Node::GenericExpression { location, text },
                _ => visit_expression(first, source),
            }
        }
        Rule::postfix_expr => visit_postfix_expr(pair, source),
        Rule::paren_expr => {
            let inner = pair.into_inner().next().unwrap();
            visit_expression(inner, source)
        }
        Rule::identifier => Node::Id { location, text },
        Rule::literal => visit_literal(pair),
        _ => Node::GenericExpression { location, text },
    }
}

/// Model a postfix chain. A trailing call segment becomes a `MethodCall`
/// (preferring the method form for dotted access); a dotted chain with no
/// trailing call degrades to its raw text.
fn visit_postfix_expr(pair: pest::iterators::Pair<Rule>, source: &str) -> Node {
    let location = pair_to_location(&pair);
    let text = pair.as_str().trim().to_string();
    let chain_start = pair.as_span().start();

    let pairs: Vec<_> = pair.into_inner().collect();
    let (primary, postfixes) = pairs.split_first().unwrap();

    if postfixes.is_empty() {
        return visit_expression(primary.clone(), source);
    }

    let last = postfixes.last().unwrap().clone().into_inner().next().unwrap();
    if last.as_rule() != Rule::call_suffix {
        return Node::GenericExpression { location, text };
    }

    // Name the call after the member segment preceding the trailing call
    // suffix, or after the base identifier when the chain has no dots.
    let (name, target) = match postfixes.len() {
        1 => {
            let base = primary.clone().into_inner().next().unwrap();
            if base.as_rule() != Rule::identifier {
                return Node::GenericExpression { location, text };
            }
            (base.as_str().to_string(), None)
        }
        n => {
            let prev = postfixes[n - 2].clone().into_inner().next().unwrap();
            if prev.as_rule() != Rule::member_access {
                return Node::GenericExpression { location, text };
            }
            let name = prev.into_inner().next().unwrap().as_str().to_string();
            let receiver_end = postfixes[n - 2].as_span().start();
            let receiver = source[chain_start..receiver_end].trim().to_string();
            (name, Some(receiver))
        }
    };

    let arguments = last
        .into_inner()
        .next()
        .map(|arg_list| {
            arg_list
                .into_inner()
                .map(|arg| visit_call_argument(arg, source))
                .collect()
        })
        .unwrap_or_default();

    Node::MethodCall(MethodCall {
        location,
        name,
        arguments,
        target,
        assignment: None,
    })
}

/// Parameters that do not model to an atomic form are preserved verbatim as
/// opaque text rather than dropped.
fn visit_call_argument(pair: pest::iterators::Pair<Rule>, source: &str) -> Node {
    let location = pair_to_location(&pair);
    let text = pair.as_str().trim().to_string();
    let node = visit_expression(pair, source);
    if node.is_atomic_argument() {
        node
    } else {
        Node::GenericExpression { location, text }
    }
}

/* ===================== Literal Coercion ===================== */

fn visit_literal(pair: pest::iterators::Pair<Rule>) -> Node {
    let location = pair_to_location(&pair);
    let inner = pair.into_inner().next().unwrap();
    let raw = inner.as_str();

    let (kind, value) = match inner.as_rule() {
        Rule::string => (LiteralKind::String, LiteralValue::Str(strip_quotes(raw))),
        Rule::number => (LiteralKind::Number, coerce_number(raw)),
        Rule::boolean => (
            LiteralKind::Boolean,
            LiteralValue::Bool(raw.eq_ignore_ascii_case("true")),
        ),
        Rule::null_lit => (LiteralKind::Null, LiteralValue::Null),
        _ => (LiteralKind::Null, LiteralValue::Null),
    };

    Node::Literal {
        location,
        kind,
        value,
    }
}

fn strip_quotes(raw: &str) -> String {
    if raw.len() >= 2 {
        raw[1..raw.len() - 1].to_string()
    } else {
        raw.to_string()
    }
}

/// Numeric literals drop a trailing type-suffix character before conversion;
/// anything unconvertible coerces to null.
fn coerce_number(raw: &str) -> LiteralValue {
    let digits = raw
        .strip_suffix(['l', 'L', 'd', 'D'])
        .unwrap_or(raw);
    match digits.parse::<f64>() {
        Ok(v) => LiteralValue::Num(v),
        Err(_) => LiteralValue::Null,
    }
}
