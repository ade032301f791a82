//! C2 — hand-written recursive-descent parser.
//!
//! Precedence, lowest to highest: `OR` < `AND` < implicit juxtaposition
//! (`UnknownOperation`) < unary prefix (`NOT`, `+`, `-`) < `field:` <
//! postfix (`^`, `~`). The postfix/unary layers run as an explicit loop
//! rather than mutual recursion so stack depth tracks expression
//! *nesting* (parens within parens), not expression *length* (a long
//! flat `AND` chain costs one frame, not one per operand).

use crate::ast::{Node, Trivia};
use crate::error::{LuceneError, ParseSyntaxError};
use crate::token::{Lex, TokenKind};
use crate::trace::{TraceLevel, Tracer};

struct Parser<'t> {
    tokens: &'t [Lex],
    pos: usize,
    tracer: Tracer,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Lex], tracer: Tracer) -> Self {
        Self { tokens, pos: 0, tracer }
    }

    fn peek(&self) -> &Lex {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Lex {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn syntax_error(&self, message: impl Into<String>, expected: Vec<&'static str>) -> ParseSyntaxError {
        let tok = self.peek();
        let err = if tok.kind == TokenKind::Eof {
            ParseSyntaxError::eof(tok.pos, expected)
        } else {
            ParseSyntaxError::new(tok.pos, message, expected)
        };
        self.tracer.emit(TraceLevel::Default, "parser", &err);
        err
    }

    fn expect(&mut self, kind: TokenKind, label: &'static str) -> Result<Lex, ParseSyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.syntax_error(format!("expected {}", label), vec![label]))
        }
    }

    // expr ← or_expr
    fn expr(&mut self) -> Result<Node, ParseSyntaxError> {
        self.or_expr()
    }

    // or_expr ← and_expr ( OR and_expr )*
    fn or_expr(&mut self) -> Result<Node, ParseSyntaxError> {
        let mut children = vec![self.and_expr()?];
        while self.check(TokenKind::Or) {
            let or_tok = self.advance();
            children.last_mut().unwrap().trivia_mut().tail = or_tok.head;
            children.push(self.and_expr()?);
        }
        Ok(finish_nary(children, |children, trivia| Node::OrOperation { children, trivia }))
    }

    // and_expr ← impl_expr ( AND impl_expr )*
    fn and_expr(&mut self) -> Result<Node, ParseSyntaxError> {
        let mut children = vec![self.impl_expr()?];
        while self.check(TokenKind::And) {
            let and_tok = self.advance();
            children.last_mut().unwrap().trivia_mut().tail = and_tok.head;
            children.push(self.impl_expr()?);
        }
        Ok(finish_nary(children, |children, trivia| Node::AndOperation { children, trivia }))
    }

    // impl_expr ← unary ( unary )*   -- ≥2 ⇒ UnknownOperation
    fn impl_expr(&mut self) -> Result<Node, ParseSyntaxError> {
        let mut children = vec![self.unary()?];
        while self.starts_unary() {
            children.push(self.unary()?);
        }
        Ok(finish_nary(children, |children, trivia| {
            Node::UnknownOperation { children, trivia }
        }))
    }

    fn starts_unary(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Not
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Term
                | TokenKind::Phrase
                | TokenKind::Regex
                | TokenKind::Star
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
        )
    }

    // unary ← NOT unary | PLUS unary | MINUS unary | postfix
    fn unary(&mut self) -> Result<Node, ParseSyntaxError> {
        match self.peek().kind {
            TokenKind::Not => {
                let tok = self.advance();
                let mut expr = self.unary()?;
                let mut trivia = Trivia::spanned(tok.head, tok.pos, tok.lexeme.len());
                trivia.tail = expr.trivia_mut().take_tail();
                Ok(Node::Not { expr: Box::new(expr), trivia })
            }
            TokenKind::Plus => {
                let tok = self.advance();
                let mut expr = self.unary()?;
                let mut trivia = Trivia::spanned(tok.head, tok.pos, tok.lexeme.len());
                trivia.tail = expr.trivia_mut().take_tail();
                Ok(Node::Plus { expr: Box::new(expr), trivia })
            }
            TokenKind::Minus => {
                let tok = self.advance();
                let mut expr = self.unary()?;
                let mut trivia = Trivia::spanned(tok.head, tok.pos, tok.lexeme.len());
                trivia.tail = expr.trivia_mut().take_tail();
                Ok(Node::Prohibit { expr: Box::new(expr), trivia })
            }
            _ => self.postfix(),
        }
    }

    // postfix ← atom ( TILDE num? | CARET num )?
    fn postfix(&mut self) -> Result<Node, ParseSyntaxError> {
        let field = self.maybe_field()?;
        let mut value = self.value_atom(field.is_some())?;

        loop {
            match self.peek().kind {
                TokenKind::Tilde | TokenKind::Approx => {
                    let tok = self.advance();
                    let degree = parse_degree(&tok)?;
                    let is_phrase = matches!(value, Node::Phrase { .. });
                    let mut wrapper_trivia = Trivia::default();
                    wrapper_trivia.head = value.trivia_mut().take_head();
                    value = if is_phrase {
                        Node::Proximity {
                            phrase: Box::new(value),
                            degree,
                            trivia: wrapper_trivia,
                        }
                    } else {
                        Node::Fuzzy {
                            term: Box::new(value),
                            degree,
                            trivia: wrapper_trivia,
                        }
                    };
                }
                TokenKind::Caret | TokenKind::Boost => {
                    let tok = self.advance();
                    let degree = parse_degree(&tok)?;
                    let force = degree.ok_or_else(|| {
                        self.syntax_error("boost requires a numeric degree", vec!["BOOST"])
                    })?;
                    let mut wrapper_trivia = Trivia::default();
                    wrapper_trivia.head = value.trivia_mut().take_head();
                    value = Node::Boost {
                        expr: Box::new(value),
                        force,
                        trivia: wrapper_trivia,
                    };
                }
                _ => break,
            }
        }

        match field {
            Some((name, mut field_trivia)) => {
                field_trivia.tail = value.trivia_mut().take_tail();
                Ok(Node::SearchField {
                    field: name,
                    expr: Box::new(value),
                    trivia: field_trivia,
                })
            }
            None => Ok(value),
        }
    }

    /// Consume a `TERM COLON` prefix if present, returning the field name
    /// and the trivia the enclosing `SearchField` should own (the field
    /// name's own leading whitespace). Returns `None`, consuming nothing,
    /// when the next two tokens are not `TERM COLON`.
    fn maybe_field(&mut self) -> Result<Option<(String, Trivia)>, ParseSyntaxError> {
        if self.check(TokenKind::Term) && self.peek_ahead_is_colon() {
            let field_tok = self.advance();
            self.expect(TokenKind::Colon, ":")?;
            let lexeme_len = field_tok.lexeme.len();
            Ok(Some((
                field_tok.lexeme,
                Trivia::spanned(field_tok.head, field_tok.pos, lexeme_len),
            )))
        } else {
            Ok(None)
        }
    }

    fn peek_ahead_is_colon(&self) -> bool {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.kind == TokenKind::Colon)
            .unwrap_or(false)
    }

    // atom_body ← LPAREN expr RPAREN | LBRACKET range RBRACKET
    //           | LBRACE range RBRACE | PHRASE | REGEX | TERM | STAR
    fn value_atom(&mut self, in_field: bool) -> Result<Node, ParseSyntaxError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::LParen => {
                self.advance();
                let mut inner = self.expr()?;
                let rparen = self.expect(TokenKind::RParen, ")")?;
                let trivia = Trivia::spanned(tok.head, tok.pos, 1);
                inner.trivia_mut().tail = rparen.head;
                Ok(if in_field {
                    Node::FieldGroup {
                        expr: Box::new(inner),
                        trivia,
                    }
                } else {
                    Node::Group {
                        expr: Box::new(inner),
                        trivia,
                    }
                })
            }
            TokenKind::LBracket => self.range(tok, true),
            TokenKind::LBrace => self.range(tok, false),
            TokenKind::Phrase => {
                self.advance();
                Ok(Node::Phrase {
                    value: tok.lexeme,
                    trivia: Trivia::spanned(tok.head, tok.pos, 0),
                    name: None,
                })
            }
            TokenKind::Regex => {
                self.advance();
                Ok(Node::Regex {
                    value: tok.lexeme,
                    trivia: Trivia::spanned(tok.head, tok.pos, 0),
                    name: None,
                })
            }
            TokenKind::Term | TokenKind::Star => {
                self.advance();
                Ok(Node::Word {
                    value: tok.lexeme,
                    trivia: Trivia::spanned(tok.head, tok.pos, 0),
                    name: None,
                })
            }
            // A reserved word reaching atom position (e.g. a query that
            // opens with `AND`) is a syntax error, not a term.
            TokenKind::And | TokenKind::Or => Err(self.syntax_error(
                "expected a term, phrase, regex or group",
                vec!["TERM", "PHRASE", "REGEX", "("],
            )),
            _ => Err(self.syntax_error(
                "expected a term, phrase, regex or group",
                vec!["TERM", "PHRASE", "REGEX", "(", "[", "{"],
            )),
        }
    }

    // range ← range_bound TO range_bound
    fn range(&mut self, open: Lex, include_low: bool) -> Result<Node, ParseSyntaxError> {
        self.advance();
        let mut low = self.range_bound()?;
        let to_tok = self.expect(TokenKind::To, "TO")?;
        low.trivia_mut().tail = to_tok.head;
        let high = self.range_bound()?;
        let (close_kind, close_label, include_high) = if self.check(TokenKind::RBracket) {
            (TokenKind::RBracket, "]", true)
        } else {
            (TokenKind::RBrace, "}", false)
        };
        let close = self.expect(close_kind, close_label)?;
        let mut high = high;
        let trivia = Trivia::spanned(open.head, open.pos, 1);
        high.trivia_mut().tail = close.head;
        Ok(Node::Range {
            low: Box::new(low),
            high: Box::new(high),
            include_low,
            include_high,
            trivia,
        })
    }

    fn range_bound(&mut self) -> Result<Node, ParseSyntaxError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Term | TokenKind::Star => {
                self.advance();
                Ok(Node::Word {
                    value: tok.lexeme,
                    trivia: Trivia::spanned(tok.head, tok.pos, 0),
                    name: None,
                })
            }
            // A phrase bound (`["a b" TO "c d"]`) looks plausible but isn't
            // part of the grammar: bounds are bare words or `*`.
            _ => Err(self.syntax_error("expected a range bound", vec!["TERM", "*"])),
        }
    }
}

fn parse_degree(tok: &Lex) -> Result<Option<f64>, ParseSyntaxError> {
    if matches!(tok.kind, TokenKind::Tilde | TokenKind::Caret) {
        return Ok(None);
    }
    tok.lexeme
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ParseSyntaxError::new(tok.pos, "expected a non-negative decimal degree", vec!["APPROX", "BOOST"]))
}

/// Collapse a list of parsed operands into a single node: the operand
/// itself when there is exactly one, or an n-ary operator built by
/// `make` with its head/tail adopted from the first/last operand.
fn finish_nary(mut children: Vec<Node>, make: impl FnOnce(Vec<Node>, Trivia) -> Node) -> Node {
    if children.len() == 1 {
        return children.pop().unwrap();
    }
    let head = std::mem::take(&mut children.first_mut().unwrap().trivia_mut().head);
    let tail = std::mem::take(&mut children.last_mut().unwrap().trivia_mut().tail);
    make(
        children,
        Trivia {
            head,
            tail,
            pos: None,
            size: None,
        },
    )
}

/// Parse a full query from an already-lexed token stream. The caller
/// typically obtains `tokens` from [`crate::lexer::tokenize`].
pub fn parse(tokens: &[Lex]) -> Result<Node, LuceneError> {
    parse_with_trace(tokens, Tracer::silent())
}

/// Like [`parse`], but reports each syntax error (and the overall outcome)
/// through `tracer`.
pub fn parse_with_trace(tokens: &[Lex], tracer: Tracer) -> Result<Node, LuceneError> {
    if tokens.is_empty() {
        let err = ParseSyntaxError::eof(0, vec!["TERM", "PHRASE", "REGEX", "("]);
        tracer.emit(TraceLevel::Default, "parser", &err);
        return Err(err.into());
    }
    let mut parser = Parser::new(tokens, tracer);
    let mut root = parser.expr().map_err(LuceneError::from)?;
    let eof = parser.expect(TokenKind::Eof, "end of input").map_err(LuceneError::from)?;
    root.trivia_mut().tail = eof.head;
    tracer.emit(TraceLevel::Success, "parser", "parse complete");
    Ok(root)
}

/// Parse directly from source text: tokenize, then parse.
pub fn parse_query(source: &str) -> Result<Node, LuceneError> {
    let tokens = crate::lexer::tokenize(source)?;
    parse(&tokens)
}

/// Like [`parse_query`], but threads `tracer` through both the lexer and
/// the parser.
pub fn parse_query_with_trace(source: &str, tracer: Tracer) -> Result<Node, LuceneError> {
    let tokens = crate::lexer::tokenize_with_trace(source, tracer)?;
    parse_with_trace(&tokens, tracer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_str(source: &str) -> Node {
        parse_query(source).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
    }

    #[test]
    fn bare_word() {
        assert_eq!(parse_str("foo"), Node::word("foo"));
    }

    #[test]
    fn search_field_wraps_value() {
        let tree = parse_str("title:foo");
        match tree {
            Node::SearchField { field, expr, .. } => {
                assert_eq!(field, "title");
                assert_eq!(*expr, Node::word("foo"));
            }
            other => panic!("expected SearchField, got {:?}", other),
        }
    }

    #[test]
    fn field_group_not_group() {
        let tree = parse_str("title:(a b)");
        match tree {
            Node::SearchField { expr, .. } => {
                assert!(matches!(*expr, Node::FieldGroup { .. }));
            }
            other => panic!("expected SearchField, got {:?}", other),
        }
    }

    #[test]
    fn bare_group_is_group_not_field_group() {
        let tree = parse_str("(a b)");
        assert!(matches!(tree, Node::Group { .. }));
    }

    #[test]
    fn flattened_and_chain() {
        let tree = parse_str("a AND b AND c");
        match tree {
            Node::AndOperation { children, .. } => assert_eq!(children.len(), 3),
            other => panic!("expected AndOperation, got {:?}", other),
        }
    }

    #[test]
    fn implicit_juxtaposition_is_unknown_operation() {
        let tree = parse_str("foo bar");
        assert!(matches!(tree, Node::UnknownOperation { .. }));
    }

    #[test]
    fn fuzzy_on_term_proximity_on_phrase() {
        assert!(matches!(parse_str("foo~2"), Node::Fuzzy { .. }));
        assert!(matches!(parse_str(r#""a b"~2"#), Node::Proximity { .. }));
    }

    #[test]
    fn boost_wraps_expr() {
        let tree = parse_str("foo^2.5");
        match tree {
            Node::Boost { force, .. } => assert_eq!(force, 2.5),
            other => panic!("expected Boost, got {:?}", other),
        }
    }

    #[test]
    fn range_with_mixed_bounds() {
        let tree = parse_str("field:[a TO b}");
        match tree {
            Node::SearchField { expr, .. } => match *expr {
                Node::Range { include_low, include_high, .. } => {
                    assert!(include_low);
                    assert!(!include_high);
                }
                other => panic!("expected Range, got {:?}", other),
            },
            other => panic!("expected SearchField, got {:?}", other),
        }
    }

    #[test]
    fn precedence_or_loosest() {
        // `a AND b OR c` ⇒ OrOperation[ AndOperation[a, b], c ]
        let tree = parse_str("a AND b OR c");
        match tree {
            Node::OrOperation { children, .. } => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[0], Node::AndOperation { .. }));
                assert_eq!(children[1], Node::word("c"));
            }
            other => panic!("expected OrOperation, got {:?}", other),
        }
    }

    #[test]
    fn not_binds_tighter_than_and() {
        let tree = parse_str("NOT a AND b");
        match tree {
            Node::AndOperation { children, .. } => {
                assert!(matches!(children[0], Node::Not { .. }));
            }
            other => panic!("expected AndOperation, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_group_is_syntax_error() {
        let tokens = tokenize("(foo").unwrap();
        let err = parse(&tokens).unwrap_err();
        assert!(matches!(err, LuceneError::Syntax(_)));
    }

    #[test]
    fn trailing_input_after_valid_expr_errors() {
        let tokens = tokenize("foo )").unwrap();
        assert!(parse(&tokens).is_err());
    }

    #[test]
    fn phrase_range_bound_is_syntax_error() {
        let tokens = tokenize(r#"field:["a b" TO "c d"]"#).unwrap();
        let err = parse(&tokens).unwrap_err();
        assert!(matches!(err, LuceneError::Syntax(_)));
    }

    #[test]
    fn tracing_does_not_change_the_parsed_tree() {
        let traced = parse_query_with_trace("title:(foo AND bar)", Tracer::new(TraceLevel::Verbose)).unwrap();
        assert_eq!(traced, parse_query("title:(foo AND bar)").unwrap());
    }
}
