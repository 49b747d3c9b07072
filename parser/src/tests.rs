//! FILENAME: parser/src/tests.rs
//! PURPOSE: Consolidated unit tests for the parser crate.

use crate::ast::{AssignOp, BinaryOp, Expr, Statement, UnaryOp};
use crate::lexer::Lexer;
use crate::parser::parse;
use crate::token::Token;

// ========================================
// LEXER TESTS
// ========================================

#[test]
fn lexer_tokenizes_simple_math() {
    let input = "1 + 2";
    let mut lexer = Lexer::new(input);

    assert_eq!(lexer.next_token(), Token::Number(1.0));
    assert_eq!(lexer.next_token(), Token::Plus);
    assert_eq!(lexer.next_token(), Token::Number(2.0));
    assert_eq!(lexer.next_token(), Token::EOF);
}

#[test]
fn lexer_tokenizes_functions() {
    let input = "MIN(au, 10)";
    let mut lexer = Lexer::new(input);

    assert_eq!(lexer.next_token(), Token::Identifier("MIN".to_string()));
    assert_eq!(lexer.next_token(), Token::LParen);
    assert_eq!(lexer.next_token(), Token::Identifier("au".to_string()));
    assert_eq!(lexer.next_token(), Token::Comma);
    assert_eq!(lexer.next_token(), Token::Number(10.0));
    assert_eq!(lexer.next_token(), Token::RParen);
}

#[test]
fn lexer_preserves_identifier_case() {
    let mut lexer = Lexer::new("HoleId holeid");
    assert_eq!(lexer.next_token(), Token::Identifier("HoleId".to_string()));
    assert_eq!(lexer.next_token(), Token::Identifier("holeid".to_string()));
}

#[test]
fn lexer_tokenizes_comparison_operators() {
    let input = "< > <= >= != == <>";
    let mut lexer = Lexer::new(input);

    assert_eq!(lexer.next_token(), Token::LessThan);
    assert_eq!(lexer.next_token(), Token::GreaterThan);
    assert_eq!(lexer.next_token(), Token::LessEqual);
    assert_eq!(lexer.next_token(), Token::GreaterEqual);
    assert_eq!(lexer.next_token(), Token::NotEqual);
    assert_eq!(lexer.next_token(), Token::Equal);
    assert_eq!(lexer.next_token(), Token::NotEqual);
    assert_eq!(lexer.next_token(), Token::EOF);
}

#[test]
fn lexer_tokenizes_assignment_operators() {
    let input = "= += -= *= /= .=";
    let mut lexer = Lexer::new(input);

    assert_eq!(lexer.next_token(), Token::Assign);
    assert_eq!(lexer.next_token(), Token::PlusAssign);
    assert_eq!(lexer.next_token(), Token::MinusAssign);
    assert_eq!(lexer.next_token(), Token::StarAssign);
    assert_eq!(lexer.next_token(), Token::SlashAssign);
    assert_eq!(lexer.next_token(), Token::DotAssign);
    assert_eq!(lexer.next_token(), Token::EOF);
}

#[test]
fn lexer_distinguishes_assign_from_equality() {
    let mut lexer = Lexer::new("a = b == c");
    assert_eq!(lexer.next_token(), Token::Identifier("a".to_string()));
    assert_eq!(lexer.next_token(), Token::Assign);
    assert_eq!(lexer.next_token(), Token::Identifier("b".to_string()));
    assert_eq!(lexer.next_token(), Token::Equal);
    assert_eq!(lexer.next_token(), Token::Identifier("c".to_string()));
}

#[test]
fn lexer_tokenizes_strings() {
    let input = "\"Hello world\" & name";
    let mut lexer = Lexer::new(input);

    assert_eq!(lexer.next_token(), Token::String("Hello world".to_string()));
    assert_eq!(lexer.next_token(), Token::Ampersand);
    assert_eq!(lexer.next_token(), Token::Identifier("name".to_string()));
}

#[test]
fn lexer_tokenizes_leading_dot_decimal() {
    let mut lexer = Lexer::new(".5 .=");
    assert_eq!(lexer.next_token(), Token::Number(0.5));
    assert_eq!(lexer.next_token(), Token::DotAssign);
}

#[test]
fn lexer_tokenizes_power_and_concat() {
    let input = "2 ^ 3 & \"test\"";
    let mut lexer = Lexer::new(input);

    assert_eq!(lexer.next_token(), Token::Number(2.0));
    assert_eq!(lexer.next_token(), Token::Caret);
    assert_eq!(lexer.next_token(), Token::Number(3.0));
    assert_eq!(lexer.next_token(), Token::Ampersand);
    assert_eq!(lexer.next_token(), Token::String("test".to_string()));
    assert_eq!(lexer.next_token(), Token::EOF);
}

// ========================================
// PARSER TESTS - LITERALS AND OPERATORS
// ========================================

#[test]
fn parser_parses_number_literal() {
    let result = parse("42").unwrap();
    assert_eq!(
        result,
        vec![Statement {
            target: None,
            expr: Expr::Number(42.0)
        }]
    );
}

#[test]
fn parser_parses_string_literal() {
    let result = parse("\"Hello World\"").unwrap();
    assert_eq!(result[0].expr, Expr::Text("Hello World".to_string()));
}

#[test]
fn parser_respects_precedence() {
    // 1 + 2 * 3 must parse as 1 + (2 * 3)
    let result = parse("1 + 2 * 3").unwrap();
    assert_eq!(
        result[0].expr,
        Expr::Binary {
            left: Box::new(Expr::Number(1.0)),
            op: BinaryOp::Add,
            right: Box::new(Expr::Binary {
                left: Box::new(Expr::Number(2.0)),
                op: BinaryOp::Multiply,
                right: Box::new(Expr::Number(3.0)),
            }),
        }
    );
}

#[test]
fn parser_parses_parenthesized_expression() {
    let result = parse("(1 + 2) * 3").unwrap();
    assert_eq!(
        result[0].expr,
        Expr::Binary {
            left: Box::new(Expr::Binary {
                left: Box::new(Expr::Number(1.0)),
                op: BinaryOp::Add,
                right: Box::new(Expr::Number(2.0)),
            }),
            op: BinaryOp::Multiply,
            right: Box::new(Expr::Number(3.0)),
        }
    );
}

#[test]
fn parser_parses_unary_negation() {
    let result = parse("-au").unwrap();
    assert_eq!(
        result[0].expr,
        Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(Expr::Ident("au".to_string())),
        }
    );
}

#[test]
fn parser_parses_comparison() {
    let result = parse("depth > 100").unwrap();
    assert_eq!(
        result[0].expr,
        Expr::Binary {
            left: Box::new(Expr::Ident("depth".to_string())),
            op: BinaryOp::GreaterThan,
            right: Box::new(Expr::Number(100.0)),
        }
    );
}

#[test]
fn parser_parses_function_call() {
    let result = parse("MIN(au, cu)").unwrap();
    assert_eq!(
        result[0].expr,
        Expr::Call {
            name: "MIN".to_string(),
            args: vec![
                Expr::Ident("au".to_string()),
                Expr::Ident("cu".to_string())
            ],
        }
    );
}

#[test]
fn parser_parses_empty_argument_list() {
    let result = parse("rand()").unwrap();
    assert_eq!(
        result[0].expr,
        Expr::Call {
            name: "rand".to_string(),
            args: vec![],
        }
    );
}

// ========================================
// PARSER TESTS - STATEMENTS AND ASSIGNMENT
// ========================================

#[test]
fn parser_parses_simple_assignment() {
    let result = parse("total = au + cu").unwrap();
    assert_eq!(result.len(), 1);
    let target = result[0].target.as_ref().unwrap();
    assert_eq!(target.column, "total");
    assert_eq!(target.op, AssignOp::Set);
}

#[test]
fn parser_parses_compound_assignments() {
    for (src, op) in [
        ("x += 1", AssignOp::Add),
        ("x -= 1", AssignOp::Subtract),
        ("x *= 2", AssignOp::Multiply),
        ("x /= 2", AssignOp::Divide),
        ("x .= \"m\"", AssignOp::Append),
    ] {
        let result = parse(src).unwrap();
        assert_eq!(result[0].target.as_ref().unwrap().op, op, "input: {}", src);
    }
}

#[test]
fn parser_parses_multiple_statements() {
    let result = parse("total = au + cu; total > 5").unwrap();
    assert_eq!(result.len(), 2);
    assert!(result[0].target.is_some());
    assert!(result[1].target.is_none());
}

#[test]
fn parser_allows_trailing_semicolon() {
    let result = parse("au > 1;").unwrap();
    assert_eq!(result.len(), 1);
}

#[test]
fn parser_keeps_bare_identifier_as_expression() {
    // An identifier not followed by an assignment operator is an expression
    let result = parse("au").unwrap();
    assert_eq!(result[0].target, None);
    assert_eq!(result[0].expr, Expr::Ident("au".to_string()));
}

#[test]
fn parser_equality_is_not_assignment() {
    let result = parse("au == 5").unwrap();
    assert_eq!(result[0].target, None);
}

#[test]
fn parser_rejects_empty_formula() {
    assert!(parse("").is_err());
    assert!(parse("   ").is_err());
    assert!(parse(";").is_err());
}

#[test]
fn parser_rejects_trailing_garbage() {
    assert!(parse("1 + 2 )").is_err());
}

#[test]
fn parser_rejects_unclosed_paren() {
    assert!(parse("MIN(au, cu").is_err());
}

// ========================================
// DISPLAY ROUND-TRIP
// ========================================

#[test]
fn statement_display_includes_assignment() {
    let result = parse("total += au * 2").unwrap();
    assert_eq!(format!("{}", result[0]), "total += au * 2");
}
