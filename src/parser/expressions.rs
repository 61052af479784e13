// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Expression parsing methods for the Parser

use super::ast::*;
use super::lexer::read_quoted;
use super::parser::Parser;
use super::precedence::Precedence;
use super::token::{Token, TokenType};
use crate::core::{DataType, Value};

impl<'a> Parser<'a> {
    /// Parse an expression with the given precedence
    pub fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix_expression()?;

        while !self.peek_token_is(TokenType::Eof) && precedence < self.peek_precedence() {
            if !self.is_infix_token() {
                return Some(left);
            }

            self.next_token();
            left = self.parse_infix_expression(left)?;
        }

        Some(left)
    }

    /// Check if the peek token is an infix operator
    fn is_infix_token(&self) -> bool {
        match self.peek_token.token_type {
            TokenType::Operator => true,
            TokenType::Keyword => {
                matches!(
                    self.peek_token.literal.as_str(),
                    "AND" | "OR" | "LIKE" | "IS" | "NOT"
                )
            }
            TokenType::Punctuator => self.peek_token.literal == "(",
            _ => false,
        }
    }

    /// Parse a prefix expression (literals, identifiers, unary operators, etc.)
    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        match self.cur_token.token_type {
            TokenType::Identifier => Some(self.parse_identifier()),
            TokenType::Integer => self.parse_integer_literal(None),
            TokenType::Float => self.parse_float_literal(None),
            TokenType::String => self.parse_string_literal(),
            TokenType::Keyword => self.parse_keyword_expression(),
            TokenType::Operator => self.parse_unary_expression(),
            TokenType::Punctuator => self.parse_punctuator_expression(),
            _ => {
                self.add_error(format!(
                    "no prefix parse function for {} '{}'",
                    self.cur_token.token_type, self.cur_token.literal
                ));
                None
            }
        }
    }

    fn parse_identifier(&self) -> Expression {
        Expression::Identifier(Identifier::new(
            self.cur_token.clone(),
            self.cur_token.literal.clone(),
        ))
    }

    /// Parse an integer literal; `sign` is the folded unary sign token, if any
    fn parse_integer_literal(&mut self, sign: Option<Token>) -> Option<Expression> {
        let negative = sign.as_ref().is_some_and(|t| t.is_operator("-"));
        let parsed = self.cur_token.literal.parse::<u64>().ok().and_then(|v| {
            if negative {
                0i64.checked_sub_unsigned(v)
            } else {
                i64::try_from(v).ok()
            }
        });
        match parsed {
            Some(value) => {
                let (token, span) = self.literal_token_and_span(sign);
                Some(Expression::IntegerLiteral(IntegerLiteral { token, value, span }))
            }
            None => {
                self.add_error(format!(
                    "could not parse {} as integer: out of range",
                    self.cur_token.literal
                ));
                None
            }
        }
    }

    fn parse_float_literal(&mut self, sign: Option<Token>) -> Option<Expression> {
        let negative = sign.as_ref().is_some_and(|t| t.is_operator("-"));
        match self.cur_token.literal.parse::<f64>() {
            Ok(value) => {
                let value = if negative { -value } else { value };
                let (token, span) = self.literal_token_and_span(sign);
                Some(Expression::FloatLiteral(FloatLiteral { token, value, span }))
            }
            Err(e) => {
                self.add_error(format!(
                    "could not parse {} as float: {}",
                    self.cur_token.literal, e
                ));
                None
            }
        }
    }

    /// Token and span of a literal whose last token is the current one
    fn literal_token_and_span(&self, sign: Option<Token>) -> (Token, Span) {
        let token = sign.unwrap_or_else(|| self.cur_token.clone());
        let span = Span::new(token.start(), self.cur_token.end);
        (token, span)
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        match read_quoted(&token.literal, '\'', self.backslash_escapes) {
            Some((value, _)) => Some(Expression::StringLiteral(StringLiteral {
                span: Span::new(token.start(), token.end),
                token,
                value,
            })),
            None => {
                self.add_error(format!("invalid string literal {}", token.literal));
                None
            }
        }
    }

    fn parse_keyword_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let span = Span::new(token.start(), token.end);
        match token.literal.as_str() {
            "NULL" => Some(Expression::NullLiteral(NullLiteral { token, span })),
            "TRUE" | "FALSE" => Some(Expression::BooleanLiteral(BooleanLiteral {
                value: token.literal == "TRUE",
                token,
                span,
            })),
            "NOT" => {
                self.next_token();
                let right = self.parse_expression(Precedence::Not)?;
                Some(Expression::Prefix(PrefixExpression::new(
                    token,
                    "NOT".to_string(),
                    Box::new(right),
                )))
            }
            "CAST" => self.parse_cast_expression(),
            _ => {
                self.add_error(format!("unexpected keyword {}", token.literal));
                None
            }
        }
    }

    /// Parse a unary `-` or `+`
    ///
    /// A sign directly followed by a numeric token is folded into the
    /// literal, so `-5` is one literal spanning both tokens.
    fn parse_unary_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let operator = token.literal.clone();
        if operator != "-" && operator != "+" {
            self.add_error(format!("unexpected operator {}", operator));
            return None;
        }

        self.next_token();

        if self.cur_token_is(TokenType::Integer) {
            return self.parse_integer_literal(Some(token));
        }
        if self.cur_token_is(TokenType::Float) {
            return self.parse_float_literal(Some(token));
        }

        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expression::Prefix(PrefixExpression::new(
            token,
            operator,
            Box::new(right),
        )))
    }

    fn parse_punctuator_expression(&mut self) -> Option<Expression> {
        match self.cur_token.literal.as_str() {
            "(" => self.parse_grouped_expression(),
            "[" => self.parse_array_expression(),
            _ => {
                self.add_error(format!("unexpected punctuator '{}'", self.cur_token.literal));
                None
            }
        }
    }

    /// Parse comma separated expressions up to `close`, leaving the closing
    /// punctuator as the current token
    fn parse_list_until(&mut self, close: &str) -> Option<Vec<Expression>> {
        let mut elements = Vec::new();
        if self.peek_token_is_punctuator(close) {
            self.next_token();
            return Some(elements);
        }

        self.next_token();
        elements.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_token_is_punctuator(",") {
            self.next_token();
            self.next_token();
            elements.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_punctuator(close) {
            return None;
        }
        Some(elements)
    }

    /// Parse `[a, b, ...]`
    fn parse_array_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let elements = self.parse_list_until("]")?;
        let span = Span::new(token.start(), self.cur_token.end);

        match literal_values(&elements) {
            Some(values) => Some(Expression::ArrayLiteral(CompositeLiteral {
                token,
                value: Value::array(values),
                span,
            })),
            None => Some(Expression::Array(ListExpression { token, elements })),
        }
    }

    /// Parse a grouped expression or a tuple
    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();

        if self.peek_token_is_punctuator(")") {
            self.add_error("empty parentheses".to_string());
            return None;
        }

        let mut elements = self.parse_list_until(")")?;
        if elements.len() == 1 {
            return elements.pop();
        }

        let span = Span::new(token.start(), self.cur_token.end);
        match literal_values(&elements) {
            Some(values) => Some(Expression::TupleLiteral(CompositeLiteral {
                token,
                value: Value::tuple(values),
                span,
            })),
            None => Some(Expression::Tuple(ListExpression { token, elements })),
        }
    }

    /// Parse an infix expression
    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        match self.cur_token.token_type {
            TokenType::Operator => self.parse_binary_expression(left),
            TokenType::Keyword => self.parse_keyword_infix(left),
            TokenType::Punctuator if self.cur_token.literal == "(" => {
                self.parse_function_call(left)
            }
            _ => {
                self.add_error(format!(
                    "unexpected infix token '{}'",
                    self.cur_token.literal
                ));
                None
            }
        }
    }

    fn parse_binary_expression(&mut self, left: Expression) -> Option<Expression> {
        let token = self.cur_token.clone();
        let operator = token.literal.clone();
        let precedence = self.cur_precedence();

        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expression::Infix(InfixExpression::new(
            token,
            Box::new(left),
            operator,
            Box::new(right),
        )))
    }

    fn parse_keyword_infix(&mut self, left: Expression) -> Option<Expression> {
        let token = self.cur_token.clone();
        match token.literal.as_str() {
            "AND" | "OR" => self.parse_binary_expression(left),
            "LIKE" => self.parse_like_expression(left, token, false),
            "NOT" => {
                if !self.expect_keyword("LIKE") {
                    return None;
                }
                self.parse_like_expression(left, token, true)
            }
            "IS" => self.parse_is_expression(left),
            _ => {
                self.add_error(format!("unexpected keyword {}", token.literal));
                None
            }
        }
    }

    fn parse_like_expression(
        &mut self,
        left: Expression,
        token: Token,
        negated: bool,
    ) -> Option<Expression> {
        self.next_token();
        let pattern = self.parse_expression(Precedence::Equals)?;
        Some(Expression::Like(LikeExpression {
            token,
            left: Box::new(left),
            pattern: Box::new(pattern),
            negated,
        }))
    }

    /// Parse `IS [NOT] NULL`
    fn parse_is_expression(&mut self, left: Expression) -> Option<Expression> {
        let token = self.cur_token.clone();
        let negated = if self.peek_token_is_keyword("NOT") {
            self.next_token();
            true
        } else {
            false
        };
        if !self.expect_keyword("NULL") {
            return None;
        }
        Some(Expression::IsNull(IsNullExpression {
            token,
            expr: Box::new(left),
            negated,
        }))
    }

    fn parse_function_call(&mut self, left: Expression) -> Option<Expression> {
        let ident = match left {
            Expression::Identifier(id) => id,
            _ => {
                self.add_error("left side of '(' must be a function name".to_string());
                return None;
            }
        };

        let arguments = self.parse_list_until(")")?;
        Some(Expression::FunctionCall(FunctionCall {
            function: ident.value.to_uppercase(),
            token: ident.token,
            arguments,
        }))
    }

    /// Parse `CAST(expr AS type)`; the type may itself have parentheses
    fn parse_cast_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();

        if !self.expect_punctuator("(") {
            return None;
        }

        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_keyword("AS") {
            return None;
        }

        if !self.peek_token_is(TokenType::Identifier) && !self.peek_token_is(TokenType::Keyword) {
            self.add_error("expected type name after AS in CAST".to_string());
            return None;
        }
        self.next_token();
        let type_start = self.cur_token.start();
        let mut type_end = self.cur_token.end;
        let mut depth = 0usize;
        loop {
            if self.peek_token_is(TokenType::Eof) {
                self.add_error("unterminated CAST".to_string());
                return None;
            }
            if self.peek_token_is_punctuator(")") {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            } else if self.peek_token_is_punctuator("(") {
                depth += 1;
            }
            self.next_token();
            type_end = self.cur_token.end;
        }
        self.next_token();

        let type_name = self.source()[type_start..type_end].to_string();
        let target = match type_name.parse::<DataType>() {
            Ok(target) => target,
            Err(e) => {
                self.add_error(e.to_string());
                return None;
            }
        };

        Some(Expression::Cast(CastExpression {
            token,
            expr: Box::new(expr),
            type_name,
            target,
        }))
    }
}

/// Values of a list of expressions if every one of them is a literal
fn literal_values(elements: &[Expression]) -> Option<Vec<Value>> {
    elements.iter().map(Expression::literal_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(input: &str) -> Expression {
        Parser::new(input)
            .parse_single_expression()
            .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", input, e))
    }

    #[test]
    fn test_parse_literals() {
        assert!(matches!(
            parse_expr("42"),
            Expression::IntegerLiteral(IntegerLiteral { value: 42, .. })
        ));
        assert!(matches!(parse_expr("NULL"), Expression::NullLiteral(_)));
        assert!(matches!(
            parse_expr("true"),
            Expression::BooleanLiteral(BooleanLiteral { value: true, .. })
        ));
        match parse_expr("'it''s'") {
            Expression::StringLiteral(s) => {
                assert_eq!(s.value, "it's");
                assert_eq!(s.span, Span::new(0, 7));
            }
            other => panic!("expected string literal, got {:?}", other),
        }
    }

    #[test]
    fn test_sign_folding() {
        match parse_expr("-12") {
            Expression::IntegerLiteral(lit) => {
                assert_eq!(lit.value, -12);
                assert_eq!(lit.span, Span::new(0, 3));
            }
            other => panic!("expected folded literal, got {:?}", other),
        }
        match parse_expr("- 2.5") {
            Expression::FloatLiteral(lit) => {
                assert_eq!(lit.value, -2.5);
                assert_eq!(lit.span, Span::new(0, 5));
            }
            other => panic!("expected folded literal, got {:?}", other),
        }
        assert!(matches!(
            parse_expr("-9223372036854775808"),
            Expression::IntegerLiteral(IntegerLiteral { value: i64::MIN, .. })
        ));
        assert!(Parser::new("9223372036854775808")
            .parse_single_expression()
            .is_err());
    }

    #[test]
    fn test_subtraction_is_not_folded() {
        let expr = parse_expr("1 - 2");
        assert!(matches!(expr, Expression::Infix(_)));
        assert_eq!(expr.to_string(), "(1 - 2)");
        assert_eq!(parse_expr("1 + -2").to_string(), "(1 + -2)");
        assert_eq!(parse_expr("-x").to_string(), "(-x)");
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse_expr("1 + 2 * 3").to_string(), "(1 + (2 * 3))");
        assert_eq!(parse_expr("(1 + 2) * 3").to_string(), "((1 + 2) * 3)");
        assert_eq!(
            parse_expr("a = 1 OR b = 2 AND c").to_string(),
            "((a = 1) OR ((b = 2) AND c))"
        );
        assert_eq!(parse_expr("NOT a AND b").to_string(), "((NOT a) AND b)");
    }

    #[test]
    fn test_array_and_tuple_literals() {
        match parse_expr("[1, -2, NULL]") {
            Expression::ArrayLiteral(lit) => {
                assert_eq!(
                    lit.value,
                    Value::array(vec![Value::integer(1), Value::integer(-2), Value::Null])
                );
                assert_eq!(lit.span, Span::new(0, 13));
            }
            other => panic!("expected array literal, got {:?}", other),
        }
        assert!(matches!(parse_expr("[]"), Expression::ArrayLiteral(_)));
        assert!(matches!(parse_expr("[x, 1]"), Expression::Array(_)));
        assert!(matches!(parse_expr("(1, 'a')"), Expression::TupleLiteral(_)));
        assert!(matches!(parse_expr("(1, now())"), Expression::Tuple(_)));
        assert!(matches!(parse_expr("([1], (2, 3))"), Expression::TupleLiteral(_)));
    }

    #[test]
    fn test_function_call() {
        match parse_expr("concat(a, 'x', 1)") {
            Expression::FunctionCall(call) => {
                assert_eq!(call.function, "CONCAT");
                assert_eq!(call.arguments.len(), 3);
            }
            other => panic!("expected function call, got {:?}", other),
        }
        assert_eq!(parse_expr("now()").to_string(), "NOW()");
    }

    #[test]
    fn test_cast() {
        match parse_expr("CAST(1 AS Nullable(Float))") {
            Expression::Cast(cast) => {
                assert_eq!(cast.type_name, "Nullable(Float)");
                assert_eq!(cast.target, DataType::nullable(DataType::Float));
            }
            other => panic!("expected cast, got {:?}", other),
        }
        assert!(Parser::new("CAST(1 AS Blob)").parse_single_expression().is_err());
        assert!(Parser::new("CAST(1 AS Integer").parse_single_expression().is_err());
    }

    #[test]
    fn test_is_null_and_like() {
        assert_eq!(parse_expr("x IS NULL").to_string(), "(x IS NULL)");
        assert_eq!(parse_expr("x IS NOT NULL").to_string(), "(x IS NOT NULL)");
        assert_eq!(
            parse_expr("name NOT LIKE 'a%'").to_string(),
            "(name NOT LIKE 'a%')"
        );
        assert!(Parser::new("x IS 1").parse_single_expression().is_err());
    }

    #[test]
    fn test_errors() {
        assert!(Parser::new("1 +").parse_single_expression().is_err());
        assert!(Parser::new("()").parse_single_expression().is_err());
        assert!(Parser::new("f(1,").parse_single_expression().is_err());
        assert!(Parser::new("1 +* 2").parse_single_expression().is_err());
    }
}
