//! Pratt 解析规则表

use crate::scanner::TokenKind;

/// 运算符优先级，从低到高
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // ()
    Primary,
}

impl Precedence {
    /// 高一级的优先级（左结合二元运算用）
    pub fn next(self) -> Self {
        use Precedence::*;
        match self {
            None => Assignment,
            Assignment => Or,
            Or => And,
            And => Equality,
            Equality => Comparison,
            Comparison => Term,
            Term => Factor,
            Factor => Unary,
            Unary => Call,
            Call | Primary => Primary,
        }
    }
}

/// 解析函数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ParseFn {
    Grouping,
    Call,
    Unary,
    Binary,
    Number,
    String,
    Literal,
    Variable,
    And,
    Or,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct ParseRule {
    pub prefix: Option<ParseFn>,
    pub infix: Option<ParseFn>,
    pub precedence: Precedence,
}

pub(super) fn get_rule(kind: TokenKind) -> ParseRule {
    use TokenKind as T;
    let (prefix, infix, precedence) = match kind {
        T::LeftParen => (Some(ParseFn::Grouping), Some(ParseFn::Call), Precedence::Call),
        T::Minus => (Some(ParseFn::Unary), Some(ParseFn::Binary), Precedence::Term),
        T::Plus => (None, Some(ParseFn::Binary), Precedence::Term),
        T::Slash | T::Star => (None, Some(ParseFn::Binary), Precedence::Factor),
        T::Bang => (Some(ParseFn::Unary), None, Precedence::None),
        T::BangEqual | T::EqualEqual => (None, Some(ParseFn::Binary), Precedence::Equality),
        T::Greater | T::GreaterEqual | T::Less | T::LessEqual => {
            (None, Some(ParseFn::Binary), Precedence::Comparison)
        }
        T::Identifier => (Some(ParseFn::Variable), None, Precedence::None),
        T::String => (Some(ParseFn::String), None, Precedence::None),
        T::Number => (Some(ParseFn::Number), None, Precedence::None),
        T::And => (None, Some(ParseFn::And), Precedence::And),
        T::Or => (None, Some(ParseFn::Or), Precedence::Or),
        T::False | T::True | T::Nil => (Some(ParseFn::Literal), None, Precedence::None),
        _ => (None, None, Precedence::None),
    };
    ParseRule {
        prefix,
        infix,
        precedence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        assert!(Precedence::Assignment < Precedence::Or);
        assert!(Precedence::Term < Precedence::Factor);
        assert_eq!(Precedence::Term.next(), Precedence::Factor);
        assert_eq!(Precedence::Primary.next(), Precedence::Primary);
    }

    #[test]
    fn test_rules() {
        let minus = get_rule(TokenKind::Minus);
        assert_eq!(minus.prefix, Some(ParseFn::Unary));
        assert_eq!(minus.infix, Some(ParseFn::Binary));
        assert_eq!(get_rule(TokenKind::Semicolon).prefix, None);
        assert_eq!(get_rule(TokenKind::This).prefix, None);
        assert_eq!(get_rule(TokenKind::Or).precedence, Precedence::Or);
    }
}
