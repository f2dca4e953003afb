//! Enable-info expressions.
//!
//! Plug-ins may describe the documents they accept with a small expression
//! language instead of a mode bitmask, for example
//!
//! ```text
//! in (PSHOP_ImageMode, RGBMode, GrayScaleMode) && PSHOP_ImageDepth == 8
//! ```
//!
//! The language has `||`, `&&`, `!`, the six comparisons, parentheses,
//! integer literals, `true`/`false`, `in(x, a, b, ...)` and a fixed set of
//! `PSHOP_` identifiers. Unknown identifiers evaluate to zero.
//!
//! Two evaluation paths exist. [`supported_modes`] evaluates the
//! expression once per image mode at that mode's natural depth and builds
//! a [`SupportedModes`] bitmask. [`supports_16bit`] evaluates it once for
//! a 16-bit gray or RGB document. The two can disagree for expressions
//! that test transparency or depth in unusual ways; both are kept.

use filterhost_abi::{SupportedModes, image_mode};

use crate::error::EnableInfoError;

/// Maximum nesting of parentheses, `!` and `in(...)`.
pub const MAX_DEPTH: usize = 64;

/// Maximum number of operands and operators in one expression.
///
/// Bounds the length of operator chains, which nest to the left.
pub const MAX_NODES: usize = 1024;

/// Document properties an expression can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    /// `PSHOP_ImageMode`.
    pub image_mode: i16,
    /// `PSHOP_ImageDepth`.
    pub depth: i32,
    /// `PSHOP_NumTargetChannels`.
    pub target_channels: i32,
    /// `PSHOP_IsTargetComposite`.
    pub is_target_composite: bool,
    /// `PSHOP_IsTargetTransparent`.
    pub is_target_transparent: bool,
    /// `PSHOP_HasSelection`.
    pub has_selection: bool,
}

impl EvalContext {
    /// A flattened, unselected document in `mode` at its natural depth.
    pub fn for_mode(mode: i16) -> Self {
        Self {
            image_mode: mode,
            depth: natural_depth(mode),
            target_channels: channel_count(mode),
            is_target_composite: true,
            is_target_transparent: false,
            has_selection: false,
        }
    }

    /// A 16-bit gray or RGB layer; RGB layers carry transparency.
    pub fn for_16bit(grayscale: bool) -> Self {
        if grayscale {
            Self::for_mode(image_mode::GRAY16)
        } else {
            Self {
                target_channels: 4,
                is_target_transparent: true,
                is_target_composite: false,
                ..Self::for_mode(image_mode::RGB48)
            }
        }
    }

    fn lookup(&self, name: &str) -> i64 {
        match name {
            "PSHOP_ImageMode" => i64::from(self.image_mode),
            "PSHOP_ImageDepth" => i64::from(self.depth),
            "PSHOP_NumTargetChannels" => i64::from(self.target_channels),
            "PSHOP_IsTargetComposite" => i64::from(self.is_target_composite),
            "PSHOP_IsTargetTransparent" => i64::from(self.is_target_transparent),
            "PSHOP_HasSelection" => i64::from(self.has_selection),
            other => mode_constant(other).map(i64::from).unwrap_or(0),
        }
    }
}

fn mode_constant(name: &str) -> Option<i16> {
    let mode = match name {
        "BitmapMode" => image_mode::BITMAP,
        "GrayScaleMode" => image_mode::GRAY_SCALE,
        "IndexedColorMode" => image_mode::INDEXED_COLOR,
        "RGBMode" => image_mode::RGB_COLOR,
        "CMYKMode" => image_mode::CMYK_COLOR,
        "HSLMode" => image_mode::HSL_COLOR,
        "HSBMode" => image_mode::HSB_COLOR,
        "MultichannelMode" => image_mode::MULTICHANNEL,
        "DuotoneMode" => image_mode::DUOTONE,
        "LabMode" => image_mode::LAB_COLOR,
        "Gray16Mode" => image_mode::GRAY16,
        "RGB48Mode" => image_mode::RGB48,
        "Lab48Mode" => image_mode::LAB48,
        "CMYK64Mode" => image_mode::CMYK64,
        "DeepMultichannelMode" => image_mode::DEEP_MULTICHANNEL,
        "Duotone16Mode" => image_mode::DUOTONE16,
        "RGB96Mode" => image_mode::RGB96,
        "Gray32Mode" => image_mode::GRAY32,
        _ => return None,
    };
    Some(mode)
}

fn natural_depth(mode: i16) -> i32 {
    match mode {
        image_mode::BITMAP => 1,
        image_mode::GRAY16
        | image_mode::RGB48
        | image_mode::LAB48
        | image_mode::CMYK64
        | image_mode::DEEP_MULTICHANNEL
        | image_mode::DUOTONE16 => 16,
        image_mode::RGB96 | image_mode::GRAY32 => 32,
        _ => 8,
    }
}

fn channel_count(mode: i16) -> i32 {
    match mode {
        image_mode::RGB_COLOR
        | image_mode::HSL_COLOR
        | image_mode::HSB_COLOR
        | image_mode::LAB_COLOR
        | image_mode::RGB48
        | image_mode::LAB48
        | image_mode::RGB96 => 3,
        image_mode::CMYK_COLOR | image_mode::CMYK64 => 4,
        _ => 1,
    }
}

/// Binary operators, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// Parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Integer literal.
    Int(i64),
    /// `true` or `false`.
    Bool(bool),
    /// Named value.
    Ident(String),
    /// `!expr`
    Not(Box<Expr>),
    /// `-expr`
    Neg(Box<Expr>),
    /// `lhs op rhs`
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `in(target, candidates...)`
    In(Box<Expr>, Vec<Expr>),
}

impl Expr {
    /// Evaluate to an integer; non-zero is true.
    pub fn evaluate(&self, ctx: &EvalContext) -> i64 {
        match self {
            Expr::Int(value) => *value,
            Expr::Bool(value) => i64::from(*value),
            Expr::Ident(name) => ctx.lookup(name),
            Expr::Not(inner) => i64::from(inner.evaluate(ctx) == 0),
            Expr::Neg(inner) => inner.evaluate(ctx).wrapping_neg(),
            Expr::Binary(op, lhs, rhs) => {
                let l = lhs.evaluate(ctx);
                let result = match op {
                    BinaryOp::Or => l != 0 || rhs.evaluate(ctx) != 0,
                    BinaryOp::And => l != 0 && rhs.evaluate(ctx) != 0,
                    BinaryOp::Eq => l == rhs.evaluate(ctx),
                    BinaryOp::Ne => l != rhs.evaluate(ctx),
                    BinaryOp::Lt => l < rhs.evaluate(ctx),
                    BinaryOp::Le => l <= rhs.evaluate(ctx),
                    BinaryOp::Gt => l > rhs.evaluate(ctx),
                    BinaryOp::Ge => l >= rhs.evaluate(ctx),
                };
                i64::from(result)
            }
            Expr::In(target, candidates) => {
                let value = target.evaluate(ctx);
                i64::from(candidates.iter().any(|c| c.evaluate(ctx) == value))
            }
        }
    }

    /// Evaluate as a condition.
    pub fn is_true(&self, ctx: &EvalContext) -> bool {
        self.evaluate(ctx) != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Ident(String),
    LParen,
    RParen,
    Comma,
    OrOr,
    AndAnd,
    Bang,
    Minus,
    Op(BinaryOp),
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Int(value) => format!("integer {value}"),
            Token::Ident(name) => format!("identifier {name}"),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::OrOr => "'||'".to_string(),
            Token::AndAnd => "'&&'".to_string(),
            Token::Bang => "'!'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Op(op) => format!("operator {op:?}"),
            Token::End => "end of input".to_string(),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, EnableInfoError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;
        let next = bytes.get(pos + 1).copied();
        let token = match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b',' => Token::Comma,
            b'-' => Token::Minus,
            b'|' if next == Some(b'|') => {
                pos += 1;
                Token::OrOr
            }
            b'&' if next == Some(b'&') => {
                pos += 1;
                Token::AndAnd
            }
            b'=' if next == Some(b'=') => {
                pos += 1;
                Token::Op(BinaryOp::Eq)
            }
            b'!' if next == Some(b'=') => {
                pos += 1;
                Token::Op(BinaryOp::Ne)
            }
            b'!' => Token::Bang,
            b'<' if next == Some(b'=') => {
                pos += 1;
                Token::Op(BinaryOp::Le)
            }
            b'<' => Token::Op(BinaryOp::Lt),
            b'>' if next == Some(b'=') => {
                pos += 1;
                Token::Op(BinaryOp::Ge)
            }
            b'>' => Token::Op(BinaryOp::Gt),
            b'0'..=b'9' => {
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                let digits = source.get(start..pos).unwrap_or_default();
                let value = digits
                    .parse::<i64>()
                    .ok()
                    .ok_or(EnableInfoError::IntegerOverflow { position: start })?;
                tokens.push((Token::Int(value), start));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                let name = source.get(start..pos).unwrap_or_default();
                tokens.push((Token::Ident(name.to_string()), start));
                continue;
            }
            _ => {
                let found = source
                    .get(start..)
                    .and_then(|rest| rest.chars().next())
                    .unwrap_or('\u{FFFD}');
                return Err(EnableInfoError::UnexpectedChar {
                    found,
                    position: start,
                });
            }
        };
        pos += 1;
        tokens.push((token, start));
    }

    tokens.push((Token::End, bytes.len()));
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    index: usize,
    depth: usize,
    nodes: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens
            .get(self.index)
            .map(|(token, _)| token)
            .unwrap_or(&Token::End)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.index).map(|(_, pos)| *pos).unwrap_or(0)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    fn expect(&mut self, wanted: Token, expected: &'static str) -> Result<(), EnableInfoError> {
        if *self.peek() == wanted {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &'static str) -> EnableInfoError {
        EnableInfoError::UnexpectedToken {
            found: self.peek().describe(),
            expected,
            position: self.position(),
        }
    }

    fn enter(&mut self) -> Result<(), EnableInfoError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EnableInfoError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn node(&mut self) -> Result<(), EnableInfoError> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(EnableInfoError::TooComplex { limit: MAX_NODES });
        }
        Ok(())
    }

    fn or(&mut self) -> Result<Expr, EnableInfoError> {
        let mut lhs = self.and()?;
        while *self.peek() == Token::OrOr {
            self.advance();
            self.node()?;
            let rhs = self.and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, EnableInfoError> {
        let mut lhs = self.comparison()?;
        while *self.peek() == Token::AndAnd {
            self.advance();
            self.node()?;
            let rhs = self.comparison()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, EnableInfoError> {
        let mut lhs = self.unary()?;
        while let Token::Op(op) = *self.peek() {
            self.advance();
            self.node()?;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, EnableInfoError> {
        self.node()?;
        match self.peek() {
            Token::Bang => {
                self.advance();
                self.enter()?;
                let inner = self.unary()?;
                self.leave();
                Ok(Expr::Not(Box::new(inner)))
            }
            Token::Minus => {
                self.advance();
                self.enter()?;
                let inner = self.unary()?;
                self.leave();
                Ok(Expr::Neg(Box::new(inner)))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, EnableInfoError> {
        match self.advance() {
            Token::Int(value) => Ok(Expr::Int(value)),
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "in" if *self.peek() == Token::LParen => self.in_call(),
                _ => Ok(Expr::Ident(name)),
            },
            Token::LParen => {
                self.enter()?;
                let inner = self.or()?;
                self.expect(Token::RParen, "')'")?;
                self.leave();
                Ok(inner)
            }
            _ => {
                self.index = self.index.saturating_sub(1);
                Err(self.unexpected("a value"))
            }
        }
    }

    fn in_call(&mut self) -> Result<Expr, EnableInfoError> {
        self.expect(Token::LParen, "'('")?;
        self.enter()?;
        let target = self.or()?;
        let mut candidates = Vec::new();
        while *self.peek() == Token::Comma {
            self.advance();
            candidates.push(self.or()?);
        }
        self.expect(Token::RParen, "')' or ','")?;
        self.leave();
        Ok(Expr::In(Box::new(target), candidates))
    }
}

/// Parse an enable-info expression.
///
/// # Errors
///
/// Returns [`EnableInfoError`] for malformed input, nesting deeper than
/// [`MAX_DEPTH`] or more than [`MAX_NODES`] operands and operators.
pub fn parse(source: &str) -> Result<Expr, EnableInfoError> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        index: 0,
        depth: 0,
        nodes: 0,
    };
    let expr = parser.or()?;
    if *parser.peek() != Token::End {
        return Err(parser.unexpected("end of input"));
    }
    Ok(expr)
}

const BITMASK_MODES: [i16; 16] = [
    image_mode::BITMAP,
    image_mode::GRAY_SCALE,
    image_mode::INDEXED_COLOR,
    image_mode::RGB_COLOR,
    image_mode::CMYK_COLOR,
    image_mode::HSL_COLOR,
    image_mode::HSB_COLOR,
    image_mode::MULTICHANNEL,
    image_mode::DUOTONE,
    image_mode::LAB_COLOR,
    image_mode::GRAY16,
    image_mode::RGB48,
    image_mode::LAB48,
    image_mode::CMYK64,
    image_mode::DEEP_MULTICHANNEL,
    image_mode::DUOTONE16,
];

/// Modes for which `expr` holds, each evaluated at its natural depth.
pub fn modes_for(expr: &Expr) -> SupportedModes {
    BITMASK_MODES
        .iter()
        .filter(|&&mode| expr.is_true(&EvalContext::for_mode(mode)))
        .filter_map(|&mode| SupportedModes::from_image_mode(mode))
        .fold(SupportedModes::empty(), |acc, flag| acc | flag)
}

/// Bitmask path: parse `source` and collect the modes it enables.
///
/// `"true"` enables every mode.
///
/// # Errors
///
/// Returns [`EnableInfoError`] when the expression does not parse.
pub fn supported_modes(source: &str) -> Result<SupportedModes, EnableInfoError> {
    if source.trim() == "true" {
        return Ok(SupportedModes::all());
    }
    Ok(modes_for(&parse(source)?))
}

/// Boolean path: whether `source` enables a 16-bit gray or RGB layer.
///
/// # Errors
///
/// Returns [`EnableInfoError`] when the expression does not parse.
pub fn supports_16bit(source: &str, grayscale: bool) -> Result<bool, EnableInfoError> {
    Ok(parse(source)?.is_true(&EvalContext::for_16bit(grayscale)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_list_expression() -> Result<(), EnableInfoError> {
        let modes = supported_modes("in (PSHOP_ImageMode, RGBMode, GrayScaleMode)")?;
        assert_eq!(modes, SupportedModes::RGB_COLOR | SupportedModes::GRAY_SCALE);
        Ok(())
    }

    #[test]
    fn test_depth_restriction() -> Result<(), EnableInfoError> {
        let modes = supported_modes("PSHOP_ImageDepth == 16")?;
        assert!(modes.contains(SupportedModes::GRAY16 | SupportedModes::RGB48));
        assert!(!modes.contains(SupportedModes::RGB_COLOR));
        Ok(())
    }

    #[test]
    fn test_true_enables_everything() -> Result<(), EnableInfoError> {
        assert_eq!(supported_modes("true")?, SupportedModes::all());
        Ok(())
    }

    #[test]
    fn test_unknown_identifier_is_zero() -> Result<(), EnableInfoError> {
        assert_eq!(supported_modes("PSHOP_Unknown")?, SupportedModes::empty());
        assert_eq!(supported_modes("!PSHOP_Unknown")?, SupportedModes::all());
        Ok(())
    }

    #[test]
    fn test_precedence_and_binds_tighter() -> Result<(), EnableInfoError> {
        let expr = parse("1 || 0 && 0")?;
        assert!(expr.is_true(&EvalContext::for_mode(image_mode::RGB_COLOR)));
        Ok(())
    }

    #[test]
    fn test_16bit_paths() -> Result<(), EnableInfoError> {
        let source = "in (PSHOP_ImageMode, Gray16Mode, RGB48Mode) && PSHOP_ImageDepth == 16";
        assert!(supports_16bit(source, true)?);
        assert!(supports_16bit(source, false)?);
        assert!(!supports_16bit("PSHOP_ImageMode == RGBMode", false)?);
        Ok(())
    }

    #[test]
    fn test_transparency_test_diverges_between_paths() -> Result<(), EnableInfoError> {
        let source = "PSHOP_ImageMode == RGB48Mode && PSHOP_IsTargetTransparent";
        assert!(!supported_modes(source)?.contains(SupportedModes::RGB48));
        assert!(supports_16bit(source, false)?);
        Ok(())
    }

    #[test]
    fn test_unbalanced_parenthesis() {
        let err = parse("(PSHOP_ImageMode == RGBMode");
        assert!(matches!(
            err,
            Err(EnableInfoError::UnexpectedToken { expected: "')'", .. })
        ));
    }

    #[test]
    fn test_stray_character() {
        assert_eq!(
            parse("1 # 2"),
            Err(EnableInfoError::UnexpectedChar {
                found: '#',
                position: 2
            })
        );
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(
            parse(&source),
            Err(EnableInfoError::TooDeep { limit: MAX_DEPTH })
        );
    }

    #[test]
    fn test_long_operator_chain_is_rejected() {
        let source = vec!["1"; 200_000].join(" || ");
        assert_eq!(
            supported_modes(&source),
            Err(EnableInfoError::TooComplex { limit: MAX_NODES })
        );
        let source = vec!["PSHOP_ImageDepth"; 200_000].join(" == ");
        assert_eq!(
            parse(&source),
            Err(EnableInfoError::TooComplex { limit: MAX_NODES })
        );
    }

    #[test]
    fn test_chain_within_limit_evaluates() -> Result<(), EnableInfoError> {
        let source = vec!["0"; 200].join(" || ") + " || 1";
        assert!(parse(&source)?.is_true(&EvalContext::for_mode(image_mode::RGB_COLOR)));
        Ok(())
    }

    #[test]
    fn test_integer_overflow() {
        assert_eq!(
            parse("99999999999999999999"),
            Err(EnableInfoError::IntegerOverflow { position: 0 })
        );
    }
}
