//! Token definitions and the keyword table.

/// A lexical unit of the Shona language.
///
/// Keywords carry no payload; identifiers and string literals own their
/// text; numbers carry the parsed double. Punctuation the lexer has no
/// opinion about arrives as [`Token::Raw`] so that the parser's
/// operator-precedence table can treat any ASCII character as a potential
/// operator.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// End of input.
    Eof,

    /// "basa" - function definition keyword.
    Def,
    /// "extern" - external declaration keyword.
    Extern,

    /// Identifier (variable, function, or class name).
    Ident(String),
    /// Numeric literal, always a double.
    Number(f64),
    /// Double-quoted string literal, captured verbatim.
    Str(String),

    /// "kana" - if.
    If,
    /// "then" - retained for compatibility, unused by the grammar.
    Then,
    /// "kanaKuti" - else.
    Else,
    /// "pakati" - for.
    For,
    /// "mu" - in (closes a `zita` binding list).
    In,
    /// "binary" - binary operator definition marker.
    Binary,
    /// "unary" - unary operator definition marker.
    Unary,
    /// "zita" - local variable binding.
    Var,
    /// "zitaGuru" - global variable binding.
    GlobalVar,
    /// "dzosa" - return.
    Return,

    /// "vhura" - deprecated file-open form; the parser rejects it.
    Open,
    /// "verenga" - deprecated file-read form; the parser rejects it.
    Read,
    /// Deprecated file-write form, no surface spelling.
    Write,
    /// Deprecated file-append form, no surface spelling.
    Append,
    /// Deprecated file-close form, no surface spelling.
    Close,
    /// "bvisa" - deprecated file-delete form; the parser rejects it.
    Delete,

    /// "kusvika" - while.
    While,
    /// "ita" - do; reserved, unused by the grammar.
    Do,
    /// "kirasi" - class.
    Class,
    /// "new" - reserved.
    New,
    /// "this" - reserved.
    This,
    /// "extends" - reserved.
    Extends,
    /// "public" - reserved.
    Public,
    /// "private" - reserved.
    Private,

    /// "." - member access.
    Dot,
    /// "->" - reserved, never produced by the lexer.
    Arrow,
    /// ";" - statement separator.
    Semicolon,

    /// Any other character, passed through for the operator machinery.
    Raw(char),
}

impl Token {
    /// Returns the raw character if this is a pass-through token.
    pub fn raw(&self) -> Option<char> {
        match self {
            Token::Raw(c) => Some(*c),
            _ => None,
        }
    }
}

/// Maps an identifier run to its keyword token, if any.
pub fn keyword_from_ident(text: &str) -> Option<Token> {
    let token = match text {
        "basa" => Token::Def,
        "extern" => Token::Extern,
        "kana" => Token::If,
        "then" => Token::Then,
        "kanaKuti" => Token::Else,
        "pakati" => Token::For,
        "mu" => Token::In,
        "binary" => Token::Binary,
        "unary" => Token::Unary,
        "zita" => Token::Var,
        "zitaGuru" => Token::GlobalVar,
        "dzosa" => Token::Return,
        "vhura" => Token::Open,
        "verenga" => Token::Read,
        "bvisa" => Token::Delete,
        "kusvika" => Token::While,
        "ita" => Token::Do,
        "kirasi" => Token::Class,
        "new" => Token::New,
        "this" => Token::This,
        "extends" => Token::Extends,
        "public" => Token::Public,
        "private" => Token::Private,
        _ => return None,
    };
    Some(token)
}
