use codespan_reporting::diagnostic::{Diagnostic, Label};
use logos::{Filter, Logos};
use std::fmt;

use crate::source::{BytePos, ByteRange, FileId, MAX_SOURCE_LEN};

#[derive(Clone, Debug, PartialEq, Eq, Logos)]
#[logos(extras = FileId)]
pub enum Token<'source> {
    #[regex(r"[\p{L}_][\p{L}\p{Nd}_]*")]
    Name(&'source str),

    #[token("func")]
    KeywordFunc,

    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("-")]
    Minus,
    #[token(">")]
    Greater,
    #[token("->")]
    HyphenGreater,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,

    #[token(r"/*", block_comment)]
    BlockComment(BlockCommentError),

    #[error]
    #[regex(r"\p{Whitespace}", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    Error,
}

const OPEN: &str = "/*";
const CLOSE: &str = "*/";
const LEN: BytePos = OPEN.len() as BytePos;

/// Block comments do not nest: the first `*/` closes the comment.
fn block_comment<'source>(
    lexer: &mut logos::Lexer<'source, Token<'source>>,
) -> Filter<BlockCommentError> {
    match lexer.remainder().find(CLOSE) {
        Some(offset) => {
            lexer.bump(offset + CLOSE.len());
            Filter::Skip
        }
        None => {
            let start = lexer.span().start as BytePos;
            lexer.bump(lexer.remainder().len());
            Filter::Emit(BlockCommentError {
                open: ByteRange::new(lexer.extras, start, start + LEN),
            })
        }
    }
}

pub type Spanned<Tok, Loc> = (Loc, Tok, Loc);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnclosedBlockComment(BlockCommentError),
    UnexpectedCharacter { range: ByteRange },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockCommentError {
    open: ByteRange,
}

impl Error {
    pub fn range(&self) -> ByteRange {
        match self {
            Error::UnexpectedCharacter { range } => *range,
            Error::UnclosedBlockComment(BlockCommentError { open }) => *open,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            Error::UnexpectedCharacter { range } => Diagnostic::error()
                .with_message("unexpected character")
                .with_labels(vec![Label::primary(range.file_id(), *range)]),
            Error::UnclosedBlockComment(BlockCommentError { open }) => Diagnostic::error()
                .with_message("unclosed block comment")
                .with_labels(vec![Label::primary(open.file_id(), *open)
                    .with_message(format!("`{OPEN}` opened here"))])
                .with_notes(vec![format!("help: close the comment with `{CLOSE}`")]),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedCharacter { range } => {
                write!(f, "unexpected character at byte {}", range.start())
            }
            Error::UnclosedBlockComment(BlockCommentError { open }) => {
                write!(f, "unclosed block comment at byte {}", open.start())
            }
        }
    }
}

pub fn tokens(
    file_id: FileId,
    source: &str,
) -> impl Iterator<Item = Result<Spanned<Token<'_>, BytePos>, Error>> {
    assert!(
        source.len() <= MAX_SOURCE_LEN,
        "`source` must be less than 4GiB in length"
    );

    Token::lexer_with_extras(source, file_id)
        .spanned()
        .map(move |(token, range)| {
            let start = range.start as BytePos;
            let end = range.end as BytePos;
            match token {
                Token::BlockComment(error) => Err(Error::UnclosedBlockComment(error)),
                Token::Error => Err(Error::UnexpectedCharacter {
                    range: ByteRange::new(file_id, start, end),
                }),
                token => Ok((start, token, end)),
            }
        })
}

impl<'source> Token<'source> {
    pub fn description(&self) -> &'static str {
        match self {
            Token::Name(_) => "name",
            Token::KeywordFunc => "func",
            Token::Colon => ":",
            Token::Comma => ",",
            Token::Minus => "-",
            Token::Greater => ">",
            Token::HyphenGreater => "->",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::BlockComment(_) => "block comment",
            Token::Error => "error",
        }
    }
}

impl<'source> fmt::Display for Token<'source> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => write!(f, "{name}"),
            token => write!(f, "{}", token.description()),
        }
    }
}
