//! Surface language.
//!
//! A WIT file is a sequence of function declarations:
//!
//! ```text
//! send-receive-skip-search : func(process-id: u64, timeout: u32) -> u32
//! ```

use codespan_reporting::diagnostic::{Diagnostic, Label};
use lalrpop_util::lalrpop_mod;
use std::fmt;

use crate::source::{BytePos, ByteRange, FileId};

lalrpop_mod!(
    #[allow(clippy::all)]
    grammar,
    "/surface/grammar.rs"
);
pub(crate) mod lexer;

/// The declarations parsed from a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// The file in which this module was defined.
    pub file_id: FileId,
    /// Declarations, in source order.
    pub items: Vec<Item>,
}

impl Module {
    /// Parse a module from the `source` string.
    pub fn parse(file_id: FileId, source: &str) -> Result<Module, ParseMessage> {
        grammar::ModuleParser::new()
            .parse(file_id, lexer::tokens(file_id, source))
            .map_err(|error| ParseMessage::from_lalrpop(file_id, error))
    }

    /// The function declarations in this module.
    pub fn funcs(&self) -> impl Iterator<Item = &Func> {
        self.items.iter().map(|item| match item {
            Item::Func(func) => func,
        })
    }
}

/// Top-level declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Function declarations.
    ///
    /// ```text
    /// <name> : func(<params>) -> <type>
    /// ```
    Func(Func),
}

impl Item {
    pub fn range(&self) -> ByteRange {
        match self {
            Item::Func(func) => func.range,
        }
    }
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    pub range: ByteRange,
    pub name: Ident,
    pub params: Vec<Param>,
    pub ret: Option<Return>,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub range: ByteRange,
    pub name: Ident,
    // FIXME: can't use `r#type` in LALRPOP grammars
    pub type_: Type,
}

/// The return type of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Return {
    pub type_: Type,
}

/// A reference to a primitive type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub range: ByteRange,
    pub name: String,
}

/// A hyphen-separated identifier, like `send-receive-skip-search`.
///
/// Every segment is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub range: ByteRange,
    pub name: String,
}

/// Syntax errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseMessage {
    Lexer(lexer::Error),
    UnrecognizedEof {
        range: ByteRange,
        expected: Vec<String>,
    },
    UnrecognizedToken {
        range: ByteRange,
        token: &'static str,
        expected: Vec<String>,
    },
    ExtraToken {
        range: ByteRange,
        token: &'static str,
    },
}

impl ParseMessage {
    fn from_lalrpop(
        file_id: FileId,
        error: lalrpop_util::ParseError<BytePos, lexer::Token<'_>, lexer::Error>,
    ) -> ParseMessage {
        use lalrpop_util::ParseError;

        match error {
            ParseError::InvalidToken { location } => {
                ParseMessage::Lexer(lexer::Error::UnexpectedCharacter {
                    range: ByteRange::new(file_id, location, location),
                })
            }
            ParseError::UnrecognizedEOF { location, expected } => ParseMessage::UnrecognizedEof {
                range: ByteRange::new(file_id, location, location),
                expected,
            },
            ParseError::UnrecognizedToken {
                token: (start, token, end),
                expected,
            } => ParseMessage::UnrecognizedToken {
                range: ByteRange::new(file_id, start, end),
                token: token.description(),
                expected,
            },
            ParseError::ExtraToken {
                token: (start, token, end),
            } => ParseMessage::ExtraToken {
                range: ByteRange::new(file_id, start, end),
                token: token.description(),
            },
            ParseError::User { error } => ParseMessage::Lexer(error),
        }
    }

    pub fn range(&self) -> ByteRange {
        match self {
            ParseMessage::Lexer(error) => error.range(),
            ParseMessage::UnrecognizedEof { range, .. }
            | ParseMessage::UnrecognizedToken { range, .. }
            | ParseMessage::ExtraToken { range, .. } => *range,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        let primary_label = |range: &ByteRange| Label::primary(range.file_id(), *range);

        match self {
            ParseMessage::Lexer(error) => error.to_diagnostic(),
            ParseMessage::UnrecognizedEof { range, expected } => Diagnostic::error()
                .with_message("unexpected end of file")
                .with_labels(vec![primary_label(range).with_message("unexpected end of file")])
                .with_notes(format_expected(expected).map_or(Vec::new(), |message| vec![message])),
            ParseMessage::UnrecognizedToken {
                range,
                token,
                expected,
            } => Diagnostic::error()
                .with_message(format!("unexpected token {token}"))
                .with_labels(vec![primary_label(range).with_message("unexpected token")])
                .with_notes(format_expected(expected).map_or(Vec::new(), |message| vec![message])),
            ParseMessage::ExtraToken { range, token } => Diagnostic::error()
                .with_message(format!("extra token {token}"))
                .with_labels(vec![primary_label(range).with_message("extra token")]),
        }
    }
}

impl fmt::Display for ParseMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMessage::Lexer(error) => fmt::Display::fmt(error, f),
            ParseMessage::UnrecognizedEof { .. } => write!(f, "unexpected end of file"),
            ParseMessage::UnrecognizedToken { token, .. } => write!(f, "unexpected token {token}"),
            ParseMessage::ExtraToken { token, .. } => write!(f, "extra token {token}"),
        }
    }
}

impl std::error::Error for ParseMessage {}

fn format_expected(expected: &[impl fmt::Display]) -> Option<String> {
    use itertools::Itertools;

    expected.split_last().map(|items| match items {
        (last, []) => format!("expected {last}"),
        (last, expected) => format!("expected {} or {last}", expected.iter().format(", ")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Module, ParseMessage> {
        Module::parse(0, source)
    }

    fn func_names(module: &Module) -> Vec<&str> {
        module.funcs().map(|func| func.name.name.as_str()).collect()
    }

    #[test]
    fn empty_module() {
        let module = parse("").unwrap();
        assert!(module.items.is_empty());

        let module = parse("  \n// nothing here\n").unwrap();
        assert!(module.items.is_empty());
    }

    #[test]
    fn func_with_params_and_return() {
        let module =
            parse("send-receive-skip-search : func(process-id: u64, timeout: u32) -> u32").unwrap();

        assert_eq!(module.items.len(), 1);
        let func = module.funcs().next().unwrap();
        assert_eq!(func.name.name, "send-receive-skip-search");
        assert_eq!(func.range, ByteRange::new(0, 0, 69));

        let params: Vec<_> = (func.params.iter())
            .map(|param| (param.name.name.as_str(), param.type_.name.as_str()))
            .collect();
        assert_eq!(params, [("process-id", "u64"), ("timeout", "u32")]);

        let ret = func.ret.as_ref().unwrap();
        assert_eq!(ret.type_.name, "u32");
        assert_eq!(ret.type_.range, ByteRange::new(0, 66, 69));
    }

    #[test]
    fn func_without_params_or_return() {
        let module = parse("yield : func()").unwrap();
        let func = module.funcs().next().unwrap();
        assert!(func.params.is_empty());
        assert!(func.ret.is_none());
    }

    #[test]
    fn declarations_keep_source_order() {
        let module = parse(
            "
            b : func()
            a : func(x: u8) -> s8
            c-d : func(y: float64,)
            ",
        )
        .unwrap();
        assert_eq!(func_names(&module), ["b", "a", "c-d"]);
    }

    #[test]
    fn trailing_comma_after_param() {
        let module = parse("foo-bar : func(x: u8,)").unwrap();
        let func = module.funcs().next().unwrap();
        assert_eq!(func.params.len(), 1);
    }

    #[test]
    fn lone_comma_is_rejected() {
        let error = parse("foo-bar : func(,)").unwrap_err();
        assert!(matches!(
            error,
            ParseMessage::UnrecognizedToken { token: ",", .. }
        ));
        assert_eq!(error.range(), ByteRange::new(0, 15, 16));
    }

    #[test]
    fn whitespace_between_segments() {
        let module = parse("send -\n receive : func()").unwrap();
        assert_eq!(func_names(&module), ["send-receive"]);
    }

    #[test]
    fn func_as_a_segment() {
        let module = parse("func-table : func(func: u32)").unwrap();
        let func = module.funcs().next().unwrap();
        assert_eq!(func.name.name, "func-table");
        assert_eq!(func.params[0].name.name, "func");
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert!(parse("a--b : func()").is_err());
        assert!(parse("-a : func()").is_err());
        assert!(parse("a- : func()").is_err());
        assert!(parse("f : func(x-: u8)").is_err());
    }

    #[test]
    fn missing_close_paren() {
        let error = parse("f : func(x: u8").unwrap_err();
        assert!(matches!(error, ParseMessage::UnrecognizedEof { .. }));
        assert_eq!(error.range(), ByteRange::new(0, 14, 14));
    }

    #[test]
    fn missing_return_type() {
        let error = parse("f : func() ->").unwrap_err();
        assert!(matches!(error, ParseMessage::UnrecognizedEof { .. }));
    }

    #[test]
    fn type_must_be_a_single_name() {
        assert!(parse("f : func(x: u-8)").is_err());
    }

    #[test]
    fn invalid_character() {
        let error = parse("f : func(x: u8) ; g : func()").unwrap_err();
        assert_eq!(
            error,
            ParseMessage::Lexer(lexer::Error::UnexpectedCharacter {
                range: ByteRange::new(0, 16, 17),
            }),
        );
    }

    #[test]
    fn block_comments_between_declarations() {
        let module = parse(
            "
            /* Message passing
             * between processes.
             */
            create-data : func(tag: s64, /* bytes */ capacity: u64)
            /**/ get-tag : func() -> s64 /* trailing */
            ",
        )
        .unwrap();
        assert_eq!(func_names(&module), ["create-data", "get-tag"]);
        assert_eq!(module.funcs().next().unwrap().params.len(), 2);
    }

    #[test]
    fn unclosed_block_comment() {
        let error = parse("f : func() /* never closed\ng : func()").unwrap_err();
        assert!(matches!(
            error,
            ParseMessage::Lexer(lexer::Error::UnclosedBlockComment(_))
        ));
        assert_eq!(error.range(), ByteRange::new(0, 11, 13));
        assert_eq!(error.to_diagnostic().message, "unclosed block comment");
    }

    #[test]
    fn arrow_may_be_split() {
        let module = parse("f : func() - > u32\ng : func() -\n> u64").unwrap();
        let rets: Vec<_> = (module.funcs())
            .map(|func| func.ret.as_ref().map(|ret| ret.type_.name.as_str()))
            .collect();
        assert_eq!(rets, [Some("u32"), Some("u64")]);
    }

    #[test]
    fn unicode_names() {
        let module = parse("café : func(größe: u8)").unwrap();
        let func = module.funcs().next().unwrap();
        assert_eq!(func.name.name, "café");
        assert_eq!(func.params[0].name.name, "größe");
    }

    #[test]
    fn types_are_not_checked_while_parsing() {
        let module = parse("f : func(x: u128)").unwrap();
        let func = module.funcs().next().unwrap();
        assert_eq!(func.params[0].type_.name, "u128");
    }

    #[test]
    fn ranges_carry_the_file_id() {
        let module = Module::parse(3, "f : func()").unwrap();
        assert_eq!(module.file_id, 3);
        assert_eq!(module.items[0].range(), ByteRange::new(3, 0, 10));
    }

    #[test]
    fn expected_tokens_are_listed() {
        let error = parse("f func()").unwrap_err();
        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.message, "unexpected token func");
        assert_eq!(diagnostic.notes.len(), 1);
        assert!(diagnostic.notes[0].starts_with("expected "));
    }
}
