//! ICU MessageFormat pattern parser.
//!
//! Produces a flattened part sequence modeled on ICU's `MessagePattern`:
//! every argument (top-level or nested inside plural/select/choice
//! sub-messages) contributes an `ArgStart`, its identifier part, and (for
//! simple args) the sub-format keyword. Literal text is never materialized;
//! downstream only needs the argument structure.
//!
//! Quoting follows ICU's DOUBLE_OPTIONAL rules: `''` is a literal
//! apostrophe, `'` before a syntax char (`{` `}` `#` `|`) opens a quoted run
//! ended by the next lone apostrophe, and an unterminated quote silently
//! quotes the rest of the message.

use thiserror::Error;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Argument category, per ICU `MessagePattern.ArgType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// Plain substitution: `{0}` or `{name}`.
    None,
    /// Keyword-formatted: `{x, number}`, `{x, date, short}`, anything that
    /// is not one of the complex forms below.
    Simple,
    Choice,
    Plural,
    Select,
    SelectOrdinal,
}

/// One entry of the flattened part sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    MsgStart,
    MsgLimit,
    ArgStart(ArgType),
    /// Identifier of the preceding `ArgStart`, exactly one of these two.
    ArgName(String),
    ArgNumber(u32),
    /// Sub-format keyword of a simple arg, verbatim.
    ArgKeyword(String),
    /// Branch label of a plural/select body, or the limit of a choice branch.
    ArgSelector(String),
    ArgLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("unmatched '{{' opened at byte {0}")]
    UnmatchedOpenBrace(usize),
    #[error("unmatched '}}' at byte {0}")]
    UnmatchedCloseBrace(usize),
    #[error("empty argument at byte {0}")]
    EmptyArgument(usize),
    #[error("bad argument name {0:?} at byte {1}")]
    BadIdentifier(String, usize),
    #[error("bad argument number {0:?} at byte {1}")]
    BadArgNumber(String, usize),
    #[error("malformed {kind} at byte {at}")]
    MalformedBody { kind: &'static str, at: usize },
}

/// Parsed pattern: the flattened parts plus the named/numbered flags ICU
/// exposes, so callers can early-out on argument-free patterns.
#[derive(Debug, Clone)]
pub struct MessagePattern {
    parts: Vec<Part>,
    has_named: bool,
    has_numbered: bool,
}

impl MessagePattern {
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let mut parser = Parser {
            src: text,
            pos: 0,
            parts: Vec::new(),
            has_named: false,
            has_numbered: false,
        };
        parser.parse_message(Ctx::Top)?;
        Ok(MessagePattern {
            parts: parser.parts,
            has_named: parser.has_named,
            has_numbered: parser.has_numbered,
        })
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn has_named_arguments(&self) -> bool {
        self.has_named
    }

    pub fn has_numbered_arguments(&self) -> bool {
        self.has_numbered
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PARSER
// ————————————————————————————————————————————————————————————————————————————

/// What kind of message body is being parsed, i.e. which terminators are
/// legal where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    /// Whole pattern; ends only at end of input.
    Top,
    /// Brace-wrapped sub-message of a plural/select branch.
    Sub,
    /// Choice branch; ends at `|` (next branch) or `}` (end of arg).
    Choice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ender {
    End,
    Brace,
    Pipe,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    parts: Vec<Part>,
    has_named: bool,
    has_numbered: bool,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Consume an identifier-ish run: everything up to whitespace or one of
    /// the arg syntax chars.
    fn take_word(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if !c.is_whitespace() && !matches!(c, '{' | '}' | ',')) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn parse_message(&mut self, ctx: Ctx) -> Result<Ender, PatternError> {
        self.parts.push(Part::MsgStart);
        loop {
            match self.peek() {
                None => {
                    if ctx == Ctx::Top {
                        self.parts.push(Part::MsgLimit);
                        return Ok(Ender::End);
                    }
                    return Err(PatternError::UnmatchedOpenBrace(self.pos));
                }
                Some('{') => self.parse_arg()?,
                Some('}') => {
                    if ctx == Ctx::Top {
                        return Err(PatternError::UnmatchedCloseBrace(self.pos));
                    }
                    self.bump();
                    self.parts.push(Part::MsgLimit);
                    return Ok(Ender::Brace);
                }
                Some('|') if ctx == Ctx::Choice => {
                    self.bump();
                    self.parts.push(Part::MsgLimit);
                    return Ok(Ender::Pipe);
                }
                Some('\'') => self.skip_apostrophe(),
                Some(_) => {
                    // literal text, including '#' (inert for tokenization)
                    self.bump();
                }
            }
        }
    }

    /// Apostrophe per DOUBLE_OPTIONAL: `''` → literal, `'` before a syntax
    /// char opens a quoted run, otherwise plain text.
    fn skip_apostrophe(&mut self) {
        self.bump();
        match self.peek() {
            Some('\'') => {
                self.bump();
            }
            Some('{' | '}' | '#' | '|') => {
                self.bump();
                loop {
                    match self.bump() {
                        // unterminated quote: the rest of the message is quoted
                        None => return,
                        Some('\'') => {
                            if self.peek() == Some('\'') {
                                self.bump();
                            } else {
                                return;
                            }
                        }
                        Some(_) => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn parse_arg(&mut self) -> Result<(), PatternError> {
        let open = self.pos;
        self.bump(); // '{'
        self.skip_ws();
        let id_at = self.pos;
        let word = self.take_word();
        if word.is_empty() {
            return Err(PatternError::EmptyArgument(id_at));
        }
        let identifier = classify_identifier(&word, id_at)?;
        self.skip_ws();
        match self.peek() {
            Some('}') => {
                self.bump();
                self.parts.push(Part::ArgStart(ArgType::None));
                self.push_identifier(identifier);
                self.parts.push(Part::ArgLimit);
                Ok(())
            }
            Some(',') => {
                self.bump();
                self.skip_ws();
                let kw_at = self.pos;
                let keyword = self.take_word();
                if keyword.is_empty() {
                    return Err(PatternError::MalformedBody { kind: "argument type", at: kw_at });
                }
                self.skip_ws();
                // complex-form keywords are case-sensitive, like ICU
                match keyword.as_str() {
                    "choice" => {
                        self.parts.push(Part::ArgStart(ArgType::Choice));
                        self.push_identifier(identifier);
                        self.expect_comma()?;
                        self.parse_choice_body()?;
                    }
                    "plural" => {
                        self.parts.push(Part::ArgStart(ArgType::Plural));
                        self.push_identifier(identifier);
                        self.expect_comma()?;
                        self.parse_plural_body(open, true)?;
                    }
                    "selectordinal" => {
                        self.parts.push(Part::ArgStart(ArgType::SelectOrdinal));
                        self.push_identifier(identifier);
                        self.expect_comma()?;
                        self.parse_plural_body(open, true)?;
                    }
                    "select" => {
                        self.parts.push(Part::ArgStart(ArgType::Select));
                        self.push_identifier(identifier);
                        self.expect_comma()?;
                        self.parse_plural_body(open, false)?;
                    }
                    _ => {
                        self.parts.push(Part::ArgStart(ArgType::Simple));
                        self.push_identifier(identifier);
                        self.parts.push(Part::ArgKeyword(keyword));
                        self.finish_simple(open)?;
                    }
                }
                self.parts.push(Part::ArgLimit);
                Ok(())
            }
            _ => Err(PatternError::UnmatchedOpenBrace(open)),
        }
    }

    fn push_identifier(&mut self, identifier: Part) {
        match &identifier {
            Part::ArgName(_) => self.has_named = true,
            Part::ArgNumber(_) => self.has_numbered = true,
            _ => {}
        }
        self.parts.push(identifier);
    }

    /// The comma between a complex-form keyword and its body.
    fn expect_comma(&mut self) -> Result<(), PatternError> {
        if self.peek() != Some(',') {
            return Err(PatternError::MalformedBody { kind: "argument body", at: self.pos });
        }
        self.bump();
        Ok(())
    }

    /// Simple arg after the keyword: either `}` right away or `, style}`
    /// where the style text is skipped with brace balancing and quoting.
    fn finish_simple(&mut self, open: usize) -> Result<(), PatternError> {
        match self.peek() {
            Some('}') => {
                self.bump();
                Ok(())
            }
            Some(',') => {
                self.bump();
                self.skip_style(open)
            }
            _ => Err(PatternError::MalformedBody { kind: "simple argument", at: self.pos }),
        }
    }

    fn skip_style(&mut self, open: usize) -> Result<(), PatternError> {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(PatternError::UnmatchedOpenBrace(open)),
                Some('\'') => self.skip_apostrophe(),
                Some('{') => {
                    depth += 1;
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Body of plural/selectordinal (`allow_offset`) and select: an optional
    /// `offset:n`, then one or more `selector {message}` pairs.
    fn parse_plural_body(&mut self, open: usize, allow_offset: bool) -> Result<(), PatternError> {
        let mut first = true;
        let mut saw_selector = false;
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(PatternError::UnmatchedOpenBrace(open)),
                Some('}') => {
                    let at = self.pos;
                    self.bump();
                    if !saw_selector {
                        return Err(PatternError::MalformedBody { kind: "selector list", at });
                    }
                    return Ok(());
                }
                _ => {}
            }
            let sel_at = self.pos;
            let selector = self.take_word();
            if selector.is_empty() {
                return Err(PatternError::MalformedBody { kind: "selector", at: sel_at });
            }
            if first && allow_offset && selector.starts_with("offset:") {
                first = false;
                let tail = &selector["offset:".len()..];
                if tail.is_empty() {
                    self.skip_ws();
                    let num_at = self.pos;
                    let num = self.take_word();
                    if num.parse::<f64>().is_err() {
                        return Err(PatternError::MalformedBody {
                            kind: "plural offset",
                            at: num_at,
                        });
                    }
                } else if tail.parse::<f64>().is_err() {
                    return Err(PatternError::MalformedBody { kind: "plural offset", at: sel_at });
                }
                continue;
            }
            first = false;
            saw_selector = true;
            self.parts.push(Part::ArgSelector(selector));
            self.skip_ws();
            if self.peek() != Some('{') {
                return Err(PatternError::MalformedBody {
                    kind: "selector message",
                    at: self.pos,
                });
            }
            self.bump();
            self.parse_message(Ctx::Sub)?;
        }
    }

    /// Choice body: `limit ⋄ message | limit ⋄ message | …` where ⋄ is one of
    /// `#`, `<`, `≤` and messages may nest further args.
    fn parse_choice_body(&mut self) -> Result<(), PatternError> {
        loop {
            self.skip_ws();
            let num_at = self.pos;
            let limit = self.take_choice_limit();
            if limit.is_empty() || !is_choice_number(&limit) {
                return Err(PatternError::MalformedBody { kind: "choice limit", at: num_at });
            }
            self.parts.push(Part::ArgSelector(limit));
            self.skip_ws();
            match self.peek() {
                Some('#' | '<' | '\u{2264}') => {
                    self.bump();
                }
                _ => {
                    return Err(PatternError::MalformedBody {
                        kind: "choice separator",
                        at: self.pos,
                    });
                }
            }
            match self.parse_message(Ctx::Choice)? {
                Ender::Pipe => continue,
                _ => return Ok(()),
            }
        }
    }

    fn take_choice_limit(&mut self) -> String {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if !c.is_whitespace() && !matches!(c, '#' | '<' | '\u{2264}' | '{' | '}' | '|')
        ) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }
}

fn classify_identifier(word: &str, at: usize) -> Result<Part, PatternError> {
    if word.bytes().all(|b| b.is_ascii_digit()) {
        // ICU parseArgNumber: "0" is fine, leading zeros are not
        if word.len() > 1 && word.starts_with('0') {
            return Err(PatternError::BadArgNumber(word.to_string(), at));
        }
        let number = word
            .parse::<u32>()
            .map_err(|_| PatternError::BadArgNumber(word.to_string(), at))?;
        return Ok(Part::ArgNumber(number));
    }
    // names must not start with a digit
    if word.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(PatternError::BadIdentifier(word.to_string(), at));
    }
    Ok(Part::ArgName(word.to_string()))
}

fn is_choice_number(word: &str) -> bool {
    let rest = word.strip_prefix('-').unwrap_or(word);
    rest == "\u{221E}" || rest.parse::<f64>().is_ok()
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    fn arg_idents(pattern: &str) -> Vec<Part> {
        let parsed = MessagePattern::parse(pattern).unwrap();
        let parts = parsed.parts();
        parts
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p, Part::ArgStart(_)))
            .map(|(i, _)| parts[i + 1].clone())
            .collect()
    }

    #[test]
    fn plain_text_has_no_args() {
        let p = MessagePattern::parse("hello world").unwrap();
        assert!(!p.has_named_arguments());
        assert!(!p.has_numbered_arguments());
        assert_eq!(p.parts(), &[Part::MsgStart, Part::MsgLimit]);
    }

    #[test]
    fn named_and_numbered_args() {
        let p = MessagePattern::parse("{greeting}, user {0}!").unwrap();
        assert!(p.has_named_arguments());
        assert!(p.has_numbered_arguments());
        assert_eq!(
            arg_idents("{greeting}, user {0}!"),
            vec![Part::ArgName("greeting".into()), Part::ArgNumber(0)]
        );
    }

    #[test]
    fn simple_arg_keeps_keyword_and_skips_style() {
        let p = MessagePattern::parse("due {when, date, MMM d, yyyy}").unwrap();
        assert_eq!(
            p.parts(),
            &[
                Part::MsgStart,
                Part::ArgStart(ArgType::Simple),
                Part::ArgName("when".into()),
                Part::ArgKeyword("date".into()),
                Part::ArgLimit,
                Part::MsgLimit,
            ]
        );
    }

    #[test]
    fn plural_nests_inner_args() {
        let idents = arg_idents("{count, plural, one {{name} has # item} other {# items}}");
        assert_eq!(idents, vec![Part::ArgName("count".into()), Part::ArgName("name".into())]);
    }

    #[test]
    fn plural_offset_is_accepted() {
        let idents = arg_idents("{n, plural, offset:1 one {you} other {# others}}");
        assert_eq!(idents, vec![Part::ArgName("n".into())]);
    }

    #[test]
    fn selectordinal_and_select_parse() {
        assert_eq!(
            arg_idents("{rank, selectordinal, one {#st} two {#nd} other {#th}}"),
            vec![Part::ArgName("rank".into())]
        );
        assert_eq!(
            arg_idents("{who, select, male {him} female {her} other {them}}"),
            vec![Part::ArgName("who".into())]
        );
    }

    #[test]
    fn choice_branches_and_nested_args() {
        let idents = arg_idents("{0, choice, 0#no {thing}|1#one|1<many}");
        assert_eq!(idents, vec![Part::ArgNumber(0), Part::ArgName("thing".into())]);
    }

    #[test]
    fn quoting_hides_syntax_chars() {
        // quoted braces are literal text, doubled apostrophe is literal
        let p = MessagePattern::parse("literal '{' and '' done").unwrap();
        assert_eq!(p.parts(), &[Part::MsgStart, Part::MsgLimit]);
        // unterminated quote swallows the rest, including a would-be arg
        let p = MessagePattern::parse("'{oops {name}").unwrap();
        assert!(!p.has_named_arguments());
    }

    #[test]
    fn leading_zero_arg_number_is_rejected() {
        let err = MessagePattern::parse("{01}").unwrap_err();
        assert!(matches!(err, PatternError::BadArgNumber(_, _)));
    }

    #[test]
    fn name_starting_with_digit_is_rejected() {
        let err = MessagePattern::parse("{1abc}").unwrap_err();
        assert!(matches!(err, PatternError::BadIdentifier(_, _)));
    }

    #[test]
    fn unmatched_braces_are_errors() {
        assert!(matches!(
            MessagePattern::parse("{name").unwrap_err(),
            PatternError::UnmatchedOpenBrace(_)
        ));
        assert!(matches!(
            MessagePattern::parse("oops}").unwrap_err(),
            PatternError::UnmatchedCloseBrace(_)
        ));
    }

    #[test]
    fn empty_selector_list_is_an_error() {
        assert!(matches!(
            MessagePattern::parse("{n, plural,}").unwrap_err(),
            PatternError::MalformedBody { .. }
        ));
    }

    #[test]
    fn whitespace_around_identifier_is_tolerated() {
        assert_eq!(
            arg_idents("{ count , number }"),
            vec![Part::ArgName("count".into())]
        );
    }
}
