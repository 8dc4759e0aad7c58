use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Diagnostic, DiagnosticKind};
use crate::intern::{Interner, Symbol};
use crate::source::Position;
use crate::token::{keyword_kind, Token, TokenKind};

/// A `#define` entry. `params` is `None` for object-like macros; function-like
/// macros record their parameter list and variadic marker but their uses are
/// not expanded (full preprocessing is out of scope).
#[derive(Debug, Clone)]
pub struct MacroDefinition {
    pub name: Symbol,
    pub params: Option<Vec<Symbol>>,
    pub variadic: bool,
    pub replacement: Vec<Token>,
}

/// State shared across the whole include tree of one translation unit:
/// search paths, the macro table, and the flag that disables expansion while
/// a definition's replacement list is being collected.
#[derive(Debug, Default)]
pub struct LexerContext {
    pub user_include_paths: Vec<PathBuf>,
    pub system_include_paths: Vec<PathBuf>,
    pub macros: HashMap<Symbol, MacroDefinition>,
    pub expansion_disabled: bool,
}

/// Built-in system include directories, appended by the driver after any
/// explicitly configured paths.
pub const DEFAULT_SYSTEM_INCLUDE_PATHS: &[&str] = &["/usr/local/include", "/usr/include"];

impl LexerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_paths(user: Vec<PathBuf>, system: Vec<PathBuf>) -> Self {
        LexerContext {
            user_include_paths: user,
            system_include_paths: system,
            ..Self::default()
        }
    }
}

/// Character-level scanner for one file. `#include` pushes a child lexer;
/// `scan` drains the child until its EOF, then resumes the parent. Tokens are
/// produced one at a time and never retracted.
pub struct Lexer {
    path: Symbol,
    dir: PathBuf,
    bytes: Vec<u8>,
    offset: usize,
    line: u32,
    column: u32,
    /// False once a token or directive has been seen on the current line;
    /// `#` only starts a directive while this is true.
    at_line_start: bool,
    child: Option<Box<Lexer>>,
    pending: VecDeque<Token>,
}

impl Lexer {
    pub fn from_file(path: &Path, interner: &mut Interner) -> io::Result<Self> {
        let source = fs::read_to_string(path)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::new(source, interner.intern(&path.to_string_lossy()), dir))
    }

    pub fn from_source(source: &str, path_name: &str, interner: &mut Interner) -> Self {
        Self::new(source.to_string(), interner.intern(path_name), PathBuf::from("."))
    }

    fn new(source: String, path: Symbol, dir: PathBuf) -> Self {
        Lexer {
            path,
            dir,
            bytes: source.into_bytes(),
            offset: 0,
            line: 1,
            column: 1,
            at_line_start: true,
            child: None,
            pending: VecDeque::new(),
        }
    }

    pub fn pos(&self) -> Position {
        Position::new(self.path, self.line, self.column)
    }

    /// Observe the n-th upcoming character without consuming it.
    pub fn peek(&self, n: usize) -> Option<char> {
        self.bytes.get(self.offset + n).map(|&b| b as char)
    }

    fn at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.offset += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
            self.at_line_start = true;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek(0) == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Produce the next token. At EOF the same token is returned on every
    /// call without advancing.
    pub fn scan(
        &mut self,
        ctx: &mut LexerContext,
        interner: &mut Interner,
        diags: &mut Vec<Diagnostic>,
    ) -> Token {
        loop {
            if let Some(tok) = self.pending.pop_front() {
                return tok;
            }

            if let Some(child) = self.child.as_mut() {
                let tok = child.scan(ctx, interner, diags);
                if tok.kind == TokenKind::Eof {
                    self.child = None;
                    continue;
                }
                return tok;
            }

            self.skip_whitespace_and_comments(diags);

            if self.at_end() {
                return Token::new(TokenKind::Eof, Symbol::EMPTY, self.pos());
            }

            if self.peek(0) == Some('#') && self.at_line_start {
                self.handle_directive(ctx, interner, diags);
                continue;
            }

            match self.lex_token_here(ctx, interner, diags) {
                Some(tok) => {
                    self.at_line_start = false;
                    return tok;
                }
                // a macro expansion filled the pending queue, or a stray
                // character was consumed; go around again
                None => continue,
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self, diags: &mut Vec<Diagnostic>) {
        loop {
            match self.peek(0) {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.bump();
                }
                Some('/') if self.peek(1) == Some('/') => {
                    while let Some(c) = self.peek(0) {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek(1) == Some('*') => {
                    let start = self.pos();
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while !self.at_end() {
                        if self.peek(0) == Some('*') && self.peek(1) == Some('/') {
                            self.bump();
                            self.bump();
                            closed = true;
                            break;
                        }
                        self.bump();
                    }
                    if !closed {
                        diags.push(Diagnostic::new(DiagnosticKind::UnterminatedBlockComment, start));
                    }
                }
                _ => return,
            }
        }
    }

    /// Scan exactly one token starting at the current (non-whitespace)
    /// character. Returns `None` when an object-like macro was expanded into
    /// the pending queue instead of yielding a token directly.
    fn lex_token_here(
        &mut self,
        ctx: &mut LexerContext,
        interner: &mut Interner,
        diags: &mut Vec<Diagnostic>,
    ) -> Option<Token> {
        let start = self.pos();
        let c = self.peek(0).unwrap();

        if c == '_' || c.is_ascii_alphabetic() {
            return self.lex_identifier(ctx, interner, start);
        }
        if c.is_ascii_digit() || (c == '.' && self.peek(1).is_some_and(|d| d.is_ascii_digit())) {
            return Some(self.lex_number(interner, start));
        }
        if c == '\'' {
            return Some(self.lex_char_literal(interner, diags, start));
        }
        if c == '"' {
            return Some(self.lex_string_literal(interner, diags, start));
        }
        self.lex_punctuator(diags, start)
    }

    fn lex_identifier(
        &mut self,
        ctx: &mut LexerContext,
        interner: &mut Interner,
        start: Position,
    ) -> Option<Token> {
        let begin = self.offset;
        while let Some(c) = self.peek(0) {
            if c == '_' || c.is_ascii_alphanumeric() {
                self.bump();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.bytes[begin..self.offset]).unwrap_or("");
        let sym = interner.intern(text);

        if let Some(kind) = keyword_kind(text) {
            return Some(Token::new(kind, sym, start));
        }

        if !ctx.expansion_disabled {
            if let Some(def) = ctx.macros.get(&sym) {
                if def.params.is_none() {
                    // drain the replacement through the pending queue before
                    // resuming character-level scanning
                    self.pending.extend(def.replacement.iter().copied());
                    self.at_line_start = false;
                    return None;
                }
            }
        }

        Some(Token::new(TokenKind::Identifier, sym, start))
    }

    fn lex_number(&mut self, interner: &mut Interner, start: Position) -> Token {
        let begin = self.offset;
        let is_hex = self.peek(0) == Some('0') && matches!(self.peek(1), Some('x') | Some('X'));
        let mut has_dot = false;
        let mut has_exponent = false;
        let mut prev = 0u8;

        while let Some(c) = self.peek(0) {
            let is_exp_char = if is_hex {
                c == 'p' || c == 'P'
            } else {
                c == 'e' || c == 'E'
            };
            if c.is_ascii_alphanumeric() {
                if is_exp_char {
                    has_exponent = true;
                }
                prev = c as u8;
                self.bump();
            } else if c == '.' {
                has_dot = true;
                prev = b'.';
                self.bump();
            } else if (c == '+' || c == '-')
                && matches!(prev, b'e' | b'E' if !is_hex)
            {
                prev = c as u8;
                self.bump();
            } else if (c == '+' || c == '-') && is_hex && matches!(prev, b'p' | b'P') {
                prev = c as u8;
                self.bump();
            } else {
                break;
            }
        }

        let text = std::str::from_utf8(&self.bytes[begin..self.offset]).unwrap_or("");
        let kind = if has_dot || has_exponent {
            TokenKind::FloatingConstant
        } else {
            TokenKind::IntegerConstant
        };
        Token::new(kind, interner.intern(text), start)
    }

    fn lex_char_literal(
        &mut self,
        interner: &mut Interner,
        diags: &mut Vec<Diagnostic>,
        start: Position,
    ) -> Token {
        let begin = self.offset;
        self.bump(); // opening quote
        let mut closed = false;
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.bump();
            if c == '\\' {
                self.bump();
            } else if c == '\'' {
                closed = true;
                break;
            }
        }
        if !closed {
            diags.push(Diagnostic::new(DiagnosticKind::UnterminatedCharLiteral, start));
        }
        let text = std::str::from_utf8(&self.bytes[begin..self.offset]).unwrap_or("");
        Token::new(TokenKind::CharLiteral, interner.intern(text), start)
    }

    fn lex_string_literal(
        &mut self,
        interner: &mut Interner,
        diags: &mut Vec<Diagnostic>,
        start: Position,
    ) -> Token {
        let begin = self.offset;
        self.bump(); // opening quote
        let mut closed = false;
        while let Some(c) = self.peek(0) {
            self.bump();
            if c == '\\' {
                self.bump();
            } else if c == '"' {
                closed = true;
                break;
            }
        }
        if !closed {
            diags.push(Diagnostic::new(DiagnosticKind::UnterminatedStringLiteral, start));
        }
        let text = std::str::from_utf8(&self.bytes[begin..self.offset]).unwrap_or("");
        Token::new(TokenKind::StringLiteral, interner.intern(text), start)
    }

    /// Longest-match over the punctuator set. Returns `None` after consuming
    /// and diagnosing a stray character.
    fn lex_punctuator(&mut self, diags: &mut Vec<Diagnostic>, start: Position) -> Option<Token> {
        use TokenKind::*;

        let three = [self.peek(0), self.peek(1), self.peek(2)];
        let kind3 = match three {
            [Some('<'), Some('<'), Some('=')] => Some(ShlAssign),
            [Some('>'), Some('>'), Some('=')] => Some(ShrAssign),
            [Some('.'), Some('.'), Some('.')] => Some(Ellipsis),
            _ => None,
        };
        if let Some(kind) = kind3 {
            self.bump();
            self.bump();
            self.bump();
            return Some(Token::new(kind, Symbol::EMPTY, start));
        }

        let two = [self.peek(0), self.peek(1)];
        let kind2 = match two {
            [Some('<'), Some('<')] => Some(Shl),
            [Some('>'), Some('>')] => Some(Shr),
            [Some('<'), Some('=')] => Some(LtEq),
            [Some('>'), Some('=')] => Some(GtEq),
            [Some('='), Some('=')] => Some(EqEq),
            [Some('!'), Some('=')] => Some(BangEq),
            [Some('&'), Some('&')] => Some(AmpAmp),
            [Some('|'), Some('|')] => Some(PipePipe),
            [Some('+'), Some('+')] => Some(PlusPlus),
            [Some('-'), Some('-')] => Some(MinusMinus),
            [Some('-'), Some('>')] => Some(Arrow),
            [Some('+'), Some('=')] => Some(PlusAssign),
            [Some('-'), Some('=')] => Some(MinusAssign),
            [Some('*'), Some('=')] => Some(StarAssign),
            [Some('/'), Some('=')] => Some(SlashAssign),
            [Some('%'), Some('=')] => Some(PercentAssign),
            [Some('&'), Some('=')] => Some(AmpAssign),
            [Some('^'), Some('=')] => Some(CaretAssign),
            [Some('|'), Some('=')] => Some(PipeAssign),
            [Some('#'), Some('#')] => Some(HashHash),
            _ => None,
        };
        if let Some(kind) = kind2 {
            self.bump();
            self.bump();
            return Some(Token::new(kind, Symbol::EMPTY, start));
        }

        let kind1 = match self.peek(0) {
            Some('=') => Some(Assign),
            Some('&') => Some(Amp),
            Some('|') => Some(Pipe),
            Some('^') => Some(Caret),
            Some('~') => Some(Tilde),
            Some('!') => Some(Bang),
            Some(';') => Some(Semicolon),
            Some(',') => Some(Comma),
            Some(':') => Some(Colon),
            Some('(') => Some(LParen),
            Some(')') => Some(RParen),
            Some('{') => Some(LBrace),
            Some('}') => Some(RBrace),
            Some('[') => Some(LBracket),
            Some(']') => Some(RBracket),
            Some('.') => Some(Dot),
            Some('+') => Some(Plus),
            Some('-') => Some(Minus),
            Some('*') => Some(Star),
            Some('/') => Some(Slash),
            Some('%') => Some(Percent),
            Some('<') => Some(Lt),
            Some('>') => Some(Gt),
            Some('?') => Some(Question),
            Some('#') => Some(Hash),
            _ => None,
        };
        if let Some(kind) = kind1 {
            self.bump();
            return Some(Token::new(kind, Symbol::EMPTY, start));
        }

        // Unknown byte: diagnose and consume it; scanning resumes at the next
        // character so the parser never sees it.
        let c = self.bump().unwrap_or('\0');
        diags.push(Diagnostic::new(DiagnosticKind::StrayCharacter(c), start));
        None
    }

    // ------------------------------------------------------------------
    // Preprocessor directives
    // ------------------------------------------------------------------

    fn skip_blanks_in_line(&mut self) {
        while matches!(self.peek(0), Some(' ') | Some('\t') | Some('\r')) {
            self.bump();
        }
    }

    fn skip_to_end_of_line(&mut self) {
        while let Some(c) = self.peek(0) {
            self.bump();
            if c == '\n' {
                break;
            }
        }
    }

    fn read_word(&mut self) -> String {
        let begin = self.offset;
        while let Some(c) = self.peek(0) {
            if c == '_' || c.is_ascii_alphanumeric() {
                self.bump();
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.bytes[begin..self.offset]).into_owned()
    }

    fn handle_directive(
        &mut self,
        ctx: &mut LexerContext,
        interner: &mut Interner,
        diags: &mut Vec<Diagnostic>,
    ) {
        let start = self.pos();
        self.bump(); // '#'
        self.at_line_start = false;
        self.skip_blanks_in_line();

        if self.peek(0) == Some('\n') || self.at_end() {
            // null directive
            self.skip_to_end_of_line();
            return;
        }

        let name = self.read_word();
        match name.as_str() {
            "include" => self.handle_include(ctx, interner, diags, start),
            "define" => self.handle_define(ctx, interner, diags, start),
            "undef" => {
                self.skip_blanks_in_line();
                let name = self.read_word();
                if name.is_empty() {
                    diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
                } else if let Some(sym) = interner.lookup(&name) {
                    ctx.macros.remove(&sym);
                }
                self.skip_to_end_of_line();
            }
            "ifdef" => {
                // recognized but carries no conditional-inclusion semantics
                self.skip_to_end_of_line();
            }
            "line" => self.handle_line(interner, diags, start),
            _ => {
                diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
                self.skip_to_end_of_line();
            }
        }
    }

    fn handle_include(
        &mut self,
        ctx: &mut LexerContext,
        interner: &mut Interner,
        diags: &mut Vec<Diagnostic>,
        start: Position,
    ) {
        self.skip_blanks_in_line();
        let (name, quoted) = match self.peek(0) {
            Some('<') => {
                self.bump();
                let mut name = String::new();
                loop {
                    match self.peek(0) {
                        Some('>') => {
                            self.bump();
                            break;
                        }
                        Some('\n') | None => {
                            diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
                            self.skip_to_end_of_line();
                            return;
                        }
                        Some(c) => {
                            name.push(c);
                            self.bump();
                        }
                    }
                }
                (name, false)
            }
            Some('"') => {
                self.bump();
                let mut name = String::new();
                loop {
                    match self.peek(0) {
                        Some('"') => {
                            self.bump();
                            break;
                        }
                        Some('\n') | None => {
                            diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
                            self.skip_to_end_of_line();
                            return;
                        }
                        Some(c) => {
                            name.push(c);
                            self.bump();
                        }
                    }
                }
                (name, true)
            }
            _ => {
                diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
                self.skip_to_end_of_line();
                return;
            }
        };
        self.skip_to_end_of_line();

        match self.resolve_include(ctx, &name, quoted) {
            Some(resolved) => match fs::read_to_string(&resolved) {
                Ok(source) => {
                    let path_sym = interner.intern(&resolved.to_string_lossy());
                    let dir = resolved
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from("."));
                    self.child = Some(Box::new(Lexer::new(source, path_sym, dir)));
                }
                Err(_) => {
                    let sym = interner.intern(&name);
                    diags.push(Diagnostic::new(DiagnosticKind::IncludeNotFound { name: sym }, start));
                }
            },
            None => {
                let sym = interner.intern(&name);
                diags.push(Diagnostic::new(DiagnosticKind::IncludeNotFound { name: sym }, start));
            }
        }
    }

    /// Search order: the including file's directory (quoted form only), then
    /// user paths, then system paths (the driver appends the built-in
    /// defaults to the system list).
    fn resolve_include(&self, ctx: &LexerContext, name: &str, quoted: bool) -> Option<PathBuf> {
        if quoted {
            let local = self.dir.join(name);
            if local.is_file() {
                return Some(local);
            }
        }
        for dir in ctx.user_include_paths.iter().chain(ctx.system_include_paths.iter()) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    fn handle_define(
        &mut self,
        ctx: &mut LexerContext,
        interner: &mut Interner,
        diags: &mut Vec<Diagnostic>,
        start: Position,
    ) {
        ctx.expansion_disabled = true;
        self.skip_blanks_in_line();
        let name = self.read_word();
        if name.is_empty() {
            diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
            self.skip_to_end_of_line();
            ctx.expansion_disabled = false;
            return;
        }
        let name_sym = interner.intern(&name);

        // a parameter list only exists when '(' immediately follows the name
        let mut params = None;
        let mut variadic = false;
        if self.peek(0) == Some('(') {
            self.bump();
            let mut list = Vec::new();
            loop {
                self.skip_blanks_in_line();
                match self.peek(0) {
                    Some(')') => {
                        self.bump();
                        break;
                    }
                    Some('.') if self.peek(1) == Some('.') && self.peek(2) == Some('.') => {
                        self.bump();
                        self.bump();
                        self.bump();
                        variadic = true;
                        self.skip_blanks_in_line();
                        if !self.eat(')') {
                            diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
                            self.skip_to_end_of_line();
                            ctx.expansion_disabled = false;
                            return;
                        }
                        break;
                    }
                    Some(c) if c == '_' || c.is_ascii_alphabetic() => {
                        let param = self.read_word();
                        list.push(interner.intern(&param));
                        self.skip_blanks_in_line();
                        if !self.eat(',') && self.peek(0) != Some(')') {
                            diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
                            self.skip_to_end_of_line();
                            ctx.expansion_disabled = false;
                            return;
                        }
                    }
                    _ => {
                        diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
                        self.skip_to_end_of_line();
                        ctx.expansion_disabled = false;
                        return;
                    }
                }
            }
            params = Some(list);
        }

        // collect the replacement tokens up to the end of the line
        let mut replacement = Vec::new();
        loop {
            self.skip_blanks_in_line();
            if self.peek(0) == Some('\n') || self.at_end() {
                break;
            }
            if let Some(tok) = self.lex_token_here(ctx, interner, diags) {
                replacement.push(tok);
            }
        }
        self.skip_to_end_of_line();

        ctx.macros.insert(
            name_sym,
            MacroDefinition { name: name_sym, params, variadic, replacement },
        );
        ctx.expansion_disabled = false;
    }

    fn handle_line(
        &mut self,
        interner: &mut Interner,
        diags: &mut Vec<Diagnostic>,
        start: Position,
    ) {
        self.skip_blanks_in_line();
        let digits = self.read_word();
        let line: u32 = match digits.parse() {
            Ok(n) => n,
            Err(_) => {
                diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
                self.skip_to_end_of_line();
                return;
            }
        };
        self.skip_blanks_in_line();
        if self.peek(0) == Some('"') {
            self.bump();
            let mut name = String::new();
            while let Some(c) = self.peek(0) {
                if c == '"' || c == '\n' {
                    break;
                }
                name.push(c);
                self.bump();
            }
            if self.eat('"') {
                self.path = interner.intern(&name);
            } else {
                diags.push(Diagnostic::new(DiagnosticKind::MalformedDirective, start));
            }
        }
        self.skip_to_end_of_line();
        self.line = line;
        self.column = 1;
    }
}

// ----------------------------------------------------------------------
// Escape-sequence decoding, shared by character and string literals
// ----------------------------------------------------------------------

fn decode_escape(bytes: &[u8], i: &mut usize) -> u8 {
    let c = bytes[*i];
    *i += 1;
    match c {
        b'n' => b'\n',
        b't' => b'\t',
        b'r' => b'\r',
        b'a' => 0x07,
        b'b' => 0x08,
        b'f' => 0x0C,
        b'v' => 0x0B,
        b'0'..=b'7' => {
            let mut value = (c - b'0') as u32;
            let mut count = 1;
            while count < 3 {
                match bytes.get(*i) {
                    Some(&d @ b'0'..=b'7') => {
                        value = value * 8 + (d - b'0') as u32;
                        *i += 1;
                        count += 1;
                    }
                    _ => break,
                }
            }
            value as u8
        }
        b'x' => {
            let mut value: u32 = 0;
            while let Some(&d) = bytes.get(*i) {
                let digit = match d {
                    b'0'..=b'9' => (d - b'0') as u32,
                    b'a'..=b'f' => (d - b'a') as u32 + 10,
                    b'A'..=b'F' => (d - b'A') as u32 + 10,
                    _ => break,
                };
                value = (value * 16 + digit) & 0xFF;
                *i += 1;
            }
            value as u8
        }
        other => other,
    }
}

/// Decode a raw string-literal lexeme (including its quotes) to its byte
/// contents.
pub fn decode_string_literal(raw: &str) -> Vec<u8> {
    let bytes = raw.as_bytes();
    let inner = if bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"' {
        &bytes[1..bytes.len() - 1]
    } else if !bytes.is_empty() && bytes[0] == b'"' {
        &bytes[1..]
    } else {
        bytes
    };
    let mut out = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        let c = inner[i];
        i += 1;
        if c == b'\\' && i < inner.len() {
            out.push(decode_escape(inner, &mut i));
        } else {
            out.push(c);
        }
    }
    out
}

/// Decode a raw character-literal lexeme (including its quotes) to its value.
pub fn decode_char_literal(raw: &str) -> Option<u8> {
    let bytes = raw.as_bytes();
    let inner = if bytes.len() >= 2 && bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'' {
        &bytes[1..bytes.len() - 1]
    } else if !bytes.is_empty() && bytes[0] == b'\'' {
        &bytes[1..]
    } else {
        bytes
    };
    if inner.is_empty() {
        return None;
    }
    let mut i = 0;
    let c = inner[i];
    i += 1;
    if c == b'\\' && i < inner.len() {
        Some(decode_escape(inner, &mut i))
    } else {
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(source: &str) -> (Vec<Token>, Vec<Diagnostic>, Interner) {
        let mut interner = Interner::new();
        let mut ctx = LexerContext::new();
        let mut diags = Vec::new();
        let mut lexer = Lexer::from_source(source, "test.c", &mut interner);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.scan(&mut ctx, &mut interner, &mut diags);
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        (tokens, diags, interner)
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_are_retagged() {
        let (tokens, diags, _) = scan_all("while int _Bool");
        assert!(diags.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::While, TokenKind::Int, TokenKind::Bool, TokenKind::Eof]
        );
    }

    #[test]
    fn identifiers_keep_their_spelling() {
        let (tokens, _, interner) = scan_all("foo _bar x9");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(interner.resolve(tokens[0].lexeme), "foo");
        assert_eq!(interner.resolve(tokens[1].lexeme), "_bar");
        assert_eq!(interner.resolve(tokens[2].lexeme), "x9");
    }

    #[test]
    fn positions_are_one_based_line_and_column() {
        let (tokens, _, _) = scan_all("a\n  b");
        assert_eq!((tokens[0].pos.line, tokens[0].pos.column), (1, 1));
        assert_eq!((tokens[1].pos.line, tokens[1].pos.column), (2, 3));
    }

    #[test]
    fn punctuators_use_longest_match() {
        let (tokens, _, _) = scan_all("<<= << <= < ... . -> - >>=");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::ShlAssign,
                TokenKind::Shl,
                TokenKind::LtEq,
                TokenKind::Lt,
                TokenKind::Ellipsis,
                TokenKind::Dot,
                TokenKind::Arrow,
                TokenKind::Minus,
                TokenKind::ShrAssign,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn comments_yield_no_tokens() {
        let (tokens, diags, _) = scan_all("a // line comment\n/* block\ncomment */ b");
        assert!(diags.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
        assert_eq!(tokens[1].pos.line, 3);
    }

    #[test]
    fn unterminated_block_comment_is_diagnosed() {
        let (tokens, diags, _) = scan_all("a /* never closed");
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Eof]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnterminatedBlockComment);
    }

    #[test]
    fn integer_and_float_constants_are_distinguished() {
        let (tokens, _, _) = scan_all("42 0x1F 077 3.25 1e5 0x1.8p3 1.f");
        assert_eq!(
            kinds(&tokens)[..7],
            [
                TokenKind::IntegerConstant,
                TokenKind::IntegerConstant,
                TokenKind::IntegerConstant,
                TokenKind::FloatingConstant,
                TokenKind::FloatingConstant,
                TokenKind::FloatingConstant,
                TokenKind::FloatingConstant,
            ]
        );
    }

    #[test]
    fn integer_suffixes_stay_in_the_lexeme() {
        let (tokens, _, interner) = scan_all("10ull");
        assert_eq!(tokens[0].kind, TokenKind::IntegerConstant);
        assert_eq!(interner.resolve(tokens[0].lexeme), "10ull");
    }

    #[test]
    fn negative_exponent_is_one_float_token() {
        let (tokens, _, interner) = scan_all("1e-5 x");
        assert_eq!(tokens[0].kind, TokenKind::FloatingConstant);
        assert_eq!(interner.resolve(tokens[0].lexeme), "1e-5");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn char_literal_with_escape() {
        let (tokens, diags, interner) = scan_all(r"'\n' 'a'");
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::CharLiteral);
        assert_eq!(interner.resolve(tokens[0].lexeme), r"'\n'");
        assert_eq!(tokens[1].kind, TokenKind::CharLiteral);
    }

    #[test]
    fn unterminated_char_literal_is_best_effort() {
        let (tokens, diags, _) = scan_all("'a\nb");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnterminatedCharLiteral);
        assert_eq!(tokens[0].kind, TokenKind::CharLiteral);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn string_literal_with_escaped_quote() {
        let (tokens, diags, interner) = scan_all(r#""he said \"hi\"" x"#);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(interner.resolve(tokens[0].lexeme), r#""he said \"hi\"""#);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn unterminated_string_is_diagnosed_at_its_start() {
        let (_, diags, _) = scan_all("  \"open");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnterminatedStringLiteral);
        assert_eq!(diags[0].pos.column, 3);
    }

    #[test]
    fn stray_character_is_consumed_with_a_diagnostic() {
        let (tokens, diags, _) = scan_all("a @ b");
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0].kind, DiagnosticKind::StrayCharacter('@')));
        // both identifiers still arrive
        assert_eq!(
            kinds(&tokens)
                .iter()
                .filter(|k| **k == TokenKind::Identifier)
                .count(),
            2
        );
    }

    #[test]
    fn eof_is_idempotent() {
        let mut interner = Interner::new();
        let mut ctx = LexerContext::new();
        let mut diags = Vec::new();
        let mut lexer = Lexer::from_source("x", "test.c", &mut interner);
        lexer.scan(&mut ctx, &mut interner, &mut diags);
        let first_eof = lexer.scan(&mut ctx, &mut interner, &mut diags);
        let second_eof = lexer.scan(&mut ctx, &mut interner, &mut diags);
        assert_eq!(first_eof.kind, TokenKind::Eof);
        assert_eq!(second_eof, first_eof);
    }

    #[test]
    fn rescanning_is_deterministic() {
        let source = "int main(void) { return 0x10 + 'a'; } /* tail */";
        let (a, _, _) = scan_all(source);
        let (b, _, _) = scan_all(source);
        assert_eq!(kinds(&a), kinds(&b));
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!((x.pos.line, x.pos.column), (y.pos.line, y.pos.column));
        }
    }

    #[test]
    fn object_macro_expands_through_pending_queue() {
        let (tokens, diags, interner) = scan_all("#define N 42\nint x = N;");
        assert!(diags.is_empty());
        let kinds = kinds(&tokens);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::IntegerConstant,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
        assert_eq!(interner.resolve(tokens[3].lexeme), "42");
    }

    #[test]
    fn macro_with_multi_token_replacement() {
        let (tokens, _, _) = scan_all("#define PAIR 1 + 2\nPAIR;");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::IntegerConstant,
                TokenKind::Plus,
                TokenKind::IntegerConstant,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn empty_macro_expands_to_nothing() {
        let (tokens, _, _) = scan_all("#define NOTHING\nNOTHING x");
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn undef_removes_the_definition() {
        let (tokens, _, _) = scan_all("#define N 1\n#undef N\nN");
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn function_like_definition_is_recorded_but_not_expanded() {
        let mut interner = Interner::new();
        let mut ctx = LexerContext::new();
        let mut diags = Vec::new();
        let mut lexer = Lexer::from_source("#define MAX(a, b) a\nMAX", "t.c", &mut interner);
        let tok = lexer.scan(&mut ctx, &mut interner, &mut diags);
        assert_eq!(tok.kind, TokenKind::Identifier);

        let max = interner.lookup("MAX").unwrap();
        let def = ctx.macros.get(&max).unwrap();
        let params = def.params.as_ref().unwrap();
        assert_eq!(params.len(), 2);
        assert!(!def.variadic);
    }

    #[test]
    fn variadic_macro_sets_the_flag() {
        let mut interner = Interner::new();
        let mut ctx = LexerContext::new();
        let mut diags = Vec::new();
        let mut lexer = Lexer::from_source("#define LOG(fmt, ...) fmt\n1", "t.c", &mut interner);
        lexer.scan(&mut ctx, &mut interner, &mut diags);
        let log = interner.lookup("LOG").unwrap();
        assert!(ctx.macros.get(&log).unwrap().variadic);
    }

    #[test]
    fn define_does_not_expand_inside_its_own_replacement() {
        let (tokens, _, _) = scan_all("#define A 1\n#define B A\nB");
        // B's replacement captured the identifier A, not A's expansion;
        // draining B therefore yields the token A unexpanded
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn hash_not_at_line_start_is_a_plain_token() {
        let (tokens, _, _) = scan_all("a # b");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Identifier, TokenKind::Hash, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn ifdef_line_is_consumed_without_tokens() {
        let (tokens, diags, _) = scan_all("#ifdef FOO\nx");
        assert!(diags.is_empty());
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn line_directive_overrides_position() {
        let (tokens, _, interner) = scan_all("#line 100 \"other.c\"\nx");
        assert_eq!(tokens[0].pos.line, 100);
        assert_eq!(interner.resolve(tokens[0].pos.path), "other.c");
    }

    #[test]
    fn missing_include_is_diagnosed_not_fatal() {
        let (tokens, diags, interner) = scan_all("#include <no_such_header.h>\nint x;");
        assert_eq!(diags.len(), 1);
        match &diags[0].kind {
            DiagnosticKind::IncludeNotFound { name } => {
                assert_eq!(interner.resolve(*name), "no_such_header.h");
            }
            other => panic!("unexpected diagnostic: {:?}", other),
        }
        assert_eq!(kinds(&tokens)[0], TokenKind::Int);
    }

    #[test]
    fn unknown_directive_is_malformed() {
        let (_, diags, _) = scan_all("#pragma once\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::MalformedDirective);
    }

    #[test]
    fn decode_string_handles_simple_and_numeric_escapes() {
        assert_eq!(decode_string_literal(r#""a\nb""#), b"a\nb");
        assert_eq!(decode_string_literal(r#""\x41\102""#), b"AB");
        assert_eq!(decode_string_literal(r#""\0""#), vec![0]);
        assert_eq!(decode_string_literal(r#""\\""#), b"\\");
    }

    #[test]
    fn decode_char_handles_escapes() {
        assert_eq!(decode_char_literal("'a'"), Some(b'a'));
        assert_eq!(decode_char_literal(r"'\n'"), Some(b'\n'));
        assert_eq!(decode_char_literal(r"'\x41'"), Some(b'A'));
        assert_eq!(decode_char_literal(r"'\101'"), Some(b'A'));
        assert_eq!(decode_char_literal("''"), None);
    }
}
