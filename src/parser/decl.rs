use crate::ast::{
    Declaration, Designator, Expr, ExternalDecl, FunctionDef, InitItem, Initializer,
};
use crate::error::DiagnosticKind;
use crate::intern::Symbol;
use crate::token::TokenKind;
use crate::types::{
    Enumerator, Field, FloatRank, IntRank, ParamDecl, StorageClass, Type, TypeKind,
};

use super::expr::ExpressionParsing;
use super::stmt::StatementParsing;
use super::symbol::SymbolKind;
use super::{ParseResult, Parser};

pub trait DeclarationParsing<'a> {
    fn parse_external_declaration(&mut self) -> ParseResult<ExternalDecl<'a>>;
    fn parse_declaration(&mut self) -> ParseResult<&'a [Declaration<'a>]>;
    fn parse_type_name(&mut self) -> ParseResult<&'a Type<'a>>;
}

/// Accumulated declaration specifiers, validated once the list ends.
#[derive(Default)]
struct SpecifierSet<'a> {
    storage: Option<TokenKind>,
    is_const: bool,
    is_volatile: bool,
    void: bool,
    bool_: bool,
    char_: bool,
    short: bool,
    int_: bool,
    long_count: u8,
    float_: bool,
    double_: bool,
    /// `Some(true)` for `signed`, `Some(false)` for `unsigned`.
    signedness: Option<bool>,
    /// struct/union/enum specifier or typedef-name.
    named: Option<&'a Type<'a>>,
    /// Most recent specifier keyword, for diagnostics.
    last: Option<TokenKind>,
}

impl<'a> SpecifierSet<'a> {
    fn has_base(&self) -> bool {
        self.void
            || self.bool_
            || self.char_
            || self.short
            || self.int_
            || self.long_count > 0
            || self.float_
            || self.double_
            || self.signedness.is_some()
            || self.named.is_some()
    }

    fn prev(&self) -> TokenKind {
        self.last.unwrap_or(TokenKind::Int)
    }
}

impl<'a, 'int> DeclarationParsing<'a> for Parser<'a, 'int> {
    fn parse_external_declaration(&mut self) -> ParseResult<ExternalDecl<'a>> {
        let start = self.mark();
        let base = self.parse_declaration_specifiers()?;

        if self.eat(TokenKind::Semicolon) {
            let span = self.span_from(start);
            let decl = Declaration { span, ty: base, name: None, init: None };
            return Ok(ExternalDecl::Declarations(self.ctx.alloc_decls(vec![decl])));
        }

        let (name, ty) = self.parse_declarator(base)?;
        let (name_sym, name_tok) = match name {
            Some(pair) => pair,
            None => return Err(self.expected(&[TokenKind::Identifier])),
        };

        if self.check(TokenKind::LBrace) {
            if let TypeKind::Function { ret, params, variadic } = ty.kind {
                self.declare_from_type(name_sym, name_tok, ty);
                // parameters live in a scope that encloses the body's block
                // scope
                self.enter_scope();
                for param in params {
                    if let Some(pname) = param.name {
                        let birth_tok = self.current;
                        self.declare(pname, birth_tok, SymbolKind::Ordinary, None);
                    }
                }
                let body = self.parse_compound_statement();
                self.leave_scope();
                let body = body?;
                let span = self.span_from(start);
                let func = self.ctx.alloc_func(FunctionDef {
                    span,
                    ret,
                    name: name_sym,
                    params,
                    variadic,
                    body,
                });
                return Ok(ExternalDecl::Function(func));
            }
            return Err(self.expected(&[TokenKind::Semicolon]));
        }

        self.declare_from_type(name_sym, name_tok, ty);
        let init = if self.eat(TokenKind::Assign) {
            Some(self.parse_initializer()?)
        } else {
            None
        };
        let mut decls = vec![Declaration {
            span: self.span_from(start),
            ty,
            name: Some(name_sym),
            init,
        }];

        while self.eat(TokenKind::Comma) {
            let (name, ty) = self.parse_declarator(base)?;
            let (name_sym, name_tok) = match name {
                Some(pair) => pair,
                None => return Err(self.expected(&[TokenKind::Identifier])),
            };
            self.declare_from_type(name_sym, name_tok, ty);
            let init = if self.eat(TokenKind::Assign) {
                Some(self.parse_initializer()?)
            } else {
                None
            };
            decls.push(Declaration {
                span: self.span_from(start),
                ty,
                name: Some(name_sym),
                init,
            });
        }
        self.consume(TokenKind::Semicolon)?;
        Ok(ExternalDecl::Declarations(self.ctx.alloc_decls(decls)))
    }

    fn parse_declaration(&mut self) -> ParseResult<&'a [Declaration<'a>]> {
        let start = self.mark();
        let base = self.parse_declaration_specifiers()?;

        if self.eat(TokenKind::Semicolon) {
            let span = self.span_from(start);
            return Ok(self
                .ctx
                .alloc_decls(vec![Declaration { span, ty: base, name: None, init: None }]));
        }

        let mut decls = Vec::new();
        loop {
            let (name, ty) = self.parse_declarator(base)?;
            let (name_sym, name_tok) = match name {
                Some(pair) => pair,
                None => return Err(self.expected(&[TokenKind::Identifier])),
            };
            self.declare_from_type(name_sym, name_tok, ty);
            let init = if self.eat(TokenKind::Assign) {
                Some(self.parse_initializer()?)
            } else {
                None
            };
            decls.push(Declaration {
                span: self.span_from(start),
                ty,
                name: Some(name_sym),
                init,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::Semicolon)?;
        Ok(self.ctx.alloc_decls(decls))
    }

    /// `<specifier-qualifier-list> <abstract-declarator>?`, as used by casts
    /// and `sizeof`.
    fn parse_type_name(&mut self) -> ParseResult<&'a Type<'a>> {
        let base = self.parse_declaration_specifiers()?;
        let (name, levels) = self.parse_declarator_levels()?;
        if let Some((_, name_tok)) = name {
            let pos = self.token_at(name_tok).pos;
            return Err(crate::error::Diagnostic::new(
                DiagnosticKind::ExpectedToken {
                    expected: vec![TokenKind::RParen],
                    found: TokenKind::Identifier,
                },
                pos,
            ));
        }
        Ok(self.apply_declarator(base, levels))
    }
}

struct PtrPartial {
    is_const: bool,
    is_volatile: bool,
    is_restrict: bool,
}

enum SuffixPartial<'a> {
    Array(Option<&'a Expr<'a>>),
    Function { params: &'a [ParamDecl<'a>], variadic: bool },
}

/// One nesting level of a declarator: the `*` prefixes on the left and the
/// `[]`/`()` clauses on the right, collected in source order. The innermost
/// level's hole receives the base type; outer partials chain through theirs.
struct DeclLevel<'a> {
    ptrs: Vec<PtrPartial>,
    suffixes: Vec<SuffixPartial<'a>>,
}

impl<'a, 'int> Parser<'a, 'int> {
    pub(crate) fn parse_declaration_specifiers(&mut self) -> ParseResult<&'a Type<'a>> {
        let mut set = SpecifierSet::default();

        loop {
            let tok = self.peek();
            match tok.kind {
                kind if kind.is_storage_class() => {
                    if let Some(prev) = set.storage {
                        return Err(
                            self.error_here(DiagnosticKind::IllegalDeclarationSpecifiers { prev })
                        );
                    }
                    set.storage = Some(kind);
                    self.advance();
                }
                TokenKind::Const => {
                    set.is_const = true;
                    self.advance();
                }
                TokenKind::Volatile => {
                    set.is_volatile = true;
                    self.advance();
                }
                TokenKind::Restrict => {
                    return Err(self.error_here(DiagnosticKind::IllegalUseOfRestrict));
                }
                TokenKind::Inline => {
                    // function specifier; accepted and carried no further
                    self.advance();
                }
                TokenKind::Void => {
                    self.add_base_specifier(&mut set, TokenKind::Void, |s| &mut s.void)?;
                }
                TokenKind::Bool => {
                    self.add_base_specifier(&mut set, TokenKind::Bool, |s| &mut s.bool_)?;
                }
                TokenKind::Char => {
                    self.add_base_specifier(&mut set, TokenKind::Char, |s| &mut s.char_)?;
                }
                TokenKind::Short => {
                    self.add_base_specifier(&mut set, TokenKind::Short, |s| &mut s.short)?;
                }
                TokenKind::Int => {
                    self.add_base_specifier(&mut set, TokenKind::Int, |s| &mut s.int_)?;
                }
                TokenKind::Float => {
                    self.add_base_specifier(&mut set, TokenKind::Float, |s| &mut s.float_)?;
                }
                TokenKind::Double => {
                    self.add_base_specifier(&mut set, TokenKind::Double, |s| &mut s.double_)?;
                }
                TokenKind::Long => {
                    if set.long_count >= 2 || set.named.is_some() {
                        return Err(self.error_here(
                            DiagnosticKind::IllegalDeclarationSpecifiers { prev: set.prev() },
                        ));
                    }
                    set.long_count += 1;
                    set.last = Some(TokenKind::Long);
                    self.advance();
                }
                TokenKind::Signed | TokenKind::Unsigned => {
                    if set.signedness.is_some() || set.named.is_some() {
                        return Err(self.error_here(
                            DiagnosticKind::IllegalDeclarationSpecifiers { prev: set.prev() },
                        ));
                    }
                    set.signedness = Some(tok.kind == TokenKind::Signed);
                    set.last = Some(tok.kind);
                    self.advance();
                }
                TokenKind::Complex => {
                    return Err(self
                        .error_here(DiagnosticKind::IllegalDeclarationSpecifiers { prev: set.prev() }));
                }
                TokenKind::Struct | TokenKind::Union => {
                    if set.has_base() {
                        return Err(self.error_here(
                            DiagnosticKind::IllegalDeclarationSpecifiers { prev: set.prev() },
                        ));
                    }
                    set.named = Some(self.parse_record_specifier()?);
                    set.last = Some(tok.kind);
                }
                TokenKind::Enum => {
                    if set.has_base() {
                        return Err(self.error_here(
                            DiagnosticKind::IllegalDeclarationSpecifiers { prev: set.prev() },
                        ));
                    }
                    set.named = Some(self.parse_enum_specifier()?);
                    set.last = Some(TokenKind::Enum);
                }
                TokenKind::Identifier => {
                    // a typedef-name acts as the type specifier, but only
                    // when no other one has been collected; otherwise the
                    // identifier is the declarator
                    if set.has_base() || !self.is_typedef_name(tok.lexeme) {
                        break;
                    }
                    let underlying = self
                        .symbols
                        .lookup(tok.lexeme)
                        .and_then(|entry| entry.ty)
                        .expect("typedef entries always record a type");
                    set.named = Some(underlying);
                    set.last = Some(TokenKind::Identifier);
                    self.advance();
                }
                _ => break,
            }
        }

        self.build_base_type(set)
    }

    fn add_base_specifier(
        &mut self,
        set: &mut SpecifierSet<'a>,
        kind: TokenKind,
        flag: impl for<'s> Fn(&'s mut SpecifierSet<'a>) -> &'s mut bool,
    ) -> ParseResult<()> {
        let conflicting = set.named.is_some() || *flag(set);
        if conflicting {
            return Err(self.error_here(DiagnosticKind::IllegalDeclarationSpecifiers {
                prev: set.prev(),
            }));
        }
        *flag(set) = true;
        set.last = Some(kind);
        self.advance();
        Ok(())
    }

    /// Validate the collected specifiers and produce the base type.
    fn build_base_type(&mut self, set: SpecifierSet<'a>) -> ParseResult<&'a Type<'a>> {
        let illegal = |parser: &mut Self, set: &SpecifierSet<'a>| {
            Err(parser.error_here(DiagnosticKind::IllegalDeclarationSpecifiers { prev: set.prev() }))
        };

        let kind = if let Some(named) = set.named {
            if set.void || set.bool_ || set.char_ || set.short || set.int_
                || set.long_count > 0 || set.float_ || set.double_ || set.signedness.is_some()
            {
                return illegal(self, &set);
            }
            named.kind
        } else if set.void {
            if set.has_base() && (set.char_ || set.short || set.int_ || set.long_count > 0
                || set.float_ || set.double_ || set.bool_ || set.signedness.is_some())
            {
                return illegal(self, &set);
            }
            TypeKind::Void
        } else if set.bool_ {
            if set.char_ || set.short || set.int_ || set.long_count > 0 || set.float_
                || set.double_ || set.signedness.is_some()
            {
                return illegal(self, &set);
            }
            TypeKind::Integer { signed: false, rank: IntRank::Bool }
        } else if set.float_ {
            if set.char_ || set.short || set.int_ || set.long_count > 0 || set.double_
                || set.signedness.is_some()
            {
                return illegal(self, &set);
            }
            TypeKind::Floating { rank: FloatRank::Float }
        } else if set.double_ {
            if set.char_ || set.short || set.int_ || set.long_count > 1
                || set.signedness.is_some()
            {
                return illegal(self, &set);
            }
            let rank = if set.long_count == 1 { FloatRank::LongDouble } else { FloatRank::Double };
            TypeKind::Floating { rank }
        } else if set.char_ {
            if set.short || set.int_ || set.long_count > 0 {
                return illegal(self, &set);
            }
            TypeKind::Integer { signed: set.signedness.unwrap_or(true), rank: IntRank::Char }
        } else if set.short {
            if set.long_count > 0 {
                return illegal(self, &set);
            }
            TypeKind::Integer { signed: set.signedness.unwrap_or(true), rank: IntRank::Short }
        } else if set.long_count > 0 {
            let rank = if set.long_count == 2 { IntRank::LongLong } else { IntRank::Long };
            TypeKind::Integer { signed: set.signedness.unwrap_or(true), rank }
        } else if set.int_ || set.signedness.is_some() {
            TypeKind::Integer { signed: set.signedness.unwrap_or(true), rank: IntRank::Int }
        } else {
            return Err(self.error_here(DiagnosticKind::TypeSpecifierMissing));
        };

        let mut ty = Type::new(kind);
        ty.storage = match set.storage {
            Some(TokenKind::Typedef) => StorageClass::Typedef,
            Some(TokenKind::Static) => StorageClass::Static,
            Some(TokenKind::Extern) => StorageClass::Extern,
            Some(TokenKind::Register) => StorageClass::Register,
            _ => StorageClass::Auto,
        };
        ty.is_const = set.is_const;
        ty.is_volatile = set.is_volatile;
        Ok(self.ctx.alloc_type(ty))
    }

    fn parse_record_specifier(&mut self) -> ParseResult<&'a Type<'a>> {
        let keyword = self.advance();
        let is_union = keyword.kind == TokenKind::Union;

        let tag = if self.check(TokenKind::Identifier) {
            Some(self.advance().lexeme)
        } else {
            None
        };

        let mut body = None;
        if self.eat(TokenKind::LBrace) {
            let mut fields = Vec::new();
            let mut index = 0u32;
            while !self.check(TokenKind::RBrace) && !self.at_eof() {
                let base = self.parse_declaration_specifiers()?;
                loop {
                    if self.eat(TokenKind::Colon) {
                        // anonymous bit-field
                        let width = self.parse_constant_expression()?;
                        fields.push(Field { index, name: None, ty: base, bit_width: Some(width) });
                        index += 1;
                    } else {
                        let (name, ty) = self.parse_declarator(base)?;
                        let width = if self.eat(TokenKind::Colon) {
                            Some(self.parse_constant_expression()?)
                        } else {
                            None
                        };
                        fields.push(Field {
                            index,
                            name: name.map(|(sym, _)| sym),
                            ty,
                            bit_width: width,
                        });
                        index += 1;
                    }
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.consume(TokenKind::Semicolon)?;
            }
            self.consume(TokenKind::RBrace)?;
            body = Some(fields);
        }

        if tag.is_none() && body.is_none() {
            return Err(self.expected(&[TokenKind::Identifier, TokenKind::LBrace]));
        }

        let has_body = body.is_some();
        let fields = self.ctx.alloc_fields(body.unwrap_or_default());
        Ok(self.ctx.type_of(TypeKind::Record { tag, is_union, fields, has_body, packed: false }))
    }

    fn parse_enum_specifier(&mut self) -> ParseResult<&'a Type<'a>> {
        self.advance(); // `enum`

        let tag = if self.check(TokenKind::Identifier) {
            Some(self.advance().lexeme)
        } else {
            None
        };

        let mut body = None;
        if self.eat(TokenKind::LBrace) {
            let mut enumerators = Vec::new();
            while !self.check(TokenKind::RBrace) {
                let name_tok_index = self.mark();
                let name_tok = self.consume(TokenKind::Identifier)?;
                let value = if self.eat(TokenKind::Assign) {
                    Some(self.parse_constant_expression()?)
                } else {
                    None
                };
                // enumeration constants are ordinary identifiers
                self.declare(name_tok.lexeme, name_tok_index, SymbolKind::Ordinary, None);
                enumerators.push(Enumerator { name: name_tok.lexeme, value });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::RBrace)?;
            body = Some(enumerators);
        }

        if tag.is_none() && body.is_none() {
            return Err(
                self.error_here(DiagnosticKind::EnumSpecifierWithoutIdentifierOrEnumeratorList)
            );
        }

        let has_body = body.is_some();
        let enumerators = self.ctx.alloc_enumerators(body.unwrap_or_default());
        Ok(self.ctx.type_of(TypeKind::Enum { tag, enumerators, has_body }))
    }

    /// Parse a declarator (concrete or abstract) against `base` and return
    /// the declared name with its token index, if any.
    pub(crate) fn parse_declarator(
        &mut self,
        base: &'a Type<'a>,
    ) -> ParseResult<(Option<(Symbol, usize)>, &'a Type<'a>)> {
        let (name, levels) = self.parse_declarator_levels()?;
        Ok((name, self.apply_declarator(base, levels)))
    }

    /// Collect the declarator's nesting levels, outermost first. Each level
    /// holds the `*` prefixes (left stack) and the `[]`/`()` clauses (right
    /// stack) seen at that nesting depth.
    fn parse_declarator_levels(
        &mut self,
    ) -> ParseResult<(Option<(Symbol, usize)>, Vec<DeclLevel<'a>>)> {
        let mut level = DeclLevel { ptrs: Vec::new(), suffixes: Vec::new() };

        while self.eat(TokenKind::Star) {
            let mut ptr = PtrPartial { is_const: false, is_volatile: false, is_restrict: false };
            loop {
                match self.peek_kind() {
                    TokenKind::Const => {
                        ptr.is_const = true;
                        self.advance();
                    }
                    TokenKind::Volatile => {
                        ptr.is_volatile = true;
                        self.advance();
                    }
                    TokenKind::Restrict => {
                        ptr.is_restrict = true;
                        self.advance();
                    }
                    _ => break,
                }
            }
            level.ptrs.push(ptr);
        }

        let mut name = None;
        let mut inner_levels = Vec::new();
        if self.check(TokenKind::Identifier) {
            let tok = self.advance();
            name = Some((tok.lexeme, self.current - 1));
        } else if self.check(TokenKind::LParen) && self.nested_declarator_follows() {
            self.advance();
            let (inner_name, levels) = self.parse_declarator_levels()?;
            self.consume(TokenKind::RParen)?;
            name = inner_name;
            inner_levels = levels;
        }
        // neither branch taken: abstract declarator with a vacant name slot

        loop {
            if self.eat(TokenKind::LBracket) {
                let size = if self.check(TokenKind::RBracket) {
                    None
                } else {
                    Some(self.parse_assignment()?)
                };
                self.consume(TokenKind::RBracket)?;
                level.suffixes.push(SuffixPartial::Array(size));
            } else if self.eat(TokenKind::LParen) {
                let (params, variadic) = self.parse_parameter_list()?;
                level.suffixes.push(SuffixPartial::Function { params, variadic });
            } else {
                break;
            }
        }

        let mut levels = vec![level];
        levels.extend(inner_levels);
        Ok((name, levels))
    }

    /// Whether the `(` at the cursor opens a nested declarator rather than a
    /// parameter list. A typedef-name after `(` selects the parameter-list
    /// reading, per the standard's disambiguation rule.
    fn nested_declarator_follows(&mut self) -> bool {
        let next = self.peek_at(1);
        match next.kind {
            TokenKind::Star | TokenKind::LParen => true,
            TokenKind::Identifier => !self.is_typedef_name(next.lexeme),
            _ => false,
        }
    }

    /// Chain the collected partials: the innermost hole takes the base type;
    /// within a level the pointers wrap first, then the suffix clauses from
    /// rightmost to leftmost. The declaration's storage class rides on the
    /// base type and is carried out to the declared (outermost) type.
    fn apply_declarator(&self, base: &'a Type<'a>, levels: Vec<DeclLevel<'a>>) -> &'a Type<'a> {
        let mut ty = base;
        for level in levels {
            for ptr in level.ptrs {
                ty = self.ctx.type_of(TypeKind::Pointer {
                    pointee: ty,
                    is_const: ptr.is_const,
                    is_volatile: ptr.is_volatile,
                    is_restrict: ptr.is_restrict,
                });
            }
            for suffix in level.suffixes.into_iter().rev() {
                ty = match suffix {
                    SuffixPartial::Array(size) => {
                        self.ctx.type_of(TypeKind::Array { element: ty, size })
                    }
                    SuffixPartial::Function { params, variadic } => {
                        self.ctx.type_of(TypeKind::Function { ret: ty, params, variadic })
                    }
                };
            }
        }
        if !std::ptr::eq(ty, base) && ty.storage != base.storage {
            let mut outer = *ty;
            outer.storage = base.storage;
            return self.ctx.alloc_type(outer);
        }
        ty
    }

    /// Parameter list, after the opening `(`. `(void)` means no parameters.
    fn parse_parameter_list(&mut self) -> ParseResult<(&'a [ParamDecl<'a>], bool)> {
        if self.eat(TokenKind::RParen) {
            return Ok((self.ctx.alloc_params(Vec::new()), false));
        }
        if self.check(TokenKind::Void) && self.peek_at(1).kind == TokenKind::RParen {
            self.advance();
            self.advance();
            return Ok((self.ctx.alloc_params(Vec::new()), false));
        }

        let mut params = Vec::new();
        let mut variadic = false;
        loop {
            if self.eat(TokenKind::Ellipsis) {
                variadic = true;
                break;
            }
            params.push(self.parse_parameter_declaration()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok((self.ctx.alloc_params(params), variadic))
    }

    /// `<declaration-specifiers> (<declarator> | <abstract-declarator>?)`.
    /// The named reading is speculated first; failure restores and tries the
    /// abstract one.
    fn parse_parameter_declaration(&mut self) -> ParseResult<ParamDecl<'a>> {
        let base = self.parse_declaration_specifiers()?;

        let named = self.try_parse(|p| {
            let (name, ty) = p.parse_declarator(base)?;
            match name {
                Some((sym, _)) => Ok(ParamDecl { name: Some(sym), ty }),
                None => Err(p.error_here(DiagnosticKind::ParameterTypeMalformed)),
            }
        });
        if let Some(param) = named {
            return Ok(param);
        }

        let abstract_ = self.try_parse(|p| {
            let (_, ty) = p.parse_declarator(base)?;
            Ok(ParamDecl { name: None, ty })
        });
        if let Some(param) = abstract_ {
            return Ok(param);
        }

        Err(self.error_here(DiagnosticKind::ParameterTypeMalformed))
    }

    pub(crate) fn parse_initializer(&mut self) -> ParseResult<&'a Initializer<'a>> {
        if self.check(TokenKind::LBrace) {
            let start = self.mark();
            let items = self.parse_initializer_list_body()?;
            let span = self.span_from(start);
            return Ok(self.ctx.alloc_init(Initializer::List { span, items }));
        }
        let expr = self.parse_assignment()?;
        Ok(self.ctx.alloc_init(Initializer::Expr(expr)))
    }

    /// `{ <designation>? <initializer> , ... }` with an optional trailing
    /// comma.
    pub(crate) fn parse_initializer_list_body(&mut self) -> ParseResult<&'a [InitItem<'a>]> {
        self.consume(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let mut designators = Vec::new();
            loop {
                if self.eat(TokenKind::LBracket) {
                    let index = self.parse_constant_expression()?;
                    self.consume(TokenKind::RBracket)?;
                    designators.push(Designator::Index(index));
                } else if self.check(TokenKind::Dot) {
                    self.advance();
                    let member = self.consume(TokenKind::Identifier)?;
                    designators.push(Designator::Field(member.lexeme));
                } else {
                    break;
                }
            }
            if !designators.is_empty() {
                self.consume(TokenKind::Assign)?;
            }
            let init = self.parse_initializer()?;
            items.push(InitItem { designation: self.ctx.alloc_designators(designators), init });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RBrace)?;
        Ok(self.ctx.alloc_init_items(items))
    }

    /// Register a declared name, as a typedef-name when the declaration's
    /// storage class says so.
    fn declare_from_type(&mut self, name: Symbol, name_tok: usize, ty: &'a Type<'a>) {
        if ty.storage == StorageClass::Typedef {
            // record the underlying type with neutral storage so later uses
            // adopt their own declaration's storage class
            let mut underlying = *ty;
            underlying.storage = StorageClass::Auto;
            let underlying = self.ctx.alloc_type(underlying);
            self.declare(name, name_tok, SymbolKind::Typedef, Some(underlying));
        } else {
            self.declare(name, name_tok, SymbolKind::Ordinary, None);
        }
    }
}
