// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use proc_macro::TokenStream;
use proc_macro2::{Literal, Span, TokenStream as TokenStream2};
use quote::{ToTokens, format_ident, quote};
use syn::parse::{Error, Parse, ParseStream, Result};
use syn::spanned::Spanned;
use syn::{
    Attribute, Expr, ExprLit, ExprUnary, GenericArgument, Ident, Item,
    ItemConst, ItemStatic, Lit, Local, Pat, PathArguments, StaticMutability,
    Stmt, Token, Type, UnOp, Visibility, braced, parse_macro_input,
};

#[proc_macro_attribute]
pub fn field_repr(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr: TokenStream2 = attr.into();
    let item: TokenStream2 = item.into();
    quote! {
        #[repr(#attr)]
        #[derive(
            Clone,
            Copy,
            Debug,
            Eq,
            PartialEq,
            ::zerocopy::Immutable,
            ::zerocopy::IntoBytes,
            ::zerocopy::TryFromBytes,
        )]
        #item
    }
    .into()
}

#[proc_macro]
pub fn register_map(item: TokenStream) -> TokenStream {
    parse_macro_input!(item as RegisterMap)
        .to_token_stream()
        .into()
}

//
// Datatypes and access restrictions.
//

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Datatype {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl Datatype {
    fn from_type(ty: &Type) -> Option<Self> {
        let Type::Path(type_path) = ty else {
            return None;
        };
        if type_path.qself.is_some() {
            return None;
        }
        let ident = type_path.path.get_ident()?;
        Some(match ident.to_string().as_str() {
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            _ => return None,
        })
    }

    const fn bits(self) -> u32 {
        match self {
            Self::U8 | Self::I8 => 8,
            Self::U16 | Self::I16 => 16,
            Self::U32 | Self::I32 => 32,
            Self::U64 | Self::I64 => 64,
        }
    }

    const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    const fn value_mask(self) -> u64 {
        low_mask(self.bits())
    }

    const fn smallest_unsigned(width: u32) -> Option<Self> {
        match width {
            1..=8 => Some(Self::U8),
            9..=16 => Some(Self::U16),
            17..=32 => Some(Self::U32),
            33..=64 => Some(Self::U64),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
        }
    }

    fn variant(self) -> TokenStream2 {
        let variant = format_ident!("{}", self.name().to_uppercase());
        quote! { ::regfld::Datatype::#variant }
    }

    fn primitive(self) -> TokenStream2 {
        TokenStream2::from_str(self.name()).unwrap()
    }
}

const fn low_mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

#[derive(Clone, Copy, Default)]
struct Access {
    readonly: bool,
    writeonly: bool,
    reserved: bool,
}

impl Access {
    const fn is_empty(self) -> bool {
        !self.readonly && !self.writeonly && !self.reserved
    }

    /// The `.with_attributes(...)` call applying the restrictions, if any.
    fn builder_call(self) -> Option<TokenStream2> {
        if self.is_empty() {
            return None;
        }
        let flags = [
            (self.readonly, "READONLY"),
            (self.writeonly, "WRITEONLY"),
            (self.reserved, "RESERVED"),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, flag)| format_ident!("{flag}"));
        Some(quote! {
            .with_attributes(::regfld::Attributes::NONE #(.union(::regfld::Attributes::#flags))*)
        })
    }
}

/// Splits the attributes of an entry into forwarded doc comments and access
/// restrictions.
fn parse_attributes(attrs: Vec<Attribute>) -> Result<(Vec<Attribute>, Access)> {
    let mut docs = Vec::new();
    let mut access = Access::default();
    for attr in attrs {
        let flag = if attr.path().is_ident("doc") {
            docs.push(attr);
            continue;
        } else if attr.path().is_ident("readonly") {
            &mut access.readonly
        } else if attr.path().is_ident("writeonly") {
            &mut access.writeonly
        } else if attr.path().is_ident("reserved") {
            &mut access.reserved
        } else {
            return Err(Error::new_spanned(
                attr,
                "only doc comments and #[readonly], #[writeonly] and #[reserved] are permitted",
            ));
        };
        attr.meta.require_path_only()?;
        *flag = true;
    }
    Ok((docs, access))
}

//
// Parsing of individual entries.
//

const INVALID_ENTRY_FORM: &str = "register map entry should take one of the following forms:\n\
    * `static $NAME: Register<$address, $datatype> = $reset;`\n\
    * `let $name: Bit<$REGISTER, $bit (, $datatype)?>;`\n\
    * `let $name: Bits<$REGISTER, $high, $low (, $datatype)?>;`\n\
    * `let $name: Concat<$member, ... (, $datatype)?>;`\n\
    * `const $NAME: Value<$field> = $literal;`";

fn invalid(spanned: &dyn ToTokens) -> Error {
    Error::new_spanned(spanned, INVALID_ENTRY_FORM)
}

/// Splits a pseudo-type like `Bits<A, 1, 0>` into its name and arguments.
fn pseudo_type(ty: &Type) -> Result<(&Ident, Vec<&GenericArgument>)> {
    let Type::Path(type_path) = ty else {
        return Err(invalid(ty));
    };
    if type_path.qself.is_some() || type_path.path.segments.len() != 1 {
        return Err(invalid(ty));
    }
    let segment = type_path.path.segments.first().unwrap();
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return Err(invalid(ty));
    };
    Ok((&segment.ident, args.args.iter().collect()))
}

fn ident_arg(arg: &GenericArgument) -> Result<Ident> {
    if let GenericArgument::Type(Type::Path(type_path)) = arg
        && type_path.qself.is_none()
        && let Some(ident) = type_path.path.get_ident()
    {
        return Ok(ident.clone());
    }
    Err(Error::new_spanned(arg, "expected an identifier"))
}

fn int_arg<N>(arg: &GenericArgument) -> Result<N>
where
    N: FromStr,
    N::Err: std::fmt::Display,
{
    let GenericArgument::Const(Expr::Lit(ExprLit {
        lit: Lit::Int(int), ..
    })) = arg
    else {
        return Err(Error::new_spanned(arg, "expected an integer literal"));
    };
    int.base10_parse()
}

fn datatype_arg(arg: &GenericArgument) -> Result<Datatype> {
    const INVALID_DATATYPE: &str =
        "datatype must be one of u8, u16, u32, u64, i8, i16, i32 or i64";
    let GenericArgument::Type(ty) = arg else {
        return Err(Error::new_spanned(arg, INVALID_DATATYPE));
    };
    Datatype::from_type(ty).ok_or_else(|| Error::new_spanned(ty, INVALID_DATATYPE))
}

fn int_literal(expr: &Expr) -> Result<i128> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => int.base10_parse(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => int_literal(expr).map(|value| -value),
        _ => Err(Error::new_spanned(expr, "expected an integer literal")),
    }
}

struct RegisterDef {
    docs: Vec<Attribute>,
    name: Ident,
    address: u64,
    address_span: Span,
    reset: u64,
    reset_span: Span,
    datatype: Datatype,
    datatype_span: Span,
    access: Access,
}

impl TryFrom<ItemStatic> for RegisterDef {
    type Error = Error;

    fn try_from(item: ItemStatic) -> Result<Self> {
        if let StaticMutability::Mut(token) = &item.mutability {
            return Err(Error::new_spanned(token, "registers are immutable"));
        }
        if !matches!(item.vis, Visibility::Inherited) {
            return Err(Error::new_spanned(
                &item.vis,
                "visibility is given by the register map",
            ));
        }
        let (kind, args) = pseudo_type(&item.ty)?;
        if kind != "Register" || args.len() != 2 {
            return Err(invalid(&item.ty));
        }
        let address = int_arg(args[0])?;
        let datatype = datatype_arg(args[1])?;
        let reset = match int_literal(&item.expr)? {
            reset if reset < 0 => {
                return Err(Error::new_spanned(
                    &item.expr,
                    "reset value exceeds datatype range",
                ));
            }
            reset => u64::try_from(reset).map_err(|_| {
                Error::new_spanned(&item.expr, "reset value exceeds datatype range")
            })?,
        };
        let address_span = args[0].span();
        let datatype_span = args[1].span();
        let reset_span = item.expr.span();
        let (docs, access) = parse_attributes(item.attrs)?;
        Ok(Self {
            docs,
            name: item.ident,
            address,
            address_span,
            reset,
            reset_span,
            datatype,
            datatype_span,
            access,
        })
    }
}

enum FieldKind {
    Bits {
        register: Ident,
        high: u32,
        low: u32,
    },
    Concat {
        members: Vec<Ident>,
    },
}

struct FieldDef {
    span: Span,
    docs: Vec<Attribute>,
    name: Ident,
    kind: FieldKind,
    datatype: Option<(Datatype, Span)>,
    access: Access,
}

impl TryFrom<Local> for FieldDef {
    type Error = Error;

    fn try_from(local: Local) -> Result<Self> {
        if let Some(init) = &local.init {
            return Err(Error::new_spanned(
                &init.expr,
                "fields take no initializer; declare literals as `const $NAME: Value<$field> = $literal;`",
            ));
        }
        let Pat::Type(ref pat_type) = local.pat else {
            return Err(invalid(&local));
        };
        let Pat::Ident(ref pat_ident) = *pat_type.pat else {
            return Err(invalid(&*pat_type.pat));
        };
        if let Some(by_ref) = &pat_ident.by_ref {
            return Err(invalid(by_ref));
        }
        if let Some(mutability) = &pat_ident.mutability {
            return Err(invalid(mutability));
        }
        if let Some(subpat) = &pat_ident.subpat {
            return Err(invalid(&subpat.0));
        }
        let name = pat_ident.ident.clone();
        let span = name.span();

        let (kind, args) = pseudo_type(&pat_type.ty)?;
        let optional_datatype = |arg: Option<&&GenericArgument>| {
            arg.map(|arg| datatype_arg(arg).map(|datatype| (datatype, arg.span())))
                .transpose()
        };
        let (kind, datatype) = if kind == "Bit" {
            if args.len() != 2 && args.len() != 3 {
                return Err(invalid(&pat_type.ty));
            }
            let bit = int_arg(args[1])?;
            let kind = FieldKind::Bits {
                register: ident_arg(args[0])?,
                high: bit,
                low: bit,
            };
            (kind, optional_datatype(args.get(2))?)
        } else if kind == "Bits" {
            if args.len() != 3 && args.len() != 4 {
                return Err(invalid(&pat_type.ty));
            }
            let high: u32 = int_arg(args[1])?;
            let low: u32 = int_arg(args[2])?;
            if high < low {
                return Err(Error::new_spanned(args[1], "first high bit, then low"));
            }
            let kind = FieldKind::Bits {
                register: ident_arg(args[0])?,
                high,
                low,
            };
            (kind, optional_datatype(args.get(3))?)
        } else if kind == "Concat" {
            let mut args = args;
            let datatype = if let Some(GenericArgument::Type(ty)) = args.last() {
                Datatype::from_type(ty).map(|datatype| (datatype, ty.span()))
            } else {
                None
            };
            if datatype.is_some() {
                args.pop();
            }
            if args.is_empty() {
                return Err(Error::new_spanned(
                    &pat_type.ty,
                    "multi-register field has no members",
                ));
            }
            let members = args
                .into_iter()
                .map(ident_arg)
                .collect::<Result<Vec<_>>>()?;
            (FieldKind::Concat { members }, datatype)
        } else {
            return Err(invalid(kind));
        };

        let (docs, access) = parse_attributes(local.attrs)?;
        Ok(Self {
            span,
            docs,
            name,
            kind,
            datatype,
            access,
        })
    }
}

struct ValueDef {
    docs: Vec<Attribute>,
    name: Ident,
    field: Ident,
    value: i128,
    value_span: Span,
}

impl TryFrom<ItemConst> for ValueDef {
    type Error = Error;

    fn try_from(item: ItemConst) -> Result<Self> {
        if !matches!(item.vis, Visibility::Inherited) {
            return Err(Error::new_spanned(
                &item.vis,
                "visibility is given by the register map",
            ));
        }
        let (kind, args) = pseudo_type(&item.ty)?;
        if kind != "Value" || args.len() != 1 {
            return Err(invalid(&item.ty));
        }
        let field = ident_arg(args[0])?;
        let value = int_literal(&item.expr)?;
        let value_span = item.expr.span();
        let (docs, access) = parse_attributes(item.attrs)?;
        if !access.is_empty() {
            return Err(Error::new_spanned(
                &item.ident,
                "access restrictions are not permitted on values",
            ));
        }
        Ok(Self {
            docs,
            name: item.ident,
            field,
            value,
            value_span,
        })
    }
}

enum Entry {
    Register(RegisterDef),
    Field(FieldDef),
    Value(ValueDef),
}

impl Parse for Entry {
    fn parse(input: ParseStream) -> Result<Self> {
        match input.parse::<Stmt>()? {
            Stmt::Item(Item::Static(item)) => {
                RegisterDef::try_from(item).map(Self::Register)
            }
            Stmt::Local(local) => FieldDef::try_from(local).map(Self::Field),
            Stmt::Item(Item::Const(item)) => {
                ValueDef::try_from(item).map(Self::Value)
            }
            stmt => Err(invalid(&stmt)),
        }
    }
}

//
// Parsing of the register map as a whole.
//

struct Header {
    attrs: Vec<Attribute>,
    vis: Visibility,
    name: Ident,
    address_type: Datatype,
}

impl Parse for Header {
    fn parse(input: ParseStream) -> Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis = input.parse()?;
        input.parse::<Token![mod]>()?;
        let name = input.parse()?;
        input.parse::<Token![<]>()?;
        let address_type: Type = input.parse()?;
        input.parse::<Token![>]>()?;
        input.parse::<Token![;]>()?;
        let address_type = Datatype::from_type(&address_type)
            .filter(|datatype| !datatype.is_signed())
            .ok_or_else(|| {
                Error::new_spanned(
                    &address_type,
                    "address type must be one of u8, u16, u32 or u64",
                )
            })?;
        Ok(Self {
            attrs,
            vis,
            name,
            address_type,
        })
    }
}

enum Member {
    Field(usize),
    Register(usize),
}

/// A field with all references resolved and all invariants checked.
enum Resolved {
    Single {
        register: usize,
        low: u32,
        width: u32,
        datatype: Datatype,
    },
    Multi {
        members: Vec<Member>,
        width: u32,
        datatype: Datatype,
    },
}

impl Resolved {
    const fn width(&self) -> u32 {
        match *self {
            Self::Single { width, .. } | Self::Multi { width, .. } => width,
        }
    }

    const fn datatype(&self) -> Datatype {
        match *self {
            Self::Single { datatype, .. } | Self::Multi { datatype, .. } => datatype,
        }
    }
}

struct RegisterMap {
    header: Header,
    registers: Vec<RegisterDef>,
    fields: Vec<FieldDef>,
    values: Vec<ValueDef>,
    resolved: Vec<Option<Resolved>>,
    errors: Vec<Error>,
}

fn const_name(name: &Ident) -> Ident {
    Ident::new(&name.to_string().to_uppercase(), name.span())
}

impl RegisterMap {
    fn check_names(&mut self) {
        let mut seen = HashSet::new();
        let names = self
            .registers
            .iter()
            .map(|register| &register.name)
            .chain(self.fields.iter().map(|field| &field.name))
            .chain(self.values.iter().map(|value| &value.name));
        for name in names {
            let upper = const_name(name).to_string();
            if !seen.insert(upper.clone()) {
                self.errors.push(Error::new_spanned(
                    name,
                    format!("duplicate item name `{upper}`"),
                ));
            }
        }
    }

    fn check_registers(&mut self) {
        let storage = self.registers.first().map(|register| register.datatype);
        let address_type = self.header.address_type;
        let mut addresses = HashMap::new();
        for register in &self.registers {
            if register.datatype.is_signed() {
                self.errors.push(Error::new(
                    register.datatype_span,
                    "register datatype must be unsigned",
                ));
            } else if let Some(storage) = storage
                && register.datatype != storage
            {
                self.errors.push(Error::new(
                    register.datatype_span,
                    format!(
                        "registers must not have different datatypes (`{}` is {}, `{}` is {})",
                        register.name,
                        register.datatype.name(),
                        self.registers[0].name,
                        storage.name(),
                    ),
                ));
            }
            if register.reset & !register.datatype.value_mask() != 0 {
                self.errors.push(Error::new(
                    register.reset_span,
                    format!(
                        "reset value exceeds datatype range ({:#x} does not fit {})",
                        register.reset,
                        register.datatype.name(),
                    ),
                ));
            }
            if register.address & !address_type.value_mask() != 0 {
                self.errors.push(Error::new(
                    register.address_span,
                    format!(
                        "address does not fit into the address type ({:#x} does not fit {})",
                        register.address,
                        address_type.name(),
                    ),
                ));
            }
            if let Some(other) = addresses.insert(register.address, &register.name) {
                self.errors.push(Error::new(
                    register.address_span,
                    format!(
                        "`{}` has the same address ({:#x}) as `{other}`",
                        register.name, register.address
                    ),
                ));
            }
        }
    }

    fn resolve_bits(
        &self,
        field: &FieldDef,
        register: &Ident,
        high: u32,
        low: u32,
    ) -> Result<Resolved> {
        let Some(index) = self
            .registers
            .iter()
            .position(|def| def.name == *register)
        else {
            return Err(Error::new_spanned(
                register,
                format!("unknown register `{register}`"),
            ));
        };
        let def = &self.registers[index];
        if high >= def.datatype.bits() {
            return Err(Error::new(
                field.span,
                format!(
                    "high bit {high} exceeds the highest possible value of {} in `{register}`",
                    def.datatype.bits() - 1,
                ),
            ));
        }
        let width = high - low + 1;
        let datatype = if let Some((datatype, span)) = field.datatype {
            if datatype.bits() > def.datatype.bits() {
                return Err(Error::new(
                    span,
                    format!(
                        "datatype does not fit into the register ({} is wider than `{register}`)",
                        datatype.name(),
                    ),
                ));
            }
            if high >= datatype.bits() {
                return Err(Error::new(
                    span,
                    format!(
                        "field does not fit into its datatype (bit {high} exceeds {})",
                        datatype.name(),
                    ),
                ));
            }
            datatype
        } else {
            // Width is at most that of the register, so this always exists.
            let datatype = Datatype::smallest_unsigned(width).unwrap();
            if high >= datatype.bits() {
                let wider = Datatype::smallest_unsigned(high + 1).unwrap();
                return Err(Error::new(
                    field.span,
                    format!(
                        "field does not fit into its datatype (bit {high} exceeds {}); \
                         declare a wider one, e.g. `Bits<{register}, {high}, {low}, {}>`",
                        datatype.name(),
                        wider.name(),
                    ),
                ));
            }
            datatype
        };
        Ok(Resolved::Single {
            register: index,
            low,
            width,
            datatype,
        })
    }

    fn resolve_concat(
        &self,
        field: &FieldDef,
        members: &[Ident],
        singles: &[Option<Resolved>],
    ) -> Result<Option<Resolved>> {
        let mut resolved = Vec::with_capacity(members.len());
        let mut addresses = HashSet::new();
        let mut width = 0;
        for member in members {
            let (register, member_width, reference) = if let Some(index) =
                self.fields.iter().position(|def| def.name == *member)
            {
                match &singles[index] {
                    Some(Resolved::Single {
                        register, width, ..
                    }) => (*register, *width, Member::Field(index)),
                    // Already reported.
                    None if matches!(self.fields[index].kind, FieldKind::Bits { .. }) => {
                        return Ok(None);
                    }
                    _ => {
                        return Err(Error::new_spanned(
                            member,
                            format!("`{member}` is not a single-register field"),
                        ));
                    }
                }
            } else if let Some(index) =
                self.registers.iter().position(|def| def.name == *member)
            {
                let bits = self.registers[index].datatype.bits();
                (index, bits, Member::Register(index))
            } else {
                return Err(Error::new_spanned(
                    member,
                    format!("unknown field or register `{member}`"),
                ));
            };
            if !addresses.insert(self.registers[register].address) {
                return Err(Error::new_spanned(
                    member,
                    "multi-register field members must be drawn from distinct registers",
                ));
            }
            width += member_width;
            resolved.push(reference);
        }
        if width > u64::BITS {
            return Err(Error::new(
                field.span,
                format!("field width exceeds 64 bits ({width} bits)"),
            ));
        }
        let Some((datatype, span)) = field.datatype else {
            return Ok(Some(Resolved::Multi {
                members: resolved,
                width,
                datatype: Datatype::smallest_unsigned(width).unwrap(),
            }));
        };
        if width > datatype.bits() {
            return Err(Error::new(
                span,
                format!(
                    "field does not fit into its datatype ({width} bits exceed {})",
                    datatype.name(),
                ),
            ));
        }
        Ok(Some(Resolved::Multi {
            members: resolved,
            width,
            datatype,
        }))
    }

    fn resolve_fields(&mut self) {
        let mut resolved = Vec::with_capacity(self.fields.len());
        let mut errors = Vec::new();
        for field in &self.fields {
            let FieldKind::Bits {
                register,
                high,
                low,
            } = &field.kind
            else {
                resolved.push(None);
                continue;
            };
            match self.resolve_bits(field, register, *high, *low) {
                Ok(field) => resolved.push(Some(field)),
                Err(err) => {
                    errors.push(err);
                    resolved.push(None);
                }
            }
        }
        for (i, field) in self.fields.iter().enumerate() {
            let FieldKind::Concat { members } = &field.kind else {
                continue;
            };
            match self.resolve_concat(field, members, &resolved) {
                Ok(field) => resolved[i] = field,
                Err(err) => errors.push(err),
            }
        }
        self.resolved = resolved;
        self.errors.extend(errors);
    }

    fn check_values(&mut self) {
        for value in &self.values {
            let Some(index) = self.fields.iter().position(|def| def.name == value.field)
            else {
                self.errors.push(Error::new_spanned(
                    &value.field,
                    format!("unknown field `{}`", value.field),
                ));
                continue;
            };
            let Some(field) = &self.resolved[index] else {
                continue;
            };
            let width = field.width();
            let signed = field.datatype().is_signed();
            let (min, max) = if signed {
                (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1)
            } else {
                (0, (1i128 << width) - 1)
            };
            if !(min..=max).contains(&value.value) {
                let kind = if signed { "signed" } else { "unsigned" };
                self.errors.push(Error::new(
                    value.value_span,
                    format!(
                        "value does not fit into its field ({kind} field `{}` of width {width} \
                         holds {min}..={max})",
                        value.field,
                    ),
                ));
            }
        }
    }

    /// Indices of the registers the fields draw from, in ascending address
    /// order.
    fn table(&self) -> Vec<usize> {
        let mut table = Vec::new();
        for field in self.resolved.iter().flatten() {
            match field {
                Resolved::Single { register, .. } => table.push(*register),
                Resolved::Multi { members, .. } => {
                    for member in members {
                        match *member {
                            Member::Register(register) => table.push(register),
                            Member::Field(index) => {
                                if let Some(Resolved::Single { register, .. }) =
                                    self.resolved[index]
                                {
                                    table.push(register);
                                }
                            }
                        }
                    }
                }
            }
        }
        table.sort_by_key(|&register| self.registers[register].address);
        table.dedup();
        table
    }
}

impl Parse for RegisterMap {
    fn parse(input: ParseStream) -> Result<Self> {
        let input = {
            let content;
            braced!(content in input);
            content
        };

        let header = input.parse::<Header>()?;

        let input = {
            let content;
            braced!(content in input);
            content
        };

        let mut map = Self {
            header,
            registers: vec![],
            fields: vec![],
            values: vec![],
            resolved: vec![],
            errors: vec![],
        };
        while !input.is_empty() {
            match input.parse::<Entry>()? {
                Entry::Register(register) => map.registers.push(register),
                Entry::Field(field) => map.fields.push(field),
                Entry::Value(value) => map.values.push(value),
            }
        }

        map.check_names();
        map.check_registers();
        map.resolve_fields();
        map.check_values();
        Ok(map)
    }
}

//
// Code generation.
//

impl RegisterMap {
    fn register_consts(&self) -> impl Iterator<Item = TokenStream2> + '_ {
        self.registers.iter().map(|register| {
            let docs = &register.docs;
            let name = &register.name;
            let address = Literal::u64_unsuffixed(register.address);
            let reset = Literal::u64_unsuffixed(register.reset);
            let datatype = register.datatype.variant();
            let access = register.access.builder_call();
            let doc = format!(
                "The {} register at address {:#x}, reset value {:#x}.",
                register.datatype.name(),
                register.address,
                register.reset,
            );
            let doc = docs.is_empty().then(|| quote! { #[doc = #doc] });
            quote! {
                #(#docs)*
                #doc
                pub const #name: ::regfld::Register =
                    ::regfld::Register::new(#address, #reset, #datatype) #access;
            }
        })
    }

    fn field_const(&self, field: &FieldDef, resolved: &Resolved) -> TokenStream2 {
        let docs = &field.docs;
        let name = const_name(&field.name);
        let access = field.access.builder_call();
        match resolved {
            Resolved::Single {
                register,
                low,
                width,
                datatype,
            } => {
                let register = &self.registers[*register].name;
                let doc = if *width == 1 {
                    format!("Bit {low} of [`{register}`].")
                } else {
                    format!("Bits [{}:{low}] of [`{register}`].", low + width - 1)
                };
                let doc = docs.is_empty().then(|| quote! { #[doc = #doc] });
                let low = Literal::u32_unsuffixed(*low);
                let width = Literal::u32_unsuffixed(*width);
                let datatype = datatype.variant();
                quote! {
                    #(#docs)*
                    #doc
                    pub const #name: ::regfld::Content<'static> =
                        ::regfld::Content::new_as(&#register, #low, #width, #datatype) #access;
                }
            }
            Resolved::Multi {
                members, datatype, ..
            } => {
                let members_name = format_ident!("__{name}_MEMBERS");
                let num_members = members.len();
                let members = members.iter().map(|member| match *member {
                    Member::Field(index) => {
                        let member = const_name(&self.fields[index].name);
                        quote! { #member }
                    }
                    Member::Register(index) => {
                        let register = &self.registers[index].name;
                        quote! { ::regfld::Content::whole(&#register) }
                    }
                });
                let datatype = datatype.variant();
                quote! {
                    #[doc(hidden)]
                    const #members_name: [::regfld::Content<'static>; #num_members] = [
                        #(#members),*
                    ];
                    #(#docs)*
                    pub const #name: ::regfld::MultiRegisterContent<'static> =
                        ::regfld::MultiRegisterContent::new(&#members_name)
                            .with_datatype(#datatype) #access;
                }
            }
        }
    }

    fn any_content(&self, index: usize) -> TokenStream2 {
        let name = const_name(&self.fields[index].name);
        if let Some(Resolved::Multi { .. }) = self.resolved[index] {
            quote! { ::regfld::AnyContent::Multi(#name) }
        } else {
            quote! { ::regfld::AnyContent::Content(#name) }
        }
    }

    fn value_consts(&self) -> impl Iterator<Item = TokenStream2> + '_ {
        self.values.iter().filter_map(|value| {
            let index = self.fields.iter().position(|def| def.name == value.field)?;
            let signed = self.resolved[index].as_ref()?.datatype().is_signed();
            let docs = &value.docs;
            let name = &value.name;
            let field = self.any_content(index);
            let constructor = if signed {
                let literal = Literal::i64_unsuffixed(i64::try_from(value.value).ok()?);
                quote! { ::regfld::Value::new_signed(#field, #literal) }
            } else {
                let literal = Literal::u64_unsuffixed(u64::try_from(value.value).ok()?);
                quote! { ::regfld::Value::new(#field, #literal) }
            };
            Some(quote! {
                #(#docs)*
                pub const #name: ::regfld::Value<'static> = #constructor;
            })
        })
    }
}

impl ToTokens for RegisterMap {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let Header {
            attrs, vis, name, ..
        } = &self.header;

        if !self.errors.is_empty() {
            let errors = self.errors.iter().map(Error::to_compile_error);
            quote! {
                #(#attrs)*
                #vis mod #name {}
                #(#errors)*
            }
            .to_tokens(tokens);
            return;
        }

        let registers = self.register_consts();
        let fields = self
            .fields
            .iter()
            .zip(&self.resolved)
            .filter_map(|(field, resolved)| {
                resolved.as_ref().map(|resolved| self.field_const(field, resolved))
            });
        let values = self.value_consts();

        let num_fields = self.fields.len();
        let any_fields = (0..num_fields).map(|index| self.any_content(index));

        let table = self.table();
        let num_registers = table.len();
        let table_registers = table.iter().map(|&index| &self.registers[index].name);
        let addresses = table
            .iter()
            .map(|&index| Literal::u64_unsuffixed(self.registers[index].address));
        let address_type = self.header.address_type.primitive();

        quote! {
            #(#attrs)*
            #vis mod #name {
                #(#registers)*

                #(#fields)*

                #(#values)*

                /// Every field of the register map, in declaration order.
                pub const FIELDS: [::regfld::AnyContent<'static>; #num_fields] = [
                    #(#any_fields),*
                ];

                /// The registers the fields draw from, in ascending address
                /// order; index `i` of a raw buffer holds the word of
                /// `REGISTERS[i]`.
                pub const REGISTERS: [::regfld::Register; #num_registers] = [
                    #(#table_registers),*
                ];

                /// The addresses of [`REGISTERS`], as bus addresses.
                pub const ADDRESSES: [#address_type; #num_registers] = [
                    #(#addresses),*
                ];

                /// The register table of [`FIELDS`].
                pub static REGISTER_TABLE: ::regfld::RegisterTable<'static> =
                    ::regfld::RegisterTable::from_sorted(&REGISTERS);
            }
        }
        .to_tokens(tokens);
    }
}
