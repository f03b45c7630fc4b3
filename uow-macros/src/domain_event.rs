use crate::utils::apply_derives;
use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Expr, Ident, Item, LitInt, LitStr, Result, Token, parse::Parse, parse::ParseStream,
    parse_macro_input,
};

/// #[domain_event] 宏实现
/// - 合并派生：Debug, Clone, PartialEq, Serialize, Deserialize
/// - 生成 `::uow_domain::domain_event::DomainEvent` 实现
/// - 事件类型默认为 `枚举名.变体名`，版本默认取 `#[domain_event(version = N)]`（缺省为 1）
/// - 变体可覆写：`#[event(event_type = "...", event_version = N)]`
///
/// 变体形态不限（单元、元组、具名字段）。
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let enum_item = match &mut input {
        Item::Enum(e) => e,
        other => {
            return syn::Error::new(
                other.span(),
                "#[domain_event] can only be used on enum types",
            )
            .to_compile_error()
            .into();
        }
    };

    if enum_item.variants.is_empty() {
        return syn::Error::new(
            enum_item.span(),
            "#[domain_event] requires at least one variant; use NoEvents for aggregates without events",
        )
        .to_compile_error()
        .into();
    }

    let default_version = cfg.version.unwrap_or_else(|| syn::parse_quote! { 1 });

    apply_derives(
        &mut enum_item.attrs,
        vec![
            syn::parse_quote!(Debug),
            syn::parse_quote!(Clone),
            syn::parse_quote!(PartialEq),
            syn::parse_quote!(serde::Serialize),
            syn::parse_quote!(serde::Deserialize),
        ],
    );

    let mut type_overrides: HashMap<String, LitStr> = HashMap::new();
    let mut version_overrides: HashMap<String, LitInt> = HashMap::new();

    for v in &mut enum_item.variants {
        let mut retained = Vec::with_capacity(v.attrs.len());
        for attr in v.attrs.drain(..) {
            if !attr.path().is_ident("event") {
                retained.push(attr);
                continue;
            }

            let overrides = match parse_variant_event_attr(&attr) {
                Ok(o) => o,
                Err(err) => return err.to_compile_error().into(),
            };
            let key = v.ident.to_string();
            let duplicate_type = overrides
                .event_type
                .is_some_and(|lit| type_overrides.insert(key.clone(), lit).is_some());
            let duplicate_version = overrides
                .event_version
                .is_some_and(|lit| version_overrides.insert(key, lit).is_some());
            if duplicate_type || duplicate_version {
                return syn::Error::new(attr.span(), "duplicate #[event] override for this variant")
                    .to_compile_error()
                    .into();
            }
        }
        v.attrs = retained;
    }

    let enum_ident = &enum_item.ident;
    let enum_name = enum_ident.to_string();

    let type_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        let lit = type_overrides.get(&v_ident.to_string()).cloned().unwrap_or_else(|| {
            LitStr::new(&format!("{enum_name}.{v_ident}"), v_ident.span())
        });
        quote! { Self::#v_ident { .. } => #lit }
    });

    let version_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        match version_overrides.get(&v_ident.to_string()) {
            Some(lit) => quote! { Self::#v_ident { .. } => #lit },
            None => quote! { Self::#v_ident { .. } => #default_version },
        }
    });

    let (impl_generics, ty_generics, where_clause) = enum_item.generics.split_for_impl();

    let out = quote! {
        #enum_item

        impl #impl_generics ::uow_domain::domain_event::DomainEvent for #enum_ident #ty_generics #where_clause {
            fn event_type(&self) -> &str { match self { #( #type_arms, )* } }
            fn event_version(&self) -> usize { match self { #( #version_arms, )* } }
        }
    };

    TokenStream::from(out)
}

// -------- parsing --------

#[derive(Default)]
struct VariantOverrides {
    event_type: Option<LitStr>,
    event_version: Option<LitInt>,
}

fn parse_variant_event_attr(attr: &syn::Attribute) -> Result<VariantOverrides> {
    let syn::Meta::List(_) = &attr.meta else {
        return Err(syn::Error::new(attr.meta.span(), "expected #[event(...)]"));
    };

    let mut out = VariantOverrides::default();
    let pairs = attr.parse_args_with(Punctuated::<KeyValue, Token![,]>::parse_terminated)?;
    for kv in pairs {
        match (kv.key.to_string().as_str(), kv.value) {
            (
                "event_type",
                Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(lit),
                    ..
                }),
            ) => {
                if out.event_type.replace(lit).is_some() {
                    return Err(syn::Error::new(kv.key.span(), "duplicate key 'event_type'"));
                }
            }
            (
                "event_version",
                Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Int(lit),
                    ..
                }),
            ) => {
                if out.event_version.replace(lit).is_some() {
                    return Err(syn::Error::new(kv.key.span(), "duplicate key 'event_version'"));
                }
            }
            ("event_type", other) => {
                return Err(syn::Error::new(
                    other.span(),
                    "expected string literal for 'event_type'",
                ));
            }
            ("event_version", other) => {
                return Err(syn::Error::new(
                    other.span(),
                    "expected integer literal for 'event_version'",
                ));
            }
            _ => {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "unknown key; expected 'event_type' | 'event_version'",
                ));
            }
        }
    }
    Ok(out)
}

struct KeyValue {
    key: Ident,
    value: Expr,
}

impl Parse for KeyValue {
    fn parse(input: ParseStream) -> Result<Self> {
        let key = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value = input.parse()?;
        Ok(Self { key, value })
    }
}

// 枚举级配置：默认版本号
#[derive(Default)]
struct EventAttrConfig {
    version: Option<LitInt>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = EventAttrConfig::default();
        let pairs = Punctuated::<KeyValue, Token![,]>::parse_terminated(input)?;

        for kv in pairs {
            if kv.key != "version" {
                return Err(syn::Error::new(kv.key.span(), "unknown key; expected 'version'"));
            }
            let lit = match &kv.value {
                Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Int(lit),
                    ..
                }) => lit.clone(),
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "expected integer literal for 'version'",
                    ));
                }
            };
            if cfg.version.replace(lit).is_some() {
                return Err(syn::Error::new(kv.key.span(), "duplicate key 'version'"));
            }
        }
        Ok(cfg)
    }
}
