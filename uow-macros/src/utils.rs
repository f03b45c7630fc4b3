use quote::ToTokens;
use syn::{Attribute, Field, FieldsNamed, Token, punctuated::Punctuated};

// 提取非 derive 属性与已有 derive 列表
fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("derive") {
            retained.push(attr.clone());
            continue;
        }
        if let Ok(list) = attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
        {
            existing.extend(list);
        }
    }
    (retained, existing)
}

// 归一化 derive 的 key，避免 Serialize/serde::Serialize 重复
fn derive_key(p: &syn::Path) -> String {
    match p.segments.last() {
        Some(last) => {
            let ident = last.ident.to_string();
            match ident.as_str() {
                "Serialize" | "Deserialize" => format!("serde::{ident}"),
                _ => ident,
            }
        }
        None => p.to_token_stream().to_string(),
    }
}

/// 合并宏要求的 derive 与用户已写的 derive（去重，required 在前），
/// 合并后的 `#[derive]` 放在最前，保证 `#[serde(..)]` 等辅助属性可用
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);

    let mut seen = std::collections::HashSet::<String>::new();
    let merged: Vec<syn::Path> = required
        .into_iter()
        .chain(existing)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();

    let derive: Attribute = syn::parse_quote!(#[derive(#(#merged),*)]);
    *attrs = std::iter::once(derive).chain(retained).collect();
}

pub(crate) fn has_field(fields: &FieldsNamed, name: &str) -> bool {
    fields
        .named
        .iter()
        .any(|f| f.ident.as_ref().is_some_and(|i| i == name))
}

/// 把字段放到最前：已存在则移动原定义，否则使用给定定义
pub(crate) fn put_first(fields: &mut FieldsNamed, name: &str, field: Field) {
    let mut rest: Punctuated<Field, Token![,]> = Punctuated::new();
    let mut first = field;
    for f in fields.named.clone() {
        if f.ident.as_ref().is_some_and(|i| i == name) {
            first = f;
        } else {
            rest.push(f);
        }
    }

    let mut named: Punctuated<Field, Token![,]> = Punctuated::new();
    named.push(first);
    named.extend(rest);
    fields.named = named;
}

/// 缺失时在末尾追加字段
pub(crate) fn push_if_missing(fields: &mut FieldsNamed, name: &str, field: Field) {
    if !has_field(fields, name) {
        fields.named.push(field);
    }
}

/// `OrderItem` → `order_item`
pub(crate) fn snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
