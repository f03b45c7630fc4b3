use crate::utils::{apply_derives, has_field, push_if_missing, put_first, snake_case};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Field, Item, LitStr, Result, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input,
};

/// #[aggregate] 宏实现
/// - 确保字段 `id: IdType` 位于最前；
/// - `created_at`：追加 `created_at: Timestamp` 并实现 `CreationStamped`；
/// - `events = E`：追加 `#[serde(skip)] pending_events: PendingEvents<E>`；
/// - 实现 `Entity` 与 `Aggregate`（`TYPE`、`Event` 与已声明的能力）。
///
/// 参数：`#[aggregate(name = "...", id = IdType, created_at, events = EventType)]`，
/// `name` 默认取结构体名的 snake_case，`id` 默认 `String`。
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as AggregateAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[aggregate] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_type = cfg.id_ty.unwrap_or_else(|| syn::parse_quote! { String });
    put_first(fields_named, "id", syn::parse_quote! { pub id: #id_type });

    if cfg.created_at && !has_field(fields_named, "created_at") {
        let field: Field = syn::parse_quote! {
            pub created_at: ::uow_domain::stamping::Timestamp
        };
        // 紧随 id 之后
        let mut named: Punctuated<Field, Token![,]> = Punctuated::new();
        let mut iter = fields_named.named.clone().into_iter();
        named.extend(iter.next());
        named.push(field);
        named.extend(iter);
        fields_named.named = named;
    }

    if let Some(event_ty) = &cfg.events {
        push_if_missing(
            fields_named,
            "pending_events",
            syn::parse_quote! {
                #[serde(skip)]
                pending_events: ::uow_domain::domain_event::PendingEvents<#event_ty>
            },
        );
    }

    apply_derives(
        &mut st.attrs,
        vec![
            syn::parse_quote!(Debug),
            syn::parse_quote!(Clone),
            syn::parse_quote!(Default),
            syn::parse_quote!(serde::Serialize),
            syn::parse_quote!(serde::Deserialize),
        ],
    );

    let ident = &st.ident;
    let name = cfg
        .name
        .unwrap_or_else(|| LitStr::new(&snake_case(&ident.to_string()), ident.span()));
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let event_ty: Type = cfg
        .events
        .clone()
        .unwrap_or_else(|| syn::parse_quote! { ::uow_domain::domain_event::NoEvents });

    let stamp_methods = cfg.created_at.then(|| {
        quote! {
            fn creation_stamp(&self) -> ::core::option::Option<&dyn ::uow_domain::stamping::CreationStamped> {
                ::core::option::Option::Some(self)
            }

            fn creation_stamp_mut(&mut self) -> ::core::option::Option<&mut dyn ::uow_domain::stamping::CreationStamped> {
                ::core::option::Option::Some(self)
            }
        }
    });

    let event_methods = cfg.events.is_some().then(|| {
        quote! {
            fn pending_events_mut(&mut self) -> ::core::option::Option<&mut ::uow_domain::domain_event::PendingEvents<Self::Event>> {
                ::core::option::Option::Some(&mut self.pending_events)
            }
        }
    });

    let stamped_impl = cfg.created_at.then(|| {
        quote! {
            impl #impl_generics ::uow_domain::stamping::CreationStamped for #ident #ty_generics #where_clause {
                fn created_at(&self) -> ::uow_domain::stamping::Timestamp {
                    self.created_at
                }

                fn set_created_at(&mut self, at: ::uow_domain::stamping::Timestamp) {
                    self.created_at = at;
                }
            }
        }
    });

    let expanded = quote! {
        #st

        impl #impl_generics ::uow_domain::entity::Entity for #ident #ty_generics #where_clause {
            type Id = #id_type;

            fn id(&self) -> &Self::Id { &self.id }
        }

        impl #impl_generics ::uow_domain::aggregate::Aggregate for #ident #ty_generics #where_clause {
            const TYPE: &'static str = #name;

            type Event = #event_ty;

            #stamp_methods
            #event_methods
        }

        #stamped_impl
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

#[derive(Default)]
struct AggregateAttrConfig {
    name: Option<LitStr>,
    id_ty: Option<Type>,
    created_at: bool,
    events: Option<Type>,
}

impl Parse for AggregateAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = AggregateAttrConfig::default();
        if input.is_empty() {
            return Ok(cfg);
        }

        let elems: Punctuated<AggregateAttrElem, Token![,]> =
            Punctuated::<AggregateAttrElem, Token![,]>::parse_terminated(input)?;

        for elem in elems {
            let duplicate = match elem {
                AggregateAttrElem::Name(lit) => cfg.name.replace(lit).map(|l| l.span()),
                AggregateAttrElem::Id(ty) => cfg.id_ty.replace(*ty).map(|t| t.span()),
                AggregateAttrElem::Events(ty) => cfg.events.replace(*ty).map(|t| t.span()),
                AggregateAttrElem::CreatedAt(span) => {
                    let seen = cfg.created_at.then_some(span);
                    cfg.created_at = true;
                    seen
                }
            };
            if let Some(span) = duplicate {
                return Err(syn::Error::new(span, "duplicate key in #[aggregate] attribute"));
            }
        }

        Ok(cfg)
    }
}

enum AggregateAttrElem {
    Name(LitStr),
    Id(Box<Type>),
    CreatedAt(proc_macro2::Span),
    Events(Box<Type>),
}

impl Parse for AggregateAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key == "created_at" {
            return Ok(AggregateAttrElem::CreatedAt(key.span()));
        }

        let _eq: Token![=] = input.parse()?;
        if key == "name" {
            Ok(AggregateAttrElem::Name(input.parse()?))
        } else if key == "id" {
            Ok(AggregateAttrElem::Id(Box::new(input.parse()?)))
        } else if key == "events" {
            Ok(AggregateAttrElem::Events(Box::new(input.parse()?)))
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'name', 'id', 'created_at' or 'events'",
            ))
        }
    }
}
