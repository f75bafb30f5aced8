use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Error, Fields, GenericArgument, Lit, PathArguments, Result, Type};
use touchstone_core::{FieldKind, IGNORE, Tag};

struct BundleField {
    ident: syn::Ident,
    type_name: String,
    kind: FieldKind,
    optional: bool,
    tags: Vec<(Tag, String)>,
}

impl BundleField {
    fn skipped(&self) -> bool {
        self.tags
            .iter()
            .any(|(tag, value)| *tag == Tag::Ignore && value == IGNORE)
    }

    fn schema_field(&self) -> TokenStream {
        let ident = self.ident.unraw().to_string();
        let type_name = &self.type_name;
        let kind = format_ident!("{}", format!("{:?}", self.kind));
        let tags = self.tags.iter().map(|(tag, value)| {
            let tag = format_ident!("{}", format!("{:?}", tag));
            quote! { .tag(::touchstone::core::Tag::#tag, #value) }
        });

        quote! {
            ::touchstone::core::Field::new(#ident, #type_name, ::touchstone::core::FieldKind::#kind)
                #(#tags)*
        }
    }

    fn value(&self, index: usize) -> TokenStream {
        if self.kind.is_metric() && !self.skipped() {
            quote! { populated.take(#index)? }
        } else if self.optional {
            quote! { ::std::option::Option::None }
        } else {
            quote! { ::std::default::Default::default() }
        }
    }
}

pub fn expand_bundle_derive(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(Error::new_spanned(
                    &input,
                    "Bundle can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input,
                "Bundle can only be derived for structs",
            ));
        }
    };

    let mut bundle_fields = Vec::new();
    for field in fields {
        bundle_fields.push(parse_field(field)?);
    }

    let type_name = name.unraw().to_string();
    let schema_fields = bundle_fields.iter().map(BundleField::schema_field);
    let idents = bundle_fields.iter().map(|f| &f.ident);
    let values = bundle_fields.iter().enumerate().map(|(i, f)| f.value(i));

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::touchstone::core::Bundle for #name #ty_generics #where_clause {
            fn schema() -> ::touchstone::core::Schema {
                ::touchstone::core::Schema::new(#type_name)
                    #(.field(#schema_fields))*
            }

            #[allow(unused_mut, unused_variables)]
            fn from_populated(
                mut populated: ::touchstone::core::Populated,
            ) -> ::std::result::Result<Self, ::touchstone::core::Error> {
                ::std::result::Result::Ok(Self {
                    #(#idents: #values,)*
                })
            }
        }
    })
}

fn parse_field(field: &syn::Field) -> Result<BundleField> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "Bundle fields must be named"))?;

    let (inner, optional) = match option_inner(&field.ty) {
        Some(inner) => (inner, true),
        None => (&field.ty, false),
    };
    let kind = last_segment(inner)
        .map(|s| FieldKind::from_type_name(&s))
        .unwrap_or(FieldKind::Other);

    let mut tags: Vec<(Tag, String)> = Vec::new();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("metric")) {
        attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .map(|i| i.unraw().to_string())
                .unwrap_or_default();

            let (tag, value) = if key == "skip" {
                (Tag::Ignore, IGNORE.to_string())
            } else if let Some(tag) = Tag::from_key(&key) {
                (tag, literal_value(&meta.value()?.parse()?)?)
            } else {
                return Err(meta.error(format!("unknown metric attribute '{key}'")));
            };

            if tags.iter().any(|(t, _)| *t == tag) {
                return Err(meta.error(format!("duplicate metric attribute '{tag}'")));
            }

            tags.push((tag, value));
            Ok(())
        })?;
    }

    let field = BundleField {
        ident,
        type_name: type_name(&field.ty),
        kind,
        optional,
        tags,
    };

    if field.kind.is_metric() && field.skipped() && !field.optional {
        return Err(Error::new_spanned(
            &field.ident,
            "a skipped metric field must be an Option, since metric handles have no default",
        ));
    }

    Ok(field)
}

fn literal_value(lit: &Lit) -> Result<String> {
    match lit {
        Lit::Str(s) => Ok(s.value()),
        Lit::Int(i) => Ok(i.base10_digits().to_string()),
        Lit::Float(f) => Ok(f.base10_digits().to_string()),
        other => Err(Error::new_spanned(other, "expected a string or a number")),
    }
}

/// The `T` of an `Option<T>`, written as `Option`, `std::option::Option` or similar.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }

    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn last_segment(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) if path.qself.is_none() => {
            path.path.segments.last().map(|s| s.ident.to_string())
        }
        _ => None,
    }
}

fn type_name(ty: &Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_kind_detection() {
        let cases: Vec<(Type, FieldKind)> = vec![
            (parse_quote!(Counter), FieldKind::Counter),
            (parse_quote!(prometheus::CounterVec), FieldKind::CounterVec),
            (parse_quote!(::touchstone::core::Observer), FieldKind::Observer),
            (parse_quote!(touchstone::core::SummaryVec), FieldKind::SummaryVec),
            (parse_quote!(u64), FieldKind::Other),
            (parse_quote!(&'static str), FieldKind::Other),
        ];

        for (ty, expected) in cases {
            let kind = last_segment(&ty)
                .map(|s| FieldKind::from_type_name(&s))
                .unwrap_or(FieldKind::Other);
            assert_eq!(kind, expected, "{}", type_name(&ty));
        }
    }

    #[test]
    fn test_option_inner() {
        let ty: Type = parse_quote!(Option<prometheus::Gauge>);
        assert_eq!(type_name(option_inner(&ty).unwrap()), "prometheus::Gauge");

        let ty: Type = parse_quote!(std::option::Option<Histogram>);
        assert!(option_inner(&ty).is_some());

        let ty: Type = parse_quote!(Vec<Histogram>);
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_parse_field_tags() {
        let field: syn::Field = parse_quote! {
            #[metric(help = "request latency", buckets = "0.1, 0.5", age_buckets = 3, type = "summary")]
            latency: Observer
        };

        let field = parse_field(&field).unwrap();
        assert_eq!(field.kind, FieldKind::Observer);
        assert_eq!(
            field.tags,
            vec![
                (Tag::Help, "request latency".to_string()),
                (Tag::Buckets, "0.1, 0.5".to_string()),
                (Tag::AgeBuckets, "3".to_string()),
                (Tag::Type, "summary".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_field_rejections() {
        let unknown: syn::Field = parse_quote! {
            #[metric(labels = "code")]
            requests: CounterVec
        };
        assert!(parse_field(&unknown).is_err());

        let duplicate: syn::Field = parse_quote! {
            #[metric(help = "a", help = "b")]
            requests: Counter
        };
        assert!(parse_field(&duplicate).is_err());

        let skipped: syn::Field = parse_quote! {
            #[metric(skip)]
            requests: Counter
        };
        assert!(parse_field(&skipped).is_err());

        let skipped_option: syn::Field = parse_quote! {
            #[metric(skip)]
            requests: Option<Counter>
        };
        assert!(parse_field(&skipped_option).unwrap().skipped());
    }

    #[test]
    fn test_raw_identifier() {
        let field: syn::Field = parse_quote! {
            r#type: Gauge
        };
        let tokens = parse_field(&field).unwrap().schema_field().to_string();
        assert!(tokens.contains("\"type\""));
    }
}
