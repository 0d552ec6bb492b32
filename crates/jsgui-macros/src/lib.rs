use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, FnArg, Ident, ItemFn, LitStr, Pat, PatIdent, PatType, Type};

/// Name override parsed from `#[component(name = "...")]` or `#[component(fragment)]`.
#[derive(Default)]
struct ComponentArgs {
    name: Option<LitStr>,
}

impl ComponentArgs {
    fn parse(attr: TokenStream2) -> syn::Result<Self> {
        let mut args = ComponentArgs::default();
        if attr.is_empty() {
            return Ok(args);
        }
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("name") {
                args.name = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("fragment") {
                args.name = Some(LitStr::new("", Span::call_site()));
                Ok(())
            } else {
                Err(meta.error("unsupported component attribute"))
            }
        });
        syn::parse::Parser::parse2(parser, attr)?;
        Ok(args)
    }
}

/// Argument as seen by the generated constructor.
struct Param {
    ident: Ident,
    ty: Box<Type>,
}

fn outer_ident(pat: &Pat, index: usize) -> Ident {
    match pat {
        Pat::Ident(PatIdent {
            ident, subpat: None, ..
        }) => ident.clone(),
        _ => Ident::new(&format!("__arg{index}"), Span::call_site()),
    }
}

fn component_name(func: &ItemFn, args: &ComponentArgs) -> syn::Result<LitStr> {
    if let Some(name) = &args.name {
        return Ok(name.clone());
    }
    let ident = func.sig.ident.to_string();
    let name = ident.strip_prefix("r#").unwrap_or(&ident);
    if name.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.ident,
            "component name cannot be empty; use #[component(fragment)]",
        ));
    }
    Ok(LitStr::new(name, func.sig.ident.span()))
}

/// Turns `fn name(cx: &mut RenderContext<'_>, args..) -> R` into a constructor
/// `fn name(args..) -> ComponentNode`.
///
/// The body becomes the node's render function. Arguments are captured by the
/// node and cloned into every pass, so they must be `Clone + 'static`.
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match ComponentArgs::parse(TokenStream2::from(attr)) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };
    let func = parse_macro_input!(item as ItemFn);
    match expand(func, &args) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(func: ItemFn, args: &ComponentArgs) -> syn::Result<TokenStream2> {
    if !func.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.generics,
            "components cannot be generic",
        ));
    }
    if let Some(asyncness) = &func.sig.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "components cannot be async"));
    }
    let name = component_name(&func, args)?;

    let mut inputs = func.sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Typed(_)) => {}
        Some(other) => {
            return Err(syn::Error::new_spanned(
                other,
                "components are free functions taking the render context first",
            ))
        }
        None => {
            return Err(syn::Error::new_spanned(
                &func.sig,
                "a component takes `&mut RenderContext<'_>` as its first argument",
            ))
        }
    }

    let mut params = Vec::new();
    for (index, arg) in inputs.enumerate() {
        let FnArg::Typed(PatType { pat, ty, .. }) = arg else {
            return Err(syn::Error::new_spanned(arg, "unexpected receiver"));
        };
        if matches!(**ty, Type::ImplTrait(_)) {
            return Err(syn::Error::new_spanned(
                ty,
                "component arguments are stored in the node and need a nameable type",
            ));
        }
        params.push(Param {
            ident: outer_ident(pat, index),
            ty: ty.clone(),
        });
    }

    let ItemFn {
        attrs, vis, sig, block, ..
    } = func;
    let ident = &sig.ident;
    let render_inputs = &sig.inputs;
    let output = &sig.output;

    let outer_inputs = params.iter().map(|Param { ident, ty }| quote! { #ident: #ty });
    let idents: Vec<&Ident> = params.iter().map(|param| &param.ident).collect();
    let types: Vec<&Type> = params.iter().map(|param| &*param.ty).collect();
    let indices = (0..params.len()).map(syn::Index::from);

    Ok(quote! {
        #(#attrs)*
        #vis fn #ident(#(#outer_inputs),*) -> jsgui_core::ComponentNode {
            #[allow(clippy::too_many_arguments)]
            fn __render(#render_inputs) #output #block

            jsgui_core::ComponentNode::from_render(
                jsgui_core::ComponentName::fixed(#name),
                (#(#idents,)*),
                |__cx: &mut jsgui_core::RenderContext<'_>, __args: &(#(#types,)*)| {
                    let _ = &__args;
                    jsgui_core::IntoRenderResult::into_render_result(
                        __render(__cx #(, ::core::clone::Clone::clone(&__args.#indices))*)
                    )
                },
            )
        }
    })
}
