//! Procedural macros for auto-log.
//!
//! # Free function
//!
//! ```rust,ignore
//! use auto_log::auto_log;
//!
//! #[auto_log(slow_threshold_mills = 100)]
//! fn checkout(cart_id: u64) -> Result<Receipt, CheckoutError> {
//!     // ...
//! }
//! ```
//!
//! # Component
//!
//! ```rust,ignore
//! use auto_log::component;
//!
//! #[component]
//! impl Calculator {
//!     #[auto_log]
//!     pub fn add(&self, a: i32, b: i32) -> i32 {
//!         a + b
//!     }
//!
//!     #[auto_log(param = false, exception = false)]
//!     pub async fn fetch(&self, key: String) -> Option<i32> {
//!         // ...
//!     }
//!
//!     pub fn reset(&mut self) {
//!         // not annotated: never intercepted
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2, TokenTree};
use quote::{quote, ToTokens};
use syn::{
    parse_macro_input, Attribute, Block, FnArg, Ident, ImplItem, ItemFn, ItemImpl, LitBool, LitInt, Meta, Pat,
    ReturnType, Signature, Token, Type,
};

/// Logs entry, result, elapsed time, slow calls and failures of a function.
///
/// # Attributes
/// - `param = bool` - log the arguments before the call (default `true`)
/// - `result = bool` - log the return value (default `true`)
/// - `cost_time = bool` - log the elapsed milliseconds (default `true`)
/// - `slow_threshold_mills = int` - warn when elapsed reaches it; negative disables (default `-1`)
/// - `exception = bool` - log failures before re-raising them (default `true`)
///
/// Arguments must be plain identifiers implementing `Debug`, and so must the
/// return value. Both render with `Debug`, so string values appear quoted
/// (`name result is "ok".`). A return type whose path ends in `Result` is
/// fallible: `Err` takes the failure path.
///
/// Inside a `#[component]` impl block this attribute is a marker consumed by
/// `#[component]`. It does not need to be imported there; a module that only
/// declares components imports `component` alone.
#[proc_macro_attribute]
pub fn auto_log(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as AutoLogArgs);
    let input = parse_macro_input!(item as ItemFn);

    match expand_function(args, input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

/// Marks an inherent impl block as an interceptable component.
///
/// Implements `auto_log::Component` for the self type with a method table
/// covering every method in the block, and routes the `#[auto_log]` methods
/// through the interceptor.
///
/// The `#[auto_log]` markers are stripped here before name resolution, so
/// only `component` itself has to be in scope.
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let err = syn::Error::new(Span::call_site(), "#[component] takes no arguments");
        return TokenStream::from(err.to_compile_error());
    }
    let input = parse_macro_input!(item as ItemImpl);

    match expand_component(input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

#[derive(Debug, Default)]
struct AutoLogArgs {
    param: Option<bool>,
    result: Option<bool>,
    cost_time: Option<bool>,
    slow_threshold_mills: Option<i64>,
    exception: Option<bool>,
}

impl syn::parse::Parse for AutoLogArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut args = AutoLogArgs::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "param" => set_once(&mut args.param, parse_bool(input)?, &ident)?,
                "result" => set_once(&mut args.result, parse_bool(input)?, &ident)?,
                "cost_time" | "costTime" => set_once(&mut args.cost_time, parse_bool(input)?, &ident)?,
                "slow_threshold_mills" | "slowThresholdMills" => {
                    set_once(&mut args.slow_threshold_mills, parse_millis(input)?, &ident)?
                }
                "exception" => set_once(&mut args.exception, parse_bool(input)?, &ident)?,
                _ => return Err(syn::Error::new(ident.span(), "unknown auto_log option")),
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

impl AutoLogArgs {
    fn from_marker(attr: &Attribute) -> syn::Result<Self> {
        match &attr.meta {
            Meta::Path(_) => Ok(Self::default()),
            Meta::List(_) => attr.parse_args(),
            Meta::NameValue(nv) => Err(syn::Error::new_spanned(nv, "expected #[auto_log] or #[auto_log(...)]")),
        }
    }

    /// `const` expression building the `AutoLog` value.
    fn to_options(&self) -> TokenStream2 {
        let mut options = quote! { ::auto_log::AutoLog::new() };
        if let Some(v) = self.param {
            options.extend(quote! { .param(#v) });
        }
        if let Some(v) = self.result {
            options.extend(quote! { .result(#v) });
        }
        if let Some(v) = self.cost_time {
            options.extend(quote! { .cost_time(#v) });
        }
        if let Some(v) = self.slow_threshold_mills {
            options.extend(quote! { .slow_threshold_mills(#v) });
        }
        if let Some(v) = self.exception {
            options.extend(quote! { .exception(#v) });
        }
        options
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, ident: &Ident) -> syn::Result<()> {
    if slot.is_some() {
        return Err(syn::Error::new(ident.span(), format!("duplicate option `{}`", ident)));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_bool(input: syn::parse::ParseStream) -> syn::Result<bool> {
    let value: LitBool = input.parse()?;
    Ok(value.value)
}

fn parse_millis(input: syn::parse::ParseStream) -> syn::Result<i64> {
    let negative = input.peek(Token![-]);
    if negative {
        input.parse::<Token![-]>()?;
    }
    let value: LitInt = input.parse()?;
    let millis: i64 = value.base10_parse()?;
    Ok(if negative { -millis } else { millis })
}

/// What the rewritten body needs to know about the function.
struct FnShape {
    name: String,
    args: Vec<Ident>,
    parameter_types: Vec<String>,
    return_type: Option<Type>,
    fallible: bool,
    is_async: bool,
}

impl FnShape {
    fn of(sig: &Signature) -> syn::Result<Self> {
        let mut args = Vec::new();
        let mut parameter_types = Vec::new();

        for input in &sig.inputs {
            if let FnArg::Typed(pat_type) = input {
                match &*pat_type.pat {
                    Pat::Ident(pat) if pat.subpat.is_none() => args.push(pat.ident.clone()),
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "auto_log arguments must be plain identifiers",
                        ))
                    }
                }
                parameter_types.push(pat_type.ty.to_token_stream().to_string());
            }
        }

        let return_type = match &sig.output {
            ReturnType::Default => None,
            ReturnType::Type(_, ty) => Some((**ty).clone()),
        };

        Ok(Self {
            name: sig.ident.to_string(),
            args,
            parameter_types,
            fallible: return_type.as_ref().map(is_result).unwrap_or(false),
            return_type,
            is_async: sig.asyncness.is_some(),
        })
    }

    fn signature(&self) -> TokenStream2 {
        let name = &self.name;
        let types = &self.parameter_types;
        quote! { ::auto_log::MethodSignature::new(#name, &[#(#types),*]) }
    }

    /// Dead `return` pinning the body's type so `?` and `return` infer.
    fn fake_return(&self) -> TokenStream2 {
        let ty = match &self.return_type {
            None => quote! { () },
            Some(ty) if mentions_impl_trait(ty) => return TokenStream2::new(),
            Some(ty) => ty.to_token_stream(),
        };
        quote! {
            #[allow(unknown_lints, unreachable_code, clippy::diverging_sub_expression, clippy::let_unit_value, clippy::empty_loop)]
            if false {
                let __auto_log_fake_return: #ty = loop {};
                return __auto_log_fake_return;
            }
        }
    }

    /// Statements that route `block` through the aspect installed at call time.
    fn intercepted_body(&self, block: &Block, target: TokenStream2) -> TokenStream2 {
        let args = &self.args;
        let stmts = &block.stmts;
        let fake_return = self.fake_return();

        let finish = match (self.is_async, self.fallible) {
            (false, false) => quote! { finish },
            (false, true) => quote! { finish_fallible },
            (true, false) => quote! { finish_async },
            (true, true) => quote! { finish_fallible_async },
        };
        let call = if self.is_async {
            quote! {
                ::auto_log::__private::#finish(__auto_log_invocation, async move {
                    #fake_return
                    #(#stmts)*
                })
                .await
            }
        } else {
            quote! {
                ::auto_log::__private::#finish(__auto_log_invocation, move || {
                    #fake_return
                    #(#stmts)*
                })
            }
        };

        quote! {
            let __auto_log_aspect = ::auto_log::__private::current();
            let __auto_log_invocation = ::auto_log::__private::enter(
                ::core::option::Option::as_deref(&__auto_log_aspect),
                #target,
                &__AUTO_LOG_SIGNATURE,
            );
            if let ::core::option::Option::Some(__auto_log_invocation) = &__auto_log_invocation {
                __auto_log_invocation.log_args(::auto_log::__private::Args(&[
                    #(&#args as &dyn ::core::fmt::Debug),*
                ]));
            }
            #call
        }
    }
}

fn is_result(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident == "Result")
            .unwrap_or(false),
        Type::Paren(inner) => is_result(&inner.elem),
        Type::Group(inner) => is_result(&inner.elem),
        _ => false,
    }
}

fn mentions_impl_trait(ty: &Type) -> bool {
    fn scan(tokens: TokenStream2) -> bool {
        tokens.into_iter().any(|tree| match tree {
            TokenTree::Ident(ident) => ident == "impl",
            TokenTree::Group(group) => scan(group.stream()),
            _ => false,
        })
    }
    scan(ty.to_token_stream())
}

fn expand_function(args: AutoLogArgs, mut input: ItemFn) -> syn::Result<TokenStream2> {
    let shape = FnShape::of(&input.sig)?;
    let signature = shape.signature();
    let options = args.to_options();
    let body = shape.intercepted_body(&input.block, quote! { &__AUTO_LOG_COMPONENT });

    let block = quote! {
        {
            const __AUTO_LOG_SIGNATURE: ::auto_log::MethodSignature = #signature;
            const __AUTO_LOG_METHODS: &[::auto_log::MethodDescriptor] =
                &[::auto_log::MethodDescriptor::annotated(__AUTO_LOG_SIGNATURE, #options)];
            const __AUTO_LOG_COMPONENT: ::auto_log::ModuleComponent =
                ::auto_log::ModuleComponent::new(::core::module_path!(), __AUTO_LOG_METHODS);
            #body
        }
    };
    input.block = Box::new(syn::parse2(block)?);

    Ok(input.into_token_stream())
}

fn is_marker(attr: &Attribute) -> bool {
    attr.path()
        .segments
        .last()
        .map(|segment| segment.ident == "auto_log")
        .unwrap_or(false)
}

fn expand_component(mut input: ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[component] must be placed on an inherent impl block",
        ));
    }

    let self_ty = input.self_ty.clone();
    let type_name = match &*self_ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        other => other.to_token_stream().to_string(),
    };

    let mut descriptors = Vec::new();

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };

        let mut markers = method.attrs.iter().filter(|attr| is_marker(attr));
        let marker = markers.next().cloned();
        if let Some(duplicate) = markers.next() {
            return Err(syn::Error::new_spanned(duplicate, "duplicate #[auto_log] attribute"));
        }
        // Remove our attribute (it's consumed here, not expanded on its own)
        method.attrs.retain(|attr| !is_marker(attr));

        let shape = FnShape::of(&method.sig);
        let marker = match (marker, shape) {
            (Some(marker), Ok(shape)) => Some((marker, shape)),
            (Some(_), Err(err)) => return Err(err),
            (None, _) => None,
        };

        match marker {
            Some((marker, shape)) => {
                let signature = shape.signature();
                let options = AutoLogArgs::from_marker(&marker)?.to_options();
                descriptors.push(quote! {
                    ::auto_log::MethodDescriptor::annotated(#signature, #options)
                });

                let body = shape.intercepted_body(&method.block, quote! { &Self::__AUTO_LOG_COMPONENT });
                let block = quote! {
                    {
                        const __AUTO_LOG_SIGNATURE: ::auto_log::MethodSignature = #signature;
                        #body
                    }
                };
                method.block = syn::parse2(block)?;
            }
            None => {
                let signature = plain_signature(&method.sig);
                descriptors.push(quote! {
                    ::auto_log::MethodDescriptor::plain(#signature)
                });
            }
        }
    }

    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #input

        impl #impl_generics #self_ty #where_clause {
            #[doc(hidden)]
            #[allow(dead_code)]
            const __AUTO_LOG_METHODS: &'static [::auto_log::MethodDescriptor] = &[#(#descriptors),*];

            #[doc(hidden)]
            #[allow(dead_code)]
            const __AUTO_LOG_COMPONENT: ::auto_log::ModuleComponent = ::auto_log::ModuleComponent::new(
                ::core::concat!(::core::module_path!(), "::", #type_name),
                Self::__AUTO_LOG_METHODS,
            );
        }

        impl #impl_generics ::auto_log::Component for #self_ty #where_clause {
            fn component_path(&self) -> &'static str {
                ::core::concat!(::core::module_path!(), "::", #type_name)
            }

            fn method_table(&self) -> &'static [::auto_log::MethodDescriptor] {
                Self::__AUTO_LOG_METHODS
            }
        }
    })
}

/// Signature of an unannotated method; its argument patterns may be anything.
fn plain_signature(sig: &Signature) -> TokenStream2 {
    let name = sig.ident.to_string();
    let types = sig.inputs.iter().filter_map(|input| match input {
        FnArg::Typed(pat_type) => Some(pat_type.ty.to_token_stream().to_string()),
        FnArg::Receiver(_) => None,
    });
    quote! { ::auto_log::MethodSignature::new(#name, &[#(#types),*]) }
}
