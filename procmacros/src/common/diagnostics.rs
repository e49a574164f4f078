//! Error accumulation for one generation round.
//!
//! Configuration and resolution problems are collected here instead of
//! aborting, so a single compilation surfaces every error in the module.
//! The collected errors are appended to the macro output as
//! `compile_error!` invocations alongside whatever code was generated.

use proc_macro2::{Span, TokenStream};
use quote::quote;

#[derive(Default)]
pub(crate) struct Diagnostics {
    errors: Vec<syn::Error>,
}

impl Diagnostics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn error(&mut self, span: Span, message: impl std::fmt::Display) {
        self.errors.push(syn::Error::new(span, message));
    }

    pub(crate) fn push(&mut self, error: syn::Error) {
        self.errors.push(error);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.errors.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Render every collected error as a `compile_error!` token stream.
    pub(crate) fn to_compile_errors(&self) -> TokenStream {
        let errors = self.errors.iter().map(syn::Error::to_compile_error);
        quote! { #(#errors)* }
    }

    #[cfg(test)]
    pub(crate) fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}
