//! Utilities shared across the macro implementation.

pub(crate) mod diagnostics;
pub(crate) mod type_utils;

pub(crate) use diagnostics::Diagnostics;
pub(crate) use type_utils::{base_type_of, is_option_type, type_ident};
