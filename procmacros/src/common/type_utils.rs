//! Declared-type inspection helpers.

use syn::Type;

/// Check if a type is an `Option<T>`.
pub(crate) fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

/// Get the inner type of `Option<T>`, or `None` for non-`Option` types.
pub(crate) fn option_inner_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };

    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }

    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
        if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
            return Some(inner);
        }
    }
    None
}

/// The base type of a declaration: `T` from `Option<T>`, otherwise the
/// type itself.
pub(crate) fn base_type_of(ty: &Type) -> &Type {
    option_inner_type(ty).unwrap_or(ty)
}

/// The trailing identifier of a plain path type (`schema::Author` →
/// `Author`), or `None` for non-path types and generic paths.
pub(crate) fn type_ident(ty: &Type) -> Option<&syn::Ident> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if !segment.arguments.is_empty() {
        return None;
    }
    Some(&segment.ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_one_level_of_option() {
        let ty: Type = syn::parse_str("Option<Author>").unwrap();
        assert!(is_option_type(&ty));
        let inner = base_type_of(&ty);
        assert_eq!(type_ident(inner).unwrap(), "Author");
    }

    #[test]
    fn base_type_of_plain_type_is_identity() {
        let ty: Type = syn::parse_str("i64").unwrap();
        assert_eq!(type_ident(base_type_of(&ty)).unwrap(), "i64");
    }
}
