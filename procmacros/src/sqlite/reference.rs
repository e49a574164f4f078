//! Reference columns: foreign keys and embedded column maps.
//!
//! A reference column's lifecycle has two phases. Classification runs in
//! the constructor with no cross-entity lookups, because the rest of the
//! module may not have been discovered yet. Resolution runs lazily on
//! first access to the reference list, by which point every definition in
//! the round is registered; it executes at most once per column and
//! latches its outcome.

use loam_core::{ConflictAction, ForeignKeyAction};
use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Expr, ExprPath, Field, Ident, Lit, Meta, Token, Type};

use super::field::{ColumnDefinition, SQLiteType, parse_conflict_action};
use super::reference_def::ReferenceDefinition;
use super::registry::{DefinitionKind, ReferenceLookup, TypeCatalog};
use crate::common::{Diagnostics, base_type_of, is_option_type, type_ident};

/// One declared column-to-column mapping request, authored via a
/// `references(…)` attribute entry. Immutable; order follows declaration
/// order.
#[derive(Clone)]
pub(crate) struct ReferenceSpecification {
    /// Column name on the owning table.
    pub(crate) column_name: String,
    /// Column name on the referenced definition.
    pub(crate) reference_name: String,
    pub(crate) on_null_conflict: ConflictAction,
    pub(crate) default_value: Option<Expr>,
}

/// Which annotation classified this column.
pub(crate) enum ReferenceMapping {
    /// `#[column_map]`: embedded composite value object.
    ColumnMapping,
    /// `#[foreign_key]`: reference to another table's row.
    ForeignKeyMapping {
        on_delete: ForeignKeyAction,
        on_update: ForeignKeyAction,
        deferred: bool,
        save_cascade: bool,
        delete_cascade: bool,
    },
}

/// How a reference column reaches the values it persists. Computed once
/// at classification; every combiner takes it as an explicit parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelationKind {
    /// Plain key column typed as the target key's type; no sub-object.
    Scalar,
    /// The referenced row struct implements the runtime `Model` trait;
    /// cascades call `Model::save`/`Model::delete` on the value.
    ModelRow,
    /// Table-annotated referenced struct without a `Model` impl; cascades
    /// go through the generated adapter functions.
    AdapterRow,
    /// The owning column passes through a `TypeConverter`; compared and
    /// bound as the converted type, never cascaded.
    Converted,
}

/// One-shot resolution latch. `Failed` is terminal: a missing referenced
/// definition is reported once and never retried.
pub(crate) enum ReferenceResolution {
    Unresolved,
    Resolved(Vec<ReferenceDefinition>),
    Failed,
}

/// Registry metadata about the referenced definition, captured when
/// resolution succeeds so emission never re-queries the registry.
pub(crate) struct ResolvedTarget {
    pub(crate) struct_ident: Ident,
    pub(crate) adapter_ident: Ident,
    pub(crate) table_name: String,
    pub(crate) kind: DefinitionKind,
}

/// Which annotation is on the field.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReferenceAttrKind {
    ColumnMap,
    ForeignKey,
}

/// The kind of definition that owns the column.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum OwnerKind {
    Table,
    QueryModel,
}

pub(crate) struct ReferenceColumnDefinition {
    pub(crate) field_ident: Ident,
    /// External column name; collapsed to the single physical column name
    /// for scalar foreign keys after resolution.
    pub(crate) column_name: String,
    pub(crate) base_type: Type,
    pub(crate) is_nullable: bool,
    pub(crate) mapping: ReferenceMapping,
    /// The entity type this column points to; `None` after a reported
    /// configuration error.
    pub(crate) referenced_type: Option<Ident>,
    /// Key-only loading: the referenced row is not eagerly loaded.
    pub(crate) stubbed: bool,
    /// The expanded key columns participate in the owning primary key.
    pub(crate) is_primary: bool,
    pub(crate) kind: RelationKind,
    pub(crate) specs: Vec<ReferenceSpecification>,
    pub(crate) converter: Option<ExprPath>,
    /// Populated alongside a successful resolution.
    pub(crate) target: Option<ResolvedTarget>,
    scalar_affinity: SQLiteType,
    resolution: ReferenceResolution,
}

impl ReferenceColumnDefinition {
    pub(crate) fn from_field(
        field: &Field,
        attr: &syn::Attribute,
        attr_kind: ReferenceAttrKind,
        owner: OwnerKind,
        catalog: &TypeCatalog,
        diag: &mut Diagnostics,
    ) -> Option<Self> {
        let field_ident = field.ident.clone()?;
        let is_nullable = is_option_type(&field.ty);
        let base_type = base_type_of(&field.ty).clone();
        let declared_name = type_ident(&base_type).cloned();

        let mut definition = match attr_kind {
            ReferenceAttrKind::ColumnMap => Self::classify_column_map(
                field_ident,
                base_type,
                is_nullable,
                declared_name,
                attr,
                catalog,
                diag,
            ),
            ReferenceAttrKind::ForeignKey => Self::classify_foreign_key(
                field_ident,
                base_type,
                is_nullable,
                declared_name,
                attr,
                owner,
                catalog,
                diag,
            ),
        }?;

        if !definition.is_nullable {
            diag.error(
                definition.field_ident.span(),
                "reference columns must be nullable since the relationship may be absent; \
                 declare the field as Option<…>",
            );
        }

        if definition.referenced_type.is_none() {
            diag.error(
                definition.field_ident.span(),
                "the referenced type could not be determined from the declared field type; \
                 specify it explicitly with `table = …`",
            );
        }

        definition.scalar_affinity =
            SQLiteType::from_rust_type(&definition.base_type).unwrap_or(SQLiteType::Numeric);

        Some(definition)
    }

    fn classify_column_map(
        field_ident: Ident,
        base_type: Type,
        is_nullable: bool,
        declared_name: Option<Ident>,
        attr: &syn::Attribute,
        _catalog: &TypeCatalog,
        diag: &mut Diagnostics,
    ) -> Option<Self> {
        let specs = if matches!(attr.meta, Meta::Path(_)) {
            Vec::new()
        } else {
            parse_reference_specifications(attr, diag)?
        };

        Some(Self {
            column_name: field_ident.to_string(),
            field_ident,
            base_type,
            is_nullable,
            mapping: ReferenceMapping::ColumnMapping,
            referenced_type: declared_name,
            // column map is stubbed
            stubbed: true,
            is_primary: false,
            kind: RelationKind::AdapterRow,
            specs,
            converter: None,
            target: None,
            scalar_affinity: SQLiteType::Numeric,
            resolution: ReferenceResolution::Unresolved,
        })
    }

    fn classify_foreign_key(
        field_ident: Ident,
        base_type: Type,
        is_nullable: bool,
        declared_name: Option<Ident>,
        attr: &syn::Attribute,
        owner: OwnerKind,
        catalog: &TypeCatalog,
        diag: &mut Diagnostics,
    ) -> Option<Self> {
        if owner == OwnerKind::QueryModel {
            diag.error(
                field_ident.span(),
                format!(
                    "`{field_ident}` cannot declare a foreign key on a query model; \
                     use `#[column_map]` instead"
                ),
            );
        }

        let mut explicit_table = None;
        let mut on_delete = ForeignKeyAction::NoAction;
        let mut on_update = ForeignKeyAction::NoAction;
        let mut deferred = false;
        let mut stubbed = false;
        let mut is_primary = false;
        let mut save_cascade = false;
        let mut delete_cascade = false;
        let mut converter = None;
        let mut specs = Vec::new();

        if !matches!(attr.meta, Meta::Path(_)) {
            let metas = match attr
                .parse_args_with(syn::punctuated::Punctuated::<Meta, Token![,]>::parse_terminated)
            {
                Ok(metas) => metas,
                Err(err) => {
                    diag.push(err);
                    return None;
                }
            };

            for meta in metas {
                match &meta {
                    Meta::Path(path) if path.is_ident("stubbed") => stubbed = true,
                    Meta::Path(path) if path.is_ident("deferred") => deferred = true,
                    Meta::Path(path) if path.is_ident("primary") || path.is_ident("primary_key") => {
                        is_primary = true;
                    }
                    Meta::Path(path) if path.is_ident("save_cascade") => save_cascade = true,
                    Meta::Path(path) if path.is_ident("delete_cascade") => delete_cascade = true,
                    Meta::NameValue(nv) if nv.path.is_ident("table") => {
                        if let Expr::Path(path) = &nv.value {
                            if let Some(ident) = path.path.get_ident() {
                                explicit_table = Some(ident.clone());
                                continue;
                            }
                        }
                        diag.error(field_ident.span(), "`table` expects a type identifier");
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("on_delete") => {
                        on_delete = parse_foreign_key_action(&nv.value, field_ident.span(), diag);
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("on_update") => {
                        on_update = parse_foreign_key_action(&nv.value, field_ident.span(), diag);
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("converter") => {
                        if let Expr::Path(path) = &nv.value {
                            converter = Some(path.clone());
                            continue;
                        }
                        diag.error(field_ident.span(), "`converter` expects a type path");
                    }
                    Meta::List(list) if list.path.is_ident("references") => {
                        if let Some(spec) = parse_one_reference(list, diag) {
                            specs.push(spec);
                        }
                    }
                    other => {
                        diag.error(
                            other
                                .path()
                                .get_ident()
                                .map_or_else(Span::call_site, |ident| ident.span()),
                            "unrecognized foreign key attribute.\n\
                             Supported: table = <Type>, on_delete/on_update = <ACTION>, \
                             primary, stubbed, deferred, save_cascade, delete_cascade, \
                             converter = <Path>, references(local = \"…\", foreign = \"…\")",
                        );
                    }
                }
            }
        }

        let kind = match &declared_name {
            Some(name) if catalog.is_table(&name.to_string()) => {
                if converter.is_some() {
                    RelationKind::Converted
                } else if catalog.is_model_table(&name.to_string()) {
                    RelationKind::ModelRow
                } else {
                    RelationKind::AdapterRow
                }
            }
            _ => RelationKind::Scalar,
        };

        Some(Self {
            column_name: field_ident.to_string(),
            field_ident,
            base_type,
            is_nullable,
            mapping: ReferenceMapping::ForeignKeyMapping {
                on_delete,
                on_update,
                deferred,
                save_cascade,
                delete_cascade,
            },
            referenced_type: explicit_table.or(declared_name),
            stubbed,
            is_primary,
            kind,
            specs,
            converter,
            target: None,
            scalar_affinity: SQLiteType::Numeric,
            resolution: ReferenceResolution::Unresolved,
        })
    }

    pub(crate) fn is_column_map(&self) -> bool {
        matches!(self.mapping, ReferenceMapping::ColumnMapping)
    }

    /// True when this column is a plain scalar key rather than a rich
    /// relationship.
    pub(crate) fn is_scalar(&self) -> bool {
        self.kind == RelationKind::Scalar
    }

    /// Scalar paths for comparison, save and delete additionally cover
    /// converted columns.
    pub(crate) fn uses_scalar_comparison(&self) -> bool {
        matches!(self.kind, RelationKind::Scalar | RelationKind::Converted)
    }

    /// The resolved reference list; triggers resolution on first access.
    pub(crate) fn references(
        &mut self,
        database: &str,
        registry: &dyn ReferenceLookup,
        diag: &mut Diagnostics,
    ) -> &[ReferenceDefinition] {
        self.resolve(database, registry, diag);
        self.resolved()
    }

    /// The resolved reference list, empty unless resolution has succeeded.
    pub(crate) fn resolved(&self) -> &[ReferenceDefinition] {
        match &self.resolution {
            ReferenceResolution::Resolved(list) => list,
            _ => &[],
        }
    }

    /// Resolve the reference list against the registry. Idempotent: both
    /// terminal states latch, so repeated calls perform no further lookups
    /// and report no further diagnostics.
    fn resolve(
        &mut self,
        database: &str,
        registry: &dyn ReferenceLookup,
        diag: &mut Diagnostics,
    ) {
        if !matches!(self.resolution, ReferenceResolution::Unresolved) {
            return;
        }

        let Some(referenced) = self.referenced_type.clone() else {
            // construction already reported the missing type
            self.resolution = ReferenceResolution::Failed;
            return;
        };

        let Some(entry) = registry.lookup(database, &referenced.to_string()) else {
            diag.error(
                referenced.span(),
                format!(
                    "could not find the referenced table or query model `{referenced}` \
                     from `{}`; ensure it is declared in database `{database}`",
                    self.field_ident
                ),
            );
            self.resolution = ReferenceResolution::Failed;
            return;
        };

        self.target = Some(ResolvedTarget {
            struct_ident: entry.struct_ident.clone(),
            adapter_ident: entry.adapter_ident.clone(),
            table_name: entry.table_name.clone(),
            kind: entry.kind,
        });

        let candidates: Vec<&super::registry::CandidateColumn> = match self.mapping {
            ReferenceMapping::ColumnMapping => entry.columns.iter().collect(),
            ReferenceMapping::ForeignKeyMapping { .. } => entry.primary_columns(),
        };

        let mut list = Vec::new();
        if self.specs.is_empty() {
            // Default composite-key expansion, candidate order.
            for candidate in &candidates {
                list.push(ReferenceDefinition::implicit(candidate));
            }
        } else {
            for spec in &self.specs {
                match candidates.iter().find(|c| c.name == spec.reference_name) {
                    None => diag.error(
                        self.field_ident.span(),
                        format!(
                            "could not find referenced column `{}` from reference named `{}`",
                            spec.reference_name, spec.column_name
                        ),
                    ),
                    Some(candidate) => list.push(ReferenceDefinition::from_spec(spec, candidate)),
                }
            }
        }

        // Collapse a single-column scalar foreign key to look like a plain
        // column.
        if self.is_scalar() && list.len() == 1 {
            self.column_name = list[0].column_name.clone();
        }

        self.resolution = ReferenceResolution::Resolved(list);
    }

    /// The plain-column view used by every scalar-path concern. Valid only
    /// after resolution, so the collapsed column name is observed.
    pub(crate) fn scalar_view(&self) -> ColumnDefinition {
        ColumnDefinition {
            field_ident: self.field_ident.clone(),
            column_name: self.column_name.clone(),
            base_type: self.base_type.clone(),
            is_nullable: self.is_nullable,
            sqlite_type: self.scalar_affinity,
            is_primary: false,
            is_autoincrement: false,
            is_unique: false,
            on_null_conflict: ConflictAction::None,
            default_value: None,
            converter: self.converter.clone(),
        }
    }
}

fn parse_foreign_key_action(
    value: &Expr,
    span: Span,
    diag: &mut Diagnostics,
) -> ForeignKeyAction {
    if let Expr::Path(path) = value {
        if let Some(ident) = path.path.get_ident() {
            return match ident.to_string().to_ascii_uppercase().as_str() {
                "NO_ACTION" => ForeignKeyAction::NoAction,
                "RESTRICT" => ForeignKeyAction::Restrict,
                "SET_NULL" => ForeignKeyAction::SetNull,
                "SET_DEFAULT" => ForeignKeyAction::SetDefault,
                "CASCADE" => ForeignKeyAction::Cascade,
                other => {
                    diag.error(
                        ident.span(),
                        format!(
                            "unknown referential action `{other}`; expected one of \
                             NO_ACTION, RESTRICT, SET_NULL, SET_DEFAULT, CASCADE"
                        ),
                    );
                    ForeignKeyAction::NoAction
                }
            };
        }
    }
    diag.error(span, "referential action must be an identifier, e.g. on_delete = CASCADE");
    ForeignKeyAction::NoAction
}

/// Parse the `references(…)` entries of a `#[column_map(…)]` attribute.
fn parse_reference_specifications(
    attr: &syn::Attribute,
    diag: &mut Diagnostics,
) -> Option<Vec<ReferenceSpecification>> {
    let metas = match attr
        .parse_args_with(syn::punctuated::Punctuated::<Meta, Token![,]>::parse_terminated)
    {
        Ok(metas) => metas,
        Err(err) => {
            diag.push(err);
            return None;
        }
    };

    let mut specs = Vec::new();
    for meta in metas {
        match &meta {
            Meta::List(list) if list.path.is_ident("references") => {
                if let Some(spec) = parse_one_reference(list, diag) {
                    specs.push(spec);
                }
            }
            other => {
                diag.error(
                    other
                        .path()
                        .get_ident()
                        .map_or_else(Span::call_site, |ident| ident.span()),
                    "unrecognized column map attribute; only references(…) entries are supported",
                );
            }
        }
    }
    Some(specs)
}

/// Parse one `references(local = "…", foreign = "…", on_null_conflict =
/// <CONFLICT>, default = <literal>)` entry.
fn parse_one_reference(
    list: &syn::MetaList,
    diag: &mut Diagnostics,
) -> Option<ReferenceSpecification> {
    let metas = match list.parse_args_with(
        syn::punctuated::Punctuated::<Meta, Token![,]>::parse_terminated,
    ) {
        Ok(metas) => metas,
        Err(err) => {
            diag.push(err);
            return None;
        }
    };

    let mut local = None;
    let mut foreign = None;
    let mut on_null_conflict = ConflictAction::None;
    let mut default_value = None;

    for meta in metas {
        match &meta {
            Meta::NameValue(nv) if nv.path.is_ident("local") => {
                if let Expr::Lit(lit) = &nv.value {
                    if let Lit::Str(s) = &lit.lit {
                        local = Some(s.value());
                        continue;
                    }
                }
                diag.error(list.path.span(), "`local` expects a string literal");
            }
            Meta::NameValue(nv) if nv.path.is_ident("foreign") => {
                if let Expr::Lit(lit) = &nv.value {
                    if let Lit::Str(s) = &lit.lit {
                        foreign = Some(s.value());
                        continue;
                    }
                }
                diag.error(list.path.span(), "`foreign` expects a string literal");
            }
            Meta::NameValue(nv) if nv.path.is_ident("on_null_conflict") => {
                if let Expr::Path(path) = &nv.value {
                    if let Some(ident) = path.path.get_ident() {
                        on_null_conflict = parse_conflict_action(ident, diag);
                        continue;
                    }
                }
                diag.error(list.path.span(), "`on_null_conflict` expects a conflict action");
            }
            Meta::NameValue(nv) if nv.path.is_ident("default") => {
                default_value = Some(nv.value.clone());
            }
            other => {
                diag.error(
                    other
                        .path()
                        .get_ident()
                        .map_or_else(Span::call_site, |ident| ident.span()),
                    "unrecognized references(…) argument.\n\
                     Supported: local = \"…\", foreign = \"…\", \
                     on_null_conflict = <CONFLICT>, default = <literal>",
                );
            }
        }
    }

    let foreign = match foreign {
        Some(foreign) => foreign,
        None => {
            diag.error(
                list.path.span(),
                "references(…) must name the target column with foreign = \"…\"",
            );
            return None;
        }
    };

    Some(ReferenceSpecification {
        // an empty local name is a reported data error at emission time
        column_name: local.unwrap_or_default(),
        reference_name: foreign,
        on_null_conflict,
        default_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::registry::test_support::CountingRegistry;
    use crate::sqlite::registry::{
        CandidateColumn, DefinitionKind, DefinitionRegistry, RegistryEntry,
    };
    use quote::format_ident;

    fn candidate(name: &str, primary: bool) -> CandidateColumn {
        CandidateColumn {
            name: name.to_string(),
            field_ident: format_ident!("{}", name),
            base_type: syn::parse_str("i64").unwrap(),
            sqlite_type: SQLiteType::Integer,
            is_primary: primary,
            converter: None,
            default_value: None,
        }
    }

    fn entry(type_name: &str, kind: DefinitionKind, columns: Vec<CandidateColumn>) -> RegistryEntry {
        RegistryEntry {
            database: "library".to_string(),
            type_name: type_name.to_string(),
            kind,
            struct_ident: format_ident!("{}", type_name),
            adapter_ident: format_ident!("{}Table", type_name),
            table_name: type_name.to_ascii_lowercase(),
            columns,
        }
    }

    fn registry_with_author() -> DefinitionRegistry {
        let mut registry = DefinitionRegistry::new();
        registry.insert(entry(
            "Author",
            DefinitionKind::Table,
            vec![candidate("id", true), candidate("name", false)],
        ));
        registry
    }

    fn catalog_with_author() -> TypeCatalog {
        let mut catalog = TypeCatalog::default();
        catalog.add_table("Author".to_string(), true);
        catalog
    }

    fn reference_column(field_source: &str, catalog: &TypeCatalog) -> ReferenceColumnDefinition {
        let item: syn::ItemStruct =
            syn::parse_str(&format!("struct Book {{ {field_source} }}")).unwrap();
        let field = item.fields.iter().next().unwrap().clone();
        let (attr, attr_kind) = field
            .attrs
            .iter()
            .find_map(|attr| {
                if attr.path().is_ident("foreign_key") {
                    Some((attr.clone(), ReferenceAttrKind::ForeignKey))
                } else if attr.path().is_ident("column_map") {
                    Some((attr.clone(), ReferenceAttrKind::ColumnMap))
                } else {
                    None
                }
            })
            .unwrap();
        let mut diag = Diagnostics::new();
        let def = ReferenceColumnDefinition::from_field(
            &field,
            &attr,
            attr_kind,
            OwnerKind::Table,
            catalog,
            &mut diag,
        )
        .unwrap();
        assert!(diag.is_empty(), "unexpected diagnostics: {:?}", diag.messages());
        def
    }

    #[test]
    fn implicit_foreign_key_expands_to_primary_columns() {
        let catalog = catalog_with_author();
        let registry = registry_with_author();
        let mut diag = Diagnostics::new();
        let mut column = reference_column("#[foreign_key] author: Option<Author>", &catalog);

        let refs = column.references("library", &registry, &mut diag);
        assert!(diag.is_empty());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].column_name, "id");
        assert_eq!(refs[0].foreign_column_name, "id");
    }

    #[test]
    fn implicit_composite_key_preserves_candidate_order() {
        let mut catalog = TypeCatalog::default();
        catalog.add_table("Passport".to_string(), false);
        let mut registry = DefinitionRegistry::new();
        registry.insert(entry(
            "Passport",
            DefinitionKind::Table,
            vec![
                candidate("country", true),
                candidate("note", false),
                candidate("number", true),
            ],
        ));
        let mut diag = Diagnostics::new();
        let mut column = reference_column("#[foreign_key] passport: Option<Passport>", &catalog);

        let refs = column.references("library", &registry, &mut diag);
        let names: Vec<_> = refs.iter().map(|r| r.column_name.clone()).collect();
        assert_eq!(names, vec!["country", "number"]);
    }

    #[test]
    fn explicit_specifications_keep_declaration_order() {
        let catalog = catalog_with_author();
        let registry = registry_with_author();
        let mut diag = Diagnostics::new();
        let mut column = reference_column(
            "#[foreign_key(\
                references(local = \"author_name\", foreign = \"name\"), \
                references(local = \"author_id\", foreign = \"id\", on_null_conflict = FAIL)\
             )] author: Option<Author>",
            &catalog,
        );

        let refs = column.references("library", &registry, &mut diag);
        assert!(diag.is_empty());
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].column_name, "author_name");
        assert_eq!(refs[0].foreign_column_name, "name");
        assert_eq!(refs[1].column_name, "author_id");
        assert_eq!(refs[1].foreign_column_name, "id");
        assert!(refs[1].not_null);
    }

    #[test]
    fn missing_target_column_is_reported_and_skipped() {
        let catalog = catalog_with_author();
        let registry = registry_with_author();
        let mut diag = Diagnostics::new();
        let mut column = reference_column(
            "#[foreign_key(\
                references(local = \"author_id\", foreign = \"id\"), \
                references(local = \"author_slug\", foreign = \"slug\")\
             )] author: Option<Author>",
            &catalog,
        );

        let refs = column.references("library", &registry, &mut diag);
        assert_eq!(refs.len(), 1);
        assert_eq!(diag.len(), 1);
        assert!(diag.messages()[0].contains("slug"));
    }

    #[test]
    fn column_map_expands_to_every_column() {
        let mut catalog = TypeCatalog::default();
        catalog.add_embeddable("Address".to_string());
        let mut registry = DefinitionRegistry::new();
        registry.insert(entry(
            "Address",
            DefinitionKind::QueryModel,
            vec![candidate("street", false), candidate("city", false)],
        ));
        let mut diag = Diagnostics::new();
        let mut column = reference_column("#[column_map] shipping: Option<Address>", &catalog);

        assert!(column.stubbed);
        let refs = column.references("library", &registry, &mut diag);
        let names: Vec<_> = refs.iter().map(|r| r.column_name.clone()).collect();
        assert_eq!(names, vec!["street", "city"]);
    }

    #[test]
    fn resolution_is_idempotent_with_one_lookup() {
        let catalog = catalog_with_author();
        let registry = CountingRegistry::new(registry_with_author());
        let mut diag = Diagnostics::new();
        let mut column = reference_column("#[foreign_key] author: Option<Author>", &catalog);

        let first: Vec<_> = column
            .references("library", &registry, &mut diag)
            .iter()
            .map(|r| r.column_name.clone())
            .collect();
        let second: Vec<_> = column
            .references("library", &registry, &mut diag)
            .iter()
            .map(|r| r.column_name.clone())
            .collect();

        assert_eq!(first, second);
        assert_eq!(registry.lookups.get(), 1);
        assert!(diag.is_empty());
    }

    #[test]
    fn missing_definition_fails_permanently_with_one_diagnostic() {
        let mut catalog = TypeCatalog::default();
        catalog.add_table("Ghost".to_string(), false);
        let registry = CountingRegistry::new(DefinitionRegistry::new());
        let mut diag = Diagnostics::new();
        let mut column = reference_column("#[foreign_key] ghost: Option<Ghost>", &catalog);

        assert!(column.references("library", &registry, &mut diag).is_empty());
        assert!(column.references("library", &registry, &mut diag).is_empty());
        assert_eq!(registry.lookups.get(), 1);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn scalar_foreign_key_collapses_to_single_column_name() {
        let catalog = catalog_with_author();
        let registry = registry_with_author();
        let mut diag = Diagnostics::new();
        let mut column = reference_column(
            "#[foreign_key(table = Author)] editor_id: Option<i64>",
            &catalog,
        );

        assert!(column.is_scalar());
        column.references("library", &registry, &mut diag);
        assert_eq!(column.column_name, "id");
    }

    #[test]
    fn scalar_collapse_skipped_for_composite_keys() {
        let mut catalog = TypeCatalog::default();
        catalog.add_table("Passport".to_string(), false);
        let mut registry = DefinitionRegistry::new();
        registry.insert(entry(
            "Passport",
            DefinitionKind::Table,
            vec![candidate("country", true), candidate("number", true)],
        ));
        let mut diag = Diagnostics::new();
        let mut column = reference_column(
            "#[foreign_key(table = Passport)] passport_key: Option<i64>",
            &catalog,
        );

        column.references("library", &registry, &mut diag);
        assert_eq!(column.column_name, "passport_key");
    }

    #[test]
    fn relationship_kind_follows_the_type_catalog() {
        let mut catalog = TypeCatalog::default();
        catalog.add_table("Author".to_string(), true);
        catalog.add_table("Tag".to_string(), false);

        let rich = reference_column("#[foreign_key] author: Option<Author>", &catalog);
        assert_eq!(rich.kind, RelationKind::ModelRow);

        let adapter = reference_column("#[foreign_key] tag: Option<Tag>", &catalog);
        assert_eq!(adapter.kind, RelationKind::AdapterRow);

        let scalar = reference_column(
            "#[foreign_key(table = Author)] editor_id: Option<i64>",
            &catalog,
        );
        assert_eq!(scalar.kind, RelationKind::Scalar);
    }
}
