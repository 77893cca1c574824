//! Compiles a [`Request`] into one SQL statement whose single row, single column result is
//! the complete JSON:API document: the root selection as `data` plus every side-loaded
//! resource as `included`, all assembled inside Postgres.
//!
//! The statement follows a fixed shape: a root CTE `t` selecting the raw rows, a CTE `t2`
//! serializing them, one CTE per include path, a union `all_ctes` deduplicating the included
//! resources, an aggregation `inc`, and a final select building the envelope.

mod include;
mod lateral;
mod resource;
#[cfg(test)]
pub(crate) mod test_support;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::instrument;

use crate::error::CompilerError;
use crate::graph::{
    fields,
    node::{NodeArena, NodeId},
    reflection,
};
use crate::request::{Request, RootSource};
use crate::schema::{entity::EntityType, EntitySchema};
use crate::serializer::SerializerSchema;
use crate::sql::{
    column::{ArrayParamWrapper, Column},
    cte::{CteExpression, CteOperation, WithQuery},
    json_agg::JsonAgg,
    json_object::{JsonObject, JsonObjectElement},
    limit::Limit,
    offset::Offset,
    predicate::Predicate,
    select::Select,
    table::Table,
    union::Union,
    ExpressionBuilder, SQLParam,
};

/// A compiled statement and its positional parameters, ready for execution.
#[derive(Debug)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Arc<dyn SQLParam>>,
}

impl CompiledQuery {
    /// The parameters in the form `tokio_postgres` query methods take
    pub fn params_refs(&self) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
        self.params.iter().map(|param| param.as_pg()).collect()
    }
}

/// The document compiler. Cheap to construct; borrows the two registries and carries no state
/// between requests.
pub struct DocumentCompiler<'a> {
    schema: &'a EntitySchema,
    serializers: &'a SerializerSchema,
}

impl<'a> DocumentCompiler<'a> {
    pub fn new(schema: &'a EntitySchema, serializers: &'a SerializerSchema) -> Self {
        Self {
            schema,
            serializers,
        }
    }

    /// Compile `request` into one statement. Compilation is pure: the same request always
    /// yields the same statement text and parameter list.
    #[instrument(skip_all, fields(root = request.root.entity_name()))]
    pub fn compile(&self, request: &Request) -> Result<CompiledQuery, CompilerError> {
        let mut compilation = Compilation::new(self.schema, self.serializers, request)?;
        compilation.plan()?;
        let (sql, params) = compilation.build()?.to_sql();
        tracing::debug!(params = params.len(), "compiled document statement");
        Ok(CompiledQuery { sql, params })
    }
}

/// What one node renders: its attribute columns and its relationship children, both already
/// narrowed by sparse fieldsets and include predicates.
pub(crate) struct NodePlan {
    pub(crate) attributes: Vec<String>,
    pub(crate) children: Vec<NodeId>,
}

/// One compilation in flight. The first phase (`plan`) expands the resource graph and decides
/// per-node fields; the second (`build`) walks the planned graph and emits the statement AST.
pub(crate) struct Compilation<'a> {
    pub(crate) schema: &'a EntitySchema,
    pub(crate) serializers: &'a SerializerSchema,
    pub(crate) request: &'a Request,
    pub(crate) arena: NodeArena,
    pub(crate) root: NodeId,
    pub(crate) plans: HashMap<NodeId, NodePlan>,
    /// Included nodes in emission order: every prefix of a requested path precedes the path
    /// itself, so each CTE only references CTEs bound before it
    pub(crate) includes: Vec<NodeId>,
}

impl<'a> Compilation<'a> {
    fn new(
        schema: &'a EntitySchema,
        serializers: &'a SerializerSchema,
        request: &'a Request,
    ) -> Result<Self, CompilerError> {
        let entity_name = request
            .root
            .entity_name()
            .ok_or(CompilerError::UnresolvableRootShape)?;
        schema.entity(entity_name)?;
        serializers.serializer(entity_name)?;

        let mut arena = NodeArena::new();
        let root_path = pluralizer::pluralize(entity_name, 2, false);
        let root = arena.insert_root(entity_name, root_path);

        Ok(Self {
            schema,
            serializers,
            request,
            arena,
            root,
            plans: HashMap::new(),
            includes: Vec::new(),
        })
    }

    fn plan(&mut self) -> Result<(), CompilerError> {
        self.plan_node(self.root)?;

        let mut seen = HashSet::new();
        let include_paths = self.request.include.clone();
        for path in &include_paths {
            let mut node = self.root;
            for segment in path.split('.') {
                node = self.child_node(node, segment)?;
                if seen.insert(node) {
                    self.ensure_includable(node)?;
                    self.plan_node(node)?;
                    tracing::debug!(
                        path = %self.arena.node(node).full_path,
                        cte = %self.arena.node(node).cte_name,
                        "planned include"
                    );
                    self.includes.push(node);
                }
            }
        }
        Ok(())
    }

    /// The node for `name` under `parent`, resolving the relationship on first sight. Repeat
    /// paths return the memoized node.
    fn child_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId, CompilerError> {
        let (parent_path, parent_entity) = {
            let node = self.arena.node(parent);
            (node.full_path.clone(), node.entity.clone())
        };
        if let Some(existing) = self.arena.get(&format!("{parent_path}.{name}")) {
            return Ok(existing);
        }

        let entity = self.schema.entity(&parent_entity)?;
        let serializer = self.serializers.serializer(&parent_entity)?;
        let resolved = reflection::resolve(entity, serializer, name)?;
        let target = resolved.target_type.clone();
        Ok(self.arena.insert_child(parent, name, target, resolved))
    }

    fn plan_node(&mut self, id: NodeId) -> Result<(), CompilerError> {
        if self.plans.contains_key(&id) {
            return Ok(());
        }
        let entity_name = self.arena.node(id).entity.clone();
        let serializer = self.serializers.serializer(&entity_name)?;
        let explicit = self.fields_for(&entity_name);
        let selected =
            fields::selected_fields(serializer, explicit.as_deref(), &self.request.context);

        let mut children = Vec::with_capacity(selected.relationships.len());
        for name in &selected.relationships {
            children.push(self.child_node(id, name)?);
        }
        self.plans.insert(
            id,
            NodePlan {
                attributes: selected.attributes,
                children,
            },
        );
        Ok(())
    }

    /// The sparse fieldset for an entity, if the request carries one. The lookup tries the
    /// public plural type name first, then the singular entity name.
    fn fields_for(&self, entity_name: &str) -> Option<Vec<String>> {
        let fields = self.request.fields.as_ref()?;
        let transform = self.request.key_transform;
        let plural = transform.apply(&pluralizer::pluralize(entity_name, 2, false));
        let singular = transform.apply(entity_name);
        fields.get(&plural).or_else(|| fields.get(&singular)).cloned()
    }

    /// Only schema-backed relationships can be side-loaded: an include CTE joins the target
    /// table against the parent CTE through the foreign key, which a virtual relationship
    /// does not have.
    fn ensure_includable(&self, id: NodeId) -> Result<(), CompilerError> {
        let node = self.arena.node(id);
        match &node.reflection {
            Some(reflection)
                if reflection.custom_query.is_none() && reflection.foreign_key.is_some() =>
            {
                Ok(())
            }
            _ => Err(CompilerError::UnsupportedIncludePath {
                path: node.full_path.clone(),
            }),
        }
    }

    fn build(&self) -> Result<WithQuery, CompilerError> {
        let root_node = self.arena.node(self.root);
        let root_entity = self.schema.entity(&root_node.entity)?;
        let table_name = root_entity.table_name.clone();

        let mut expressions = vec![
            CteExpression::new("t", CteOperation::Select(self.root_select(root_entity)?)),
            CteExpression::new(
                "t2",
                CteOperation::Select(self.document_data_select(&table_name)?),
            ),
        ];

        for id in &self.includes {
            let node = self.arena.node(*id);
            expressions.push(CteExpression::new(
                node.cte_name.clone(),
                CteOperation::Select(self.include_select(*id)?),
            ));
        }

        // The seed row keeps the union well-formed with zero includes; its predicate means it
        // contributes no rows.
        let mut union = vec![seed_select()];
        for id in &self.includes {
            let node = self.arena.node(*id);
            union.push(Select::new(
                Table::cte(node.cte_name.clone(), None),
                vec![Column::unqualified("j")],
                Predicate::True,
            ));
        }
        expressions.push(CteExpression::new(
            "all_ctes",
            CteOperation::Union(Union(union)),
        ));

        expressions.push(CteExpression::new(
            "inc",
            CteOperation::Select(Select::new(
                Table::cte("all_ctes", None),
                vec![Column::aliased(
                    Column::JsonAgg(JsonAgg::new(Column::unqualified("j"), None)),
                    "j",
                )],
                Predicate::True,
            )),
        ));

        let mut envelope = vec![JsonObjectElement::new("data", Column::physical("t2", "j"))];
        if !self.includes.is_empty() {
            envelope.push(JsonObjectElement::new(
                "included",
                Column::physical("inc", "j"),
            ));
        }
        let select = Select::new(
            Table::cte("t2", None).cross_join(Table::cte("inc", None)),
            vec![Column::text_cast(Column::JsonObject(JsonObject(envelope)))],
            Predicate::True,
        );

        Ok(WithQuery {
            expressions,
            select,
        })
    }

    /// The root CTE `t`: the raw rows of the root selection.
    fn root_select(&self, entity: &EntityType) -> Result<Select, CompilerError> {
        let table = Table::physical(entity.table_name.clone(), None);
        let star = vec![Column::Star(Some(entity.table_name.clone()))];
        match &self.request.root {
            RootSource::Relation {
                predicate,
                order_by,
                limit,
                offset,
                ..
            } => Ok(Select {
                table: Some(table),
                columns: star,
                distinct_on: None,
                predicate: predicate.clone(),
                order_by: order_by.clone(),
                limit: limit.map(Limit),
                offset: offset.map(Offset),
            }),
            RootSource::Entity { id, .. } => Ok(Select::new(
                table,
                star,
                Predicate::Eq(
                    Column::physical(entity.table_name.clone(), entity.primary_key.clone()),
                    Column::Param(id.clone()),
                ),
            )),
            RootSource::Entities { ids, .. } => {
                let predicate = match ids {
                    Some(ids) => Predicate::Eq(
                        Column::physical(entity.table_name.clone(), entity.primary_key.clone()),
                        Column::ArrayParam {
                            param: ids.clone(),
                            wrapper: ArrayParamWrapper::Any,
                        },
                    ),
                    None => Predicate::False,
                };
                Ok(Select::new(table, star, predicate))
            }
        }
    }

    /// The CTE `t2`: the document's `data` member. A collection root aggregates the resource
    /// objects into an array; a single-entity root yields the object itself (and no row at
    /// all when the entity does not exist).
    fn document_data_select(&self, table_name: &str) -> Result<Select, CompilerError> {
        let resource = self.resource_object(self.root, table_name)?;
        let value = if self.request.root.is_collection() {
            Column::JsonAgg(JsonAgg::new(resource, None))
        } else {
            resource
        };

        let mut from = Table::cte("t", Some(table_name.to_string()));
        for (alias, select) in self.relationship_laterals(self.root, table_name)? {
            from = from.lateral_join(select, alias);
        }
        Ok(Select::new(
            from,
            vec![Column::aliased(value, "j")],
            Predicate::True,
        ))
    }

    pub(crate) fn json_type(&self, entity_name: &str) -> String {
        self.request
            .key_transform
            .apply(&pluralizer::pluralize(entity_name, 2, false))
    }

    pub(crate) fn json_key(&self, name: &str) -> String {
        self.request.key_transform.apply(name)
    }
}

fn seed_select() -> Select {
    Select {
        table: None,
        columns: vec![Column::aliased(Column::Raw("'{}'::jsonb".to_string()), "j")],
        distinct_on: None,
        predicate: Predicate::False,
        order_by: None,
        limit: None,
        offset: None,
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{serializers_with_note, test_schema, test_serializers};
    use super::*;
    use crate::request::KeyTransform;
    use crate::schema::relationship::{RelationSpec, RelationshipSchema, VirtualRelationship};
    use crate::serializer::{
        config::{LinkTemplate, RelationshipConfig},
        SerializationContext, SerializerSchema, SerializerType,
    };
    use crate::sql::{
        order::{OrderBy, OrderByElement, Ordering},
        SQLParamContainer,
    };

    fn single_note(id: i32) -> Request {
        Request::new(RootSource::Entity {
            entity: "note".to_string(),
            id: SQLParamContainer::new(id),
        })
    }

    fn all_notes() -> Request {
        Request::new(RootSource::Relation {
            entity: "note".to_string(),
            predicate: Predicate::True,
            order_by: None,
            limit: None,
            offset: None,
        })
    }

    fn compile(
        schema: &EntitySchema,
        serializers: &SerializerSchema,
        request: &Request,
    ) -> CompiledQuery {
        DocumentCompiler::new(schema, serializers)
            .compile(request)
            .unwrap()
    }

    fn compile_err(
        schema: &EntitySchema,
        serializers: &SerializerSchema,
        request: &Request,
    ) -> CompilerError {
        DocumentCompiler::new(schema, serializers)
            .compile(request)
            .unwrap_err()
    }

    #[test]
    fn single_note_document() {
        let schema = test_schema();
        let serializers = test_serializers();
        let query = compile(&schema, &serializers, &single_note(7));
        assert_binding!(
            (query.sql, query.params),
            concat!(
                r#"WITH "t" AS (SELECT "notes".* FROM "notes" WHERE "notes"."id" = $1), "#,
                r#""t2" AS (SELECT jsonb_build_object('id', "notes"."id"::text, 'type', 'notes', "#,
                r#"'attributes', jsonb_build_object('name', "notes"."name", 'content', "notes"."content"), "#,
                r#"'relationships', jsonb_build_object('tags', jsonb_build_object('data', "rel_cte_dd077616c4"."j"))) AS "j" "#,
                r#"FROM "t" AS "notes" LEFT JOIN LATERAL (SELECT COALESCE(jsonb_agg(jsonb_build_object('id', "rel"."id"::text, 'type', 'tags') "#,
                r#"ORDER BY "rel"."name" ASC), '[]'::jsonb) AS "j" FROM "tags" AS "rel" WHERE "rel"."note_id" = "notes"."id") AS "rel_cte_dd077616c4" ON TRUE), "#,
                r#""all_ctes" AS (SELECT '{}'::jsonb AS "j" WHERE FALSE), "#,
                r#""inc" AS (SELECT COALESCE(jsonb_agg("j"), '[]'::jsonb) AS "j" FROM "all_ctes") "#,
                r#"SELECT jsonb_build_object('data', "t2"."j")::text FROM "t2" CROSS JOIN "inc""#,
            ),
            7i32
        );
    }

    #[test]
    fn collection_aggregates_into_an_array() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = all_notes().fields("notes", vec!["name"]);
        let query = compile(&schema, &serializers, &request);
        assert_binding!(
            (query.sql, query.params),
            concat!(
                r#"WITH "t" AS (SELECT "notes".* FROM "notes"), "#,
                r#""t2" AS (SELECT COALESCE(jsonb_agg(jsonb_build_object('id', "notes"."id"::text, 'type', 'notes', "#,
                r#"'attributes', jsonb_build_object('name', "notes"."name"))), '[]'::jsonb) AS "j" FROM "t" AS "notes"), "#,
                r#""all_ctes" AS (SELECT '{}'::jsonb AS "j" WHERE FALSE), "#,
                r#""inc" AS (SELECT COALESCE(jsonb_agg("j"), '[]'::jsonb) AS "j" FROM "all_ctes") "#,
                r#"SELECT jsonb_build_object('data', "t2"."j")::text FROM "t2" CROSS JOIN "inc""#,
            )
        );
    }

    #[test]
    fn relation_root_passes_through_shaping() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = Request::new(RootSource::Relation {
            entity: "note".to_string(),
            predicate: Predicate::Eq(
                Column::physical("notes", "user_id"),
                Column::Param(SQLParamContainer::new(42i32)),
            ),
            order_by: Some(OrderBy(vec![OrderByElement::column(
                Some("notes".to_string()),
                "name",
                Ordering::Asc,
            )])),
            limit: Some(10),
            offset: Some(20),
        })
        .fields("notes", vec!["name"]);
        let query = compile(&schema, &serializers, &request);
        assert!(query.sql.starts_with(
            r#"WITH "t" AS (SELECT "notes".* FROM "notes" WHERE "notes"."user_id" = $1 ORDER BY "notes"."name" ASC LIMIT $2 OFFSET $3)"#
        ));
        assert_params!(query.params, 42i32, 10i64, 20i64);
    }

    #[test]
    fn entities_root_selects_by_id_list() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = Request::new(RootSource::Entities {
            entity: Some("note".to_string()),
            ids: Some(SQLParamContainer::new(vec![1i32, 2, 3])),
        });
        let query = compile(&schema, &serializers, &request);
        assert!(query
            .sql
            .contains(r#""t" AS (SELECT "notes".* FROM "notes" WHERE "notes"."id" = ANY($1))"#));
        // A collection root, so `data` aggregates
        assert!(query.sql.contains("\"t2\" AS (SELECT COALESCE(jsonb_agg("));
        assert_params!(query.params, vec![1i32, 2, 3]);
    }

    #[test]
    fn entities_root_without_ids_yields_empty_data() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = Request::new(RootSource::Entities {
            entity: Some("note".to_string()),
            ids: None,
        });
        let query = compile(&schema, &serializers, &request);
        assert!(query
            .sql
            .contains(r#""t" AS (SELECT "notes".* FROM "notes" WHERE FALSE)"#));
        assert_params!(query.params);
    }

    #[test]
    fn entities_root_without_a_type_is_rejected() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = Request::new(RootSource::Entities {
            entity: None,
            ids: Some(SQLParamContainer::new(vec![1i32])),
        });
        assert_eq!(
            compile_err(&schema, &serializers, &request),
            CompilerError::UnresolvableRootShape
        );
    }

    #[test]
    fn belongs_to_is_inlined_from_the_foreign_key() {
        let schema = test_schema();
        let serializers = serializers_with_note(
            SerializerType::new().attribute("name").relationship("user"),
        );
        let query = compile(&schema, &serializers, &single_note(1));
        assert!(query.sql.contains(concat!(
            r#"'user', jsonb_build_object('data', "#,
            r#"CASE WHEN "notes"."user_id" IS NULL THEN NULL "#,
            r#"ELSE jsonb_build_object('id', "notes"."user_id"::text, 'type', 'users') END)"#,
        )));
        // No lateral for a belongs-to
        assert!(!query.sql.contains("LEFT JOIN LATERAL"));
    }

    #[test]
    fn enum_attribute_translates_to_labels() {
        let schema = test_schema();
        let serializers =
            serializers_with_note(SerializerType::new().attribute("status"));
        let query = compile(&schema, &serializers, &single_note(1));
        assert!(query.sql.contains(concat!(
            r#"'status', CASE WHEN "notes"."status" = 0 THEN 'draft' "#,
            r#"WHEN "notes"."status" = 1 THEN 'published' "#,
            r#"WHEN "notes"."status" = 2 THEN 'deleted' END"#,
        )));
        // Discriminants and labels render inline, not as parameters
        assert_params!(query.params, 1i32);
    }

    #[test]
    fn include_side_loads_through_a_cte() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = single_note(1).include("tags");
        let query = compile(&schema, &serializers, &request);
        assert_binding!(
            (query.sql, query.params),
            concat!(
                r#"WITH "t" AS (SELECT "notes".* FROM "notes" WHERE "notes"."id" = $1), "#,
                r#""t2" AS (SELECT jsonb_build_object('id', "notes"."id"::text, 'type', 'notes', "#,
                r#"'attributes', jsonb_build_object('name', "notes"."name", 'content', "notes"."content"), "#,
                r#"'relationships', jsonb_build_object('tags', jsonb_build_object('data', "rel_cte_dd077616c4"."j"))) AS "j" "#,
                r#"FROM "t" AS "notes" LEFT JOIN LATERAL (SELECT COALESCE(jsonb_agg(jsonb_build_object('id', "rel"."id"::text, 'type', 'tags') "#,
                r#"ORDER BY "rel"."name" ASC), '[]'::jsonb) AS "j" FROM "tags" AS "rel" WHERE "rel"."note_id" = "notes"."id") AS "rel_cte_dd077616c4" ON TRUE), "#,
                r#""cte_dd077616c4" AS (SELECT DISTINCT ON ("tags"."id") "tags".*, "#,
                r#"jsonb_build_object('id', "tags"."id"::text, 'type', 'tags', 'attributes', jsonb_build_object('name', "tags"."name")) AS "j" "#,
                r#"FROM "tags" JOIN "t" ON "t"."id" = "tags"."note_id" ORDER BY "tags"."id" ASC), "#,
                r#""all_ctes" AS (SELECT '{}'::jsonb AS "j" WHERE FALSE UNION SELECT "j" FROM "cte_dd077616c4"), "#,
                r#""inc" AS (SELECT COALESCE(jsonb_agg("j"), '[]'::jsonb) AS "j" FROM "all_ctes") "#,
                r#"SELECT jsonb_build_object('data', "t2"."j", 'included', "inc"."j")::text FROM "t2" CROSS JOIN "inc""#,
            ),
            1i32
        );
    }

    #[test]
    fn nested_include_emits_prefix_ctes_in_order() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = single_note(1).include("user.notes");
        let query = compile(&schema, &serializers, &request);

        // The prefix `user` gets its own CTE even though only `user.notes` was requested
        let user_cte = query.sql.find(r#""cte_4d8dd2c7ca" AS ("#).unwrap();
        let user_notes_cte = query.sql.find(r#""cte_87288ae63c" AS ("#).unwrap();
        assert!(user_cte < user_notes_cte);

        // belongs-to include joins the parent's foreign key against the target's primary key
        assert!(query
            .sql
            .contains(r#"FROM "users" JOIN "t" ON "t"."user_id" = "users"."id""#));
        // has-many include joins the parent CTE's primary key against the target's foreign key
        assert!(query.sql.contains(
            r#"FROM "notes" JOIN "cte_4d8dd2c7ca" ON "cte_4d8dd2c7ca"."id" = "notes"."user_id""#
        ));
        assert!(query.sql.contains(concat!(
            r#""all_ctes" AS (SELECT '{}'::jsonb AS "j" WHERE FALSE "#,
            r#"UNION SELECT "j" FROM "cte_4d8dd2c7ca" "#,
            r#"UNION SELECT "j" FROM "cte_87288ae63c")"#,
        )));
    }

    #[test]
    fn repeated_include_compiles_once() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = single_note(1).include("tags").include("tags");
        let query = compile(&schema, &serializers, &request);
        assert_eq!(query.sql.matches(r#""cte_dd077616c4" AS ("#).count(), 1);
    }

    #[test]
    fn virtual_relationship_cannot_be_included() {
        let schema = test_schema();
        let serializers = serializers_with_note(
            SerializerType::new()
                .attribute("name")
                .relationship("recent_tags"),
        );
        let request = single_note(1).include("recent_tags");
        assert_eq!(
            compile_err(&schema, &serializers, &request),
            CompilerError::UnsupportedIncludePath {
                path: "notes.recent_tags".to_string(),
            }
        );
    }

    #[test]
    fn virtual_relationship_compiles_to_a_lateral() {
        let schema = test_schema();
        let serializers = serializers_with_note(
            SerializerType::new()
                .attribute("name")
                .relationship("recent_tags"),
        );
        let query = compile(&schema, &serializers, &single_note(1));
        assert!(query.sql.contains(concat!(
            r#"LEFT JOIN LATERAL (SELECT COALESCE(jsonb_agg(jsonb_build_object('id', "rel"."id"::text, 'type', 'tags') "#,
            r#"ORDER BY "rel"."created_at" DESC), '[]'::jsonb) AS "j" "#,
            r#"FROM "tags" AS "rel" WHERE "rel"."note_id" = "notes"."id") AS "rel_cte_cc87cee2b2" ON TRUE"#,
        )));
        assert!(query.sql.contains(
            r#"'recent_tags', jsonb_build_object('data', "rel_cte_cc87cee2b2"."j")"#
        ));
    }

    #[test]
    fn raw_default_ordering_passes_through_unqualified() {
        let schema = test_schema();
        let serializers = serializers_with_note(
            SerializerType::new()
                .attribute("name")
                .relationship("comments"),
        );
        let query = compile(&schema, &serializers, &single_note(1));
        assert!(query
            .sql
            .contains(r#"'type', 'comments') ORDER BY created_at DESC), '[]'::jsonb"#));
    }

    #[test]
    fn kindless_virtual_relationship_with_data_is_rejected() {
        let (schema, serializers) = kindless_fixture(
            SerializerType::new().attribute("name").relationship("shadow"),
        );
        assert_eq!(
            compile_err(&schema, &serializers, &single_note(1)),
            CompilerError::UnknownRelationshipKind {
                path: "notes.shadow".to_string(),
            }
        );
    }

    #[test]
    fn kindless_virtual_relationship_with_links_only_compiles() {
        let (schema, serializers) = kindless_fixture(
            SerializerType::new().attribute("name").relationship_with(
                "shadow",
                RelationshipConfig::new()
                    .include_data(false)
                    .link("self", LinkTemplate::fixed("/shadow")),
            ),
        );
        let query = compile(&schema, &serializers, &single_note(1));
        assert!(query.sql.contains(
            r#"'shadow', jsonb_build_object('links', jsonb_build_object('self', '/shadow'))"#
        ));
    }

    fn kindless_fixture(note: SerializerType) -> (EntitySchema, SerializerSchema) {
        let schema = EntitySchema::new()
            .register(
                EntityType::new("note", "notes", "id")
                    .attribute("name")
                    .virtual_relationship(
                        "shadow",
                        VirtualRelationship::new("tag", None, |_parent| RelationSpec {
                            source: Table::physical("tags", Some("rel".to_string())),
                            correlation: "rel".to_string(),
                            predicate: Predicate::True,
                            order_by: None,
                        }),
                    ),
            )
            .register(EntityType::new("tag", "tags", "id").attribute("name"));
        let serializers = SerializerSchema::new()
            .register("note", note)
            .register("tag", SerializerType::new().attribute("name"));
        (schema, serializers)
    }

    #[test]
    fn link_templates_splice_the_row_id() {
        let schema = test_schema();
        let serializers = serializers_with_note(
            SerializerType::new().attribute("name").relationship_with(
                "tags",
                RelationshipConfig::new().include_data(false).link(
                    "related",
                    LinkTemplate::new()
                        .literal("/notes/")
                        .resource_id()
                        .literal("/tags"),
                ),
            ),
        );
        let query = compile(&schema, &serializers, &single_note(1));
        assert!(query.sql.contains(concat!(
            r#"'tags', jsonb_build_object('links', jsonb_build_object('related', "#,
            r#"CONCAT('/notes/', "notes"."id", '/tags')))"#,
        )));
        assert!(!query.sql.contains("LEFT JOIN LATERAL"));
    }

    #[test]
    fn relationship_carries_both_data_and_links() {
        let schema = test_schema();
        let serializers = serializers_with_note(
            SerializerType::new().attribute("name").relationship_with(
                "tags",
                RelationshipConfig::new().link("related", LinkTemplate::fixed("/t")),
            ),
        );
        let query = compile(&schema, &serializers, &single_note(1));
        assert!(query.sql.contains(concat!(
            r#"'tags', jsonb_build_object('data', "rel_cte_dd077616c4"."j", "#,
            r#"'links', jsonb_build_object('related', '/t'))"#,
        )));
    }

    #[test]
    fn aliased_relationship_uses_the_public_name() {
        let schema = test_schema();
        let serializers = serializers_with_note(
            SerializerType::new()
                .attribute("name")
                .relationship_alias("author", "user"),
        );
        let query = compile(&schema, &serializers, &single_note(1));
        assert!(query.sql.contains(concat!(
            r#"'author', jsonb_build_object('data', "#,
            r#"CASE WHEN "notes"."user_id" IS NULL THEN NULL "#,
            r#"ELSE jsonb_build_object('id', "notes"."user_id"::text, 'type', 'users') END)"#,
        )));
    }

    #[test]
    fn has_one_yields_a_single_identifier() {
        let schema = EntitySchema::new()
            .register(
                EntityType::new("note", "notes", "id")
                    .attribute("name")
                    .relationship("cover", RelationshipSchema::has_one("attachment", "note_id")),
            )
            .register(EntityType::new("attachment", "attachments", "id").attribute("url"));
        let serializers = SerializerSchema::new()
            .register(
                "note",
                SerializerType::new().attribute("name").relationship("cover"),
            )
            .register("attachment", SerializerType::new().attribute("url"));
        let query = compile(&schema, &serializers, &single_note(1));
        assert!(query.sql.contains(concat!(
            r#"LEFT JOIN LATERAL (SELECT jsonb_build_object('id', "rel"."id"::text, 'type', 'attachments') AS "j" "#,
            r#"FROM "attachments" AS "rel" WHERE "rel"."note_id" = "notes"."id") AS "rel_cte_695534edfd" ON TRUE"#,
        )));
        assert!(query
            .sql
            .contains(r#"'cover', jsonb_build_object('data', "rel_cte_695534edfd"."j")"#));
    }

    #[test]
    fn computed_columns_override_plain_columns() {
        let schema = EntitySchema::new().register(
            EntityType::new("note", "notes", "id")
                .attribute("name")
                .attribute("content")
                .computed_column("excerpt", r#"substr("notes"."content", 1, 10)"#),
        );
        let serializers = SerializerSchema::new().register(
            "note",
            SerializerType::new()
                .attribute("excerpt")
                .attribute("shout")
                .sql_override("shout", r#"upper("notes"."name")"#)
                // The schema-level definition wins over a serializer override
                .sql_override("excerpt", "'ignored'"),
        );
        let query = compile(&schema, &serializers, &single_note(1));
        assert!(query
            .sql
            .contains(r#"'excerpt', substr("notes"."content", 1, 10)"#));
        assert!(query.sql.contains(r#"'shout', upper("notes"."name")"#));
        assert!(!query.sql.contains("'ignored'"));
    }

    #[test]
    fn dash_transform_applies_to_member_names() {
        let schema = test_schema();
        let serializers = serializers_with_note(
            SerializerType::new()
                .attribute("name")
                .relationship("recent_tags"),
        );
        let request = single_note(1).key_transform(KeyTransform::Dash);
        let query = compile(&schema, &serializers, &request);
        assert!(query.sql.contains(r#"'recent-tags'"#));
        assert!(!query.sql.contains(r#"'recent_tags'"#));
    }

    #[test]
    fn sparse_fieldset_accepts_the_singular_type_name() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = single_note(1).fields("note", vec!["content"]);
        let query = compile(&schema, &serializers, &request);
        assert!(query.sql.contains(
            r#"'attributes', jsonb_build_object('content', "notes"."content")"#
        ));
        assert!(!query.sql.contains(r#"'name', "notes"."name""#));
    }

    #[test]
    fn context_predicate_gates_an_attribute() {
        let schema = test_schema();
        let serializers = serializers_with_note(
            SerializerType::new()
                .attribute("name")
                .attribute_if("content", |context| context.flag("full")),
        );
        let bare = compile(&schema, &serializers, &single_note(1));
        assert!(!bare.sql.contains(r#"'content'"#));

        let request = single_note(1)
            .context(SerializationContext::new().with_value("full", serde_json::json!(true)));
        let full = compile(&schema, &serializers, &request);
        assert!(full.sql.contains(r#"'content', "notes"."content""#));
    }

    #[test]
    fn compilation_is_deterministic() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = single_note(1).include("tags").include("user.notes");
        let first = compile(&schema, &serializers, &request);
        let second = compile(&schema, &serializers, &request);
        assert_eq!(first.sql, second.sql);
        assert_eq!(first.params.len(), second.params.len());
    }

    #[test]
    fn unresolvable_relationship_is_reported() {
        let schema = test_schema();
        let serializers = serializers_with_note(
            SerializerType::new().attribute("name").relationship("owner"),
        );
        assert_eq!(
            compile_err(&schema, &serializers, &single_note(1)),
            CompilerError::UnresolvableRelationship {
                entity: "note".to_string(),
                relationship: "owner".to_string(),
            }
        );
    }

    #[test]
    fn unknown_root_types_are_reported() {
        let schema = test_schema();
        let serializers = test_serializers();
        let request = Request::new(RootSource::Entity {
            entity: "widget".to_string(),
            id: SQLParamContainer::new(1i32),
        });
        assert_eq!(
            compile_err(&schema, &serializers, &request),
            CompilerError::UnknownEntityType {
                name: "widget".to_string(),
            }
        );

        let serializers_without_note = SerializerSchema::new();
        assert_eq!(
            compile_err(&schema, &serializers_without_note, &single_note(1)),
            CompilerError::UnknownSerializerType {
                name: "note".to_string(),
            }
        );
    }
}
