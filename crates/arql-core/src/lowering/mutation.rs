use crate::{
    context::QueryContext,
    error::CompileError,
    frag,
    fragment::{self, CollectionAccess, QueryFragment},
    ir::{EdgeFilter, EdgeSpec, NodeRef, PartialEdgeSpec, PropertySpec, QueryNode, Variable},
    lowering::{lower, object_key},
};
use arql_model::RelationModel;
use serde_json::json;

/// Lower a statement node as a whole query. Expression nodes never reach
/// this function; statement nodes never reach `lower`.
pub(super) fn lower_statement(
    node: &NodeRef,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    match node.as_ref() {
        QueryNode::CreateEntity {
            entity_type,
            object,
        } => {
            let model = ctx.registry().root_entity(entity_type)?;
            Ok(fragment::lines(vec![
                frag![
                    "INSERT ",
                    lower(object, ctx)?,
                    " IN ",
                    fragment::collection(&model.collection_name, CollectionAccess::Write)?
                ],
                fragment::text("RETURN NEW._key"),
            ]))
        }

        QueryNode::UpdateEntities {
            entity_type,
            list,
            current_variable,
            updates,
        } => lower_update_entities(entity_type, list, current_variable, updates, ctx),

        QueryNode::DeleteEntities { entity_type, list } => {
            let model = ctx.registry().root_entity(entity_type)?;
            let entity = fragment::variable("entityToDelete");
            Ok(fragment::lines(vec![
                frag!["FOR ", &entity, " IN ", lower(list, ctx)?],
                frag![
                    "REMOVE ",
                    &entity,
                    " IN ",
                    fragment::collection(&model.collection_name, CollectionAccess::Write)?
                ],
                fragment::text("RETURN OLD._key"),
            ]))
        }

        QueryNode::AddEdges { relation, edges } => lower_add_edges(relation, edges, ctx),
        QueryNode::RemoveEdges { relation, filter } => lower_remove_edges(relation, filter, ctx),
        QueryNode::SetEdge {
            relation,
            existing,
            new,
        } => lower_set_edge(relation, existing, new, ctx),

        _ => Err(CompileError::malformed(
            "expression node in statement position",
        )),
    }
}

fn lower_update_entities(
    entity_type: &str,
    list: &NodeRef,
    current_variable: &Variable,
    updates: &[PropertySpec],
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let model = ctx.registry().root_entity(entity_type)?;
    // The list is lowered in the outer scope; update values see the
    // current entity.
    let list = lower(list, ctx)?;
    let (scope_ctx, entity) = ctx.introduce_variable(current_variable)?;

    let mut properties = Vec::with_capacity(updates.len());
    for update in updates {
        properties.push(frag![
            object_key(&update.property),
            ": ",
            lower(&update.value, &scope_ctx)?
        ]);
    }
    let update_object = if properties.is_empty() {
        fragment::text("{}")
    } else {
        frag!["{ ", fragment::join(properties, ", "), " }"]
    };

    Ok(fragment::lines(vec![
        frag!["FOR ", &entity, " IN ", list],
        frag![
            "UPDATE ",
            &entity,
            " WITH ",
            update_object,
            " IN ",
            fragment::collection(&model.collection_name, CollectionAccess::Write)?,
            " OPTIONS { mergeObjects: false }"
        ],
        fragment::text("RETURN NEW._key"),
    ]))
}

fn lower_add_edges(
    relation: &RelationModel,
    edges: &[EdgeSpec],
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let mut edge_objects = Vec::with_capacity(edges.len());
    for edge in edges {
        edge_objects.push(frag![
            "{ _from: ",
            full_id(relation, Side::From, &edge.from_key, ctx)?,
            ", _to: ",
            full_id(relation, Side::To, &edge.to_key, ctx)?,
            " }"
        ]);
    }

    let edge = fragment::variable("edge");
    Ok(fragment::lines(vec![
        frag![
            "FOR ",
            &edge,
            " IN [",
            fragment::join(edge_objects, ", "),
            "]"
        ],
        // UPSERT keeps edge insertion idempotent.
        frag![
            "UPSERT ",
            &edge,
            " INSERT ",
            &edge,
            " UPDATE {} IN ",
            fragment::collection(&relation.edge_collection_name, CollectionAccess::Write)?
        ],
    ]))
}

fn lower_remove_edges(
    relation: &RelationModel,
    filter: &EdgeFilter,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let edge = fragment::variable("edge");

    let mut conditions = Vec::new();
    if let Some(from_keys) = &filter.from_keys {
        conditions.push(frag![
            &edge,
            "._from IN ",
            full_id_list(relation, Side::From, from_keys, ctx)?
        ]);
    }
    if let Some(to_keys) = &filter.to_keys {
        conditions.push(frag![
            &edge,
            "._to IN ",
            full_id_list(relation, Side::To, to_keys, ctx)?
        ]);
    }

    let mut block = vec![frag![
        "FOR ",
        &edge,
        " IN ",
        fragment::collection(&relation.edge_collection_name, CollectionAccess::Read)?
    ]];
    if !conditions.is_empty() {
        block.push(frag!["FILTER ", fragment::join(conditions, " && ")]);
    }
    block.push(frag![
        "REMOVE ",
        &edge,
        " IN ",
        fragment::collection(&relation.edge_collection_name, CollectionAccess::Write)?
    ]);

    Ok(fragment::lines(block))
}

fn lower_set_edge(
    relation: &RelationModel,
    existing: &PartialEdgeSpec,
    new: &EdgeSpec,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let mut existing_properties = Vec::new();
    if let Some(from_key) = &existing.from_key {
        existing_properties.push(frag![
            "_from: ",
            full_id(relation, Side::From, from_key, ctx)?
        ]);
    }
    if let Some(to_key) = &existing.to_key {
        existing_properties.push(frag!["_to: ", full_id(relation, Side::To, to_key, ctx)?]);
    }
    let existing_object = if existing_properties.is_empty() {
        fragment::text("{}")
    } else {
        frag!["{ ", fragment::join(existing_properties, ", "), " }"]
    };

    let new_object = frag![
        "{ _from: ",
        full_id(relation, Side::From, &new.from_key, ctx)?,
        ", _to: ",
        full_id(relation, Side::To, &new.to_key, ctx)?,
        " }"
    ];

    Ok(frag![
        "UPSERT ",
        existing_object,
        " INSERT ",
        new_object.clone(),
        " UPDATE ",
        new_object,
        " IN ",
        fragment::collection(&relation.edge_collection_name, CollectionAccess::Write)?
    ])
}

#[derive(Clone, Copy)]
enum Side {
    From,
    To,
}

fn endpoint_collection(
    relation: &RelationModel,
    side: Side,
    ctx: &QueryContext,
) -> Result<String, CompileError> {
    let entity_type = match side {
        Side::From => &relation.from_type,
        Side::To => &relation.to_type,
    };
    Ok(ctx
        .registry()
        .root_entity(entity_type)?
        .collection_name
        .clone())
}

/// `CONCAT("<coll>/", key)`: a root-entity key widened to a document id.
fn full_id(
    relation: &RelationModel,
    side: Side,
    key: &NodeRef,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let collection = endpoint_collection(relation, side, ctx)?;
    Ok(frag![
        "CONCAT(",
        fragment::value(json!(format!("{collection}/"))),
        ", ",
        lower(key, ctx)?,
        ")"
    ])
}

/// Widen a list of keys to a list of document ids.
fn full_id_list(
    relation: &RelationModel,
    side: Side,
    keys: &NodeRef,
    ctx: &QueryContext,
) -> Result<QueryFragment, CompileError> {
    let collection = endpoint_collection(relation, side, ctx)?;
    let key = fragment::variable("key");
    Ok(frag![
        "(FOR ",
        &key,
        " IN ",
        lower(keys, ctx)?,
        " RETURN CONCAT(",
        fragment::value(json!(format!("{collection}/"))),
        ", ",
        &key,
        "))"
    ])
}
