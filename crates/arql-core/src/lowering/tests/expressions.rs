//! Lowering of value, structural, variable, and access nodes.

use crate::{
    compile::{CompileOptions, compile_with_options},
    error::CompileError,
    ir::{BasicType, BinaryOperator, ObjectProperty, QueryNode, TransformListBuilder, Variable},
    lowering::tests::fixtures::{compile_ok, normalize, registry},
};
use arql_model::{EdgeDirection, RelationSide};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

#[test]
fn empty_object_and_list_lower_to_their_empty_forms() {
    let compound = compile_ok(&QueryNode::object(Vec::new()));
    assert_eq!(normalize(&compound.main.text), "RETURN {}");

    let compound = compile_ok(&QueryNode::list(Vec::new()));
    assert_eq!(normalize(&compound.main.text), "RETURN []");
}

#[test]
fn object_keys_follow_the_whitelist() {
    let root = QueryNode::object(vec![
        ObjectProperty::new("safeKey", QueryNode::const_int(1)),
        ObjectProperty::new("weird key!", QueryNode::const_int(2)),
    ]);
    let compound = compile_ok(&root);

    assert_eq!(
        normalize(&compound.main.text),
        "RETURN { safeKey: 1, [@p0]: 2 }"
    );
    assert_eq!(compound.main.bindings["p0"], json!("weird key!"));
}

#[test]
fn merge_and_union_flatten_degenerate_arities() {
    let one = QueryNode::object(vec![ObjectProperty::new("a", QueryNode::const_int(1))]);
    let two = QueryNode::object(vec![ObjectProperty::new("b", QueryNode::const_int(2))]);

    let compound = compile_ok(&QueryNode::merge_objects(Vec::new()));
    assert_eq!(normalize(&compound.main.text), "RETURN {}");

    let compound = compile_ok(&QueryNode::merge_objects(vec![one.clone()]));
    assert_eq!(normalize(&compound.main.text), "RETURN { a: 1 }");

    let compound = compile_ok(&QueryNode::merge_objects(vec![one, two]));
    assert_eq!(
        normalize(&compound.main.text),
        "RETURN MERGE({ a: 1 }, { b: 2 })"
    );

    let compound = compile_ok(&QueryNode::concat_lists(vec![
        QueryNode::list(vec![QueryNode::const_int(1)]),
        QueryNode::list(vec![QueryNode::const_int(2)]),
    ]));
    assert_eq!(normalize(&compound.main.text), "RETURN UNION([1], [2])");
}

#[test]
fn runtime_errors_lower_to_the_sentinel_object() {
    let compound = compile_ok(&QueryNode::runtime_error("delivery number not unique"));

    assert_eq!(
        normalize(&compound.main.text),
        "RETURN { __arql_runtime_error: @p0 }"
    );
    assert_eq!(
        compound.main.bindings["p0"],
        json!("delivery number not unique")
    );
}

#[test]
fn conditionals_and_type_checks_lower_inline() {
    let root = QueryNode::conditional(
        QueryNode::const_bool(true),
        QueryNode::const_int(1),
        QueryNode::const_int(2),
    );
    let compound = compile_ok(&root);
    assert_eq!(normalize(&compound.main.text), "RETURN (true ? 1 : 2)");

    let root = QueryNode::type_check(
        QueryNode::literal(json!(5)).expect("scalar literal"),
        BasicType::Scalar,
    );
    let compound = compile_ok(&root);
    assert_eq!(
        normalize(&compound.main.text),
        "RETURN (IS_BOOL(@p0) || IS_NUMBER(@p1) || IS_STRING(@p2))"
    );

    let root = QueryNode::type_check(QueryNode::null(), BasicType::Null);
    let compound = compile_ok(&root);
    assert_eq!(normalize(&compound.main.text), "RETURN IS_NULL(null)");
}

#[test]
fn safe_list_guards_with_a_type_check() {
    let root = QueryNode::safe_list(QueryNode::literal(json!([1, 2])).expect("array literal"));
    let compound = compile_ok(&root);

    assert_eq!(
        normalize(&compound.main.text),
        "RETURN (IS_LIST(@p0) ? @p1 : [])"
    );
    assert_eq!(compound.main.bindings["p0"], json!([1, 2]));
    assert_eq!(compound.main.bindings["p1"], json!([1, 2]));
}

#[test]
fn unary_operators_lower_to_their_native_forms() {
    let compound = compile_ok(&QueryNode::not(QueryNode::const_bool(false)));
    // Constant folding happens in filters, not bare expressions.
    assert_eq!(normalize(&compound.main.text), "RETURN !(false)");

    let compound = compile_ok(&QueryNode::unary_op(
        crate::ir::UnaryOperator::JsonStringify,
        QueryNode::const_int(7),
    ));
    assert_eq!(normalize(&compound.main.text), "RETURN JSON_STRINGIFY(7)");
}

#[test]
fn nested_assignments_wrap_in_a_first_subquery() {
    let v = Variable::new("tmp");
    let assignment = QueryNode::variable_assignment(
        v.clone(),
        QueryNode::const_int(1),
        QueryNode::variable(v),
    );
    // Behind an operator edge the assignment cannot be hoisted.
    let root = QueryNode::binary_op(BinaryOperator::Add, assignment, QueryNode::const_int(2));
    let compound = compile_ok(&root);

    assert_eq!(
        normalize(&compound.main.text),
        "RETURN (FIRST(LET v0_tmp = 1 RETURN v0_tmp) + 2)"
    );
}

#[test]
fn top_level_assignments_hoist_into_let_lines() {
    let v = Variable::new("total");
    let root = QueryNode::variable_assignment(
        v.clone(),
        QueryNode::const_int(1),
        QueryNode::binary_op(
            BinaryOperator::Add,
            QueryNode::variable(v),
            QueryNode::const_int(2),
        ),
    );
    let compound = compile_ok(&root);

    assert_eq!(
        normalize(&compound.main.text),
        "LET v0_total = 1 RETURN (v0_total + 2)"
    );
}

#[test]
fn entity_from_id_lowers_to_document_lookup() {
    let root = QueryNode::entity_from_id(
        "Delivery",
        QueryNode::literal(json!("abc123")).expect("scalar literal"),
    );
    let compound = compile_ok(&root);

    assert_eq!(
        normalize(&compound.main.text),
        "RETURN DOCUMENT(deliveries, @p0)"
    );
    assert!(compound.read_collections.contains("deliveries"));
}

#[test]
fn root_entity_id_reads_the_key_field() {
    let root = QueryNode::root_entity_id(QueryNode::entity_from_id(
        "Delivery",
        QueryNode::literal(json!("abc123")).expect("scalar literal"),
    ));
    let compound = compile_ok(&root);

    assert_eq!(
        normalize(&compound.main.text),
        "RETURN DOCUMENT(deliveries, @p0)._key"
    );
}

#[test]
fn unsafe_field_segments_are_bound_as_bracket_keys() {
    let delivery = Variable::new("delivery");
    let inner = QueryNode::field_with_path(
        QueryNode::variable(delivery.clone()),
        vec!["nested path".to_string()],
        "field name!",
    );
    let root = TransformListBuilder::new(QueryNode::entities("Delivery"), delivery).inner(inner);
    let compound = compile_ok(&root);
    let text = normalize(&compound.main.text);

    assert!(
        text.contains("RETURN v0_delivery[@p0][@p1]"),
        "unexpected text: {text}"
    );
    assert_eq!(compound.main.bindings["p0"], json!("nested path"));
    assert_eq!(compound.main.bindings["p1"], json!("field name!"));
}

fn handling_unit_side() -> RelationSide {
    let registry = registry();
    let relation = registry
        .relation("delivery_handlingUnits")
        .expect("fixture relation")
        .clone();
    RelationSide::new(relation, EdgeDirection::Outbound)
}

#[test]
fn follow_edge_in_expression_position_filters_dangling_edges() {
    let source = QueryNode::entity_from_id(
        "Delivery",
        QueryNode::literal(json!("abc123")).expect("scalar literal"),
    );
    let root = QueryNode::follow_edge(handling_unit_side(), source);
    let compound = compile_ok(&root);

    assert_eq!(
        normalize(&compound.main.text),
        "RETURN (FOR v0_node IN OUTBOUND DOCUMENT(deliveries, @p0) deliveries_handlingUnits \
         FILTER v0_node != null RETURN v0_node)"
    );
    assert!(compound.read_collections.contains("deliveries_handlingUnits"));
    assert!(compound.read_collections.contains("handling_units"));
}

#[test]
fn follow_edge_as_list_source_uses_the_simple_form() {
    let source = QueryNode::entity_from_id(
        "Delivery",
        QueryNode::literal(json!("abc123")).expect("scalar literal"),
    );
    let hu = Variable::new("hu");
    let root = TransformListBuilder::new(
        QueryNode::follow_edge(handling_unit_side(), source),
        hu,
    )
    .identity();
    let compound = compile_ok(&root);

    assert_eq!(
        normalize(&compound.main.text),
        "RETURN ( FOR v0_hu IN OUTBOUND DOCUMENT(deliveries, @p0) deliveries_handlingUnits \
         FILTER v0_hu != null RETURN v0_hu )"
    );
}

#[test]
fn quick_search_requires_an_indexed_type() {
    let item = Variable::new("item");
    let root = QueryNode::quick_search(
        "HandlingUnit",
        item.clone(),
        QueryNode::equal(
            QueryNode::field(QueryNode::variable(item), "huNumber"),
            QueryNode::literal(json!("hu-1")).expect("scalar literal"),
        ),
    );

    let err = crate::compile::compile(&root, &registry()).unwrap_err();
    assert!(matches!(err, CompileError::MalformedIr { .. }));
}

#[test]
fn cancellation_aborts_the_compilation() {
    let token = Arc::new(AtomicBool::new(false));
    token.store(true, Ordering::Relaxed);
    let options = CompileOptions::new().with_cancellation(Arc::clone(&token));

    let err = compile_with_options(
        &QueryNode::count(QueryNode::entities("Delivery")),
        &registry(),
        &options,
    )
    .unwrap_err();
    assert_eq!(err, CompileError::Cancelled);
}
