//! Quantifier lowering: array expansion and the count-based canonical
//! reduction.

use crate::{
    ir::{
        BinaryOperator, NodeRef, Quantifier, QueryNode, TransformListBuilder, Variable,
    },
    lowering::tests::fixtures::{compile_ok, normalize},
};
use serde_json::json;

/// Compile a list query whose filter quantifies over `delivery.items`.
fn compile_quantifier(quantifier: Quantifier, condition: impl Fn(&Variable) -> NodeRef) -> String {
    let delivery = Variable::new("delivery");
    let item = Variable::new("item");
    let filter = QueryNode::quantifier_filter(
        quantifier,
        QueryNode::field(QueryNode::variable(delivery.clone()), "items"),
        item.clone(),
        condition(&item),
    );
    let root = TransformListBuilder::new(QueryNode::entities("Delivery"), delivery)
        .filter(filter)
        .identity();
    normalize(&compile_ok(&root).main.text)
}

fn item_number_equals(item: &Variable, value: &str) -> NodeRef {
    QueryNode::equal(
        QueryNode::field(QueryNode::variable(item.clone()), "itemNumber"),
        QueryNode::literal(json!(value)).expect("scalar literal"),
    )
}

#[test]
fn some_with_equality_expands_the_array() {
    let text = compile_quantifier(Quantifier::Some, |item| item_number_equals(item, "abc"));

    assert!(
        text.contains("(@p0 IN v0_delivery.items[*].itemNumber)"),
        "unexpected text: {text}"
    );
    assert!(
        !text.contains("COLLECT WITH COUNT"),
        "unexpected text: {text}"
    );
}

#[test]
fn some_with_caseless_literal_like_expands_the_array() {
    let item_condition = |item: &Variable| {
        QueryNode::binary_op(
            BinaryOperator::Like,
            QueryNode::field(QueryNode::variable(item.clone()), "itemNumber"),
            QueryNode::literal(json!("12-34")).expect("scalar literal"),
        )
    };
    let text = compile_quantifier(Quantifier::Some, item_condition);

    assert!(
        text.contains("(@p0 IN v0_delivery.items[*].itemNumber)"),
        "unexpected text: {text}"
    );
}

#[test]
fn some_over_a_safe_list_wrapper_still_expands() {
    let delivery = Variable::new("delivery");
    let item = Variable::new("item");
    let filter = QueryNode::quantifier_filter(
        Quantifier::Some,
        QueryNode::safe_list(QueryNode::field(
            QueryNode::variable(delivery.clone()),
            "items",
        )),
        item.clone(),
        item_number_equals(&item, "abc"),
    );
    let root = TransformListBuilder::new(QueryNode::entities("Delivery"), delivery)
        .filter(filter)
        .identity();
    let text = normalize(&compile_ok(&root).main.text);

    assert!(
        text.contains("(@p0 IN v0_delivery.items[*].itemNumber)"),
        "unexpected text: {text}"
    );
}

#[test]
fn nested_field_chains_expand_segment_by_segment() {
    let text = compile_quantifier(Quantifier::Some, |item| {
        QueryNode::equal(
            QueryNode::field(
                QueryNode::field(QueryNode::variable(item.clone()), "detail"),
                "code",
            ),
            QueryNode::literal(json!("c-1")).expect("scalar literal"),
        )
    });

    assert!(
        text.contains("(@p0 IN v0_delivery.items[*].detail.code)"),
        "unexpected text: {text}"
    );
}

#[test]
fn some_with_a_non_equality_condition_counts_the_filtered_list() {
    let text = compile_quantifier(Quantifier::Some, |item| {
        QueryNode::binary_op(
            BinaryOperator::GreaterThan,
            QueryNode::field(QueryNode::variable(item.clone()), "quantity"),
            QueryNode::const_int(5),
        )
    });

    assert!(
        text.contains("COLLECT WITH COUNT INTO"),
        "unexpected text: {text}"
    );
    assert!(text.contains("> 0)"), "unexpected text: {text}");
}

#[test]
fn some_with_an_item_dependent_rhs_cannot_expand() {
    let text = compile_quantifier(Quantifier::Some, |item| {
        QueryNode::equal(
            QueryNode::field(QueryNode::variable(item.clone()), "itemNumber"),
            QueryNode::field(QueryNode::variable(item.clone()), "otherNumber"),
        )
    });

    assert!(
        text.contains("COLLECT WITH COUNT INTO"),
        "unexpected text: {text}"
    );
}

#[test]
fn every_rewrites_to_a_negated_none() {
    let text = compile_quantifier(Quantifier::Every, |item| item_number_equals(item, "abc"));

    assert!(
        text.contains("FILTER !((v2_item.itemNumber == @p0))"),
        "unexpected text: {text}"
    );
    assert!(text.contains("== 0)"), "unexpected text: {text}");
    assert!(
        text.contains("COLLECT WITH COUNT INTO"),
        "unexpected text: {text}"
    );
}

#[test]
fn none_counts_matches_down_to_zero() {
    let text = compile_quantifier(Quantifier::None, |item| item_number_equals(item, "abc"));

    assert!(text.contains("== 0)"), "unexpected text: {text}");
    assert!(
        text.contains("FILTER (v2_item.itemNumber == @p0)"),
        "unexpected text: {text}"
    );
}

#[test]
fn cased_literal_like_cannot_expand() {
    let text = compile_quantifier(Quantifier::Some, |item| {
        QueryNode::binary_op(
            BinaryOperator::Like,
            QueryNode::field(QueryNode::variable(item.clone()), "itemNumber"),
            QueryNode::literal(json!("abc")).expect("scalar literal"),
        )
    });

    assert!(
        text.contains("COLLECT WITH COUNT INTO"),
        "unexpected text: {text}"
    );
}
