//! Cross-cutting guarantees: determinism, scope discipline, pre-exec
//! isolation, and collection tracking.

use crate::{
    compile::compile,
    error::CompileError,
    ir::{
        EdgeFilter, EdgeSpec, PartialEdgeSpec, PreExecSpec, QueryNode, TransformListBuilder,
        Variable,
    },
    lowering::tests::fixtures::{compile_ok, normalize, registry},
};
use serde_json::json;

#[test]
fn compilation_is_deterministic() {
    let delivery = Variable::new("delivery");
    let filter = QueryNode::equal(
        QueryNode::field(QueryNode::variable(delivery.clone()), "deliveryNumber"),
        QueryNode::literal(json!("1000173")).expect("scalar literal"),
    );
    let root = TransformListBuilder::new(QueryNode::entities("Delivery"), delivery)
        .filter(filter)
        .max_count(10)
        .identity();

    let first = compile_ok(&root);
    let second = compile_ok(&root);

    assert_eq!(first, second);
}

#[test]
fn pre_exec_queries_cannot_see_transient_scope() {
    let delivery = Variable::new("delivery");
    let inner = QueryNode::with_pre_execution(
        vec![PreExecSpec::new(QueryNode::variable(delivery.clone()))],
        QueryNode::const_int(1),
    );
    let root = TransformListBuilder::new(QueryNode::entities("Delivery"), delivery).inner(inner);

    let err = compile(&root, &registry()).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnboundVariable {
            label: "delivery".to_string()
        }
    );
}

#[test]
fn pre_exec_queries_see_earlier_result_bindings() {
    let first_result = Variable::new("firstResult");
    let second_result = Variable::new("secondResult");
    let root = QueryNode::with_pre_execution(
        vec![
            PreExecSpec::new(QueryNode::const_int(1))
                .with_result_variable(first_result.clone()),
            PreExecSpec::new(QueryNode::variable(first_result))
                .with_result_variable(second_result.clone()),
        ],
        QueryNode::variable(second_result),
    );
    let compound = compile_ok(&root);

    assert_eq!(compound.pre_exec.len(), 2);
    assert_eq!(normalize(&compound.pre_exec[0].query.text), "RETURN 1");
    assert_eq!(
        normalize(&compound.pre_exec[1].query.text),
        "RETURN @r0_firstResult"
    );
    assert_eq!(
        normalize(&compound.main.text),
        "RETURN @r1_secondResult"
    );
}

#[test]
fn pre_exec_bindings_stay_isolated_from_the_main_query() {
    let created_key = Variable::new("createdKey");
    let create = QueryNode::create_entity(
        "Delivery",
        QueryNode::object(vec![crate::ir::ObjectProperty::new(
            "deliveryNumber",
            QueryNode::literal(json!("pre-exec-only")).expect("scalar literal"),
        )]),
    );
    let delivery = Variable::new("delivery");
    let filter = QueryNode::equal(
        QueryNode::field(QueryNode::variable(delivery.clone()), "deliveryNumber"),
        QueryNode::literal(json!("main-only")).expect("scalar literal"),
    );
    let list = TransformListBuilder::new(QueryNode::entities("Delivery"), delivery)
        .filter(filter)
        .identity();
    let root = QueryNode::with_pre_execution(
        vec![PreExecSpec::new(create).with_result_variable(created_key)],
        list,
    );
    let compound = compile_ok(&root);

    let pre_exec_values: Vec<_> = compound.pre_exec[0].query.bindings.values().collect();
    assert!(!pre_exec_values.contains(&&json!("main-only")));
    let main_values: Vec<_> = compound.main.bindings.values().collect();
    assert!(!main_values.contains(&&json!("pre-exec-only")));
}

#[test]
fn reusing_a_variable_identity_across_scopes_fails() {
    let shared = Variable::new("shared");
    let inner = TransformListBuilder::new(
        QueryNode::field(QueryNode::variable(shared.clone()), "items"),
        shared.clone(),
    )
    .identity();
    let root = TransformListBuilder::new(QueryNode::entities("Delivery"), shared).inner(inner);

    let err = compile(&root, &registry()).unwrap_err();
    assert_eq!(
        err,
        CompileError::DoubleIntroduction {
            label: "shared".to_string()
        }
    );
}

#[test]
fn collection_tracking_covers_reads_and_writes() {
    struct Case {
        name: &'static str,
        root: crate::ir::NodeRef,
        expect_read: &'static [&'static str],
        expect_write: &'static [&'static str],
    }

    let relation = registry()
        .relation("delivery_handlingUnits")
        .expect("fixture relation")
        .clone();
    let key = || QueryNode::literal(json!("k1")).expect("scalar literal");

    let cases = vec![
        Case {
            name: "entities_read",
            root: QueryNode::count(QueryNode::entities("Delivery")),
            expect_read: &["deliveries"],
            expect_write: &[],
        },
        Case {
            name: "create_write",
            root: QueryNode::create_entity("Delivery", QueryNode::object(Vec::new())),
            expect_read: &[],
            expect_write: &["deliveries"],
        },
        Case {
            name: "update_read_write",
            root: QueryNode::update_entities(
                "Delivery",
                QueryNode::entities("Delivery"),
                Variable::new("delivery"),
                Vec::new(),
            ),
            expect_read: &["deliveries"],
            expect_write: &["deliveries"],
        },
        Case {
            name: "delete_write",
            root: QueryNode::delete_entities("Delivery", QueryNode::entities("Delivery")),
            expect_read: &["deliveries"],
            expect_write: &["deliveries"],
        },
        Case {
            name: "add_edges_write",
            root: QueryNode::add_edges(relation.clone(), vec![EdgeSpec::new(key(), key())]),
            expect_read: &[],
            expect_write: &["deliveries_handlingUnits"],
        },
        Case {
            name: "remove_edges_write",
            root: QueryNode::remove_edges(relation.clone(), EdgeFilter::default()),
            expect_read: &["deliveries_handlingUnits"],
            expect_write: &["deliveries_handlingUnits"],
        },
        Case {
            name: "set_edge_write",
            root: QueryNode::set_edge(
                relation,
                PartialEdgeSpec::default(),
                EdgeSpec::new(key(), key()),
            ),
            expect_read: &[],
            expect_write: &["deliveries_handlingUnits"],
        },
    ];

    for case in cases {
        let compound = compile_ok(&case.root);
        for collection in case.expect_read {
            assert!(
                compound.read_collections.contains(*collection),
                "case '{}': missing read '{collection}'",
                case.name
            );
        }
        for collection in case.expect_write {
            assert!(
                compound.write_collections.contains(*collection),
                "case '{}': missing write '{collection}'",
                case.name
            );
        }
    }
}

#[test]
fn unknown_entity_types_surface_model_errors() {
    let root = QueryNode::count(QueryNode::entities("Nonexistent"));
    let err = compile(&root, &registry()).unwrap_err();
    assert!(matches!(err, CompileError::Model(_)));
}
