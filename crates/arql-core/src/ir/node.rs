use crate::{
    compound::QueryResultValidator,
    error::CompileError,
    ir::{
        ops::{BasicType, BinaryOperator, LanguageOperator, OrderClause, Quantifier, UnaryOperator},
        variable::Variable,
    },
};
use arql_model::{AnalyzerLanguage, RelationSide};
use serde_json::Value as JsonValue;
use std::{rc::Rc, sync::Arc};

/// Shared handle to an IR node. Nodes are immutable after construction;
/// a node may appear in multiple positions without deep copies.
pub type NodeRef = Rc<QueryNode>;

///
/// ObjectProperty
///

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectProperty {
    pub key: String,
    pub value: NodeRef,
}

impl ObjectProperty {
    #[must_use]
    pub fn new(key: impl Into<String>, value: NodeRef) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

///
/// PropertySpec
///
/// One property update inside `UpdateEntities`; the value node may
/// reference the update's current-entity variable.
///

#[derive(Clone, Debug, PartialEq)]
pub struct PropertySpec {
    pub property: String,
    pub value: NodeRef,
}

impl PropertySpec {
    #[must_use]
    pub fn new(property: impl Into<String>, value: NodeRef) -> Self {
        Self {
            property: property.into(),
            value,
        }
    }
}

///
/// EdgeSpec
///
/// Endpoints of one edge, given as root-entity key expressions. Lowering
/// expands them to full document ids.
///

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSpec {
    pub from_key: NodeRef,
    pub to_key: NodeRef,
}

impl EdgeSpec {
    #[must_use]
    pub const fn new(from_key: NodeRef, to_key: NodeRef) -> Self {
        Self { from_key, to_key }
    }
}

///
/// PartialEdgeSpec
///
/// Edge endpoints with either side unspecified; used to locate the
/// existing edge in `SetEdge`.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialEdgeSpec {
    pub from_key: Option<NodeRef>,
    pub to_key: Option<NodeRef>,
}

///
/// EdgeFilter
///
/// Match condition for `RemoveEdges`: optional list expressions of
/// root-entity keys per side. A side left unset matches any endpoint.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeFilter {
    pub from_keys: Option<NodeRef>,
    pub to_keys: Option<NodeRef>,
}

///
/// PreExecSpec
///
/// One pre-execution entry of `WithPreExecution`: the query to run, the
/// variable its result is bound to (if any), and an opaque validator the
/// executing layer applies to that result.
///

#[derive(Clone, Debug, PartialEq)]
pub struct PreExecSpec {
    pub query: NodeRef,
    pub result_variable: Option<Variable>,
    pub result_validator: Option<QueryResultValidator>,
}

impl PreExecSpec {
    #[must_use]
    pub const fn new(query: NodeRef) -> Self {
        Self {
            query,
            result_variable: None,
            result_validator: None,
        }
    }

    #[must_use]
    pub fn with_result_variable(mut self, variable: Variable) -> Self {
        self.result_variable = Some(variable);
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: QueryResultValidator) -> Self {
        self.result_validator = Some(validator);
        self
    }
}

///
/// QueryNode
///
/// The closed node family. Value, structural, variable/scope, access,
/// transformation, operation, mutation, quantifier, and search nodes.
/// Construction invariants:
///
/// - literals hold JSON scalars or arrays, never objects
/// - `skip`/`max_count` are unsigned; `max_count == None` means unbounded
/// - a variable is introduced at most once per scope (enforced during
///   lowering, since introduction is a scope act, not a node act)
/// - mutation nodes are statements and may only appear as query roots
///

#[derive(Clone, Debug, PartialEq)]
pub enum QueryNode {
    // value nodes
    Literal(JsonValue),
    ConstBool(bool),
    ConstInt(i64),
    Null,
    RuntimeError {
        message: String,
    },

    // structural nodes
    Object {
        properties: Vec<ObjectProperty>,
    },
    List {
        items: Vec<NodeRef>,
    },
    MergeObjects {
        objects: Vec<NodeRef>,
    },
    ConcatLists {
        lists: Vec<NodeRef>,
    },
    FirstOfList {
        list: NodeRef,
    },
    SafeList {
        list: NodeRef,
    },

    // variable/scope nodes
    Variable(Variable),
    VariableAssignment {
        variable: Variable,
        value: NodeRef,
        result: NodeRef,
    },
    WithPreExecution {
        pre_exec: Vec<PreExecSpec>,
        result: NodeRef,
    },

    // access nodes
    Field {
        object: NodeRef,
        path: Vec<String>,
        field: String,
    },
    RootEntityId {
        object: NodeRef,
    },
    EntityFromId {
        entity_type: String,
        id: NodeRef,
    },
    Entities {
        entity_type: String,
    },
    FollowEdge {
        side: RelationSide,
        source: NodeRef,
    },

    // transformation nodes
    TransformList {
        list: NodeRef,
        item_variable: Variable,
        filter: Option<NodeRef>,
        order_by: Vec<OrderClause>,
        skip: u64,
        max_count: Option<u64>,
        inner: NodeRef,
    },
    Count {
        list: NodeRef,
    },

    // operation nodes
    BinaryOp {
        op: BinaryOperator,
        lhs: NodeRef,
        rhs: NodeRef,
    },
    UnaryOp {
        op: UnaryOperator,
        value: NodeRef,
    },
    Conditional {
        condition: NodeRef,
        then_value: NodeRef,
        else_value: NodeRef,
    },
    TypeCheck {
        value: NodeRef,
        basic_type: BasicType,
    },
    OperatorWithLanguage {
        op: LanguageOperator,
        lhs: NodeRef,
        rhs: NodeRef,
        language: Option<AnalyzerLanguage>,
    },

    // mutation nodes (statements)
    CreateEntity {
        entity_type: String,
        object: NodeRef,
    },
    UpdateEntities {
        entity_type: String,
        list: NodeRef,
        current_variable: Variable,
        updates: Vec<PropertySpec>,
    },
    DeleteEntities {
        entity_type: String,
        list: NodeRef,
    },
    AddEdges {
        relation: Arc<arql_model::RelationModel>,
        edges: Vec<EdgeSpec>,
    },
    RemoveEdges {
        relation: Arc<arql_model::RelationModel>,
        filter: EdgeFilter,
    },
    SetEdge {
        relation: Arc<arql_model::RelationModel>,
        existing: PartialEdgeSpec,
        new: EdgeSpec,
    },

    // quantifier nodes
    QuantifierFilter {
        quantifier: Quantifier,
        list: NodeRef,
        item_variable: Variable,
        condition: NodeRef,
    },

    // search nodes
    QuickSearch {
        entity_type: String,
        item_variable: Variable,
        filter: NodeRef,
    },
}

impl QueryNode {
    /// Checked literal constructor: JSON scalars and arrays only.
    pub fn literal(value: JsonValue) -> Result<NodeRef, CompileError> {
        if value.is_object() {
            return Err(CompileError::malformed(
                "literal nodes hold JSON scalars or arrays, not objects",
            ));
        }
        Ok(Rc::new(Self::Literal(value)))
    }

    #[must_use]
    pub fn const_bool(value: bool) -> NodeRef {
        Rc::new(Self::ConstBool(value))
    }

    #[must_use]
    pub fn const_int(value: i64) -> NodeRef {
        Rc::new(Self::ConstInt(value))
    }

    #[must_use]
    pub fn null() -> NodeRef {
        Rc::new(Self::Null)
    }

    #[must_use]
    pub fn runtime_error(message: impl Into<String>) -> NodeRef {
        Rc::new(Self::RuntimeError {
            message: message.into(),
        })
    }

    #[must_use]
    pub fn object(properties: Vec<ObjectProperty>) -> NodeRef {
        Rc::new(Self::Object { properties })
    }

    #[must_use]
    pub fn list(items: Vec<NodeRef>) -> NodeRef {
        Rc::new(Self::List { items })
    }

    #[must_use]
    pub fn merge_objects(objects: Vec<NodeRef>) -> NodeRef {
        Rc::new(Self::MergeObjects { objects })
    }

    #[must_use]
    pub fn concat_lists(lists: Vec<NodeRef>) -> NodeRef {
        Rc::new(Self::ConcatLists { lists })
    }

    #[must_use]
    pub fn first_of_list(list: NodeRef) -> NodeRef {
        Rc::new(Self::FirstOfList { list })
    }

    #[must_use]
    pub fn safe_list(list: NodeRef) -> NodeRef {
        Rc::new(Self::SafeList { list })
    }

    #[must_use]
    pub fn variable(variable: Variable) -> NodeRef {
        Rc::new(Self::Variable(variable))
    }

    #[must_use]
    pub fn variable_assignment(variable: Variable, value: NodeRef, result: NodeRef) -> NodeRef {
        Rc::new(Self::VariableAssignment {
            variable,
            value,
            result,
        })
    }

    #[must_use]
    pub fn with_pre_execution(pre_exec: Vec<PreExecSpec>, result: NodeRef) -> NodeRef {
        Rc::new(Self::WithPreExecution { pre_exec, result })
    }

    #[must_use]
    pub fn field(object: NodeRef, field: impl Into<String>) -> NodeRef {
        Rc::new(Self::Field {
            object,
            path: Vec::new(),
            field: field.into(),
        })
    }

    #[must_use]
    pub fn field_with_path(
        object: NodeRef,
        path: Vec<String>,
        field: impl Into<String>,
    ) -> NodeRef {
        Rc::new(Self::Field {
            object,
            path,
            field: field.into(),
        })
    }

    #[must_use]
    pub fn root_entity_id(object: NodeRef) -> NodeRef {
        Rc::new(Self::RootEntityId { object })
    }

    #[must_use]
    pub fn entity_from_id(entity_type: impl Into<String>, id: NodeRef) -> NodeRef {
        Rc::new(Self::EntityFromId {
            entity_type: entity_type.into(),
            id,
        })
    }

    #[must_use]
    pub fn entities(entity_type: impl Into<String>) -> NodeRef {
        Rc::new(Self::Entities {
            entity_type: entity_type.into(),
        })
    }

    #[must_use]
    pub fn follow_edge(side: RelationSide, source: NodeRef) -> NodeRef {
        Rc::new(Self::FollowEdge { side, source })
    }

    #[must_use]
    pub fn count(list: NodeRef) -> NodeRef {
        Rc::new(Self::Count { list })
    }

    #[must_use]
    pub fn binary_op(op: BinaryOperator, lhs: NodeRef, rhs: NodeRef) -> NodeRef {
        Rc::new(Self::BinaryOp { op, lhs, rhs })
    }

    #[must_use]
    pub fn and(lhs: NodeRef, rhs: NodeRef) -> NodeRef {
        Self::binary_op(BinaryOperator::And, lhs, rhs)
    }

    #[must_use]
    pub fn or(lhs: NodeRef, rhs: NodeRef) -> NodeRef {
        Self::binary_op(BinaryOperator::Or, lhs, rhs)
    }

    #[must_use]
    pub fn equal(lhs: NodeRef, rhs: NodeRef) -> NodeRef {
        Self::binary_op(BinaryOperator::Equal, lhs, rhs)
    }

    #[must_use]
    pub fn not(value: NodeRef) -> NodeRef {
        Rc::new(Self::UnaryOp {
            op: UnaryOperator::Not,
            value,
        })
    }

    #[must_use]
    pub fn unary_op(op: UnaryOperator, value: NodeRef) -> NodeRef {
        Rc::new(Self::UnaryOp { op, value })
    }

    #[must_use]
    pub fn conditional(condition: NodeRef, then_value: NodeRef, else_value: NodeRef) -> NodeRef {
        Rc::new(Self::Conditional {
            condition,
            then_value,
            else_value,
        })
    }

    #[must_use]
    pub fn type_check(value: NodeRef, basic_type: BasicType) -> NodeRef {
        Rc::new(Self::TypeCheck { value, basic_type })
    }

    #[must_use]
    pub fn operator_with_language(
        op: LanguageOperator,
        lhs: NodeRef,
        rhs: NodeRef,
        language: Option<AnalyzerLanguage>,
    ) -> NodeRef {
        Rc::new(Self::OperatorWithLanguage {
            op,
            lhs,
            rhs,
            language,
        })
    }

    #[must_use]
    pub fn quantifier_filter(
        quantifier: Quantifier,
        list: NodeRef,
        item_variable: Variable,
        condition: NodeRef,
    ) -> NodeRef {
        Rc::new(Self::QuantifierFilter {
            quantifier,
            list,
            item_variable,
            condition,
        })
    }

    #[must_use]
    pub fn quick_search(
        entity_type: impl Into<String>,
        item_variable: Variable,
        filter: NodeRef,
    ) -> NodeRef {
        Rc::new(Self::QuickSearch {
            entity_type: entity_type.into(),
            item_variable,
            filter,
        })
    }

    #[must_use]
    pub fn create_entity(entity_type: impl Into<String>, object: NodeRef) -> NodeRef {
        Rc::new(Self::CreateEntity {
            entity_type: entity_type.into(),
            object,
        })
    }

    #[must_use]
    pub fn update_entities(
        entity_type: impl Into<String>,
        list: NodeRef,
        current_variable: Variable,
        updates: Vec<PropertySpec>,
    ) -> NodeRef {
        Rc::new(Self::UpdateEntities {
            entity_type: entity_type.into(),
            list,
            current_variable,
            updates,
        })
    }

    #[must_use]
    pub fn delete_entities(entity_type: impl Into<String>, list: NodeRef) -> NodeRef {
        Rc::new(Self::DeleteEntities {
            entity_type: entity_type.into(),
            list,
        })
    }

    #[must_use]
    pub fn add_edges(relation: Arc<arql_model::RelationModel>, edges: Vec<EdgeSpec>) -> NodeRef {
        Rc::new(Self::AddEdges { relation, edges })
    }

    #[must_use]
    pub fn remove_edges(relation: Arc<arql_model::RelationModel>, filter: EdgeFilter) -> NodeRef {
        Rc::new(Self::RemoveEdges { relation, filter })
    }

    #[must_use]
    pub fn set_edge(
        relation: Arc<arql_model::RelationModel>,
        existing: PartialEdgeSpec,
        new: EdgeSpec,
    ) -> NodeRef {
        Rc::new(Self::SetEdge {
            relation,
            existing,
            new,
        })
    }

    /// True for statement nodes: mutations that may only form the root
    /// of a query, never a sub-expression.
    #[must_use]
    pub const fn is_statement(&self) -> bool {
        matches!(
            self,
            Self::CreateEntity { .. }
                | Self::UpdateEntities { .. }
                | Self::DeleteEntities { .. }
                | Self::AddEdges { .. }
                | Self::RemoveEdges { .. }
                | Self::SetEdge { .. }
        )
    }
}

///
/// TransformListBuilder
///
/// The transformation node has enough knobs that a builder keeps call
/// sites readable. `skip` defaults to 0, `max_count` to unbounded.
///

#[derive(Clone, Debug)]
pub struct TransformListBuilder {
    list: NodeRef,
    item_variable: Variable,
    filter: Option<NodeRef>,
    order_by: Vec<OrderClause>,
    skip: u64,
    max_count: Option<u64>,
}

impl TransformListBuilder {
    #[must_use]
    pub const fn new(list: NodeRef, item_variable: Variable) -> Self {
        Self {
            list,
            item_variable,
            filter: None,
            order_by: Vec::new(),
            skip: 0,
            max_count: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: NodeRef) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, order_by: Vec<OrderClause>) -> Self {
        self.order_by = order_by;
        self
    }

    #[must_use]
    pub const fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub const fn max_count(mut self, max_count: u64) -> Self {
        self.max_count = Some(max_count);
        self
    }

    #[must_use]
    pub fn inner(self, inner: NodeRef) -> NodeRef {
        Rc::new(QueryNode::TransformList {
            list: self.list,
            item_variable: self.item_variable,
            filter: self.filter,
            order_by: self.order_by,
            skip: self.skip,
            max_count: self.max_count,
            inner,
        })
    }

    /// Finish with the identity projection (`RETURN item`).
    #[must_use]
    pub fn identity(self) -> NodeRef {
        let item = QueryNode::variable(self.item_variable.clone());
        self.inner(item)
    }
}
