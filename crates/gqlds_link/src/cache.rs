//! Normalized response cache.
//!
//! Results are written field by field, walking the operation's selection set.
//! Every field is stored under its name plus its resolved arguments, so
//! `posts(first: 1)` and `posts(first: 10)` never share a slot. Objects
//! carrying `__typename` and `id` (or `_id`) are stored once in an entity
//! table keyed `Type:id` and referenced from wherever they appear; a mutation
//! returning an entity updates it in place, so later cached reads of any query
//! referencing it see the new fields.
//!
//! Queries are served cache-first: a read succeeds only when every field the
//! query selects is present. Mutations always reach the network. Responses
//! carrying GraphQL errors are never written.
//!
//! A cache hit carries `data` only. Top-level `extensions` describe a single
//! upstream execution and are not replayed.

use async_trait::async_trait;
use gqlds_core::{JsonMap, OperationKind, OperationRequest, Response};
use graphql_parser::query::{
    Definition, Directive, Field, FragmentDefinition, OperationDefinition, Selection,
    SelectionSet, TypeCondition, Value as InputValue, VariableDefinition,
};
use reqwest::Url;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::chain::LinkResult;
use crate::transport::Transport;

const REF: &str = "__ref";
const OBJECT: &str = "__object";

type Selections = SelectionSet<'static, String>;

/// Entity and root-field storage.
#[derive(Debug, Default)]
pub struct NormalizedCache {
    entities: FxHashMap<String, JsonMap>,
    roots: FxHashMap<String, JsonMap>,
}

impl NormalizedCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a stored entity by its `Type:id` key.
    pub fn entity(&self, key: &str) -> Option<&JsonMap> {
        self.entities.get(key)
    }

    /// Returns the number of stored entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns the root query fields stored for an upstream URL.
    pub fn root(&self, url: &str) -> Option<&JsonMap> {
        self.roots.get(url)
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.roots.clear();
    }

    fn write(&mut self, url: &Url, kind: OperationKind, shape: &Shape<'_>, data: &Value) {
        if !data.is_object() {
            return;
        }
        let root = self.normalize(data, &[shape.root], shape);
        if let (OperationKind::Query, Value::Object(fields)) = (kind, root) {
            merge(self.roots.entry(url.to_string()).or_default(), fields);
        }
    }

    fn read_query(&self, url: &Url, shape: &Shape<'_>) -> Option<Value> {
        let root = self.roots.get(url.as_str())?;
        self.read_fields(root, &[shape.root], shape)
            .map(Value::Object)
    }

    fn normalize<'a>(&mut self, value: &Value, sets: &[&'a Selections], shape: &Shape<'a>) -> Value {
        if sets.is_empty() {
            return value.clone();
        }
        match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.normalize(item, sets, shape))
                    .collect(),
            ),
            Value::Object(object) => {
                let mut fields = JsonMap::new();
                for plan in shape.fields(sets) {
                    if let Some(value) = object.get(plan.response_key) {
                        let stored = self.normalize(value, &plan.selections, shape);
                        fields.insert(plan.store_key, stored);
                    }
                }

                match entity_key(object) {
                    Some(key) => {
                        merge(self.entities.entry(key.clone()).or_default(), fields);
                        let mut reference = JsonMap::new();
                        reference.insert(REF.into(), Value::String(key));
                        Value::Object(reference)
                    }
                    None => {
                        fields.insert(OBJECT.into(), Value::Bool(true));
                        Value::Object(fields)
                    }
                }
            }
            scalar => scalar.clone(),
        }
    }

    fn read<'a>(&self, value: &Value, sets: &[&'a Selections], shape: &Shape<'a>) -> Option<Value> {
        if sets.is_empty() {
            return Some(value.clone());
        }
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| self.read(item, sets, shape))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            Value::Object(stored) => {
                let object = match stored.get(REF) {
                    Some(Value::String(key)) => self.entities.get(key)?,
                    _ => stored,
                };
                self.read_fields(object, sets, shape).map(Value::Object)
            }
            scalar => Some(scalar.clone()),
        }
    }

    fn read_fields<'a>(
        &self,
        object: &JsonMap,
        sets: &[&'a Selections],
        shape: &Shape<'a>,
    ) -> Option<JsonMap> {
        let typename = object.get("__typename").and_then(Value::as_str);
        let mut out = JsonMap::new();
        for plan in shape.fields(sets) {
            match object.get(&plan.store_key) {
                Some(stored) => {
                    let value = self.read(stored, &plan.selections, shape)?;
                    out.insert(plan.response_key.to_string(), value);
                }
                None if plan.required(typename) => return None,
                None => {}
            }
        }
        Some(out)
    }
}

fn entity_key(object: &JsonMap) -> Option<String> {
    let typename = object.get("__typename")?.as_str()?;
    let id = object.get("id").or_else(|| object.get("_id"))?;
    match id {
        Value::String(id) => Some(format!("{typename}:{id}")),
        Value::Number(id) => Some(format!("{typename}:{id}")),
        _ => None,
    }
}

/// Merges freshly written fields into stored ones.
///
/// Nested plain objects merge field by field; everything else is replaced.
fn merge(into: &mut JsonMap, incoming: JsonMap) {
    for (key, value) in incoming {
        let value = match (into.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(fields))
                if existing.contains_key(OBJECT) && fields.contains_key(OBJECT) =>
            {
                merge(existing, fields);
                continue;
            }
            (_, value) => value,
        };
        into.insert(key, value);
    }
}

/// One response key of a selection set, flattened across fragments.
struct FieldPlan<'a> {
    response_key: &'a str,
    store_key: String,
    unconditional: bool,
    conditions: Vec<&'a str>,
    selections: Vec<&'a Selections>,
}

impl FieldPlan<'_> {
    /// A field selected only under type conditions is optional when the
    /// object's `__typename` is known and matches none of them.
    fn required(&self, typename: Option<&str>) -> bool {
        self.unconditional
            || typename.map_or(true, |typename| {
                self.conditions.iter().any(|condition| *condition == typename)
            })
    }
}

/// The selections of one operation, resolved against its variables.
struct Shape<'a> {
    root: &'a Selections,
    fragments: FxHashMap<&'a str, &'a FragmentDefinition<'static, String>>,
    variables: JsonMap,
}

impl<'a> Shape<'a> {
    fn of(request: &'a OperationRequest) -> Option<Self> {
        let mut fragments = FxHashMap::default();
        let mut operations = Vec::new();
        for definition in &request.query.ast().definitions {
            match definition {
                Definition::Operation(operation) => operations.push(operation),
                Definition::Fragment(fragment) => {
                    fragments.insert(fragment.name.as_str(), fragment);
                }
            }
        }

        let wanted = request.operation_name.as_deref();
        let operation = operations
            .iter()
            .copied()
            .find(|operation| wanted.is_some() && operation_name(operation) == wanted)
            .or_else(|| operations.first().copied())?;

        let (root, definitions): (&'a Selections, &'a [VariableDefinition<'static, String>]) =
            match operation {
                OperationDefinition::SelectionSet(set) => (set, [].as_slice()),
                OperationDefinition::Query(query) => {
                    (&query.selection_set, query.variable_definitions.as_slice())
                }
                OperationDefinition::Mutation(mutation) => {
                    (&mutation.selection_set, mutation.variable_definitions.as_slice())
                }
                OperationDefinition::Subscription(subscription) => (
                    &subscription.selection_set,
                    subscription.variable_definitions.as_slice(),
                ),
            };

        let mut variables = request.variables.clone();
        for definition in definitions {
            if let (false, Some(default)) = (
                variables.contains_key(&definition.name),
                &definition.default_value,
            ) {
                let value = input_value(default, &JsonMap::new());
                variables.insert(definition.name.clone(), value);
            }
        }

        Some(Self {
            root,
            fragments,
            variables,
        })
    }

    fn fields(&self, sets: &[&'a Selections]) -> Vec<FieldPlan<'a>> {
        let mut plans = Vec::new();
        let mut visited = Vec::new();
        for &set in sets {
            self.collect(set, None, &mut visited, &mut plans);
        }
        plans
    }

    fn collect(
        &self,
        set: &'a Selections,
        condition: Option<&'a str>,
        visited: &mut Vec<&'a str>,
        plans: &mut Vec<FieldPlan<'a>>,
    ) {
        for selection in &set.items {
            match selection {
                Selection::Field(field) => {
                    if !self.included(&field.directives) {
                        continue;
                    }
                    let response_key = field.alias.as_deref().unwrap_or(&field.name);
                    let index = match plans.iter().position(|p| p.response_key == response_key) {
                        Some(index) => index,
                        None => {
                            plans.push(FieldPlan {
                                response_key,
                                store_key: self.store_key(field),
                                unconditional: false,
                                conditions: Vec::new(),
                                selections: Vec::new(),
                            });
                            plans.len() - 1
                        }
                    };

                    let plan = &mut plans[index];
                    match condition {
                        Some(condition) => plan.conditions.push(condition),
                        None => plan.unconditional = true,
                    }
                    if !field.selection_set.items.is_empty() {
                        plan.selections.push(&field.selection_set);
                    }
                }
                Selection::InlineFragment(fragment) => {
                    if !self.included(&fragment.directives) {
                        continue;
                    }
                    let condition = match &fragment.type_condition {
                        Some(TypeCondition::On(on)) => Some(on.as_str()),
                        None => condition,
                    };
                    self.collect(&fragment.selection_set, condition, visited, plans);
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.fragment_name.as_str();
                    if !self.included(&spread.directives) || visited.contains(&name) {
                        continue;
                    }
                    if let Some(&fragment) = self.fragments.get(name) {
                        let TypeCondition::On(on) = &fragment.type_condition;
                        visited.push(name);
                        self.collect(&fragment.selection_set, Some(on.as_str()), visited, plans);
                        visited.pop();
                    }
                }
            }
        }
    }

    /// Applies `@skip(if:)` and `@include(if:)`.
    fn included(&self, directives: &[Directive<'static, String>]) -> bool {
        directives.iter().all(|directive| {
            let flag = directive
                .arguments
                .iter()
                .find(|(name, _)| name == "if")
                .map(|(_, value)| input_value(value, &self.variables));
            !matches!(
                (directive.name.as_str(), flag),
                ("skip", Some(Value::Bool(true))) | ("include", Some(Value::Bool(false)))
            )
        })
    }

    fn store_key(&self, field: &Field<'static, String>) -> String {
        if field.arguments.is_empty() {
            return field.name.clone();
        }
        let arguments: JsonMap = field
            .arguments
            .iter()
            .map(|(name, value)| (name.clone(), input_value(value, &self.variables)))
            .collect();
        format!("{}({})", field.name, Value::Object(arguments))
    }
}

fn operation_name<'a>(operation: &'a OperationDefinition<'static, String>) -> Option<&'a str> {
    match operation {
        OperationDefinition::Query(query) => query.name.as_deref(),
        OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
        OperationDefinition::SelectionSet(_) => None,
    }
}

fn input_value(value: &InputValue<'static, String>, variables: &JsonMap) -> Value {
    match value {
        InputValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
        InputValue::Int(number) => number.as_i64().map_or(Value::Null, Value::from),
        InputValue::Float(float) => {
            serde_json::Number::from_f64(*float).map_or(Value::Null, Value::Number)
        }
        InputValue::String(string) => Value::String(string.clone()),
        InputValue::Boolean(boolean) => Value::Bool(*boolean),
        InputValue::Null => Value::Null,
        InputValue::Enum(name) => Value::String(name.clone()),
        InputValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| input_value(item, variables))
                .collect(),
        ),
        InputValue::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), input_value(value, variables)))
                .collect(),
        ),
    }
}

/// Transport serving queries from a [`NormalizedCache`] before the network.
pub struct CachingTransport {
    inner: Arc<dyn Transport>,
    cache: Arc<RwLock<NormalizedCache>>,
}

impl CachingTransport {
    /// Wraps `inner` with an empty cache.
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(NormalizedCache::new())),
        }
    }

    /// Returns the shared cache.
    pub fn cache(&self) -> Arc<RwLock<NormalizedCache>> {
        self.cache.clone()
    }
}

#[async_trait]
impl Transport for CachingTransport {
    async fn send(&self, url: &Url, request: &OperationRequest) -> LinkResult {
        let Some(shape) = Shape::of(request) else {
            return self.inner.send(url, request).await;
        };

        if request.kind == OperationKind::Query {
            if let Some(data) = self.cache.read().await.read_query(url, &shape) {
                debug!(operation = request.operation_name.as_deref(), "Cache hit");
                return Ok(Response::from_data(data));
            }
        }

        let response = self.inner.send(url, request).await?;
        if let (false, Some(data)) = (response.has_errors(), &response.data) {
            self.cache
                .write()
                .await
                .write(url, request.kind, &shape, data);
        }
        Ok(response)
    }
}
