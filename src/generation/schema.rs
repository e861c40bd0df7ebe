//! Library-agnostic schema tree
//!
//! Every builder in the compiler works on this representation. Nodes are
//! shared handles (`SchemaRef`) because schemas derived from recursive
//! definitions may point back at an ancestor. Any operation that walks the
//! tree must therefore track the nodes it has already seen, and any subtree
//! lifted into another output tree must go through [`deep_copy`].
//!
//! Cycles keep their nodes alive after the last outside handle is dropped.
//! A tree that may be cyclic is torn down with [`release_tree`] once nobody
//! reads it any more.

use serde_json::{Map, Value as JsonValue};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Shared, mutable handle to a schema node
pub type SchemaRef = Rc<RefCell<Schema>>;

/// Identity of a node, used to detect revisits in cyclic trees
pub(crate) type NodeId = *const RefCell<Schema>;

pub(crate) fn node_id(schema: &SchemaRef) -> NodeId {
    Rc::as_ptr(schema)
}

/// A JSON-Schema-like node
///
/// `Clone` is shallow: the clone shares its children with the original.
#[derive(Default, Clone)]
pub struct Schema {
    /// Primitive type names; more than one for OpenAPI 3.1 type arrays
    pub types: Vec<String>,
    pub description: Option<String>,
    /// Named children in insertion order
    pub properties: Vec<Property>,
    pub items: Option<SchemaRef>,
    pub all_of: Vec<SchemaRef>,
    pub required: Vec<String>,
    pub enum_values: Vec<JsonValue>,
    pub default: Option<JsonValue>,
    pub format: Option<String>,
    /// Vendor extensions (`x-*` keys)
    pub extensions: Map<String, JsonValue>,
}

/// A named child of an object schema
///
/// Cloning a `Property` shares its schema; use [`deep_copy_property`] to
/// detach it.
#[derive(Clone)]
pub struct Property {
    pub name: String,
    pub schema: SchemaRef,
}

impl Property {
    pub fn new(name: impl Into<String>, schema: SchemaRef) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

impl Schema {
    /// Schema with a single primitive type
    pub fn typed(type_name: &str) -> Self {
        Self {
            types: vec![type_name.to_string()],
            ..Default::default()
        }
    }

    pub fn object() -> Self {
        Self::typed("object")
    }

    pub fn string() -> Self {
        Self::typed("string")
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn into_ref(self) -> SchemaRef {
        Rc::new(RefCell::new(self))
    }

    /// First type that is not `"null"`
    pub fn primary_type(&self) -> Option<&str> {
        self.types
            .iter()
            .map(String::as_str)
            .find(|t| *t != "null")
    }

    pub fn is_object(&self) -> bool {
        self.primary_type() == Some("object")
    }

    pub fn is_array(&self) -> bool {
        self.primary_type() == Some("array")
    }

    pub fn property(&self, name: &str) -> Option<SchemaRef> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| Rc::clone(&p.schema))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    pub fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.name.clone()).collect()
    }

    /// Set a property, replacing an existing one in place or appending.
    /// Returns the replaced schema, if any.
    pub fn set_property(&mut self, name: &str, schema: SchemaRef) -> Option<SchemaRef> {
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.schema, schema)),
            None => {
                self.properties.push(Property::new(name, schema));
                None
            }
        }
    }

    /// Append a property unless one with the same name exists.
    /// Returns whether the property was added.
    pub fn add_property(&mut self, name: &str, schema: SchemaRef) -> bool {
        if self.has_property(name) {
            return false;
        }
        self.properties.push(Property::new(name, schema));
        true
    }

    /// Remove a property and drop it from the required list
    pub fn remove_property(&mut self, name: &str) -> Option<SchemaRef> {
        let index = self.properties.iter().position(|p| p.name == name)?;
        let removed = self.properties.remove(index);
        self.required.retain(|r| r != name);
        Some(removed.schema)
    }

    /// Give a property its own node before it is modified in place.
    ///
    /// Reused definitions share one node between several parents; the
    /// detached node is a shallow copy, so its siblings elsewhere keep the
    /// original.
    pub fn detach_property(&mut self, name: &str) -> Option<SchemaRef> {
        let property = self.properties.iter_mut().find(|p| p.name == name)?;
        let detached = property.schema.borrow().clone().into_ref();
        property.schema = Rc::clone(&detached);
        Some(detached)
    }

    pub fn mark_required(&mut self, name: &str) {
        if !self.is_required(name) {
            self.required.push(name.to_string());
        }
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Direct children: properties, items and allOf entries
    pub(crate) fn children(&self) -> Vec<SchemaRef> {
        let mut children: Vec<SchemaRef> =
            self.properties.iter().map(|p| Rc::clone(&p.schema)).collect();
        if let Some(items) = &self.items {
            children.push(Rc::clone(items));
        }
        children.extend(self.all_of.iter().cloned());
        children
    }
}

impl fmt::Debug for Schema {
    // Children are summarized so cyclic trees stay printable.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("types", &self.types)
            .field("description", &self.description)
            .field("properties", &self.property_names())
            .field("items", &self.items.is_some())
            .field("all_of", &self.all_of.len())
            .field("required", &self.required)
            .field("format", &self.format)
            .finish()
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("schema", &self.schema.borrow())
            .finish()
    }
}

/// Copy a tree so that no node is shared with the source.
///
/// Nodes reached more than once (including back-edges of a cycle) map to a
/// single copy, so the copy has the same shape as the source and copying
/// always terminates.
pub fn deep_copy(schema: &SchemaRef) -> SchemaRef {
    let mut copies = HashMap::new();
    copy_node(schema, &mut copies)
}

pub fn deep_copy_property(property: &Property) -> Property {
    Property::new(property.name.clone(), deep_copy(&property.schema))
}

fn copy_node(source: &SchemaRef, copies: &mut HashMap<NodeId, SchemaRef>) -> SchemaRef {
    if let Some(existing) = copies.get(&node_id(source)) {
        return Rc::clone(existing);
    }

    let target = Schema::default().into_ref();
    copies.insert(node_id(source), Rc::clone(&target));

    let src = source.borrow();
    let properties = src
        .properties
        .iter()
        .map(|p| Property::new(p.name.clone(), copy_node(&p.schema, copies)))
        .collect();
    let items = src.items.as_ref().map(|items| copy_node(items, copies));
    let all_of = src
        .all_of
        .iter()
        .map(|sub| copy_node(sub, copies))
        .collect();

    *target.borrow_mut() = Schema {
        types: src.types.clone(),
        description: src.description.clone(),
        properties,
        items,
        all_of,
        required: src.required.clone(),
        enum_values: src.enum_values.clone(),
        default: src.default.clone(),
        format: src.format.clone(),
        extensions: src.extensions.clone(),
    };

    target
}

/// Drop the child links of every node reachable from `schema`.
///
/// Afterwards the nodes only hold their own attributes, so cycles no longer
/// keep them alive. Any other holder of a node in the tree sees it emptied.
pub fn release_tree(schema: &SchemaRef) {
    let mut visited = HashSet::new();
    let mut pending = vec![Rc::clone(schema)];

    while let Some(node) = pending.pop() {
        if !visited.insert(node_id(&node)) {
            continue;
        }
        let mut current = node.borrow_mut();
        pending.extend(current.properties.drain(..).map(|p| p.schema));
        pending.extend(current.items.take());
        pending.append(&mut current.all_of);
    }
}

/// Rewrite every `number` type to `integer` throughout the tree
pub fn coerce_number_to_integer(schema: &SchemaRef) {
    let mut visited = HashSet::new();
    let mut pending = vec![Rc::clone(schema)];

    while let Some(node) = pending.pop() {
        if !visited.insert(node_id(&node)) {
            continue;
        }
        let children = {
            let mut current = node.borrow_mut();
            if current.types.iter().any(|t| t == "number") {
                let mut coerced: Vec<String> = Vec::with_capacity(current.types.len());
                for t in current.types.drain(..) {
                    let t = if t == "number" { "integer".to_string() } else { t };
                    if !coerced.contains(&t) {
                        coerced.push(t);
                    }
                }
                current.types = coerced;
            }
            current.children()
        };
        pending.extend(children);
    }
}

/// Merge every `allOf` entry's properties into its owner.
///
/// Sub-schemas are flattened before they are merged, so nested compositions
/// resolve fully. The walk also descends into properties and array items.
/// Merged entries are removed from `all_of`; required names are unioned and
/// an untyped owner adopts the sub-schema's type.
pub fn flatten_all_of(schema: &SchemaRef) {
    let mut visited = HashSet::new();
    flatten_node(schema, &mut visited);
}

fn flatten_node(schema: &SchemaRef, visited: &mut HashSet<NodeId>) {
    if !visited.insert(node_id(schema)) {
        return;
    }

    let (children, all_of) = {
        let current = schema.borrow();
        (current.children(), current.all_of.clone())
    };
    for child in &children {
        flatten_node(child, visited);
    }
    if all_of.is_empty() {
        return;
    }

    for sub in &all_of {
        if Rc::ptr_eq(sub, schema) {
            continue;
        }
        let (properties, required, types, description) = {
            let sub = sub.borrow();
            (
                sub.properties.clone(),
                sub.required.clone(),
                sub.types.clone(),
                sub.description.clone(),
            )
        };

        let mut owner = schema.borrow_mut();
        for property in properties {
            owner.set_property(&property.name, property.schema);
        }
        for name in required {
            owner.mark_required(&name);
        }
        if owner.types.is_empty() {
            owner.types = types;
        }
        if owner.description.is_none() {
            owner.description = description;
        }
    }

    schema.borrow_mut().all_of.clear();
}
