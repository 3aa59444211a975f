use std::ops::ControlFlow;

use serde_json::Value;

use crate::resource::Object;

/// A recursive-descent walk over an untyped document.
///
/// Every `visit_*` method defaults to the matching `walk_*` method, so an implementor only
/// overrides the nodes it cares about and calls back into `walk_*` to keep descending.
pub trait Visitor<'a> {
    type Break;

    fn visit_value(&mut self, node: &'a Value) -> ControlFlow<Self::Break> {
        self.walk_value(node)
    }

    fn visit_object(&mut self, object: &'a Object) -> ControlFlow<Self::Break> {
        self.walk_object(object)
    }

    fn visit_array(&mut self, array: &'a [Value]) -> ControlFlow<Self::Break> {
        self.walk_array(array)
    }

    fn walk_object(&mut self, object: &'a Object) -> ControlFlow<Self::Break> {
        for value in object.values() {
            self.visit_value(value)?;
        }

        ControlFlow::Continue(())
    }

    fn walk_array(&mut self, array: &'a [Value]) -> ControlFlow<Self::Break> {
        for item in array {
            self.visit_value(item)?;
        }

        ControlFlow::Continue(())
    }

    fn walk_value(&mut self, node: &'a Value) -> ControlFlow<Self::Break> {
        match node {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                ControlFlow::Continue(())
            }
            Value::Array(array) => self.visit_array(array),
            Value::Object(object) => self.visit_object(object),
        }
    }
}

pub trait Visit {
    fn visit_with<'a, V: Visitor<'a>>(&'a self, visitor: &mut V) -> ControlFlow<V::Break>;
}

impl Visit for Value {
    fn visit_with<'a, V: Visitor<'a>>(&'a self, visitor: &mut V) -> ControlFlow<V::Break> {
        visitor.visit_value(self)
    }
}

impl Visit for Object {
    fn visit_with<'a, V: Visitor<'a>>(&'a self, visitor: &mut V) -> ControlFlow<V::Break> {
        visitor.visit_object(self)
    }
}
