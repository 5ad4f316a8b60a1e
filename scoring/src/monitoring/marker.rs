use std::fmt;

/// A named group of operations, e.g. one service.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Component {
    pub name: &'static str,
}

impl Component {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

/// Static descriptor of one intercepted operation.
///
/// Declared once as a `static` next to the code that implements the
/// operation and handed to the interceptor by reference. Timing markers match
/// on that static, not on the name.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Operation {
    pub component: &'static Component,
    pub name: &'static str,
}

impl Operation {
    pub const fn new(component: &'static Component, name: &'static str) -> Self {
        Self { component, name }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(..)", self.component.name, self.name)
    }
}
