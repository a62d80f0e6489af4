use std::ops::Range;

/// A schema-definition expression, as a read-only view over source text.
///
/// `span` is a byte range into the text of the unit the expression was parsed
/// from. Flattening never mutates an `Expr`; it renders new text from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    /// Byte range of the whole expression in its owning source text
    pub span: Range<usize>,
    /// Shape of the expression
    pub kind: ExprKind,
}

/// Shape tag of an [`Expr`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// A bare name, e.g. `userSchema`
    Identifier(String),
    /// `{ key: value, ... }` in source order
    Object(Vec<Property>),
    /// `[a, b, ...]` in source order
    Array(Vec<Expr>),
    /// `callee(arg, ...)`
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    /// `base.property`
    PropertyAccess { base: Box<Expr>, property: String },
    /// Anything else; always rendered verbatim
    Opaque,
}

/// One member of an object literal.
///
/// `value` is `None` for members that carry no separately rewritable
/// initializer (shorthand properties, spreads, methods).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: Option<Expr>,
}

impl Expr {
    pub fn new(span: Range<usize>, kind: ExprKind) -> Self {
        Expr { span, kind }
    }

    pub fn opaque(span: Range<usize>) -> Self {
        Expr::new(span, ExprKind::Opaque)
    }

    /// Name of the identifier, if this is one.
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Direct sub-expressions that are rewritten in place, in source order.
    pub(crate) fn rewritable_children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Object(properties) => {
                properties.iter().filter_map(|p| p.value.as_ref()).collect()
            }
            ExprKind::Array(elements) => elements.iter().collect(),
            ExprKind::Call { callee, arguments } => {
                let mut children = Vec::with_capacity(arguments.len() + 1);
                if matches!(callee.kind, ExprKind::PropertyAccess { .. }) {
                    children.push(callee.as_ref());
                }
                children.extend(arguments.iter());
                children
            }
            ExprKind::PropertyAccess { base, .. } => vec![base.as_ref()],
            ExprKind::Identifier(_) | ExprKind::Opaque => Vec::new(),
        }
    }

    /// Shift every span by `offset` bytes towards the start of the text.
    pub(crate) fn rebase(&mut self, offset: usize) {
        self.span = (self.span.start - offset)..(self.span.end - offset);
        match &mut self.kind {
            ExprKind::Object(properties) => {
                for value in properties.iter_mut().filter_map(|p| p.value.as_mut()) {
                    value.rebase(offset);
                }
            }
            ExprKind::Array(elements) => {
                for element in elements {
                    element.rebase(offset);
                }
            }
            ExprKind::Call { callee, arguments } => {
                callee.rebase(offset);
                for argument in arguments {
                    argument.rebase(offset);
                }
            }
            ExprKind::PropertyAccess { base, .. } => base.rebase(offset),
            ExprKind::Identifier(_) | ExprKind::Opaque => {}
        }
    }
}
