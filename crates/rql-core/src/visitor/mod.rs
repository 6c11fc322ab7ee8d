//! Query traversal.
//!
//! [`Visit`] walks a [`Query`](crate::ast::Query) by shared reference and
//! [`VisitMut`] by mutable reference. Each trait has one method per clause
//! and node kind. The default methods call the free function of the same
//! name in [`visit`] or [`visit_mut`], which recurses into the children, so
//! an override can run its own logic and then delegate to keep walking.
//!
//! A WHERE filter reaches [`Visit::visit_where_clause`] only when its root
//! is a binary expression. Comparisons are dispatched to
//! [`Visit::visit_simple_where_expression`] and connectives to
//! [`Visit::visit_compound_where_expression`].

pub mod visit;
pub mod visit_mut;

pub use visit::Visit;
pub use visit_mut::VisitMut;
