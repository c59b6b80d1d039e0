//! The seam between the core and a page
//!
//! [`Dom`] covers reading and writing the element tree, [`EventLoop`] covers
//! timers and the mutation subscription. The browser host and the
//! in-memory host both implement the pair; callbacks come back into the
//! core as [`Wakeup`] values.

use crate::core::{ElementContext, StyleProperty};
use crate::error::DomError;
use std::fmt;

/// Host-assigned timer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u32);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One structural change reported by the mutation subscription
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<N> {
    /// An element (with its subtree) was inserted
    Added(N),
    /// `style` or `class` changed on an existing element
    Attribute(N),
}

/// A callback delivered by the host's event loop
#[derive(Debug, Clone, PartialEq)]
pub enum Wakeup<N> {
    Timer(TimerId),
    Mutations(Vec<Mutation<N>>),
    DomReady,
}

pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug;

    /// Every element in document order
    fn all_elements(&self) -> Vec<Self::Node>;

    /// Descendant elements of `root`, excluding `root`
    fn descendants(&self, root: &Self::Node) -> Vec<Self::Node>;

    fn child_element_count(&self, node: &Self::Node) -> usize;

    /// Resolved style and structural position of `node`
    fn inspect(&self, node: &Self::Node) -> Result<ElementContext, DomError>;

    /// Current inline value of `property`, if set
    fn inline_style(&self, node: &Self::Node, property: StyleProperty) -> Option<String>;

    /// Set `property: value !important` inline
    fn set_inline_important(&mut self, node: &Self::Node, property: StyleProperty, value: &str);

    fn remove_inline(&mut self, node: &Self::Node, property: StyleProperty);

    /// Elements carrying a `style` attribute
    fn styled_elements(&self) -> Vec<Self::Node>;

    fn has_stylesheet(&self, id: &str) -> bool;
    fn insert_stylesheet(&mut self, id: &str, css: &str);
    fn remove_stylesheet(&mut self, id: &str);

    /// Current page URL
    fn location(&self) -> String;

    /// Document still parsing
    fn is_loading(&self) -> bool;

    /// Deliver [`Wakeup::DomReady`] once parsing finishes
    fn request_dom_ready(&mut self);
}

pub trait EventLoop {
    fn set_timeout(&mut self, delay_ms: u32) -> TimerId;
    fn set_interval(&mut self, period_ms: u32) -> TimerId;
    /// Cancel a pending timeout or interval; unknown ids are ignored
    fn clear_timer(&mut self, id: TimerId);

    /// Start reporting child insertions anywhere in the document and
    /// `style`/`class` attribute changes
    fn observe_mutations(&mut self);
    fn disconnect_mutations(&mut self);
}

/// Everything the scanner needs from a page
pub trait Host: Dom + EventLoop {}

impl<T: Dom + EventLoop> Host for T {}
