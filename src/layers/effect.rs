//! Layer effects declared by filters
//!
//! Every filter record carries the change it makes to the engine's layer
//! stack. The effect is declared when the record is emitted, never observed.

use serde::{Deserialize, Serialize};

/// Predicted change to the layer stack caused by one filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LayerEffect {
    /// Geometry edited in place; the stack is unchanged
    None,
    /// Append one layer and make it current
    AddLayer(String),
    /// Append several layers in order; the last one becomes current
    AddLayers(Vec<String>),
    /// Append one layer, keeping the current layer where it was
    AppendLayer(String),
    /// Append several layers in order, keeping the current layer
    AppendLayers(Vec<String>),
    /// Remove the layer at the index, or the current layer when `None`
    DeleteLayer(Option<usize>),
    /// Make the layer at the index current
    ChangeCurrent(usize),
    /// Replace the label of the current layer
    RenameCurrent(String),
    /// Replace every layer with a single one and make it current
    Collapse(String),
}

impl LayerEffect {
    /// Whether applying this effect changes the stack at all
    pub fn is_none(&self) -> bool {
        matches!(self, LayerEffect::None)
    }

    /// Number of layers the effect appends
    pub fn added_layers(&self) -> usize {
        match self {
            LayerEffect::AddLayer(_) | LayerEffect::AppendLayer(_) => 1,
            LayerEffect::AddLayers(labels) | LayerEffect::AppendLayers(labels) => labels.len(),
            _ => 0,
        }
    }
}

impl Default for LayerEffect {
    fn default() -> Self {
        LayerEffect::None
    }
}

impl std::fmt::Display for LayerEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerEffect::None => write!(f, "none"),
            LayerEffect::AddLayer(label) => write!(f, "add '{}'", label),
            LayerEffect::AddLayers(labels) => write!(f, "add {:?}", labels),
            LayerEffect::AppendLayer(label) => write!(f, "append '{}'", label),
            LayerEffect::AppendLayers(labels) => write!(f, "append {:?}", labels),
            LayerEffect::DeleteLayer(Some(index)) => write!(f, "delete #{}", index),
            LayerEffect::DeleteLayer(None) => write!(f, "delete current"),
            LayerEffect::ChangeCurrent(index) => write!(f, "change to #{}", index),
            LayerEffect::RenameCurrent(label) => write!(f, "rename current to '{}'", label),
            LayerEffect::Collapse(label) => write!(f, "collapse into '{}'", label),
        }
    }
}
