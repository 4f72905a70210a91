//! Layer Stack
//!
//! Static model of the engine's mesh-layer stack. The engine identifies
//! layers by position only, and deleting a layer shifts every layer above
//! it down by one, so later filters that say "layer N" or "the current
//! layer" are only correct if these shifts are predicted exactly.

use log::debug;
use serde::{Deserialize, Serialize};

use super::LayerEffect;
use crate::error::{MeshScriptError, Result};

/// Ordered layer labels plus the index of the current layer
///
/// Invariant: `current` is `Some(i)` with `i < entries.len()` whenever the
/// stack is non-empty, and `None` when it is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStack {
    /// Layer labels in stack order
    entries: Vec<String>,
    /// Index of the current layer
    current: Option<usize>,
    /// Layer that was current before the last effect that moved `current`
    /// to a new layer. Deleting the current layer returns here.
    #[serde(skip)]
    previous: Option<usize>,
}

impl LayerStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the stack with one entry per input, current = last
    ///
    /// # Errors
    /// `AlreadySeeded` if the stack already holds layers.
    pub fn seed<I, S>(&mut self, labels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.entries.is_empty() {
            return Err(MeshScriptError::AlreadySeeded {
                len: self.entries.len(),
            });
        }

        self.entries = labels.into_iter().map(Into::into).collect();
        self.current = self.entries.len().checked_sub(1);
        self.previous = None;
        debug!("Seeded layer stack with {} layers", self.entries.len());
        Ok(())
    }

    /// Apply one filter's layer effect
    ///
    /// A failed apply leaves the stack untouched.
    pub fn apply(&mut self, effect: &LayerEffect) -> Result<()> {
        match effect {
            LayerEffect::None => {}
            LayerEffect::AddLayer(label) => {
                self.previous = self.current;
                self.entries.push(label.clone());
                self.current = Some(self.entries.len() - 1);
            }
            LayerEffect::AddLayers(labels) => {
                if labels.is_empty() {
                    return Ok(());
                }
                self.previous = self.current;
                self.entries.extend(labels.iter().cloned());
                self.current = Some(self.entries.len() - 1);
            }
            LayerEffect::AppendLayer(label) => self.append(std::slice::from_ref(label)),
            LayerEffect::AppendLayers(labels) => self.append(labels),
            LayerEffect::DeleteLayer(index) => self.delete(*index)?,
            LayerEffect::ChangeCurrent(index) => {
                self.check_index(*index)?;
                self.previous = self.current;
                self.current = Some(*index);
            }
            LayerEffect::RenameCurrent(label) => {
                let current = self.current.ok_or(MeshScriptError::EmptyLayerStack)?;
                self.entries[current] = label.clone();
            }
            LayerEffect::Collapse(label) => {
                self.entries = vec![label.clone()];
                self.current = Some(0);
                self.previous = None;
            }
        }

        debug!(
            "Applied layer effect {}: {} layers, current {:?}",
            effect,
            self.entries.len(),
            self.current
        );
        Ok(())
    }

    fn append(&mut self, labels: &[String]) {
        if labels.is_empty() {
            return;
        }
        let first = self.entries.len();
        self.entries.extend(labels.iter().cloned());
        if self.current.is_none() {
            self.current = Some(first);
        }
    }

    fn delete(&mut self, index: Option<usize>) -> Result<()> {
        let target = match index {
            Some(index) => index,
            None => self.current.ok_or(MeshScriptError::EmptyLayerStack)?,
        };
        self.check_index(target)?;

        self.entries.remove(target);

        self.previous = match self.previous {
            Some(p) if p == target => None,
            Some(p) if p > target => Some(p - 1),
            other => other,
        };

        if self.entries.is_empty() {
            self.current = None;
            self.previous = None;
            return Ok(());
        }

        let last = self.entries.len() - 1;
        self.current = match self.current {
            Some(c) if target < c => Some(c - 1),
            Some(c) if target == c => {
                let fallback = target.saturating_sub(1);
                Some(self.previous.take().unwrap_or(fallback).min(last))
            }
            Some(c) => Some(c),
            None => Some(last),
        };
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(MeshScriptError::LayerIndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    /// Label of the current layer
    pub fn current_label(&self) -> Result<&str> {
        self.current
            .map(|i| self.entries[i].as_str())
            .ok_or(MeshScriptError::EmptyLayerStack)
    }

    /// Index of the current layer, `None` when empty
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Index of the last layer; `-1` when empty
    pub fn last_index(&self) -> isize {
        self.entries.len() as isize - 1
    }

    /// Label at a given index
    pub fn label(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Index of the first layer with this label
    pub fn position(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|l| l == label)
    }

    /// All labels in stack order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
