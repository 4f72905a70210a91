//! Filter Emitters
//!
//! Each emitter maps typed parameters to one script fragment plus the layer
//! effect the engine is documented to have, and pushes the pair into a
//! `FilterSink`. Fragments are built with `FilterXml`.

pub mod clean;
pub mod compute;
pub mod create;
pub mod layers;
pub mod normals;
pub mod remesh;
pub mod sampling;
pub mod select;
pub mod smooth;
pub mod subdivide;
pub mod transform;
pub mod vert_color;

use std::fmt;

use crate::error::Result;
use crate::layers::LayerEffect;
use crate::script::{FilterRecord, FilterSink};

/// Escape a value for use inside a double-quoted XML attribute
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Format a float so integral values keep a decimal point (`1.0`, not `1`)
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Typed value of a filter parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum { value: usize, options: Vec<String> },
    /// Layer index
    Mesh(usize),
    Point3f([f64; 3]),
    AbsPerc { value: f64, min: f64, max: f64 },
    DynamicFloat { value: f64, min: f64, max: f64 },
    /// RGBA
    Color([u8; 4]),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "RichBool",
            ParamValue::Int(_) => "RichInt",
            ParamValue::Float(_) => "RichFloat",
            ParamValue::String(_) => "RichString",
            ParamValue::Enum { .. } => "RichEnum",
            ParamValue::Mesh(_) => "RichMesh",
            ParamValue::Point3f(_) => "RichPoint3f",
            ParamValue::AbsPerc { .. } => "RichAbsPerc",
            ParamValue::DynamicFloat { .. } => "RichDynamicFloat",
            ParamValue::Color(_) => "RichColor",
        }
    }

    /// Attributes that carry the value itself
    fn value_attributes(&self) -> String {
        match self {
            ParamValue::Bool(b) => format!("value=\"{}\"", b),
            ParamValue::Int(i) => format!("value=\"{}\"", i),
            ParamValue::Float(f) => format!("value=\"{}\"", format_float(*f)),
            ParamValue::String(s) => format!("value=\"{}\"", escape_attribute(s)),
            ParamValue::Enum { value, .. } => format!("value=\"{}\"", value),
            ParamValue::Mesh(index) => format!("value=\"{}\"", index),
            ParamValue::Point3f([x, y, z]) => format!(
                "x=\"{}\" y=\"{}\" z=\"{}\"",
                format_float(*x),
                format_float(*y),
                format_float(*z)
            ),
            ParamValue::AbsPerc { value, .. } | ParamValue::DynamicFloat { value, .. } => {
                format!("value=\"{}\"", format_float(*value))
            }
            ParamValue::Color([r, g, b, a]) => {
                format!("r=\"{}\" g=\"{}\" b=\"{}\" a=\"{}\"", r, g, b, a)
            }
        }
    }

    /// Attributes describing the value's domain
    fn domain_attributes(&self) -> String {
        match self {
            ParamValue::Enum { options, .. } => {
                let mut attrs = String::new();
                for (i, option) in options.iter().enumerate() {
                    attrs.push_str(&format!("enum_val{}=\"{}\" ", i, escape_attribute(option)));
                }
                attrs.push_str(&format!("enum_cardinality=\"{}\" ", options.len()));
                attrs
            }
            ParamValue::AbsPerc { min, max, .. } | ParamValue::DynamicFloat { min, max, .. } => {
                format!("min=\"{}\" max=\"{}\" ", format_float(*min), format_float(*max))
            }
            _ => String::new(),
        }
    }
}

/// One `<Param>` element
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub description: String,
    pub value: ParamValue,
    pub tooltip: Option<String>,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "    <Param name=\"{}\" {} description=\"{}\" {}type=\"{}\" ",
            escape_attribute(&self.name),
            self.value.value_attributes(),
            escape_attribute(&self.description),
            self.value.domain_attributes(),
            self.value.type_name()
        )?;
        if let Some(tooltip) = &self.tooltip {
            write!(f, "tooltip=\"{}\" ", escape_attribute(tooltip))?;
        }
        writeln!(f, "/>")
    }
}

/// Element name a filter is wrapped in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTag {
    /// Classic `<filter>`
    Filter,
    /// `<xmlfilter>`, used by the measure plugins
    XmlFilter,
}

impl FilterTag {
    fn as_str(&self) -> &'static str {
        match self {
            FilterTag::Filter => "filter",
            FilterTag::XmlFilter => "xmlfilter",
        }
    }
}

/// Builder for one filter fragment
#[derive(Debug, Clone, PartialEq)]
pub struct FilterXml {
    tag: FilterTag,
    name: String,
    params: Vec<Param>,
}

impl FilterXml {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tag: FilterTag::Filter,
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn xml(name: impl Into<String>) -> Self {
        Self {
            tag: FilterTag::XmlFilter,
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param(mut self, name: &str, description: &str, value: ParamValue) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            description: description.to_string(),
            value,
            tooltip: None,
        });
        self
    }

    /// Attach a tooltip to the most recently added parameter
    pub fn tooltip(mut self, tooltip: &str) -> Self {
        if let Some(last) = self.params.last_mut() {
            last.tooltip = Some(tooltip.to_string());
        }
        self
    }

    pub fn bool(self, name: &str, description: &str, value: bool) -> Self {
        self.param(name, description, ParamValue::Bool(value))
    }

    pub fn int(self, name: &str, description: &str, value: i64) -> Self {
        self.param(name, description, ParamValue::Int(value))
    }

    pub fn float(self, name: &str, description: &str, value: f64) -> Self {
        self.param(name, description, ParamValue::Float(value))
    }

    pub fn string(self, name: &str, description: &str, value: impl Into<String>) -> Self {
        self.param(name, description, ParamValue::String(value.into()))
    }

    pub fn enumeration(self, name: &str, description: &str, value: usize, options: &[&str]) -> Self {
        self.param(
            name,
            description,
            ParamValue::Enum {
                value,
                options: options.iter().map(|o| o.to_string()).collect(),
            },
        )
    }

    pub fn mesh(self, name: &str, description: &str, layer: usize) -> Self {
        self.param(name, description, ParamValue::Mesh(layer))
    }

    pub fn point(self, name: &str, description: &str, value: [f64; 3]) -> Self {
        self.param(name, description, ParamValue::Point3f(value))
    }

    pub fn abs_perc(self, name: &str, description: &str, value: f64, min: f64, max: f64) -> Self {
        self.param(name, description, ParamValue::AbsPerc { value, min, max })
    }

    pub fn dynamic_float(
        self,
        name: &str,
        description: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Self {
        self.param(name, description, ParamValue::DynamicFloat { value, min, max })
    }

    pub fn color(self, name: &str, description: &str, rgba: [u8; 4]) -> Self {
        self.param(name, description, ParamValue::Color(rgba))
    }

    /// Render the fragment, including indentation and trailing newline
    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn into_record(self, effect: LayerEffect) -> FilterRecord {
        FilterRecord::new(self.render(), effect)
    }
}

impl fmt::Display for FilterXml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag.as_str();
        let name = escape_attribute(&self.name);
        if self.params.is_empty() {
            return writeln!(f, "  <{} name=\"{}\"/>", tag, name);
        }
        writeln!(f, "  <{} name=\"{}\">", tag, name)?;
        for param in &self.params {
            write!(f, "{}", param)?;
        }
        writeln!(f, "  </{}>", tag)
    }
}

/// Push a rendered filter with its layer effect
pub(crate) fn emit(sink: &mut impl FilterSink, filter: FilterXml, effect: LayerEffect) -> Result<()> {
    sink.push(filter.into_record(effect))
}

/// Label of the current layer for derived labels
///
/// Sinks without layer tracking ignore effects, so any label will do.
pub(crate) fn current_label(sink: &impl FilterSink) -> Result<String> {
    match sink.layers() {
        Some(layers) => Ok(layers.current_label()?.to_string()),
        None => Ok(String::new()),
    }
}
