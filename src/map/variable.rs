//! Map variables: a source template, a lookup table and a default.

use std::sync::Arc;

use bytes::Bytes;

use crate::config::MapConfig;
use crate::hash::HashSizing;
use crate::map::table::{MapBuilder, MapTable};
use crate::observability::metrics;
use crate::template::Template;
use crate::variables::{
    ConfigError, Evaluation, EvaluationError, Getter, VariableFlags, VariableIndex,
    VariableValue, VariablesBuilder,
};

/// A map result.
#[derive(Debug, Clone)]
pub enum MapValue {
    Literal(Bytes),
    /// Exactly one `$name` reference.
    Variable(VariableIndex),
    Template(Template),
}

impl MapValue {
    /// Parse a value, pre-resolving any `$name` references.
    pub fn parse(builder: &mut VariablesBuilder, text: &str) -> Result<Self, ConfigError> {
        if !text.contains('$') {
            return Ok(MapValue::Literal(Bytes::copy_from_slice(text.as_bytes())));
        }
        let template = Template::compile(builder, text)?;
        Ok(match template.as_single_variable() {
            Some(index) => MapValue::Variable(index),
            None => MapValue::Template(template),
        })
    }

    fn resolve(&self, eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
        match self {
            MapValue::Literal(text) => Ok(VariableValue::valid(text.clone())),
            MapValue::Variable(index) => eval.get_flushed(*index),
            MapValue::Template(template) => Ok(VariableValue::valid(template.render(eval)?)),
        }
    }
}

/// Getter state for one map variable.
#[derive(Debug)]
pub struct MapVariable {
    source: Template,
    table: MapTable<MapValue>,
    default: Option<MapValue>,
}

impl MapVariable {
    pub fn new(source: Template, table: MapTable<MapValue>, default: Option<MapValue>) -> Self {
        Self {
            source,
            table,
            default,
        }
    }

    /// Evaluate the source, look it up and resolve the matching value.
    pub fn get(&self, eval: &mut Evaluation<'_>) -> Result<VariableValue, EvaluationError> {
        let subject = self.source.render(eval)?;

        let value = match self.table.find(eval, &subject)? {
            Some(value) => value,
            None => match &self.default {
                Some(default) => {
                    metrics::record_map_lookup("default");
                    default
                }
                None => {
                    metrics::record_map_lookup("miss");
                    return Ok(VariableValue::empty());
                }
            },
        };

        value.resolve(eval)
    }
}

/// Register a map variable described by `config`.
pub fn define_map(
    builder: &mut VariablesBuilder,
    config: &MapConfig,
    sizing: HashSizing,
) -> Result<(), ConfigError> {
    let name = config.variable.trim_start_matches('$');
    let source = Template::compile(builder, &config.source)?;

    let mut table = MapBuilder::new(format!("map_{}_hash", name), config.hostnames);
    for entry in &config.entries {
        let value = MapValue::parse(builder, &entry.value)?;
        table.add(builder, &entry.key, value)?;
    }
    let table = table.build(sizing)?;

    let default = config
        .default
        .as_deref()
        .map(|text| MapValue::parse(builder, text))
        .transpose()?;

    let map = Arc::new(MapVariable::new(source, table, default));
    let descriptor = builder.register(name, VariableFlags::CHANGEABLE)?;
    descriptor.set_getter(Getter::Map(map));
    // a merge with an earlier registration keeps only the first flags
    if config.volatile {
        descriptor.insert_flags(VariableFlags::NOCACHEABLE);
    }

    tracing::debug!(
        variable = %name,
        entries = config.entries.len(),
        hostnames = config.hostnames,
        volatile = config.volatile,
        "map variable defined"
    );
    Ok(())
}
