//! XMP property paths: `name`, `name[n]`, `name/ns:field` and combinations.

use indexmap::IndexMap;

use crate::{value::Value, ErrorCode, Result};

/// One step below the top-level property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// 1-based array item
    Index(usize),
    /// Struct field, `xmlprefix:name`
    Field(String),
}

fn unsupported(path: &str) -> crate::Error {
    native_error!(ErrorCode::InvalidKey, "Unsupported XMP path '{}'", path)
}

/// Splits a property path into the top-level property name and the steps below it.
pub(crate) fn parse_path(path: &str) -> Result<(&str, Vec<Step>)> {
    let split = path.find(['[', '/']).unwrap_or(path.len());
    let (name, mut rest) = path.split_at(split);
    if name.is_empty() {
        return Err(unsupported(path));
    }

    let mut steps = Vec::new();
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix('[') {
            let close = tail.find(']').ok_or_else(|| unsupported(path))?;
            let index = tail[..close]
                .parse::<usize>()
                .ok()
                .filter(|index| *index > 0)
                .ok_or_else(|| unsupported(path))?;
            steps.push(Step::Index(index));
            rest = &tail[close + 1..];
        } else if let Some(tail) = rest.strip_prefix('/') {
            let end = tail.find(['[', '/']).unwrap_or(tail.len());
            let field = &tail[..end];
            match field.split_once(':') {
                Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => {
                    steps.push(Step::Field(field.to_string()));
                }
                _ => return Err(unsupported(path)),
            }
            rest = &tail[end..];
        } else {
            return Err(unsupported(path));
        }
    }

    Ok((name, steps))
}

/// A property tree assembled from flat keys.
#[derive(Debug, Default)]
pub(crate) struct Node {
    pub(crate) value: Option<Value>,
    pub(crate) items: Vec<Node>,
    pub(crate) fields: IndexMap<String, Node>,
}

impl Node {
    pub(crate) fn descend(&mut self, steps: &[Step]) -> &mut Node {
        let mut node = self;
        for step in steps {
            node = match step {
                Step::Index(index) => {
                    if node.items.len() < *index {
                        node.items.resize_with(*index, Node::default);
                    }
                    &mut node.items[index - 1]
                }
                Step::Field(name) => node.fields.entry(name.clone()).or_default(),
            };
        }
        node
    }
}
