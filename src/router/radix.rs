//! Segment radix tree for OpenAPI path templates
//!
//! Each node represents one path segment. Literal segments match exactly,
//! `{name}` segments match any single segment. Terminal nodes carry the
//! template and its operations keyed by HTTP method.
//!
//! Unlike a first-match router, lookup collects every template that fits the
//! request and keeps the one with the fewest parameter segments, so
//! `/{kind}/{id}/weather` never shadows `/cities/{id}/weather`, whatever the
//! insertion order. Equally specific overlapping templates are rejected at
//! load time by [`check_ambiguity`].

use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use super::core::ParamVec;
use crate::error::LoadError;
use crate::spec::{Operation, SpecDocument};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{([^{}/]+)\}$").expect("Failed to compile placeholder regex"));

/// One segment of a parsed path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    Literal(&'t str),
    Param(&'t str),
}

/// Split a path template into segments, validating placeholder syntax.
///
/// Empty segments are dropped, so `/cities/` and `/cities` parse the same.
pub fn parse_template(template: &str) -> Result<Vec<Segment<'_>>, LoadError> {
    let invalid = |reason: &str| LoadError::InvalidPathTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };
    if !template.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    let mut segments = Vec::new();
    for raw in template.split('/').filter(|s| !s.is_empty()) {
        if let Some(caps) = PLACEHOLDER.captures(raw) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            segments.push(Segment::Param(name));
        } else if raw.contains('{') || raw.contains('}') {
            return Err(invalid("a placeholder must be a whole, non-empty segment"));
        } else {
            segments.push(Segment::Literal(raw));
        }
    }
    Ok(segments)
}

fn param_count(segments: &[Segment<'_>]) -> usize {
    segments
        .iter()
        .filter(|s| matches!(s, Segment::Param(_)))
        .count()
}

/// Two templates overlap when some concrete path matches both.
fn overlaps(a: &[Segment<'_>], b: &[Segment<'_>]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|pair| match pair {
            (Segment::Literal(x), Segment::Literal(y)) => x == y,
            _ => true,
        })
}

/// Reject templates that are equally specific and can match the same path.
pub fn check_ambiguity<'t>(templates: impl IntoIterator<Item = &'t str>) -> Result<(), LoadError> {
    let parsed = templates
        .into_iter()
        .map(|t| parse_template(t).map(|segs| (t, segs)))
        .collect::<Result<Vec<_>, _>>()?;
    for (i, (first, a)) in parsed.iter().enumerate() {
        for (second, b) in &parsed[i + 1..] {
            if param_count(a) == param_count(b) && overlaps(a, b) {
                return Err(LoadError::AmbiguousPaths {
                    first: (*first).to_string(),
                    second: (*second).to_string(),
                });
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub(crate) struct Terminal {
    pub(crate) template: Arc<str>,
    pub(crate) param_count: usize,
    pub(crate) operations: HashMap<Method, Arc<Operation>>,
}

/// Node in the radix tree
#[derive(Debug, Clone, Default)]
struct RadixNode {
    /// Literal segment this node matches (empty for the root and param nodes)
    segment: String,
    /// Parameter name if this node is a `{name}` segment
    param_name: Option<Arc<str>>,
    terminal: Option<Terminal>,
    children: Vec<RadixNode>,
    /// Multiple parameter children are kept so `/users/{id}/posts` and
    /// `/users/{user_id}/comments` each report their own parameter name
    param_children: Vec<RadixNode>,
}

impl RadixNode {
    fn insert(&mut self, segments: &[Segment<'_>], terminal: Terminal) {
        let Some((first, rest)) = segments.split_first() else {
            self.terminal = Some(terminal);
            return;
        };
        match first {
            Segment::Param(name) => {
                if let Some(child) = self
                    .param_children
                    .iter_mut()
                    .find(|c| c.param_name.as_deref() == Some(*name))
                {
                    child.insert(rest, terminal);
                    return;
                }
                let mut child = RadixNode {
                    param_name: Some(Arc::from(*name)),
                    ..RadixNode::default()
                };
                child.insert(rest, terminal);
                self.param_children.push(child);
            }
            Segment::Literal(lit) => {
                if let Some(child) = self.children.iter_mut().find(|c| c.segment == *lit) {
                    child.insert(rest, terminal);
                    return;
                }
                let mut child = RadixNode {
                    segment: (*lit).to_string(),
                    ..RadixNode::default()
                };
                child.insert(rest, terminal);
                self.children.push(child);
            }
        }
    }

    /// Collect every terminal that matches `segments`, with its captured params.
    fn collect<'n, 's>(
        &'n self,
        segments: &[&'s str],
        captured: &mut Vec<(Arc<str>, &'s str)>,
        out: &mut Vec<(&'n Terminal, Vec<(Arc<str>, &'s str)>)>,
    ) {
        let Some((first, rest)) = segments.split_first() else {
            if let Some(terminal) = &self.terminal {
                out.push((terminal, captured.clone()));
            }
            return;
        };
        for child in self.children.iter().filter(|c| c.segment == *first) {
            child.collect(rest, captured, out);
        }
        for child in &self.param_children {
            if let Some(name) = &child.param_name {
                captured.push((Arc::clone(name), *first));
                child.collect(rest, captured, out);
                captured.pop();
            }
        }
    }
}

/// Radix tree over every path template of a document.
#[derive(Debug, Clone)]
pub struct RadixRouter {
    root: RadixNode,
    templates: usize,
}

impl RadixRouter {
    /// Build the tree. Templates were validated by the loader; a template
    /// that fails to parse here is skipped.
    #[must_use]
    pub fn new(doc: &SpecDocument) -> Self {
        let mut root = RadixNode::default();
        let mut templates = 0;
        for (template, item) in doc.paths() {
            let Ok(segments) = parse_template(template) else {
                continue;
            };
            let terminal = Terminal {
                template: Arc::from(template.as_str()),
                param_count: param_count(&segments),
                operations: item.operations.clone(),
            };
            root.insert(&segments, terminal);
            templates += 1;
        }
        Self { root, templates }
    }

    #[must_use]
    pub fn template_count(&self) -> usize {
        self.templates
    }

    /// Find the most literal template matching `path` (already prefix-stripped,
    /// without query string). Parameter values are returned raw.
    pub(crate) fn find(&self, path: &str) -> Option<(&Terminal, ParamVec)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut captured = Vec::new();
        let mut candidates = Vec::new();
        self.root.collect(&segments, &mut captured, &mut candidates);
        candidates
            .into_iter()
            .min_by_key(|(terminal, _)| terminal.param_count)
            .map(|(terminal, params)| {
                let params = params
                    .into_iter()
                    .map(|(name, value)| (name, value.to_string()))
                    .collect();
                (terminal, params)
            })
    }
}
