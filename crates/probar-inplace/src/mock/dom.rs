//! Minimal DOM tree and CSS selector engine for the mock page.
//!
//! Supports what the inline-edit markup needs: selector lists (`,`), the
//! descendant and child (`>`) combinators, and compound selectors made of a
//! tag, `#id`, `.class` and the `:invalid` pseudo-class.

use crate::driver::{ElementSnapshot, Scope};
use crate::matcher::normalize_whitespace;
use crate::result::{FieldError, FieldResult};

/// What a node does when the page is interacted with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeRole {
    /// Opens the editor of field `n`
    Trigger(usize),
    /// Editor input of field `n`
    Input(usize),
    /// Save control of field `n`
    SaveControl(usize),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub text: String,
    pub value: Option<String>,
    pub invalid: bool,
    pub role: Option<NodeRole>,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.extend(class.split('.').filter(|c| !c.is_empty()).map(String::from));
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub const fn invalid(mut self, invalid: bool) -> Self {
        self.invalid = invalid;
        self
    }

    pub const fn role(mut self, role: NodeRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Rendered document; index 0 is the document node
#[derive(Debug, Clone)]
pub(crate) struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub const ROOT: usize = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("#document")],
        }
    }

    /// Append `node` under `parent`, returning its index
    pub fn append(&mut self, parent: usize, mut node: Node) -> usize {
        let index = self.nodes.len();
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent].children.push(index);
        index
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Descendants of `index` in document order
    fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[index].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }

    /// Own text plus all descendant text, whitespace-normalized
    pub fn text_content(&self, index: usize) -> String {
        let mut parts = vec![self.nodes[index].text.clone()];
        parts.extend(
            self.descendants(index)
                .into_iter()
                .map(|i| self.nodes[i].text.clone()),
        );
        normalize_whitespace(&parts.join(" "))
    }

    pub fn snapshot(&self, index: usize) -> ElementSnapshot {
        let node = &self.nodes[index];
        ElementSnapshot {
            tag_name: node.tag.clone(),
            text: self.text_content(index),
            value: node.value.clone(),
        }
    }

    /// Descendants of `within` matching `selector`, in document order
    pub fn select_all(&self, within: usize, selector: &str) -> FieldResult<Vec<usize>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(within)
            .into_iter()
            .filter(|&i| list.matches(self, i))
            .collect())
    }

    /// Resolve a scope chain to an element, failing when a segment is missing
    pub fn resolve(&self, scope: &Scope) -> FieldResult<usize> {
        let mut current = Self::ROOT;
        let mut walked = Scope::root();
        for segment in scope.chain() {
            current = self
                .select_all(current, segment)?
                .into_iter()
                .next()
                .ok_or_else(|| FieldError::not_found(walked.describe(segment)))?;
            walked = walked.within(segment.as_str());
        }
        Ok(current)
    }

    /// First match of `selector` within `scope`
    pub fn first(&self, scope: &Scope, selector: &str) -> FieldResult<usize> {
        let within = self.resolve(scope)?;
        self.select_all(within, selector)?
            .into_iter()
            .next()
            .ok_or_else(|| FieldError::not_found(scope.describe(selector)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    invalid: bool,
}

impl Compound {
    fn parse(input: &str) -> FieldResult<Self> {
        let unsupported = || FieldError::driver(format!("unsupported selector '{input}'"));
        let mut compound = Self::default();
        let mut rest = input;

        let tag_len = rest
            .find(|c: char| c == '.' || c == '#' || c == ':')
            .unwrap_or(rest.len());
        if tag_len > 0 {
            let tag = &rest[..tag_len];
            if tag != "*" {
                compound.tag = Some(tag.to_ascii_lowercase());
            }
            rest = &rest[tag_len..];
        }

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let len = body
                .find(|c: char| c == '.' || c == '#' || c == ':')
                .unwrap_or(body.len());
            let name = &body[..len];
            if name.is_empty() {
                return Err(unsupported());
            }
            match marker {
                '.' => compound.classes.push(name.to_string()),
                '#' => compound.id = Some(name.to_string()),
                ':' if name == "invalid" => compound.invalid = true,
                _ => return Err(unsupported()),
            }
            rest = &body[len..];
        }
        Ok(compound)
    }

    fn matches(&self, node: &Node) -> bool {
        self.tag.as_ref().map_or(true, |t| *t == node.tag)
            && self.id.as_ref().map_or(true, |id| node.id.as_ref() == Some(id))
            && self.classes.iter().all(|c| node.classes.contains(c))
            && (!self.invalid || node.invalid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// A complex selector, stored right-to-left
#[derive(Debug, Clone)]
struct Complex {
    subject: Compound,
    ancestors: Vec<(Combinator, Compound)>,
}

impl Complex {
    fn parse(input: &str) -> FieldResult<Self> {
        let spaced = input.replace('>', " > ");
        let mut compounds = Vec::new();
        // links[i] joins compounds[i] to compounds[i + 1]
        let mut links = Vec::new();
        let mut pending = None;
        for token in spaced.split_whitespace() {
            if token == ">" {
                pending = Some(Combinator::Child);
                continue;
            }
            if !compounds.is_empty() {
                links.push(pending.unwrap_or(Combinator::Descendant));
            }
            compounds.push(Compound::parse(token)?);
            pending = None;
        }
        let subject = compounds
            .pop()
            .ok_or_else(|| FieldError::driver(format!("empty selector '{input}'")))?;
        let ancestors = compounds
            .into_iter()
            .zip(links)
            .rev()
            .map(|(compound, link)| (link, compound))
            .collect();
        Ok(Self { subject, ancestors })
    }

    fn matches(&self, doc: &Document, index: usize) -> bool {
        self.subject.matches(doc.node(index)) && Self::match_from(doc, index, &self.ancestors)
    }

    fn match_from(doc: &Document, index: usize, rest: &[(Combinator, Compound)]) -> bool {
        let Some(((combinator, compound), tail)) = rest.split_first() else {
            return true;
        };
        let mut parent = doc.node(index).parent;
        while let Some(p) = parent {
            if p == Document::ROOT {
                return false;
            }
            if compound.matches(doc.node(p)) && Self::match_from(doc, p, tail) {
                return true;
            }
            if *combinator == Combinator::Child {
                return false;
            }
            parent = doc.node(p).parent;
        }
        false
    }
}

#[derive(Debug, Clone)]
struct SelectorList(Vec<Complex>);

impl SelectorList {
    fn parse(input: &str) -> FieldResult<Self> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Complex::parse)
            .collect::<FieldResult<Vec<_>>>()
            .and_then(|list| {
                if list.is_empty() {
                    Err(FieldError::driver(format!("empty selector '{input}'")))
                } else {
                    Ok(Self(list))
                }
            })
    }

    fn matches(&self, doc: &Document, index: usize) -> bool {
        self.0.iter().any(|c| c.matches(doc, index))
    }
}
