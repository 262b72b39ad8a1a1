//! Path-expression selector dialect.
//!
//! The analysis stage returns selectors in two dialects; this module handles
//! the path-expression one. Expressions are evaluated against an independent
//! parse of the markup (`scraper`'s ego-tree), and the resolver bridges the
//! matches back to the primary tree.
//!
//! Supported grammar, the subset the analysis stage actually produces:
//! absolute (`/html/body/div`) and descendant (`//article`) paths, `*` and
//! tag node tests, attribute predicates `[@attr='v']` / `[@attr="v"]`,
//! `[contains(@attr,'v')]`, and 1-based positional predicates `[2]`.

use scraper::{ElementRef, Html};

/// Parse failure for a path expression.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path expression")]
    Empty,

    #[error("empty step in path expression")]
    EmptyStep,

    #[error("unterminated predicate: {0}")]
    UnterminatedPredicate(String),

    #[error("unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    #[error("invalid node test: {0}")]
    InvalidNodeTest(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Any,
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    /// `[@attr='value']`: exact attribute match.
    AttrEquals { name: String, value: String },

    /// `[contains(@attr,'value')]`: substring attribute match.
    AttrContains { name: String, value: String },

    /// `[n]`: 1-based position among this step's matches per context node.
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    steps: Vec<Step>,
}

impl PathExpr {
    /// Parse a path expression.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let mut rest = trimmed;
        let mut steps = Vec::new();
        // A relative expression is treated as starting from anywhere.
        let mut axis = Axis::Descendant;

        if let Some(r) = rest.strip_prefix("//") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('/') {
            axis = Axis::Child;
            rest = r;
        }

        loop {
            let (token, remainder) = split_step(rest)?;
            steps.push(parse_step(axis, token)?);

            match remainder {
                None => break,
                Some(r) => {
                    if let Some(r2) = r.strip_prefix('/') {
                        axis = Axis::Descendant;
                        rest = r2;
                    } else {
                        axis = Axis::Child;
                        rest = r;
                    }
                }
            }
        }

        Ok(Self { steps })
    }

    /// Evaluate against a parsed document, returning matches in document
    /// order with duplicates removed.
    #[must_use]
    pub fn evaluate<'a>(&self, html: &'a Html) -> Vec<ElementRef<'a>> {
        let root = html.tree.root();
        // Work on raw tree node ids so the document node can serve as the
        // initial context.
        let mut current: Vec<ego_tree::NodeId> = vec![root.id()];

        for step in &self.steps {
            let mut next: Vec<ego_tree::NodeId> = Vec::new();
            let mut seen: std::collections::HashSet<ego_tree::NodeId> =
                std::collections::HashSet::new();

            for ctx_id in &current {
                let Some(ctx) = html.tree.get(*ctx_id) else {
                    continue;
                };

                let mut group: Vec<ego_tree::NodeId> = Vec::new();
                match step.axis {
                    Axis::Child => {
                        for child in ctx.children() {
                            if let Some(el) = ElementRef::wrap(child) {
                                if test_matches(&step.test, &el) {
                                    group.push(child.id());
                                }
                            }
                        }
                    }
                    Axis::Descendant => {
                        for desc in ctx.descendants() {
                            if desc.id() == ctx.id() {
                                continue;
                            }
                            if let Some(el) = ElementRef::wrap(desc) {
                                if test_matches(&step.test, &el) {
                                    group.push(desc.id());
                                }
                            }
                        }
                    }
                }

                for predicate in &step.predicates {
                    group = apply_predicate(html, predicate, group);
                }

                for id in group {
                    if seen.insert(id) {
                        next.push(id);
                    }
                }
            }

            current = next;
            if current.is_empty() {
                break;
            }
        }

        current
            .into_iter()
            .filter_map(|id| html.tree.get(id).and_then(ElementRef::wrap))
            .collect()
    }
}

fn test_matches(test: &NodeTest, el: &ElementRef) -> bool {
    match test {
        NodeTest::Any => true,
        NodeTest::Tag(tag) => el.value().name().eq_ignore_ascii_case(tag),
    }
}

fn apply_predicate(
    html: &Html,
    predicate: &Predicate,
    group: Vec<ego_tree::NodeId>,
) -> Vec<ego_tree::NodeId> {
    match predicate {
        Predicate::Position(n) => {
            if *n >= 1 && *n <= group.len() {
                vec![group[n - 1]]
            } else {
                Vec::new()
            }
        }
        Predicate::AttrEquals { name, value } => group
            .into_iter()
            .filter(|id| attr_of(html, *id, name).is_some_and(|v| v == *value))
            .collect(),
        Predicate::AttrContains { name, value } => group
            .into_iter()
            .filter(|id| attr_of(html, *id, name).is_some_and(|v| v.contains(value.as_str())))
            .collect(),
    }
}

fn attr_of(html: &Html, id: ego_tree::NodeId, name: &str) -> Option<String> {
    html.tree
        .get(id)
        .and_then(ElementRef::wrap)
        .and_then(|el| el.value().attr(name))
        .map(ToString::to_string)
}

/// Split off one step token, respecting brackets. Returns the token and the
/// remainder starting with `/` (or `None` at the end).
fn split_step(input: &str) -> Result<(&str, Option<&str>), PathError> {
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                let token = &input[..i];
                if token.is_empty() {
                    return Err(PathError::EmptyStep);
                }
                return Ok((token, Some(&input[i + 1..])));
            }
            _ => {}
        }
    }
    if input.is_empty() {
        return Err(PathError::EmptyStep);
    }
    Ok((input, None))
}

fn parse_step(axis: Axis, token: &str) -> Result<Step, PathError> {
    let (name_part, mut rest) = match token.find('[') {
        Some(idx) => (&token[..idx], &token[idx..]),
        None => (token, ""),
    };

    let name = name_part.trim();
    if name.is_empty() {
        return Err(PathError::EmptyStep);
    }
    let test = if name == "*" {
        NodeTest::Any
    } else if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        NodeTest::Tag(name.to_ascii_lowercase())
    } else {
        return Err(PathError::InvalidNodeTest(name.to_string()));
    };

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let Some(stripped) = rest.strip_prefix('[') else {
            return Err(PathError::UnsupportedPredicate(rest.to_string()));
        };
        let Some(end) = stripped.find(']') else {
            return Err(PathError::UnterminatedPredicate(token.to_string()));
        };
        predicates.push(parse_predicate(stripped[..end].trim())?);
        rest = &stripped[end + 1..];
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

fn parse_predicate(body: &str) -> Result<Predicate, PathError> {
    if let Ok(n) = body.parse::<usize>() {
        if n == 0 {
            return Err(PathError::UnsupportedPredicate(body.to_string()));
        }
        return Ok(Predicate::Position(n));
    }

    if let Some(rest) = body.strip_prefix('@') {
        let Some(eq) = rest.find('=') else {
            return Err(PathError::UnsupportedPredicate(body.to_string()));
        };
        let name = rest[..eq].trim();
        let value = unquote(rest[eq + 1..].trim())
            .ok_or_else(|| PathError::UnsupportedPredicate(body.to_string()))?;
        if name.is_empty() {
            return Err(PathError::UnsupportedPredicate(body.to_string()));
        }
        return Ok(Predicate::AttrEquals {
            name: name.to_ascii_lowercase(),
            value,
        });
    }

    if let Some(rest) = body.strip_prefix("contains(") {
        let inner = rest
            .strip_suffix(')')
            .ok_or_else(|| PathError::UnsupportedPredicate(body.to_string()))?;
        let (name_part, value_part) = inner
            .split_once(',')
            .ok_or_else(|| PathError::UnsupportedPredicate(body.to_string()))?;
        let name = name_part
            .trim()
            .strip_prefix('@')
            .ok_or_else(|| PathError::UnsupportedPredicate(body.to_string()))?;
        let value = unquote(value_part.trim())
            .ok_or_else(|| PathError::UnsupportedPredicate(body.to_string()))?;
        return Ok(Predicate::AttrContains {
            name: name.trim().to_ascii_lowercase(),
            value,
        });
    }

    Err(PathError::UnsupportedPredicate(body.to_string()))
}

fn unquote(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
            return Some(s[1..s.len() - 1].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Html {
        Html::parse_document(
            r#"<html><body>
                <div id="main" class="content wide">
                    <p>one</p>
                    <p>two</p>
                    <span class="note">n</span>
                </div>
                <div class="sidebar"><p>side</p></div>
            </body></html>"#,
        )
    }

    fn texts(html: &Html, expr: &str) -> Vec<String> {
        PathExpr::parse(expr)
            .unwrap()
            .evaluate(html)
            .iter()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect()
    }

    #[test]
    fn descendant_tag_match() {
        let html = doc();
        assert_eq!(texts(&html, "//p"), vec!["one", "two", "side"]);
    }

    #[test]
    fn absolute_child_path() {
        let html = doc();
        let matches = PathExpr::parse("/html/body/div").unwrap().evaluate(&html);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn attribute_equals_predicate() {
        let html = doc();
        let matches = PathExpr::parse("//div[@id='main']").unwrap().evaluate(&html);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value().attr("id"), Some("main"));
    }

    #[test]
    fn attribute_contains_predicate() {
        let html = doc();
        let matches = PathExpr::parse("//div[contains(@class,'side')]")
            .unwrap()
            .evaluate(&html);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value().attr("class"), Some("sidebar"));
    }

    #[test]
    fn positional_predicate_is_one_based_per_context() {
        let html = doc();
        assert_eq!(texts(&html, "//div[@id='main']/p[2]"), vec!["two"]);
        assert!(texts(&html, "//div[@id='main']/p[9]").is_empty());
    }

    #[test]
    fn wildcard_node_test() {
        let html = doc();
        let matches = PathExpr::parse("//div[@id='main']/*").unwrap().evaluate(&html);
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn double_quoted_predicate_value() {
        let html = doc();
        let matches = PathExpr::parse(r#"//span[@class="note"]"#).unwrap().evaluate(&html);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn relative_expression_means_descendant() {
        let html = doc();
        assert_eq!(texts(&html, "span"), vec!["n"]);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(PathExpr::parse(""), Err(PathError::Empty));
        assert_eq!(PathExpr::parse("//"), Err(PathError::EmptyStep));
        assert!(matches!(
            PathExpr::parse("//div[@id='x'"),
            Err(PathError::UnterminatedPredicate(_))
        ));
        assert!(matches!(
            PathExpr::parse("//div[last()]"),
            Err(PathError::UnsupportedPredicate(_))
        ));
        assert!(matches!(
            PathExpr::parse("//div::text"),
            Err(PathError::InvalidNodeTest(_))
        ));
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let html = doc();
        assert!(texts(&html, "//article").is_empty());
    }
}
