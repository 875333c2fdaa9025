//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the stb engine. A fixture is a
//! small site (settings, boxes, hook overrides) plus cases; each case names a
//! page view and what the engine must produce for it.
//!
//! ```yaml
//! name: contact page
//! boxes:
//!   - id: 1
//!     content: Hello
//!     rules: [{ condition: is_page, value: "5, contact" }]
//! cases:
//!   - name: matches by slug
//!     context: { type: page, id: "5", slug: contact }
//!     matched: [1]
//!     payload:
//!       1: { triggerPercentage: 65 }
//! ```

use crate::{page_view, ContextError};
use serde::Deserialize;
use serde_json::Value;
use stb::prelude::*;
use stb::{BoxRecord, Renderer};
use std::collections::BTreeMap;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub hooks: HooksConfig,
    #[serde(default)]
    pub boxes: Vec<BoxRecord>,
    pub cases: Vec<TestCase>,
}

/// Hook overrides, applied on top of the standard content pipeline
#[derive(Debug, Default, Deserialize)]
pub struct HooksConfig {
    /// `show_box` forces these boxes in.
    #[serde(default)]
    pub force_show: Vec<BoxId>,
    /// `show_box` forces these boxes out.
    #[serde(default)]
    pub force_hide: Vec<BoxId>,
    /// `auto_hide_small_screens` returns this for every box.
    #[serde(default)]
    pub auto_hide_small_screens: Option<bool>,
    /// `close_icon` returns this markup.
    #[serde(default)]
    pub close_icon: Option<String>,
}

impl HooksConfig {
    /// Build hooks: the standard pipeline plus these overrides
    pub fn build(&self) -> Hooks {
        let mut builder = HooksBuilder::standard(ShortcodeRegistry::new());

        if !self.force_show.is_empty() || !self.force_hide.is_empty() {
            let show = self.force_show.clone();
            let hide = self.force_hide.clone();
            builder = builder.show_box(move |matched, id| {
                !hide.contains(&id) && (matched || show.contains(&id))
            });
        }
        if let Some(enabled) = self.auto_hide_small_screens {
            builder = builder.auto_hide_small_screens(move |_, _| enabled);
        }
        if let Some(icon) = self.close_icon.clone() {
            builder = builder.close_icon(move |_, _| icon.clone());
        }
        builder.build()
    }
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    /// `key=value` pairs understood by [`page_view`](crate::page_view).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Expected matched ids, in stored order.
    #[serde(default)]
    pub matched: Option<Vec<BoxId>>,
    /// Expected shown ids (matched, existing, published).
    #[serde(default)]
    pub shown: Option<Vec<BoxId>>,
    /// Expected payload fields per box; unlisted fields are not compared.
    #[serde(default)]
    pub payload: BTreeMap<BoxId, Value>,
    #[serde(default)]
    pub markup_contains: Vec<String>,
    #[serde(default)]
    pub markup_excludes: Vec<String>,
}

impl TestCase {
    /// Build the page view for this case
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] if the context map is not a valid page view.
    pub fn build_context(&self) -> Result<PageView, ContextError> {
        page_view(&self.context)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    /// Human-readable mismatches; empty when the case passed.
    pub failures: Vec<String>,
}

impl CaseResult {
    /// Returns `true` if every expectation held.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// The fixture's boxes as a site.
    #[must_use]
    pub fn site(&self) -> SiteConfig {
        SiteConfig {
            settings: self.settings.clone(),
            boxes: self.boxes.clone(),
        }
    }

    /// Run all test cases and return results
    pub fn run(&self) -> Vec<CaseResult> {
        let store = MemoryStore::from(&self.site());
        let hooks = self.hooks.build();
        self.cases
            .iter()
            .map(|case| CaseResult {
                case_name: case.name.clone(),
                failures: self.check(case, &store, &hooks),
            })
            .collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        for result in self.run() {
            assert!(
                result.passed(),
                "Fixture '{}' case '{}' failed:\n  {}",
                self.name,
                result.case_name,
                result.failures.join("\n  ")
            );
        }
    }

    fn check(&self, case: &TestCase, store: &MemoryStore, hooks: &Hooks) -> Vec<String> {
        let ctx = match case.build_context() {
            Ok(ctx) => ctx,
            Err(err) => return vec![format!("invalid context: {err}")],
        };
        let scope = RequestScope::new(&ctx, store, hooks, &self.settings);
        let mut failures = Vec::new();

        if let Some(expected) = &case.matched {
            let actual = scope.matched_ids().as_slice();
            if actual != expected.as_slice() {
                failures.push(format!("matched: expected {expected:?}, got {actual:?}"));
            }
        }

        if let Some(expected) = &case.shown {
            let actual: Vec<BoxId> = scope.matched_boxes().iter().map(|m| m.post.id).collect();
            if &actual != expected {
                failures.push(format!("shown: expected {expected:?}, got {actual:?}"));
            }
        }

        if !case.payload.is_empty() {
            let payload = scope.payload();
            for (id, expected) in &case.payload {
                let Some(entry) = payload.get(*id) else {
                    failures.push(format!("payload: box {id} missing"));
                    continue;
                };
                let actual = serde_json::to_value(entry).unwrap_or(Value::Null);
                compare_fields(*id, expected, &actual, &mut failures);
            }
        }

        if !case.markup_contains.is_empty() || !case.markup_excludes.is_empty() {
            let markup = Renderer::new(&self.settings, hooks).render(scope.matched_boxes());
            for needle in &case.markup_contains {
                if !markup.contains(needle.as_str()) {
                    failures.push(format!("markup: missing {needle:?} in\n{markup}"));
                }
            }
            for needle in &case.markup_excludes {
                if markup.contains(needle.as_str()) {
                    failures.push(format!("markup: unexpected {needle:?}"));
                }
            }
        }

        failures
    }
}

fn compare_fields(id: BoxId, expected: &Value, actual: &Value, failures: &mut Vec<String>) {
    let Some(fields) = expected.as_object() else {
        failures.push(format!("payload: box {id} expectation must be a map"));
        return;
    };
    for (key, want) in fields {
        match actual.get(key) {
            Some(got) if got == want => {}
            Some(got) => failures.push(format!("payload: box {id} {key}: expected {want}, got {got}")),
            None => failures.push(format!("payload: box {id} has no field {key}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = r#"
name: runner smoke test
boxes:
  - id: 1
    content: Hello
    options:
      css: { width: 300 }
    rules:
      - { condition: is_page, value: "contact" }
  - id: 2
    status: draft
    rules:
      - { condition: everywhere }
cases:
  - name: contact
    context: { type: page, id: "5", slug: contact }
    matched: [1, 2]
    shown: [1]
    payload:
      1: { minimumScreenWidth: 300, position: bottom-right }
    markup_contains: ["<p>Hello</p>"]
    markup_excludes: ["stb-2"]
"#;

    #[test]
    fn passing_fixture() {
        let fixture = Fixture::from_yaml(SITE).unwrap();
        assert_eq!(fixture.cases.len(), 1);
        fixture.run_and_assert();
    }

    #[test]
    fn failures_are_reported() {
        let mut fixture = Fixture::from_yaml(SITE).unwrap();
        fixture.cases[0].matched = Some(vec![BoxId(2)]);
        fixture.cases[0].payload.insert(BoxId(9), serde_json::json!({}));
        fixture.cases[0].context.insert("flags".into(), "bogus".into());

        let results = fixture.run();
        assert_eq!(results[0].failures, vec!["invalid context: unknown flag \"bogus\""]);

        fixture.cases[0].context.remove("flags");
        let results = fixture.run();
        assert_eq!(results[0].failures.len(), 2);
        assert!(results[0].failures[0].starts_with("matched:"));
        assert_eq!(results[0].failures[1], "payload: box 9 missing");
    }

    #[test]
    fn hook_overrides() {
        let hooks = HooksConfig {
            force_show: vec![BoxId(3)],
            force_hide: vec![BoxId(1)],
            ..HooksConfig::default()
        }
        .build();
        assert!(hooks.show_box(false, BoxId(3)));
        assert!(!hooks.show_box(true, BoxId(1)));
        assert!(hooks.show_box(true, BoxId(2)));
        assert!(!hooks.show_box(false, BoxId(2)));
    }

    #[test]
    fn multi_document() {
        let yaml = "name: a\ncases: []\n---\nname: b\ncases: []\n";
        let names: Vec<String> = Fixture::from_yaml_multi(yaml)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
