//! Restricted expression language for `manual` rules.
//!
//! Administrators write boolean expressions such as
//!
//! ```text
//! is_single(1, 3) || (is_page(array('about', 'contact')) && !is_user_logged_in())
//! ```
//!
//! The expression is parsed into an [`Expr`] tree of AND/OR/NOT over calls
//! to a fixed whitelist of [`ManualPredicate`]s with literal arguments, and
//! interpreted against a [`RequestContext`]. Nothing else can be expressed:
//! there are no variables, no assignments and no host-language escape.
//!
//! # INV: parse errors are the only errors
//!
//! Every name is checked against the whitelist at parse time, so a parsed
//! [`Expr`] always evaluates to a plain `bool`.

mod lexer;
mod parser;

use crate::{ExprError, PageFlag, RequestContext};
use std::fmt;

/// A whitelisted predicate callable from a `manual` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManualPredicate {
    /// `is_single(ids...)`
    IsSingle,
    /// `is_page(ids...)`
    IsPage,
    /// `is_post(ids...)`
    IsPost,
    /// `is_singular(types...)`
    IsSingular,
    /// `is_post_type(types...)`
    IsPostType,
    /// `is_url(patterns...)`
    IsUrl,
    /// `is_front_page()`
    IsFrontPage,
    /// `is_home()`
    IsHome,
    /// `is_archive()`
    IsArchive,
    /// `is_search()`
    IsSearch,
    /// `is_404()`
    Is404,
    /// `is_user_logged_in()`
    IsUserLoggedIn,
}

impl ManualPredicate {
    /// Every predicate, in documentation order.
    pub const ALL: [Self; 12] = [
        Self::IsSingle,
        Self::IsPage,
        Self::IsPost,
        Self::IsSingular,
        Self::IsPostType,
        Self::IsUrl,
        Self::IsFrontPage,
        Self::IsHome,
        Self::IsArchive,
        Self::IsSearch,
        Self::Is404,
        Self::IsUserLoggedIn,
    ];

    /// Look a predicate up by the name used in expressions.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// The name used in expressions.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::IsSingle => "is_single",
            Self::IsPage => "is_page",
            Self::IsPost => "is_post",
            Self::IsSingular => "is_singular",
            Self::IsPostType => "is_post_type",
            Self::IsUrl => "is_url",
            Self::IsFrontPage => "is_front_page",
            Self::IsHome => "is_home",
            Self::IsArchive => "is_archive",
            Self::IsSearch => "is_search",
            Self::Is404 => "is_404",
            Self::IsUserLoggedIn => "is_user_logged_in",
        }
    }

    /// Evaluate against the context. Flag predicates ignore their arguments.
    pub fn evaluate(self, args: &[String], ctx: &dyn RequestContext) -> bool {
        match self {
            Self::IsSingle => ctx.is_single(args),
            Self::IsPage => ctx.is_page(args),
            Self::IsPost => ctx.is_post(args),
            Self::IsSingular => ctx.is_singular(args),
            Self::IsPostType => ctx.is_post_type(args),
            Self::IsUrl => ctx.is_url(args),
            Self::IsFrontPage => ctx.has_flag(PageFlag::FrontPage),
            Self::IsHome => ctx.has_flag(PageFlag::Home),
            Self::IsArchive => ctx.has_flag(PageFlag::Archive),
            Self::IsSearch => ctx.has_flag(PageFlag::Search),
            Self::Is404 => ctx.has_flag(PageFlag::NotFound),
            Self::IsUserLoggedIn => ctx.has_flag(PageFlag::LoggedIn),
        }
    }
}

/// A predicate call with its flattened literal arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Which predicate.
    pub predicate: ManualPredicate,
    /// Literal arguments, numbers kept in their textual form.
    pub args: Vec<String>,
}

/// Parsed `manual` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `true` / `false`.
    Literal(bool),
    /// A whitelisted predicate call.
    Call(Call),
    /// All must hold. Short-circuits on the first `false`.
    And(Vec<Expr>),
    /// Any must hold. Short-circuits on the first `true`.
    Or(Vec<Expr>),
    /// Negation.
    Not(Box<Expr>),
}

impl Expr {
    /// Parse an expression.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError`] for lexical or syntax errors, calls to predicates
    /// outside the whitelist, nesting deeper than [`MAX_DEPTH`](crate::MAX_DEPTH)
    /// or calls with more than [`MAX_CALL_ARGS`](crate::MAX_CALL_ARGS) arguments.
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = lexer::tokenize(source)?;
        parser::Parser::new(tokens, source.len()).parse()
    }

    /// Evaluate against the request context.
    pub fn evaluate(&self, ctx: &dyn RequestContext) -> bool {
        match self {
            Self::Literal(b) => *b,
            Self::Call(call) => call.predicate.evaluate(&call.args, ctx),
            Self::And(terms) => terms.iter().all(|t| t.evaluate(ctx)),
            Self::Or(terms) => terms.iter().any(|t| t.evaluate(ctx)),
            Self::Not(inner) => !inner.evaluate(ctx),
        }
    }

    /// Depth of the expression tree.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Literal(_) | Self::Call(_) => 1,
            Self::And(terms) | Self::Or(terms) => {
                1 + terms.iter().map(Expr::depth).max().unwrap_or(0)
            }
            Self::Not(inner) => 1 + inner.depth(),
        }
    }
}

/// Canonical form: fully parenthesized compounds, single-quoted arguments.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(b) => write!(f, "{b}"),
            Self::Call(call) => {
                write!(f, "{}(", call.predicate.name())?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}'", arg.replace('\\', "\\\\").replace('\'', "\\'"))?;
                }
                f.write_str(")")
            }
            Self::And(terms) => write_joined(f, terms, " && "),
            Self::Or(terms) => write_joined(f, terms, " || "),
            Self::Not(inner) => write!(f, "!{inner}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, terms: &[Expr], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{term}")?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PageView, QueriedObject};

    fn contact_page() -> PageView {
        PageView::builder()
            .queried(QueriedObject::page(5, "contact"))
            .path("/contact/")
            .build()
    }

    fn eval(source: &str, ctx: &PageView) -> bool {
        Expr::parse(source).unwrap().evaluate(ctx)
    }

    #[test]
    fn call_with_numeric_and_string_arguments() {
        let ctx = contact_page();
        assert!(eval("is_page(5)", &ctx));
        assert!(eval("is_page('contact')", &ctx));
        assert!(eval("is_page(1, 3, \"contact\")", &ctx));
        assert!(!eval("is_page(7)", &ctx));
    }

    #[test]
    fn bare_name_and_empty_call_match_any() {
        let ctx = contact_page();
        assert!(eval("is_page", &ctx));
        assert!(eval("is_page()", &ctx));
        assert!(!eval("is_single()", &ctx));
    }

    #[test]
    fn php_and_bracket_arrays_flatten() {
        let ctx = contact_page();
        assert!(eval("is_page(array('about', 'contact'))", &ctx));
        assert!(eval("is_page([1, [2, 5]])", &ctx));
        let parsed = Expr::parse("is_page(array(1, 2), 3)").unwrap();
        assert_eq!(
            parsed,
            Expr::Call(Call {
                predicate: ManualPredicate::IsPage,
                args: vec!["1".into(), "2".into(), "3".into()],
            })
        );
    }

    #[test]
    fn boolean_operators_and_precedence() {
        let ctx = contact_page();
        assert!(eval("is_single() || is_page(5)", &ctx));
        assert!(!eval("is_single() || is_page(5) && is_404()", &ctx));
        assert!(eval("(is_single() || is_page(5)) && !is_404()", &ctx));
        assert!(eval("not is_search() and is_url('/contact')", &ctx));
        assert!(eval("true", &ctx));
        assert!(!eval("!true", &ctx));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let parsed = Expr::parse("is_home || is_search && is_404").unwrap();
        let Expr::Or(terms) = parsed else {
            panic!("expected Or at the root");
        };
        assert_eq!(terms.len(), 2);
        assert!(matches!(terms[1], Expr::And(_)));
    }

    #[test]
    fn unknown_predicate_names_the_call() {
        assert_eq!(
            Expr::parse("is_home() || wp_delete_post(5)"),
            Err(ExprError::UnknownPredicate {
                name: "wp_delete_post".into()
            })
        );
    }

    #[test]
    fn flags() {
        let ctx = PageView::builder()
            .flag(PageFlag::FrontPage)
            .flag(PageFlag::LoggedIn)
            .build();
        assert!(eval("is_front_page() && is_user_logged_in()", &ctx));
        assert!(!eval("is_home() || is_archive() || is_search() || is_404()", &ctx));
    }

    #[test]
    fn rejects_arbitrary_code() {
        for source in [
            "system('rm -rf /')",
            "$_GET['x']",
            "is_page(5); exit",
            "is_page(get_option('x'))",
            "phpinfo()",
        ] {
            assert!(Expr::parse(source).is_err(), "{source}");
        }
    }

    #[test]
    fn syntax_errors() {
        assert_eq!(Expr::parse("   "), Err(ExprError::Empty));
        assert!(matches!(
            Expr::parse("is_page(5"),
            Err(ExprError::UnexpectedToken { found, .. }) if found == "end of input"
        ));
        assert!(matches!(
            Expr::parse("is_page(5) is_home"),
            Err(ExprError::UnexpectedToken { expected: "end of expression", .. })
        ));
        assert!(matches!(
            Expr::parse("is_page(5,)"),
            Err(ExprError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            Expr::parse("&& is_home"),
            Err(ExprError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn depth_limit() {
        let deep = format!("{}true{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(
            Expr::parse(&deep),
            Err(ExprError::DepthExceeded {
                max: crate::MAX_DEPTH
            })
        );

        let nots = format!("{}true", "!".repeat(40));
        assert!(matches!(
            Expr::parse(&nots),
            Err(ExprError::DepthExceeded { .. })
        ));

        let ok = format!("{}true{}", "(".repeat(8), ")".repeat(8));
        assert!(Expr::parse(&ok).is_ok());
    }

    #[test]
    fn argument_limit() {
        let args = (0..=crate::MAX_CALL_ARGS)
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");
        assert!(matches!(
            Expr::parse(&format!("is_page({args})")),
            Err(ExprError::TooManyArguments { .. })
        ));
    }

    #[test]
    fn display_is_reparseable() {
        let source = "is_page(array('a', \"it's\")) || !(is_home && is_search())";
        let parsed = Expr::parse(source).unwrap();
        let printed = parsed.to_string();
        assert_eq!(Expr::parse(&printed).unwrap(), parsed);
    }

    #[test]
    fn depth_counts_nesting() {
        assert_eq!(Expr::parse("is_home").unwrap().depth(), 1);
        assert_eq!(Expr::parse("!is_home").unwrap().depth(), 2);
        assert_eq!(Expr::parse("is_home && !is_404").unwrap().depth(), 3);
    }

    #[test]
    fn every_predicate_is_reachable_by_name() {
        for p in ManualPredicate::ALL {
            assert_eq!(ManualPredicate::from_name(p.name()), Some(p));
        }
        assert_eq!(ManualPredicate::from_name("IS_PAGE"), None);
    }
}
