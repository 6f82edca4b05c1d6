//! Quackc - driver for the quack analyzer.
//!
//! A [`Processor`] owns everything that outlives a single source unit: the
//! string interner, the node arena and the class registry (bootstrapped from
//! [`core`] and then sealed). Each unit is processed into an [`Outcome`]
//! holding its issues and the value of its last top-level expression.
//!
//! Turning source text into a tree is the job of a [`Parser`]; trees can
//! also be built directly with [`Processor::builder`].

pub mod core;

use std::sync::Once;

use quack_diagnostic::{Issue, IssueKind, IssueLog};
use quack_eval::{EvalConfig, Evaluator, SharedRegistry};
use quack_ir::{desugar, NodeArena, NodeId, StringInterner, TreeBuilder};
use quack_types::{ClassId, ClassRegistry, RegistryError, Value};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=quack_eval=debug` or `RUST_LOG=quack_eval=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// A parser failure, reported at the line the parser gave up on.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub message: String,
}

/// Turns source text into an expression tree.
pub trait Parser {
    /// Parse `source`, allocating nodes through `builder`, and return the
    /// root node.
    ///
    /// # Errors
    /// A [`ParseError`] when `source` is not well-formed.
    fn parse(&mut self, source: &str, builder: &mut TreeBuilder<'_>) -> Result<NodeId, ParseError>;
}

/// The result of processing one unit.
#[derive(Clone, Debug)]
pub struct Outcome {
    /// Issues in the order they were found.
    pub issues: Vec<Issue>,
    /// Value of the last top-level expression; `Broken` when the unit did
    /// not parse.
    pub result: Value,
}

impl Outcome {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

pub struct Processor {
    interner: StringInterner,
    arena: NodeArena,
    registry: SharedRegistry,
    config: EvalConfig,
}

impl Processor {
    /// A processor with the core classes and methods installed.
    ///
    /// # Errors
    /// Propagates a [`RegistryError`] from a malformed bootstrap entry.
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(EvalConfig::default())
    }

    /// Like [`Processor::new`], with custom evaluation limits.
    ///
    /// # Errors
    /// Propagates a [`RegistryError`] from a malformed bootstrap entry.
    pub fn with_config(config: EvalConfig) -> Result<Self, RegistryError> {
        let interner = StringInterner::new();
        let mut registry = ClassRegistry::new();
        core::install(&mut registry, &interner)?;
        registry.seal();
        Ok(Processor {
            interner,
            arena: NodeArena::new(),
            registry: SharedRegistry::new(registry),
            config,
        })
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn config(&self) -> EvalConfig {
        self.config
    }

    /// Builder allocating into this processor's arena.
    ///
    /// Nodes stay alive for the life of the processor, so methods defined by
    /// one unit remain callable from the next.
    pub fn builder(&mut self) -> TreeBuilder<'_> {
        TreeBuilder::new(&mut self.arena, &self.interner)
    }

    /// Parse and analyze one unit.
    ///
    /// A parse failure produces exactly one `ParseFailure` issue and no
    /// evaluation.
    pub fn process_source<P: Parser + ?Sized>(
        &mut self,
        parser: &mut P,
        source: &str,
        path: &str,
    ) -> Outcome {
        let parsed = {
            let mut builder = TreeBuilder::new(&mut self.arena, &self.interner);
            parser.parse(source, &mut builder)
        };
        match parsed {
            Ok(root) => self.process_tree(root, path),
            Err(error) => {
                tracing::debug!(path, %error, "unit failed to parse");
                let mut log = IssueLog::new(path);
                log.report(IssueKind::ParseFailure, error.line, error.message);
                Outcome {
                    issues: log.into_issues(),
                    result: Value::Broken,
                }
            }
        }
    }

    /// Analyze a tree already built in this processor's arena.
    #[tracing::instrument(level = "debug", skip(self), fields(root = root.raw()))]
    pub fn process_tree(&mut self, root: NodeId, path: &str) -> Outcome {
        desugar(&mut self.arena);
        let mut evaluator = Evaluator::new(
            &self.arena,
            &self.interner,
            &self.registry,
            self.config,
            IssueLog::new(path),
        );
        let result = evaluator.evaluate(root);
        let issues = evaluator.into_issues().into_issues();
        tracing::debug!(issues = issues.len(), "unit processed");
        Outcome { issues, result }
    }

    /// Render a value the way issue messages do, e.g. `Maybe(2:Integer |
    /// 2.5:Float)`.
    pub fn describe(&self, value: &Value) -> String {
        value.describe(&self.registry.read(), &self.interner)
    }

    /// Element type of a single array value.
    pub fn element_type(&self, value: &Value) -> Option<Value> {
        let Value::Instance(instance) = value else {
            return None;
        };
        let registry = self.registry.read();
        let element = registry
            .is_subclass_of(instance.class, ClassId::ARRAY)
            .then(|| registry.element_value(instance));
        element
    }

    /// Name of the class of a single-instance value.
    pub fn class_name(&self, value: &Value) -> Option<String> {
        let Value::Instance(instance) = value else {
            return None;
        };
        let registry = self.registry.read();
        Some(
            self.interner
                .lookup(registry.class(instance.class).name)
                .to_owned(),
        )
    }
}
