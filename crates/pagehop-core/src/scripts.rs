//! Script replay after a content swap.
//!
//! Script elements inserted through structured content assignment do not
//! execute in a browser, so after every body swap each script in the
//! affected scope is rewritten: a fresh node is created, attributes and text
//! are copied over, and the fresh node replaces the original in place. The
//! actual "run" is delegated to a [`ScriptRunner`], which keeps execution an
//! explicit, assertable step rather than a hidden side effect of tree
//! surgery.
//!
//! One opt-out is honored: `<script state="save">` is excluded from replay,
//! for embedded widgets that must keep their state across transitions.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::dom::{Attr, Dom, NodeData, NodeId};

/// Attribute name marking a script as persistent across navigations.
pub const PERSIST_ATTR: &str = "state";
/// Attribute value marking a script as persistent across navigations.
pub const PERSIST_VALUE: &str = "save";

/// A script handed to the runner: its attributes and executable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedScript {
    /// Attributes copied onto the fresh node, document order.
    pub attrs: Vec<Attr>,
    /// The script's text content, copied verbatim.
    pub text: String,
}

/// Executes materialized scripts.
///
/// The engine calls [`ScriptRunner::run`] once per replayed script, in
/// document order. A headless embedder can interpret, forward, or just
/// record them.
pub trait ScriptRunner: Send + Sync {
    /// Execute one materialized script.
    fn run(&mut self, script: &MaterializedScript);
}

/// Runner that only logs. The default when an embedder has no script host.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRunner;

impl ScriptRunner for LoggingRunner {
    fn run(&mut self, script: &MaterializedScript) {
        debug!("materialized script ({} bytes)", script.text.len());
    }
}

/// Runner that records every materialized script, in order.
///
/// Cloning shares the underlying record, so a caller can keep a handle
/// while the router owns the runner.
#[derive(Debug, Default, Clone)]
pub struct RecordingRunner {
    runs: Arc<Mutex<Vec<MaterializedScript>>>,
}

impl RecordingRunner {
    /// Create an empty recording runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every script run so far, in execution order.
    #[must_use]
    pub fn runs(&self) -> Vec<MaterializedScript> {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ScriptRunner for RecordingRunner {
    fn run(&mut self, script: &MaterializedScript) {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(script.clone());
    }
}

/// Replay every non-persistent script under `scope`.
///
/// Each affected script is replaced in place by a freshly created node with
/// the same attributes and text, then materialized through `runner`.
/// Returns the number of scripts replayed.
pub fn replay_scripts(dom: &mut Dom, scope: NodeId, runner: &mut dyn ScriptRunner) -> usize {
    let mut replayed = 0;
    for script in dom.elements_by_tag(scope, "script") {
        if dom.attr(script, PERSIST_ATTR) == Some(PERSIST_VALUE) {
            continue;
        }

        let Some(NodeData::Element { name, attrs }) = dom.get(script).map(|n| &n.data) else {
            continue;
        };
        let name = name.clone();
        let attrs = attrs.clone();
        let text = dom.text_content(script);

        let fresh = dom.create_element(name, attrs.clone());
        if !text.is_empty() {
            let text_node = dom.create_text(text.clone());
            dom.append(fresh, text_node);
        }
        dom.replace_node(script, fresh);

        runner.run(&MaterializedScript { attrs, text });
        replayed += 1;
    }
    replayed
}
