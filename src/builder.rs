use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::{self, NameCase};
use crate::entry::EntryId;
use crate::error::ParseErrorKind;
use crate::registry::AdapterRegistry;
use crate::results::Reconciliation;
use crate::traits::{Adapter, SnapshotCache, Visibility};
use crate::visibility::{HideDotfiles, ShowAll};

// ---------------------------------------------------------------------------
// ReconcileOptions
// ---------------------------------------------------------------------------

/// Plain-data settings, suitable for loading from a host's config file.
///
/// Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Duplicate-name rule. Defaults to the host platform's.
    pub name_case: NameCase,

    /// Expect dotfiles in the listing. Off by default.
    pub show_hidden: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            name_case:   NameCase::platform(),
            show_hidden: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ReconcileBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and running a reconciliation pass.
///
/// Created via [`relist::reconcile()`](crate::reconcile). Configure with
/// chained builder methods, then call [`run()`](ReconcileBuilder::run).
///
/// # Example
///
/// ```rust,ignore
/// let result = relist::reconcile()
///     .registry(AdapterRegistry::with_local())
///     .show_hidden(true)
///     .run(&snapshot, "file:///home/me/", &lines);
/// ```
pub struct ReconcileBuilder {
    registry:   AdapterRegistry,
    visibility: Option<Box<dyn Visibility>>,
    options:    ReconcileOptions,
}

impl Default for ReconcileBuilder {
    fn default() -> Self {
        Self {
            registry:   AdapterRegistry::with_local(),
            visibility: None,
            options:    ReconcileOptions::default(),
        }
    }
}

impl ReconcileBuilder {
    // ── Adapters ──────────────────────────────────────────────────────────

    /// Replace the adapter registry. The default knows only `file://`.
    pub fn registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register one more adapter for `scheme`.
    pub fn adapter(mut self, scheme: impl Into<String>, adapter: impl Adapter + 'static) -> Self {
        self.registry = self.registry.register(scheme, adapter);
        self
    }

    // ── Visibility ────────────────────────────────────────────────────────

    /// Set a custom visibility policy. Overrides `.show_hidden()`.
    pub fn visibility(mut self, v: impl Visibility + 'static) -> Self {
        self.visibility = Some(Box::new(v));
        self
    }

    /// Shorthand for the two built-in policies: everything, or no dotfiles.
    pub fn show_hidden(mut self, yes: bool) -> Self {
        self.options.show_hidden = yes;
        self
    }

    // ── Options ───────────────────────────────────────────────────────────

    /// Duplicate detection rule. Defaults to [`NameCase::platform()`].
    pub fn name_case(mut self, case: NameCase) -> Self {
        self.options.name_case = case;
        self
    }

    /// Apply a whole [`ReconcileOptions`] at once.
    pub fn options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Reconcile `lines`, the edited listing of the directory at `url`.
    ///
    /// The cache is borrowed for the whole pass and never re-read.
    ///
    /// Never fails: if no adapter handles `url` the result holds a single
    /// [`AdapterUnavailable`](ParseErrorKind::AdapterUnavailable) error and
    /// no diffs.
    pub fn run<C, I>(&self, cache: &C, url: &str, lines: I) -> Reconciliation
    where
        C: SnapshotCache + ?Sized,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let Some((adapter, _path)) = self.registry.resolve(url) else {
            warn!(url, "no adapter for buffer");
            return Reconciliation::fatal(ParseErrorKind::AdapterUnavailable(url.to_string()));
        };

        let columns = adapter.supported_columns();
        let visibility: &dyn Visibility = match (&self.visibility, self.options.show_hidden) {
            (Some(v), _)  => v.as_ref(),
            (None, true)  => &ShowAll,
            (None, false) => &HideDotfiles,
        };

        let working: BTreeMap<String, EntryId> = cache
            .list_children(url)
            .into_iter()
            .filter(|e| visibility.is_visible(e))
            .map(|e| (e.name.clone(), e.id))
            .collect();

        engine::reconcile(lines, cache, working, &columns, self.options.name_case)
    }
}
