//! Cache rule tree and most-specific-wins resolution.
//!
//! The tree is keyed by `"*"` (every group) or a group name. A group value is
//! either a directive for the whole group or a map keyed by `"*"` / endpoint
//! name. A directive is the literal `"disabled"` or a settings table:
//!
//! ```toml
//! [cache."*"]
//! adapter = "memory"
//! lifetime_secs = 20
//!
//! [cache.users]
//! "*" = "disabled"
//! userInfo = { adapter = "memory", lifetime_secs = 60 }
//! ```
//!
//! Resolution order, first populated level wins:
//! group endpoint > group `"*"` / group directive > `"*"` endpoint >
//! `"*"` directive > disabled.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Key matching every group or every endpoint
pub const WILDCARD: &str = "*";

/// Default adapter name used when a settings table omits `adapter`
pub const DEFAULT_ADAPTER: &str = "memory";

/// Settings handed to the selected cache adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    /// Name of the registered adapter that stores entries
    #[serde(default = "default_adapter")]
    pub adapter: String,

    /// Entries older than this are treated as absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_secs: Option<u64>,
}

fn default_adapter() -> String {
    DEFAULT_ADAPTER.to_string()
}

impl CacheSettings {
    pub fn new(adapter: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            lifetime_secs: None,
        }
    }

    /// Set the lifetime, rounding sub-second remainders up to a whole second
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        let round_up = u64::from(lifetime.subsec_nanos() > 0);
        self.lifetime_secs = Some(lifetime.as_secs().saturating_add(round_up));
        self
    }

    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime_secs.map(Duration::from_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::new(DEFAULT_ADAPTER)
    }
}

/// The "do not cache" literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSentinel {
    Disabled,
}

/// Either the disable sentinel or settings enabling the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheDirective {
    Off(CacheSentinel),
    On(CacheSettings),
}

impl CacheDirective {
    pub fn disabled() -> Self {
        CacheDirective::Off(CacheSentinel::Disabled)
    }

    pub fn settings(&self) -> Option<&CacheSettings> {
        match self {
            CacheDirective::Off(_) => None,
            CacheDirective::On(settings) => Some(settings),
        }
    }
}

impl From<CacheSettings> for CacheDirective {
    fn from(settings: CacheSettings) -> Self {
        CacheDirective::On(settings)
    }
}

/// Rule attached to a top-level key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupCacheRule {
    Directive(CacheDirective),
    Endpoints(BTreeMap<String, CacheDirective>),
}

impl GroupCacheRule {
    /// Directive for `endpoint` at this level, if any
    fn lookup(&self, endpoint: &str) -> Option<&CacheDirective> {
        match self {
            GroupCacheRule::Directive(directive) => Some(directive),
            GroupCacheRule::Endpoints(map) => map.get(endpoint).or_else(|| map.get(WILDCARD)),
        }
    }

    /// Directive that names `endpoint` explicitly, ignoring wildcards
    fn lookup_exact(&self, endpoint: &str) -> Option<&CacheDirective> {
        match self {
            GroupCacheRule::Directive(_) => None,
            GroupCacheRule::Endpoints(map) => map.get(endpoint),
        }
    }

    /// Every directive stored under this key
    pub fn directives(&self) -> Box<dyn Iterator<Item = &CacheDirective> + '_> {
        match self {
            GroupCacheRule::Directive(directive) => Box::new(std::iter::once(directive)),
            GroupCacheRule::Endpoints(map) => Box::new(map.values()),
        }
    }
}

/// The whole cache configuration surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheRules(BTreeMap<String, GroupCacheRule>);

impl CacheRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rule for a group, or for every group with `"*"`
    pub fn set_group(&mut self, group: impl Into<String>, directive: impl Into<CacheDirective>) {
        self.0
            .insert(group.into(), GroupCacheRule::Directive(directive.into()));
    }

    /// Set the rule for one endpoint of a group
    ///
    /// A directive already set for the whole group is kept as the group's
    /// `"*"` entry.
    pub fn set_endpoint(
        &mut self,
        group: impl Into<String>,
        endpoint: impl Into<String>,
        directive: impl Into<CacheDirective>,
    ) {
        let entry = self
            .0
            .entry(group.into())
            .or_insert_with(|| GroupCacheRule::Endpoints(BTreeMap::new()));

        if let GroupCacheRule::Directive(existing) = entry {
            let mut map = BTreeMap::new();
            map.insert(WILDCARD.to_string(), existing.clone());
            *entry = GroupCacheRule::Endpoints(map);
        }

        if let GroupCacheRule::Endpoints(map) = entry {
            map.insert(endpoint.into(), directive.into());
        }
    }

    /// Insert a top-level rule unless one already exists for that key
    pub fn insert_if_absent(&mut self, key: String, rule: GroupCacheRule) {
        self.0.entry(key).or_insert(rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GroupCacheRule)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most specific directive for an endpoint, or `None` when nothing matches
    pub fn resolve_directive(&self, group: &str, endpoint: &str) -> Option<&CacheDirective> {
        if let Some(directive) = self.0.get(group).and_then(|rule| rule.lookup(endpoint)) {
            return Some(directive);
        }

        let global = self.0.get(WILDCARD)?;
        global
            .lookup_exact(endpoint)
            .or_else(|| global.lookup(WILDCARD))
    }

    /// Effective settings for an endpoint; `None` means caching is off
    pub fn resolve(&self, group: &str, endpoint: &str) -> Option<&CacheSettings> {
        self.resolve_directive(group, endpoint)
            .and_then(CacheDirective::settings)
    }

    /// Every adapter name referenced anywhere in the tree
    pub fn adapter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .0
            .values()
            .flat_map(GroupCacheRule::directives)
            .filter_map(CacheDirective::settings)
            .map(|settings| settings.adapter.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
