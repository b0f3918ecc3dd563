//! Checker configuration surface, as named in the specification's
//! external-interfaces section. A plain struct with a `Default` impl and a
//! small builder, rather than flags read from a global or thread-local —
//! every pass receives it by reference.

/// Access-check strictness, mirroring historical corpora that disagreed on
/// whether an unspecified access modifier defaults to the most restrictive
/// or most permissive reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AccessCheckMode {
    Strict,
    #[default]
    NotSpecifiedUnrestricted,
    NotSpecifiedRestricted,
}

/// Which base values are pre-declared in every program's outermost scope
/// before the Declaration Resolver walks user declarations. The checker
/// core does not define the registry's contents (out of scope, §1); this
/// only names the activation strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BaseValueActivation {
    #[default]
    PredeclaredValues,
}

/// Configuration record accepted by `check()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckerConfig {
    pub access_check_mode: AccessCheckMode,
    pub base_value_activation: BaseValueActivation,
    /// Gates whether interface members may carry executable bodies
    /// (`default implementations`, §9). Defaults to `true`.
    pub default_implementations_enabled: bool,
    /// Gates whether an interface may declare `: SuperInterface` and the
    /// transitive-closure obligations in §4.4 rule 3 apply. Defaults to
    /// `true`; disabling it degrades interface inheritance to a flat,
    /// single-level conformance check (no transitive closure, no cycle
    /// detection beyond direct self-reference).
    pub interface_inheritance_enabled: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            access_check_mode: AccessCheckMode::default(),
            base_value_activation: BaseValueActivation::default(),
            default_implementations_enabled: true,
            interface_inheritance_enabled: true,
        }
    }
}

impl CheckerConfig {
    #[must_use]
    pub fn with_access_check_mode(mut self, mode: AccessCheckMode) -> Self {
        self.access_check_mode = mode;
        self
    }

    #[must_use]
    pub fn with_default_implementations(mut self, enabled: bool) -> Self {
        self.default_implementations_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_interface_inheritance(mut self, enabled: bool) -> Self {
        self.interface_inheritance_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_the_richer_semantics() {
        let config = CheckerConfig::default();
        assert!(config.default_implementations_enabled);
        assert!(config.interface_inheritance_enabled);
        assert_eq!(config.access_check_mode, AccessCheckMode::NotSpecifiedUnrestricted);
    }

    #[test]
    fn builder_overrides_fields() {
        let config = CheckerConfig::default()
            .with_default_implementations(false)
            .with_interface_inheritance(false);
        assert!(!config.default_implementations_enabled);
        assert!(!config.interface_inheritance_enabled);
    }
}
