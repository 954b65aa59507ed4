//! Named locators for UI elements.
//!
//! A [`Target`] pairs a human-readable name (used in errors and logs) with a
//! [`Locator`] the session knows how to resolve. Targets are plain values:
//! they are resolved against the session on each use and never cache the
//! element they found.
//!
//! # Example
//!
//! ```
//! use tapline_core::target::{Locator, Target};
//!
//! let login = Target::the("login button").located_by(Locator::accessibility_id("login"));
//! assert_eq!(login.name(), "login button");
//! assert_eq!(login.locator().strategy.as_str(), "accessibility id");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Element lookup strategies understood by WebDriver/Appium backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Id,
    AccessibilityId,
    Xpath,
    ClassName,
    CssSelector,
    AndroidUiAutomator,
    IosPredicate,
    IosClassChain,
}

impl Strategy {
    /// The `using` value sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Id => "id",
            Strategy::AccessibilityId => "accessibility id",
            Strategy::Xpath => "xpath",
            Strategy::ClassName => "class name",
            Strategy::CssSelector => "css selector",
            Strategy::AndroidUiAutomator => "-android uiautomator",
            Strategy::IosPredicate => "-ios predicate string",
            Strategy::IosClassChain => "-ios class chain",
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    /// Accepts both the wire form (`"accessibility id"`) and the kebab-case
    /// form (`"accessibility-id"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('-').replace([' ', '_'], "-");
        match normalized.to_ascii_lowercase().as_str() {
            "id" => Ok(Strategy::Id),
            "accessibility-id" | "a11y" => Ok(Strategy::AccessibilityId),
            "xpath" => Ok(Strategy::Xpath),
            "class-name" | "class" => Ok(Strategy::ClassName),
            "css-selector" | "css" => Ok(Strategy::CssSelector),
            "android-uiautomator" => Ok(Strategy::AndroidUiAutomator),
            "ios-predicate-string" | "ios-predicate" => Ok(Strategy::IosPredicate),
            "ios-class-chain" => Ok(Strategy::IosClassChain),
            _ => Err(format!("unknown locator strategy '{s}'")),
        }
    }
}

/// How to find an element: a strategy and its query value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub strategy: Strategy,
    pub value: String,
}

impl Locator {
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    pub fn accessibility_id(value: impl Into<String>) -> Self {
        Self::new(Strategy::AccessibilityId, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::Xpath, value)
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, value)
    }

    pub fn android_uiautomator(value: impl Into<String>) -> Self {
        Self::new(Strategy::AndroidUiAutomator, value)
    }

    pub fn ios_predicate(value: impl Into<String>) -> Self {
        Self::new(Strategy::IosPredicate, value)
    }

    pub fn ios_class_chain(value: impl Into<String>) -> Self {
        Self::new(Strategy::IosClassChain, value)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.as_str(), self.value)
    }
}

/// A named element reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    name: String,
    locator: Locator,
}

/// Intermediate value returned by [`Target::the`]; finish with
/// [`located_by`](TargetName::located_by).
#[derive(Debug, Clone)]
pub struct TargetName(String);

impl TargetName {
    pub fn located_by(self, locator: Locator) -> Target {
        Target {
            name: self.0,
            locator,
        }
    }
}

impl Target {
    /// Starts a target definition with a human-readable name.
    pub fn the(name: impl Into<String>) -> TargetName {
        TargetName(name.into())
    }

    pub fn new(name: impl Into<String>, locator: Locator) -> Self {
        Self {
            name: name.into(),
            locator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_round_trips_through_wire_names() {
        for strategy in [
            Strategy::Id,
            Strategy::AccessibilityId,
            Strategy::Xpath,
            Strategy::ClassName,
            Strategy::CssSelector,
            Strategy::AndroidUiAutomator,
            Strategy::IosPredicate,
            Strategy::IosClassChain,
        ] {
            assert_eq!(strategy.as_str().parse::<Strategy>(), Ok(strategy));
        }
    }

    #[test]
    fn strategy_accepts_cli_spellings() {
        assert_eq!("accessibility-id".parse::<Strategy>(), Ok(Strategy::AccessibilityId));
        assert_eq!("css".parse::<Strategy>(), Ok(Strategy::CssSelector));
        assert_eq!("ios-predicate".parse::<Strategy>(), Ok(Strategy::IosPredicate));
        assert!("by-magic".parse::<Strategy>().is_err());
    }

    #[test]
    fn target_displays_its_name() {
        let target = Target::the("products list").located_by(Locator::xpath("//list"));
        assert_eq!(target.to_string(), "products list");
        assert_eq!(target.locator().to_string(), "xpath=//list");
    }
}
