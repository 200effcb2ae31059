//! Global configuration.
//!
//! Field names deserialize from camelCase so hosts can pass the same option
//! objects the JavaScript API accepts. Every section has defaults; element
//! attributes override individual values at scan time.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level options, one section per effect.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    #[serde(deserialize_with = "flag_or_section")]
    pub animation: AnimationOptions,
    pub parallax: ParallaxOptions,
    pub count: CounterOptions,
    pub roller: CounterOptions,
    pub ticker: TickerOptions,
    #[serde(deserialize_with = "flag_or_section")]
    pub text: TextOptions,
}

impl Options {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Accepts either a section object or a bare boolean (`animation: true`),
/// which selects the defaults.
fn flag_or_section<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlagOr<T> {
        Flag(bool),
        Section(T),
    }
    Ok(match Option::<FlagOr<T>>::deserialize(d)? {
        Some(FlagOr::Section(v)) => v,
        Some(FlagOr::Flag(_)) | None => T::default(),
    })
}

/// Entrance animations (`data-mf-animation`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationOptions {
    pub once: bool,
    /// Travel distance in px, exposed as `--mf-distance`.
    pub distance: f64,
    /// Milliseconds, exposed as `--mf-duration`.
    pub duration: f64,
    /// Milliseconds, exposed as `--mf-delay`.
    pub delay: f64,
    /// Easing name (see [`crate::easing`]) or a raw CSS timing function.
    pub easing: String,
    pub trigger: String,
    pub repeat: String,
    pub stagger: StaggerOptions,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            once: false,
            distance: 100.0,
            duration: 600.0,
            delay: 0.0,
            easing: "ease".into(),
            trigger: "top 90%".into(),
            repeat: "both".into(),
            stagger: StaggerOptions::default(),
        }
    }
}

/// Group overrides for `data-mf-stagger-animation` parents. Unset fields
/// fall back to [`AnimationOptions`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StaggerOptions {
    pub delay: Option<f64>,
    pub gap: Option<f64>,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub easing: Option<String>,
    pub once: Option<bool>,
    pub repeat: Option<String>,
    pub trigger: Option<String>,
}

pub const DEFAULT_STAGGER_GAP: f64 = 100.0;

/// Viewport width breakpoints (inclusive upper bounds).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoints {
    pub mobile: f64,
    pub tablet: f64,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            mobile: 768.0,
            tablet: 1024.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Breakpoint {
    Mobile,
    Tablet,
    Desktop,
}

impl Breakpoints {
    pub fn classify(&self, width: f64) -> Breakpoint {
        if width <= self.mobile {
            Breakpoint::Mobile
        } else if width <= self.tablet {
            Breakpoint::Tablet
        } else {
            Breakpoint::Desktop
        }
    }
}

/// A value with per-breakpoint variants.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PerBreakpoint {
    pub desktop: f64,
    pub tablet: f64,
    pub mobile: f64,
}

impl PerBreakpoint {
    pub fn pick(&self, bp: Breakpoint) -> f64 {
        match bp {
            Breakpoint::Mobile => self.mobile,
            Breakpoint::Tablet => self.tablet,
            Breakpoint::Desktop => self.desktop,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParallaxOptions {
    pub speed: f64,
    pub tablet_speed: f64,
    pub mobile_speed: f64,
    pub breakpoints: Breakpoints,
    pub stagger: ParallaxStaggerOptions,
}

impl Default for ParallaxOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            tablet_speed: 0.0,
            mobile_speed: 0.0,
            breakpoints: Breakpoints::default(),
            stagger: ParallaxStaggerOptions::default(),
        }
    }
}

impl ParallaxOptions {
    pub fn speeds(&self) -> PerBreakpoint {
        PerBreakpoint {
            desktop: self.speed,
            tablet: self.tablet_speed,
            mobile: self.mobile_speed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParallaxStaggerOptions {
    pub speed: f64,
    pub tablet_speed: f64,
    pub mobile_speed: f64,
    pub step: f64,
    pub tablet_step: f64,
    pub mobile_step: f64,
    /// `left`, `right` or `center`.
    pub direction: String,
}

impl Default for ParallaxStaggerOptions {
    fn default() -> Self {
        Self {
            speed: 0.0,
            tablet_speed: 0.0,
            mobile_speed: 0.0,
            step: 0.3,
            tablet_step: 0.2,
            mobile_step: 0.1,
            direction: "left".into(),
        }
    }
}

impl ParallaxStaggerOptions {
    pub fn speeds(&self) -> PerBreakpoint {
        PerBreakpoint {
            desktop: self.speed,
            tablet: self.tablet_speed,
            mobile: self.mobile_speed,
        }
    }

    pub fn steps(&self) -> PerBreakpoint {
        PerBreakpoint {
            desktop: self.step,
            tablet: self.tablet_step,
            mobile: self.mobile_step,
        }
    }
}

/// Shared by the `count` and `roller` sections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CounterOptions {
    pub from: f64,
    pub once: bool,
    pub repeat: String,
    /// Milliseconds.
    pub duration: f64,
    pub trigger: String,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            from: 0.0,
            once: false,
            repeat: "both".into(),
            duration: 1200.0,
            trigger: "top 90%".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TickerOptions {
    /// Pixels per second.
    pub speed: f64,
    pub direction: String,
    /// Start every ticker paused (also disables hover pausing).
    pub pause: bool,
    pub pause_on_hover: bool,
    pub pause_on_visibility_change: bool,
}

impl Default for TickerOptions {
    fn default() -> Self {
        Self {
            speed: 80.0,
            direction: "left".into(),
            pause: false,
            pause_on_hover: false,
            pause_on_visibility_change: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextOptions {
    #[serde(rename = "loop")]
    pub cycle: TextLoopOptions,
    pub typing: TypingOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextLoopOptions {
    pub interval: f64,
    pub animation: String,
    pub duration: f64,
    pub easing: String,
    pub distance: f64,
}

impl Default for TextLoopOptions {
    fn default() -> Self {
        Self {
            interval: 2000.0,
            animation: "fade-up".into(),
            duration: 500.0,
            easing: "ease".into(),
            distance: 40.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypingOptions {
    /// Milliseconds per typed character.
    pub speed: f64,
    /// Milliseconds per deleted character.
    pub delete_speed: f64,
    /// Pause after a string is fully typed.
    pub interval: f64,
    #[serde(rename = "loop")]
    pub repeat: bool,
    pub cursor: bool,
    pub cursor_char: String,
    pub cursor_blink: bool,
}

impl Default for TypingOptions {
    fn default() -> Self {
        Self {
            speed: 80.0,
            delete_speed: 40.0,
            interval: 1200.0,
            repeat: true,
            cursor: true,
            cursor_char: "|".into(),
            cursor_blink: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let o = Options::from_json("{}").unwrap();
        assert_eq!(o, Options::default());
        assert_eq!(o.ticker.speed, 80.0);
        assert_eq!(o.count.duration, 1200.0);
        assert_eq!(o.animation.trigger, "top 90%");
    }

    #[test]
    fn boolean_sections_select_defaults() {
        let o = Options::from_json(r#"{"animation": true, "text": false}"#).unwrap();
        assert_eq!(o.animation, AnimationOptions::default());
        assert_eq!(o.text, TextOptions::default());
    }

    #[test]
    fn camel_case_fields() {
        let o = Options::from_json(
            r#"{
                "parallax": {"tabletSpeed": 0.5, "breakpoints": {"mobile": 600}},
                "ticker": {"pauseOnHover": true, "direction": "up"},
                "animation": {"stagger": {"gap": 50}},
                "text": {"typing": {"deleteSpeed": 10, "loop": false}}
            }"#,
        )
        .unwrap();
        assert_eq!(o.parallax.tablet_speed, 0.5);
        assert_eq!(o.parallax.breakpoints.mobile, 600.0);
        assert_eq!(o.parallax.breakpoints.tablet, 1024.0);
        assert!(o.ticker.pause_on_hover);
        assert_eq!(o.animation.stagger.gap, Some(50.0));
        assert_eq!(o.text.typing.delete_speed, 10.0);
        assert!(!o.text.typing.repeat);
    }

    #[test]
    fn breakpoint_classification_is_inclusive() {
        let bp = Breakpoints::default();
        assert_eq!(bp.classify(768.0), Breakpoint::Mobile);
        assert_eq!(bp.classify(769.0), Breakpoint::Tablet);
        assert_eq!(bp.classify(1024.0), Breakpoint::Tablet);
        assert_eq!(bp.classify(1025.0), Breakpoint::Desktop);
    }
}
