//! MotionFlow Core (host-agnostic)
//!
//! Scroll and time driven effects for declarative `data-mf-*` markup:
//! entrance animations, parallax smoothing, counters, digit rollers, an
//! infinite ticker and text effects. The core reads and writes the page only
//! through the [`Document`] trait; hosts forward [`HostEvent`]s and call
//! [`MotionFlow::pump`] once per animation frame.

pub mod attrs;
pub mod config;
pub mod count;
pub mod dom;
pub mod easing;
pub mod entrance;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod number;
pub mod parallax;
pub mod roller;
pub mod runtime;
pub mod schedule;
pub mod stagger;
pub mod text;
pub mod ticker;
pub mod trigger;

// Re-exports for consumers (adapters)
pub use config::{
    AnimationOptions, Breakpoint, Breakpoints, CounterOptions, Options, ParallaxOptions,
    ParallaxStaggerOptions, PerBreakpoint, StaggerOptions, TextLoopOptions, TextOptions,
    TickerOptions, TypingOptions,
};
pub use count::{CountAnimator, CountItem};
pub use dom::{Document, HostEvent, MediaFeatures, MutationRecord, Rect, Viewport};
pub use entrance::{EntranceEngine, EntranceItem};
pub use error::{BuildError, LiteralError};
pub use geometry::{ElementAnchor, Trigger};
pub use ids::{ElementId, IdAllocator, TaskId};
pub use number::Grouping;
pub use parallax::{ParallaxItem, ParallaxSmoother};
pub use roller::{RollerAnimator, RollerItem};
pub use runtime::MotionFlow;
pub use schedule::Scheduler;
pub use stagger::{StaggerDirection, StaggerTable};
pub use text::{TextEffects, TextInstance, TextKind};
pub use ticker::{Direction, Ticker, TickerInstance, TickerRegistry};
pub use trigger::{RepeatPolicy, Watch};
