//! # Remindr Core Library
//!
//! The recurrence expression engine behind Remindr: it turns a reminder's
//! anchor date, time and repeat pattern into the compact schedule expression
//! the external scheduler stores, and computes upcoming fire times from such
//! an expression.
//!
//! ## Features
//!
//! - **Expression Compiler**: one-time, interval and calendar patterns
//!   compiled to `at(...)`, `rate(...)` or six-field `cron(...)`
//! - **Timezone Awareness**: local anchors converted to UTC with IANA zones,
//!   including DST gaps and weekday/day-of-month shifts across midnight
//! - **Expression Parser**: a pest grammar for the legacy AWS dialect, with
//!   `?` wildcards, `L`, ranges, steps and 1 = Sunday weekday numbering
//! - **Occurrence Simulator**: cron expressions evaluated as RFC 5545 rules
//!   via `rrule`, bounded by a lookahead horizon
//!
//! ## Core Modules
//!
//! - [`models`]: recurrence specs and repeat patterns
//! - [`expression`]: typed schedule expressions
//! - [`compiler`]: spec to expression
//! - [`parser`]: text to expression
//! - [`recurrence`]: occurrence simulation
//! - [`extract`]: validation of extractor payloads
//! - [`summary`]: human-readable confirmations
//! - [`timezone`]: timezone and calendar helpers
//! - [`error`]: error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
//! use remindr_core::{compile, next_occurrences, Pattern, RecurrenceSpec};
//!
//! let spec = RecurrenceSpec::new(
//!     NaiveDate::from_ymd_opt(2024, 10, 14).unwrap(),
//!     NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
//!     "Asia/Kolkata",
//!     Pattern::IntervalDays(1),
//! );
//! let expression = compile(&spec).unwrap();
//! assert_eq!(expression.to_string(), "rate(1 day)");
//!
//! let now = Utc.with_ymd_and_hms(2024, 10, 14, 5, 30, 0).unwrap();
//! let upcoming = next_occurrences(&expression, now, 3).unwrap();
//! assert_eq!(upcoming.len(), 3);
//! ```

pub mod compiler;
pub mod error;
pub mod expression;
pub mod extract;
pub mod models;
pub mod parser;
pub mod recurrence;
pub mod summary;
pub mod timezone;

pub use compiler::{compile, CompilerConfig, ExpressionCompiler};
pub use error::{CoreError, Result};
pub use expression::{CronExpression, Expression, Rate, RateUnit};
pub use extract::{ExtractedReminder, RepeatFrequency};
pub use models::{Pattern, RecurrenceSpec, WeekdaySet};
pub use parser::parse;
pub use recurrence::{next_occurrences, preview, Occurrence, OccurrenceSimulator, SimulatorConfig};
pub use summary::{describe, reminder_summary};
