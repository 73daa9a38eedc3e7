//! # topicbus
//!
//! In-process publish/subscribe dispatch with hierarchical, dot-delimited
//! topics. A subscriber of `"a"` receives everything published to `"a"`,
//! `"a.b"`, `"a.b.c"` and so on; it is always handed the originally
//! published topic.
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//! use topicbus::{Bus, Unsubscribed};
//!
//! let bus: Bus<i32> = Bus::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let log = Rc::clone(&seen);
//! let token = bus.subscribe_fn("a", move |topic, data| {
//!     log.borrow_mut().push(format!("{topic}={data}"));
//! });
//!
//! assert!(bus.publish_sync("a.b.c", 42).unwrap());
//! assert!(bus.publish("a.b", 7));
//! assert_eq!(bus.run_pending().unwrap(), 1);
//! assert_eq!(*seen.borrow(), vec!["a.b.c=42", "a.b=7"]);
//!
//! assert_eq!(bus.unsubscribe(token), Unsubscribed::Token(token));
//! assert!(!bus.publish("a", 0));
//! ```
//!
//! The bus is single-threaded: handlers may reenter it (subscribe,
//! unsubscribe, publish) while a delivery pass is running. Deferred work is
//! executed when the host drives the turn queue with [`Bus::run_pending`] or
//! [`Bus::run`].

/// Settings loading (`config` crate, `TOPICBUS_` environment variables).
pub mod config;
/// Logging initialisation for binaries (tracing-subscriber).
pub mod logging;
/// Pub/Sub: Bus, topic matching, default bus.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Settings.
pub use config::{BusSettings, Settings};
/// Pub/Sub API.
pub use pubsub::{
    global, match_sequence, Bus, ErrorSink, ExceptionMode, Handler, HandlerResult, Token,
    TopicRemoval, Unsubscribe, Unsubscribed, WeakBus,
};
/// Errors and result types.
pub use topicbus_error::{BusError, BusResult, ErrorExt, HandlerError, LogLevel, StatusCode};
