// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live activity tracking.

pub mod adapters;
pub mod clock;
pub mod deferred;
pub mod service;
pub mod session;
pub mod status;
pub mod writer;

pub use adapters::{DeviceBridge, LocationProvider, LocationRequest, SessionSink, StepCounter};
pub use clock::{Clock, ManualClock, SystemClock};
pub use deferred::{deferred_activity_id, ActivityIdResolver, DeferredActivityId};
pub use service::{Collaborators, TrackingHandle, TrackingService};
pub use session::{FixOutcome, Session};
pub use status::{session_status, SessionStatus, StatusPublisher};
pub use writer::{LocationWriter, WriteReport, WriterSettings};
