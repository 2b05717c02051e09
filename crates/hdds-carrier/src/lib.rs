// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HDDS Carrier Plugins
//!
//! Carrier chains for HDDS connections, and a priority modifier that lets
//! several sources compete for one receiving port.
//!
//! # Features
//!
//! - **Carrier Contract**: per-connection protocol plugins cloned from
//!   named prototypes
//! - **Modifier Chains**: decorators stacked on a base carrier from a
//!   `tcp+recv.priority+level.15` style specification
//! - **Peer Election**: connections sharing an endpoint find a common group
//!   by name, with RAII deregistration
//! - **Priority Admission**: decaying per-source scores with excitatory and
//!   inhibitory sources
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use hdds_carrier::{CarrierFactory, InboundConnection, PriorityElection, Route, SystemClock};
//!
//! let peers = Arc::new(PriorityElection::new());
//! let factory = CarrierFactory::with_defaults(peers.clone(), Arc::new(SystemClock));
//!
//! let route = Route::new("/camera", "/viewer", "tcp+recv.priority+level.10+time.2");
//! let mut conn = InboundConnection::open(&factory, route).unwrap();
//! assert!(conn.deliver(b"frame").is_some());
//! assert_eq!(peers.member_count("/viewer"), 1);
//! ```
//!
//! # Modifier Parameters
//!
//! | Key        | Meaning                                  |
//! |------------|------------------------------------------|
//! | `level`    | peak priority                            |
//! | `time`     | decay time constant (seconds)            |
//! | `inhibit`  | suppress weaker peers, never deliver     |
//! | `arrival`  | `observed` (default) or `admitted`       |

pub mod carrier;
pub mod clock;
pub mod config;
pub mod connection;
pub mod election;
pub mod error;
pub mod modifier;
pub mod priority;
pub mod simulator;

pub use carrier::{
    Carrier, CarrierFactory, CarrierFlags, ConnectionContext, ConnectionReader, InboundMessage,
    Modifier, ModifyingCarrier, PassthroughCarrier, Route,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EventConfig, ScenarioConfig, SourceConfig};
pub use connection::{
    ConnectionStats, ConnectionStatsSnapshot, InboundConnection, OutboundConnection,
};
pub use election::{Election, PeerGroup, PeerId, Registration};
pub use error::{CarrierError, Result};
pub use modifier::{Direction, ModifierConfig};
pub use priority::{
    Admission, ArrivalPolicy, PeerSnapshot, PriorityCarrier, PriorityElection, PriorityGroup,
    PriorityState,
};
pub use simulator::{SimulationError, SimulationReport};
