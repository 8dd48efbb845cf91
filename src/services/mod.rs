// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external collaborators.

pub mod weather;

pub use weather::{OpenMeteoClient, WeatherLookup};
