//! Scenario tests for routing, the query service and startup wiring.

mod fixtures;
