// Tests module
// Simulation invariants: properties that hold on every tick of a long run
// Broadcast: lazy start, start-once under concurrent connects, fan-out, shutdown

pub mod simulation_invariants;
