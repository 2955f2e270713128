//! Simulation stage
//!
//! [`LifeSimulation`] advances the automaton on the GPU; [`TickCounter`]
//! decides which frames run it; [`PingPong`] tracks which of the two
//! generation textures is current.

pub mod gpu;
pub mod ping_pong;
pub mod tick;

pub use gpu::LifeSimulation;
pub use ping_pong::PingPong;
pub use tick::TickCounter;
