use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn distance_to(self, other: Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Snapshot of the world state this core needs. The collaborator maintains the
/// full world cache; we only ever ask for the slice relevant to validation and
/// prompting.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Observation {
    pub position: Vec3,
    #[serde(default)]
    pub health: Option<f64>,
    #[serde(default)]
    pub nearby_players: Vec<String>,
}

/// Geometry-bound micro primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveOp {
    /// Approach a coordinate.
    Goto(Vec3),
    /// Inspect the block at a coordinate.
    Inspect(Vec3),
    /// Break the block at a coordinate (`dig` and `mine` both land here).
    Break(Vec3),
}

/// Compound helper routines. Opaque to this core: each may fan out into many
/// collaborator calls.
#[derive(Debug, Clone, PartialEq)]
pub enum CompoundOp {
    DropItems { player: String },
    GotoPlayer { player: String },
    EnsureWorkbench,
    CraftWoodPickaxe,
    CraftStonePickaxe,
    Status,
}

/// Boundary to the world/physics collaborator.
///
/// Movement, digging, crafting, inventory, and the raw server command channel
/// all live on the far side of this trait; the host process implements it.
pub trait GameApi: Send + Sync {
    fn observe<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Observation>> + Send + 'a>>;

    fn primitive<'a>(
        &'a self,
        op: PrimitiveOp,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>>;

    fn compound<'a>(
        &'a self,
        op: CompoundOp,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>>;

    fn run_command<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>>;

    /// Human-readable side channel for rationale, rejection notices, and
    /// refusals. Best effort; callers ignore failures.
    fn notify<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Vec3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        };
        let b = Vec3 {
            x: 3.0,
            y: 0.0,
            z: 4.0,
        };
        assert!((a.distance_to(b) - 5.0).abs() < 1e-9);
        assert_eq!(a.distance_to(a), 0.0);
    }
}
