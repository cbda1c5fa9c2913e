use log::{debug, info};
use rand::Rng;
use shared::map::{find_spawn, random_step, step_toward};
use shared::{Difficulty, HunterView, MapTopology, Position};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Hunter {
    pub id: String,
    pub position: Position,
    pub target: Option<String>,
    pub difficulty: Difficulty,
}

impl Hunter {
    pub fn new(index: usize, position: Position, difficulty: Difficulty) -> Self {
        Self {
            id: format!("hunter_{}", index),
            position,
            target: None,
            difficulty,
        }
    }

    pub fn view(&self) -> HunterView {
        HunterView {
            id: self.id.clone(),
            x: self.position.x,
            y: self.position.y,
            difficulty: self.difficulty,
        }
    }
}

/// Hunter population and the per-tick chase algorithm.
#[derive(Debug, Clone)]
pub struct PursuitEngine {
    hunters: Vec<Hunter>,
    catch_distance: f64,
}

impl PursuitEngine {
    pub fn new(catch_distance: f64) -> Self {
        Self {
            hunters: Vec::new(),
            catch_distance,
        }
    }

    /// Replaces the population with a fresh batch sized for `difficulty`.
    pub fn spawn<T: MapTopology + ?Sized, R: Rng + ?Sized>(
        &mut self,
        difficulty: Difficulty,
        map: &str,
        topology: &T,
        rng: &mut R,
        attempts: u32,
        fallback: Position,
    ) {
        self.hunters = (0..difficulty.hunter_count())
            .map(|index| {
                let position = find_spawn(topology, map, rng, attempts, fallback);
                if position == fallback {
                    debug!("Spawn search for hunter_{} fell back to default", index);
                }
                Hunter::new(index, position, difficulty)
            })
            .collect();

        info!(
            "Spawned {} hunters on {} at difficulty {}",
            self.hunters.len(),
            map,
            difficulty.level()
        );
    }

    pub fn clear(&mut self) {
        self.hunters.clear();
    }

    pub fn hunters(&self) -> &[Hunter] {
        &self.hunters
    }

    pub fn views(&self) -> Vec<HunterView> {
        self.hunters.iter().map(Hunter::view).collect()
    }

    /// Advances every hunter by one step.
    ///
    /// With nobody on the map each hunter wanders. Otherwise each hunter
    /// targets its nearest player (first in order wins a tie) and steps
    /// toward it. After the step, every player inside the hunter's catch box
    /// is caught, target or not. Players in `cooldown` cannot be caught;
    /// newly caught players are added to it and returned in catch order.
    pub fn tick<T: MapTopology + ?Sized, R: Rng + ?Sized>(
        &mut self,
        players: &[(String, Position)],
        map: &str,
        topology: &T,
        rng: &mut R,
        cooldown: &mut HashSet<String>,
    ) -> Vec<String> {
        let mut caught = Vec::new();

        if players.is_empty() {
            for hunter in &mut self.hunters {
                hunter.target = None;
                hunter.position = random_step(topology, map, hunter.position, rng);
            }
            return caught;
        }

        for hunter in &mut self.hunters {
            let Some((target_id, target_position)) = nearest(hunter.position, players) else {
                continue;
            };

            hunter.target = Some(target_id.clone());
            hunter.position = step_toward(topology, map, hunter.position, *target_position);

            for (player_id, player_position) in players {
                if hunter.position.within_box(player_position, self.catch_distance)
                    && cooldown.insert(player_id.clone())
                {
                    info!("{} caught player {}", hunter.id, player_id);
                    caught.push(player_id.clone());
                }
            }
        }

        caught
    }
}

fn nearest(from: Position, players: &[(String, Position)]) -> Option<&(String, Position)> {
    let mut best: Option<(&(String, Position), f64)> = None;
    for candidate in players {
        let distance = from.distance(&candidate.1);
        if best.map_or(true, |(_, shortest)| distance < shortest) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}
